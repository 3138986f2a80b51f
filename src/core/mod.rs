pub mod batch;
pub mod config;
pub mod identity;
pub mod manifest;
pub mod normalizer;
pub mod paths;
pub mod pipeline;

pub use config::Config;
