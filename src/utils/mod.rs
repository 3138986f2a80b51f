pub mod log_file;
pub mod progress;

pub use log_file::DeferredLogFile;
pub use progress::{batch_progress, create_progress_bar};
