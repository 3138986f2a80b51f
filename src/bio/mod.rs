pub mod fasta;
pub mod sequence;
pub mod taxonomy;

pub use sequence::Sequence;
pub use taxonomy::{TaxonomyDB, TaxonomyLookup};
