//! Acquirer + Preprocessor (§4.2, §4.3): fetch paper records from curated
//! lists and external literature services, normalize them to a common
//! record, then clean and sentence-segment the text for NER.

pub mod acquirer;
pub mod curated;
pub mod dedup;
pub mod models;
pub mod preprocess;
pub mod sources;

pub use acquirer::{Acquirer, AcquisitionOutput};
pub use preprocess::{clean_text, preprocess_paper, segment_sentences, Cleaned, ScientificTagger};
