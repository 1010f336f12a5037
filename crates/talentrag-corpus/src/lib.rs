//! TalentRAG Corpus — immutable (vector, text) arena with cosine top-k search.

pub mod index;
pub mod loader;
pub mod npy;
pub mod types;

pub use index::CorpusIndex;
pub use loader::{load_corpus, load_texts};
pub use types::*;
