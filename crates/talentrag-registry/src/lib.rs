//! TalentRAG Registry — resolves the latest registered version of the served
//! model and freezes its metadata into a snapshot at startup.

pub mod cache;
pub mod file;
pub mod mlflow;
pub mod registry;
pub mod types;

pub use cache::ModelMetadataCache;
pub use file::FileRegistry;
pub use mlflow::MlflowRegistry;
pub use registry::ModelRegistry;
pub use types::{ModelMetadataSnapshot, RegisteredVersion};
