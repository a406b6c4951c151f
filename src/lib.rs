pub mod config;
pub mod errors;
pub mod expand;
pub mod model;
pub mod parser;
pub mod reference;
pub mod state;
pub mod store;
pub mod tree;
pub mod viewport;

// Re-export commonly used types
pub use config::AppConfig;
pub use errors::{ExpandError, MapError, StoreError};
pub use expand::{AiExpansionOrchestrator, ExpandPhase, GenerationSettings};
pub use model::{Document, Node};
pub use reference::ReferenceResolver;
pub use state::MindMapState;
pub use store::{DocumentStore, FileStore, MemoryStore};
pub use viewport::CanvasViewport;
