/// TextCNN Configuration and embedding initialization policy
pub mod config;

/// TextCNN Model
pub mod model;

/// Training and validation steps
pub mod train;

pub use config::{ConfigError, EmbeddingMode, TextCnnConfig};
pub use model::TextCnn;
