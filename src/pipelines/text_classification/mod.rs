/// Batcher
pub mod batcher;

/// Text Classification Items
pub mod item;

/// Training step output and metric adaptors
pub mod output;

/// Experiment configuration
pub mod config;

/// Per-class precision, recall and F-score
pub mod report;

/// Cohen's kappa agreement
pub mod kappa;

/// Training
pub mod training;

/// Inference
pub mod inference;

pub use batcher::Batcher;
pub use config::Config;
pub use inference::infer;
pub use item::Item;
pub use kappa::{CohenKappa, Weighting};
pub use output::Output;
pub use report::ClassificationReport;
pub use training::{build_vocab, evaluate, train, Evaluation};

/// The unique string token that identifies this pipeline
pub static PIPELINE: &str = "text-classification";
