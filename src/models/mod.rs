/// TextCNN: parallel convolutions with max-pooling over time
pub mod text_cnn;

/// The name used for the model's artifact directory
pub static MODEL_NAME: &str = "textcnn";
