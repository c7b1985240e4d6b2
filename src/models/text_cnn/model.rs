use burn::{
    module::Module,
    nn::{conv::Conv1d, loss::CrossEntropyLossConfig, Dropout, Embedding, Linear},
    tensor::{
        activation::{relu, sigmoid},
        backend::Backend,
        Int, Tensor,
    },
};

use crate::pipelines::text_classification::{batcher, Output};

/// Probabilities are clamped away from 0 and 1 before taking logs
const EPSILON: f64 = 1e-7;

/// TextCNN for sentence classification
#[derive(Module, Debug)]
pub struct TextCnn<B: Backend> {
    /// Token embedding table, `[vocab_size, embedding_dim]`
    pub embedding: Embedding<B>,

    /// One filter bank per kernel size, in concatenation order
    pub convs: Vec<Conv1d<B>>,

    /// Dropout over the sentence embedding
    pub dropout: Dropout,

    /// Linear layer for classification
    pub output: Linear<B>,

    /// Total number of classes
    pub n_classes: usize,

    /// The largest kernel size, which is the shortest sequence every branch can convolve
    pub min_seq_length: usize,
}

/// Define model behavior
impl<B: Backend> TextCnn<B> {
    /// Max-pooled convolution features for each sequence, `[batch_size, num_filters * n_kernels]`.
    ///
    /// # Panics
    ///
    /// If the sequences are shorter than the largest kernel size.
    pub fn sentence_embedding(&self, tokens: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        let [batch_size, seq_length] = tokens.dims();

        assert!(
            seq_length >= self.min_seq_length,
            "sequence length {} is shorter than the largest kernel size {}",
            seq_length,
            self.min_seq_length
        );

        // [batch_size, seq_length, embedding_dim] -> [batch_size, embedding_dim, seq_length]
        let embedded = self.embedding.forward(tokens).swap_dims(1, 2);

        let pooled = self
            .convs
            .iter()
            .map(|conv| {
                let features = relu(conv.forward(embedded.clone()));
                let [_, num_filters, _] = features.dims();

                features.max_dim(2).reshape([batch_size, num_filters])
            })
            .collect();

        Tensor::cat(pooled, 1)
    }

    /// Class probabilities, `[batch_size, n_classes]`.
    ///
    /// Dropout is only active on autodiff backends, so calling this on the module returned by
    /// `valid()` is deterministic.
    pub fn forward(&self, tokens: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        let features = self.dropout.forward(self.sentence_embedding(tokens));

        sigmoid(self.output.forward(features))
    }

    /// The probability of the last class for each sequence, `[batch_size]`. For a binary model
    /// this is P(positive).
    pub fn predict(&self, tokens: Tensor<B, 2, Int>) -> Tensor<B, 1> {
        let [batch_size, _] = tokens.dims();
        let n_classes = self.n_classes;

        self.forward(tokens)
            .slice([0..batch_size, n_classes - 1..n_classes])
            .reshape([batch_size])
    }

    /// Defines forward pass for training and validation
    pub fn forward_classification(&self, item: batcher::Train<B>) -> Output<B> {
        let output = self.forward(item.input.tokens);
        let loss = classification_loss(output.clone(), item.targets.clone());

        Output::new(loss, output, item.targets)
    }

    /// Defines forward pass for inference
    pub fn infer(&self, input: batcher::Infer<B>) -> Tensor<B, 2> {
        self.forward(input.tokens)
    }
}

/// Binary cross-entropy for a single sigmoid output, or cross-entropy over the normalized
/// sigmoid scores when there are several classes
fn classification_loss<B: Backend>(
    output: Tensor<B, 2>,
    targets: Tensor<B, 1, Int>,
) -> Tensor<B, 1> {
    let [batch_size, n_classes] = output.dims();

    if n_classes == 1 {
        return binary_cross_entropy(output.reshape([batch_size]), targets);
    }

    CrossEntropyLossConfig::new()
        .init(&output.device())
        .forward(output.clamp(EPSILON, 1.0).log(), targets)
}

/// Mean binary cross-entropy between probabilities and 0/1 targets
pub(crate) fn binary_cross_entropy<B: Backend>(
    probabilities: Tensor<B, 1>,
    targets: Tensor<B, 1, Int>,
) -> Tensor<B, 1> {
    let probabilities = probabilities.clamp(EPSILON, 1.0 - EPSILON);
    let targets = targets.float();

    let positive = targets.clone() * probabilities.clone().log();
    let negative = targets.neg().add_scalar(1.0) * probabilities.neg().add_scalar(1.0).log();

    (positive + negative).mean().neg()
}

#[cfg(test)]
mod tests {
    use burn::{
        backend::{Autodiff, NdArray},
        module::AutodiffModule,
    };
    use pretty_assertions::assert_eq;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    use crate::{
        models::text_cnn::{ConfigError, EmbeddingMode, TextCnnConfig},
        pipelines::text_classification::batcher::{Infer, Train},
        utils::tensors::{class_ids, pad_to},
        vocab::{PretrainedEmbeddings, PAD_INDEX},
    };

    use super::*;

    type TestBackend = NdArray;
    type TestAutodiffBackend = Autodiff<TestBackend>;

    fn pretrained(rows: usize, dim: usize, seed: u64) -> PretrainedEmbeddings {
        let mut rng = StdRng::seed_from_u64(seed);
        let values = (0..rows * dim).map(|_| rng.gen_range(-1.0..1.0)).collect();

        PretrainedEmbeddings::new(rows, dim, values).expect("valid shape")
    }

    fn tokens<B: Backend>(
        batch_size: usize,
        seq_length: usize,
        vocab_size: usize,
        device: &B::Device,
    ) -> Tensor<B, 2, Int> {
        let ids = (0..batch_size)
            .map(|row| {
                (0..seq_length)
                    .map(|col| (row * 7 + col * 13 + 2) % vocab_size)
                    .collect()
            })
            .collect();

        pad_to::<B>(PAD_INDEX, ids, seq_length, device)
    }

    fn small_config() -> TextCnnConfig {
        TextCnnConfig::new(50)
            .with_embedding_dim(8)
            .with_kernel_sizes(vec![2, 3])
            .with_num_filters(4)
    }

    fn values<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> Vec<f32> {
        tensor.into_data().convert::<f32>().value
    }

    fn assert_probabilities(probabilities: &[f32]) {
        assert!(probabilities.iter().all(|p| *p > 0.0 && *p < 1.0));
    }

    #[test]
    fn test_output_shape_and_range() {
        let device = Default::default();
        let model = small_config()
            .with_mode(EmbeddingMode::Random)
            .init::<TestBackend>(None, &device)
            .expect("valid config");

        let output = model.predict(tokens(4, 6, 50, &device));

        assert_eq!(output.dims(), [4]);
        assert_probabilities(&values(output));
    }

    #[test]
    fn test_variable_sequence_lengths() {
        let device = Default::default();
        let model = small_config()
            .with_mode(EmbeddingMode::Random)
            .init::<TestBackend>(None, &device)
            .expect("valid config");

        for seq_length in [3, 4, 17, 64] {
            let output = model.predict(tokens(2, seq_length, 50, &device));

            assert_eq!(output.dims(), [2]);
            assert_probabilities(&values(output));
        }
    }

    #[test]
    fn test_eval_forward_is_deterministic() {
        let device = Default::default();
        let model = small_config()
            .with_mode(EmbeddingMode::Random)
            .init::<TestAutodiffBackend>(None, &device)
            .expect("valid config")
            .valid();

        let input = tokens::<TestBackend>(3, 9, 50, &device);

        let first = values(model.forward(input.clone()));
        let second = values(model.forward(input));

        assert_eq!(first, second);
    }

    #[test]
    fn test_multiclass_output() {
        let device = Default::default();
        let model = small_config()
            .with_num_classes(3)
            .with_mode(EmbeddingMode::Random)
            .init::<TestBackend>(None, &device)
            .expect("valid config");

        let output = model.forward(tokens(5, 4, 50, &device));

        assert_eq!(output.dims(), [5, 3]);
        assert_probabilities(&values(output));
    }

    #[test]
    fn test_sentence_embedding_width() {
        let device = Default::default();

        for (kernel_sizes, num_filters) in [
            (vec![3, 4, 5], 6),
            (vec![2], 5),
            (vec![2, 2, 3], 4),
            (vec![1, 2, 3, 4], 3),
        ] {
            let config = small_config()
                .with_kernel_sizes(kernel_sizes)
                .with_num_filters(num_filters)
                .with_mode(EmbeddingMode::Random);
            let model = config
                .init::<TestBackend>(None, &device)
                .expect("valid config");

            let features = model.sentence_embedding(tokens(2, 5, 50, &device));

            assert_eq!(features.dims(), [2, config.sentence_embedding_width()]);
            assert_eq!(
                config.sentence_embedding_width(),
                num_filters * config.distinct_kernel_sizes().len()
            );
        }
    }

    #[test]
    #[should_panic(expected = "shorter than the largest kernel size")]
    fn test_rejects_sequences_shorter_than_kernels() {
        let device = Default::default();
        let model = small_config()
            .with_mode(EmbeddingMode::Random)
            .init::<TestBackend>(None, &device)
            .expect("valid config");

        model.predict(tokens(2, 2, 50, &device));
    }

    #[test]
    fn test_static_mode_copies_and_freezes() {
        let device = Default::default();
        let embeddings = pretrained(50, 8, 1);

        let model = small_config()
            .with_mode(EmbeddingMode::Static)
            .init::<TestAutodiffBackend>(Some(&embeddings), &device)
            .expect("valid config");

        let weight = model.embedding.weight.val();
        assert!(!weight.is_require_grad());
        assert_eq!(values(weight), embeddings.values().to_vec());
    }

    #[test]
    fn test_nonstatic_mode_copies_and_trains() {
        let device = Default::default();
        let embeddings = pretrained(50, 8, 2);

        let model = small_config()
            .with_mode(EmbeddingMode::NonStatic)
            .init::<TestAutodiffBackend>(Some(&embeddings), &device)
            .expect("valid config");

        let weight = model.embedding.weight.val();
        assert!(weight.is_require_grad());
        assert_eq!(values(weight), embeddings.values().to_vec());
    }

    #[test]
    fn test_random_mode_ignores_pretrained() {
        let device = Default::default();
        let embeddings = pretrained(50, 8, 3);

        let model = small_config()
            .with_mode(EmbeddingMode::Random)
            .init::<TestAutodiffBackend>(Some(&embeddings), &device)
            .expect("valid config");

        let weight = model.embedding.weight.val();
        assert!(weight.is_require_grad());

        let table = values(weight);
        assert_ne!(table, embeddings.values().to_vec());
        assert_eq!(&table[PAD_INDEX * 8..(PAD_INDEX + 1) * 8], &[0.0; 8]);
    }

    #[test]
    fn test_unknown_mode_builds_nothing() {
        let device = Default::default();
        let embeddings = pretrained(50, 8, 4);

        let result =
            small_config().init_with_mode::<TestBackend>("glove", Some(&embeddings), &device);

        assert_eq!(
            result.err(),
            Some(ConfigError::UnknownMode("glove".to_string()))
        );
    }

    #[test]
    fn test_pretrained_modes_require_matching_matrix() {
        let device = Default::default();

        let missing = small_config()
            .with_mode(EmbeddingMode::NonStatic)
            .init::<TestBackend>(None, &device);
        assert_eq!(
            missing.err(),
            Some(ConfigError::MissingPretrained(EmbeddingMode::NonStatic))
        );

        let mismatched = small_config()
            .with_mode(EmbeddingMode::Static)
            .init::<TestBackend>(Some(&pretrained(50, 16, 5)), &device);
        assert!(matches!(
            mismatched.err(),
            Some(ConfigError::PretrainedShape { cols: 16, .. })
        ));
    }

    #[test]
    fn test_static_embedding_receives_no_gradient() {
        let device = Default::default();
        let embeddings = pretrained(50, 8, 6);

        let model = small_config()
            .with_mode(EmbeddingMode::Static)
            .init::<TestAutodiffBackend>(Some(&embeddings), &device)
            .expect("valid config");

        let batch = Train::new(
            Infer::new(tokens(4, 6, 50, &device)),
            class_ids(&[0, 1, 1, 0], &device),
        );

        let gradients = model.forward_classification(batch).loss.backward();

        assert!(model.embedding.weight.val().grad(&gradients).is_none());
        assert!(model.convs[0].weight.val().grad(&gradients).is_some());
        assert!(model.output.weight.val().grad(&gradients).is_some());
    }

    #[test]
    fn test_binary_cross_entropy() {
        let device = Default::default();

        let probabilities = Tensor::<TestBackend, 1>::from_floats([0.5, 0.5], &device);
        let loss = binary_cross_entropy(probabilities, class_ids(&[1, 0], &device));
        let loss = values(loss)[0];
        assert!((loss - std::f32::consts::LN_2).abs() < 1e-5);

        let certain = Tensor::<TestBackend, 1>::from_floats([1.0, 0.0], &device);
        let loss = values(binary_cross_entropy(certain, class_ids(&[0, 1], &device)))[0];
        assert!(loss.is_finite());
        assert!(loss > 10.0);
    }

    #[test]
    fn test_static_scenario() {
        let device = Default::default();
        let embeddings = pretrained(10_000, 100, 7);

        let config = TextCnnConfig::new(10_000)
            .with_embedding_dim(100)
            .with_kernel_sizes(vec![3, 4, 5])
            .with_num_filters(100)
            .with_num_classes(1)
            .with_dropout(0.5)
            .with_mode(EmbeddingMode::Static);
        let model = config
            .init::<TestAutodiffBackend>(Some(&embeddings), &device)
            .expect("valid config");

        let output = model.predict(tokens(32, 7, 10_000, &device));
        assert_eq!(output.dims(), [32]);
        assert_probabilities(&values(output));

        let weight = model.embedding.weight.val();
        assert!(!weight.is_require_grad());
        assert_eq!(values(weight), embeddings.values().to_vec());
    }

    #[test]
    fn test_rand_scenario() {
        let device = Default::default();
        let embeddings = pretrained(10_000, 100, 8);

        let model = TextCnnConfig::new(10_000)
            .init_with_mode::<TestAutodiffBackend>("rand", Some(&embeddings), &device)
            .expect("valid config");

        let output = model.predict(tokens(32, 7, 10_000, &device));
        assert_eq!(output.dims(), [32]);
        assert_probabilities(&values(output));

        let weight = model.embedding.weight.val();
        assert!(weight.is_require_grad());
        assert_ne!(values(weight), embeddings.values().to_vec());
    }
}
