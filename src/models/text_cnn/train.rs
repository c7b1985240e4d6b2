use burn::{
    tensor::backend::{AutodiffBackend, Backend},
    train::{TrainOutput, TrainStep, ValidStep},
};

use crate::pipelines::text_classification::{batcher, Output};

use super::TextCnn;

/// Define training step
impl<B: AutodiffBackend> TrainStep<batcher::Train<B>, Output<B>> for TextCnn<B> {
    fn step(&self, item: batcher::Train<B>) -> TrainOutput<Output<B>> {
        // Run forward pass, calculate gradients and return them along with the output
        let output = self.forward_classification(item);
        let grads = output.loss.backward();

        TrainOutput::new(self, grads, output)
    }
}

/// Define validation step
impl<B: Backend> ValidStep<batcher::Train<B>, Output<B>> for TextCnn<B> {
    fn step(&self, item: batcher::Train<B>) -> Output<B> {
        // Run forward pass and return the output
        self.forward_classification(item)
    }
}

#[cfg(test)]
mod tests {
    use burn::{
        backend::{Autodiff, NdArray},
        module::AutodiffModule,
    };
    use pretty_assertions::assert_eq;

    use crate::{
        models::text_cnn::{EmbeddingMode, TextCnnConfig},
        pipelines::text_classification::batcher::{Infer, Train},
        utils::tensors::{class_ids, pad_to},
        vocab::PAD_INDEX,
    };

    use super::*;

    type TestBackend = NdArray;
    type TestAutodiffBackend = Autodiff<TestBackend>;

    fn batch<B: Backend>(device: &B::Device) -> Train<B> {
        let tokens = pad_to::<B>(
            PAD_INDEX,
            vec![vec![2, 3, 4, 5], vec![6, 7, 8], vec![9, 10, 11, 12, 13]],
            5,
            device,
        );

        Train::new(Infer::new(tokens), class_ids(&[1, 0, 1], device))
    }

    #[test]
    fn test_train_and_valid_steps() {
        let device = Default::default();
        let model = TextCnnConfig::new(20)
            .with_embedding_dim(6)
            .with_num_filters(3)
            .with_mode(EmbeddingMode::Random)
            .init::<TestAutodiffBackend>(None, &device)
            .expect("valid config");

        let train = TrainStep::step(&model, batch::<TestAutodiffBackend>(&device));
        let loss = train.item.loss.into_data().convert::<f32>().value;
        assert_eq!(loss.len(), 1);
        assert!(loss[0].is_finite() && loss[0] > 0.0);

        let valid = ValidStep::step(&model.valid(), batch::<TestBackend>(&device));
        assert_eq!(valid.output.dims(), [3, 1]);
        assert_eq!(valid.target_ids(), vec![1, 0, 1]);
    }
}
