use burn::{
    tensor::{backend::Backend, Int, Tensor},
    train::metric::{AccuracyInput, Adaptor, LossInput},
};
use derive_new::new;

/// Classification output adapted for multiple metrics.
#[derive(new)]
pub struct Output<B: Backend> {
    /// The loss.
    pub loss: Tensor<B, 1>,

    /// Sigmoid class probabilities: [batch_size, n_classes]
    pub output: Tensor<B, 2>,

    /// The targets.
    pub targets: Tensor<B, 1, Int>,
}

impl<B: Backend> Output<B> {
    /// Per-class scores whose argmax is the predicted class
    pub fn scores(&self) -> Tensor<B, 2> {
        class_scores(self.output.clone())
    }

    /// Predicted class ids
    pub fn predictions(&self) -> Vec<usize> {
        predicted_classes(self.output.clone())
    }

    /// Ground-truth class ids
    pub fn target_ids(&self) -> Vec<usize> {
        to_ids(self.targets.clone().into_data().convert::<i64>().value)
    }
}

/// Expand sigmoid probabilities into per-class scores.
///
/// A single sigmoid output becomes `[1 - p, p]`, so the argmax thresholds at 0.5.
pub fn class_scores<B: Backend>(probabilities: Tensor<B, 2>) -> Tensor<B, 2> {
    let [_, n_classes] = probabilities.dims();

    if n_classes == 1 {
        let negative = probabilities.clone().neg().add_scalar(1.0);

        Tensor::cat(vec![negative, probabilities], 1)
    } else {
        probabilities
    }
}

/// The most likely class id for each row of sigmoid probabilities
pub fn predicted_classes<B: Backend>(probabilities: Tensor<B, 2>) -> Vec<usize> {
    to_ids(
        class_scores(probabilities)
            .argmax(1)
            .into_data()
            .convert::<i64>()
            .value,
    )
}

fn to_ids(values: Vec<i64>) -> Vec<usize> {
    values.into_iter().map(|id| id.max(0) as usize).collect()
}

impl<B: Backend> Adaptor<AccuracyInput<B>> for Output<B> {
    fn adapt(&self) -> AccuracyInput<B> {
        AccuracyInput::new(self.scores(), self.targets.clone())
    }
}

impl<B: Backend> Adaptor<LossInput<B>> for Output<B> {
    fn adapt(&self) -> LossInput<B> {
        LossInput::new(self.loss.clone())
    }
}

#[cfg(test)]
mod tests {
    use burn::backend::NdArray;
    use pretty_assertions::assert_eq;

    use crate::utils::tensors::class_ids;

    use super::*;

    type TestBackend = NdArray;

    #[test]
    fn test_binary_predictions_threshold_at_half() {
        let device = Default::default();

        let output = Output::<TestBackend>::new(
            Tensor::from_floats([0.3], &device),
            Tensor::from_floats([[0.9], [0.2], [0.49], [0.51]], &device),
            class_ids(&[1, 0, 1, 1], &device),
        );

        assert_eq!(output.scores().dims(), [4, 2]);
        assert_eq!(output.predictions(), vec![1, 0, 0, 1]);
        assert_eq!(output.target_ids(), vec![1, 0, 1, 1]);
    }

    #[test]
    fn test_multiclass_predictions_use_argmax() {
        let device = Default::default();

        let output = Output::<TestBackend>::new(
            Tensor::from_floats([0.3], &device),
            Tensor::from_floats([[0.1, 0.7, 0.2], [0.6, 0.3, 0.9]], &device),
            class_ids(&[1, 2], &device),
        );

        assert_eq!(output.predictions(), vec![1, 2]);
    }
}
