use burn::tensor::{backend::Backend, Data, ElementConversion, Int, Shape, Tensor};

/// Right-pad a list of token id sequences into a `[batch_size, seq_length]` matrix.
///
/// Sequences longer than `seq_length` are truncated.
pub fn pad_to<B: Backend>(
    pad_token: usize,
    tokens_list: Vec<Vec<usize>>,
    seq_length: usize,
    device: &B::Device,
) -> Tensor<B, 2, Int> {
    let batch_size = tokens_list.len();

    let mut ids = vec![pad_token as i64; batch_size * seq_length];

    for (index, tokens) in tokens_list.into_iter().enumerate() {
        let row = index * seq_length;

        for (position, token) in tokens.into_iter().take(seq_length).enumerate() {
            ids[row + position] = token as i64;
        }
    }

    let data: Data<B::IntElem, 2> = Data::new(
        ids.into_iter().map(|id| id.elem()).collect(),
        Shape::new([batch_size, seq_length]),
    );

    Tensor::from_data(data, device)
}

/// Build a 1D integer tensor from a list of class ids
pub fn class_ids<B: Backend>(ids: &[usize], device: &B::Device) -> Tensor<B, 1, Int> {
    let data: Data<B::IntElem, 1> = Data::new(
        ids.iter().map(|id| (*id as i64).elem()).collect(),
        Shape::new([ids.len()]),
    );

    Tensor::from_data(data, device)
}
