// ============================================================
// Layer 4: Sequence Batcher
// ============================================================
// Implements Burn's Batcher trait to stack a Vec<WindowSample>
// into tensors an RNN can consume directly.
//
// How batching works here:
//   Input:  N windows, each seq_len x n_features, plus a target
//   Output: inputs  [N, seq_len, n_features]
//           targets [N, 1]
//
//   Window values are already row-major, so the batch is the
//   windows' buffers laid end to end, then reshaped.
//
// Reference: Burn Book §4 (Batcher)
//            Rust Book §8 (Vectors)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::WindowSample;

// ─── SequenceBatch ────────────────────────────────────────────────────────────
/// A batch of windows ready for a recurrent model's forward pass.
#[derive(Debug, Clone)]
pub struct SequenceBatch<B: Backend> {
    /// Shape: [batch_size, seq_len, n_features]
    pub inputs: Tensor<B, 3>,

    /// Shape: [batch_size, 1]
    pub targets: Tensor<B, 2>,
}

// ─── SequenceBatcher ──────────────────────────────────────────────────────────
/// Holds the device the tensors are created on.
#[derive(Clone, Debug)]
pub struct SequenceBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> SequenceBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<WindowSample, SequenceBatch<B>> for SequenceBatcher<B> {
    fn batch(&self, items: Vec<WindowSample>) -> SequenceBatch<B> {
        let batch_size = items.len();
        // Every window of a dataset shares these
        let (seq_len, n_features) = items
            .first()
            .map(|w| (w.seq_len, w.n_features))
            .unwrap_or((0, 0));

        let input_flat: Vec<f32> = items
            .iter()
            .flat_map(|w| w.inputs.iter().copied())
            .collect();

        let target_flat: Vec<f32> = items.iter().map(|w| w.target).collect();

        let inputs = Tensor::<B, 1>::from_floats(input_flat.as_slice(), &self.device)
            .reshape([batch_size, seq_len, n_features]);

        let targets = Tensor::<B, 1>::from_floats(target_flat.as_slice(), &self.device)
            .reshape([batch_size, 1]);

        SequenceBatch { inputs, targets }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    fn window(start: usize) -> WindowSample {
        let s = start as f32;
        WindowSample {
            start,
            seq_len:    2,
            n_features: 3,
            inputs:     vec![s, s, s, s + 1.0, s + 1.0, s + 1.0],
            target:     s + 2.0,
        }
    }

    #[test]
    fn test_batch_shapes() {
        let batcher = SequenceBatcher::<NdArray>::new(Default::default());
        let batch   = batcher.batch(vec![window(0), window(1), window(2), window(3)]);

        assert_eq!(batch.inputs.dims(), [4, 2, 3]);
        assert_eq!(batch.targets.dims(), [4, 1]);
    }

    #[test]
    fn test_batch_values_keep_window_order() {
        let batcher = SequenceBatcher::<NdArray>::new(Default::default());
        let batch   = batcher.batch(vec![window(5), window(6)]);

        let targets = batch.targets.into_data().to_vec::<f32>().unwrap();
        assert_eq!(targets, vec![7.0, 8.0]);

        let inputs = batch.inputs.into_data().to_vec::<f32>().unwrap();
        assert_eq!(&inputs[..6], &[5.0, 5.0, 5.0, 6.0, 6.0, 6.0]);
        assert_eq!(&inputs[6..], &[6.0, 6.0, 6.0, 7.0, 7.0, 7.0]);
    }
}
