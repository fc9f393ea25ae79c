//! Top-k class selection over per-timestep distributions.

use crate::error::ConfigError;
use ndarray::prelude::*;

/// The k best classes at every `(sample, timestep)`.
///
/// Both arrays have shape `(batch, time, k)`. Along the last axis entries are
/// sorted by probability descending; equal probabilities keep the lower
/// class index first. Ordering follows [`f32::total_cmp`], so a NaN never
/// breaks the sort.
#[derive(Clone, Debug)]
pub struct TopK {
    pub indices: Array3<usize>,
    pub probs: Array3<f32>,
}

impl TopK {
    pub fn batch_size(&self) -> usize {
        self.indices.len_of(Axis(0))
    }

    pub fn num_steps(&self) -> usize {
        self.indices.len_of(Axis(1))
    }

    pub fn k(&self) -> usize {
        self.indices.len_of(Axis(2))
    }

    /// `(time, k)` view of one sample's indices.
    pub fn sample_indices(&self, sample: usize) -> ArrayView2<'_, usize> {
        self.indices.index_axis(Axis(0), sample)
    }

    /// `(time, k)` view of one sample's probabilities.
    pub fn sample_probs(&self, sample: usize) -> ArrayView2<'_, f32> {
        self.probs.index_axis(Axis(0), sample)
    }
}

/// Select the `k` most probable classes at each timestep.
pub fn select_topk(probs: ArrayView3<f32>, k: usize) -> Result<TopK, ConfigError> {
    let (batch, steps, num_classes) = probs.dim();

    if k == 0 || k > num_classes {
        return Err(ConfigError::InvalidTopK { k, num_classes });
    }

    let mut indices = Array3::<usize>::zeros((batch, steps, k));
    let mut selected = Array3::<f32>::zeros((batch, steps, k));
    let mut ranked: Vec<(usize, f32)> = Vec::with_capacity(num_classes);

    for b in 0..batch {
        for t in 0..steps {
            ranked.clear();
            ranked.extend(probs.slice(s![b, t, ..]).iter().copied().enumerate());
            // Stable sort keeps the lower index first among equal probabilities.
            ranked.sort_by(|x, y| y.1.total_cmp(&x.1));

            for (j, &(index, p)) in ranked.iter().take(k).enumerate() {
                indices[[b, t, j]] = index;
                selected[[b, t, j]] = p;
            }
        }
    }

    Ok(TopK {
        indices,
        probs: selected,
    })
}

/// Softmax over the class axis of `(batch, time, classes)` logits.
pub fn softmax(logits: ArrayView3<f32>) -> Array3<f32> {
    let mut probs = logits.to_owned();

    for mut lane in probs.lanes_mut(Axis(2)) {
        let max = lane.fold(f32::NEG_INFINITY, |m, &x| m.max(x));
        lane.mapv_inplace(|x| (x - max).exp());
        let sum = lane.sum();
        if sum > 0.0 {
            lane.mapv_inplace(|x| x / sum);
        }
    }

    probs
}
