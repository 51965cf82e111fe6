//! Dimensionality reduction ahead of clustering (§4.6 step 2).
//!
//! No pure-Rust UMAP implementation is available, so PCA (`linfa-reduction`)
//! stands in for it: both serve the same role here (project L2-normalized
//! embeddings down to `n_components` dimensions before density clustering),
//! and PCA is deterministic under a fixed input, unlike UMAP's stochastic
//! optimizer. `n_neighbors` has no PCA analogue and is accepted but unused.

use linfa::traits::{Fit, Predict};
use linfa::DatasetBase;
use linfa_reduction::Pca;
use ndarray::Array2;

use crate::error::{Result, TopicError};

pub fn reduce(embeddings: &[Vec<f32>], n_components: usize) -> Result<Vec<Vec<f64>>> {
    if embeddings.is_empty() {
        return Ok(Vec::new());
    }
    let dim = embeddings[0].len();
    let n_components = n_components.min(dim).min(embeddings.len());
    if n_components == 0 {
        return Ok(embeddings.iter().map(|_| Vec::new()).collect());
    }

    let flat: Vec<f64> = embeddings.iter().flat_map(|row| row.iter().map(|&v| v as f64)).collect();
    let array = Array2::from_shape_vec((embeddings.len(), dim), flat)
        .map_err(|e| TopicError::Reduction(e.to_string()))?;
    let dataset = DatasetBase::from(array);

    let pca = Pca::params(n_components)
        .fit(&dataset)
        .map_err(|e| TopicError::Reduction(e.to_string()))?;
    let reduced: Array2<f64> = pca.predict(&dataset);

    Ok(reduced.outer_iter().map(|row| row.to_vec()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduces_to_requested_components() {
        let embeddings = vec![vec![1.0, 0.0, 0.0, 0.0], vec![0.0, 1.0, 0.0, 0.0], vec![0.0, 0.0, 1.0, 0.0]];
        let reduced = reduce(&embeddings, 2).unwrap();
        assert_eq!(reduced.len(), 3);
        assert_eq!(reduced[0].len(), 2);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(reduce(&[], 5).unwrap().is_empty());
    }
}
