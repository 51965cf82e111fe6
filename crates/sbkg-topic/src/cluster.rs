//! HDBSCAN clustering over reduced embeddings (§4.6 step 3). Outliers are
//! returned as topic id `-1`, matching HDBSCAN's own noise label.

use hdbscan::{Hdbscan, HdbscanHyperParams};

use crate::error::{Result, TopicError};

pub fn cluster(reduced: &[Vec<f64>], min_topic_size: usize, min_samples: Option<usize>) -> Result<Vec<i32>> {
    if reduced.is_empty() {
        return Ok(Vec::new());
    }

    let mut builder = HdbscanHyperParams::builder().min_cluster_size(min_topic_size);
    if let Some(min_samples) = min_samples {
        builder = builder.min_samples(min_samples);
    }
    let params = builder.build();

    let clusterer = Hdbscan::new(reduced, params);
    clusterer.cluster().map_err(|e| TopicError::Clustering(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_tight_cluster_is_assigned_one_label() {
        let points: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64 * 0.001, 0.0]).collect();
        let labels = cluster(&points, 5, None).unwrap();
        assert_eq!(labels.len(), 20);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(cluster(&[], 5, None).unwrap().is_empty());
    }
}
