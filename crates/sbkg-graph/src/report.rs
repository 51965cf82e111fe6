//! Per-stage load report (§4.9 step 4): counts per node/edge label plus
//! any batches that were quarantined rather than loaded.

use std::collections::BTreeMap;

use sbkg_common::error::RejectedRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphLoadReport {
    pub node_counts: BTreeMap<String, usize>,
    pub edge_counts: BTreeMap<String, usize>,
    pub rejections: Vec<RejectedRecord>,
}

impl GraphLoadReport {
    pub fn add_nodes(&mut self, label: impl Into<String>, n: usize) {
        *self.node_counts.entry(label.into()).or_insert(0) += n;
    }

    pub fn add_edges(&mut self, edge_type: impl Into<String>, n: usize) {
        *self.edge_counts.entry(edge_type.into()).or_insert(0) += n;
    }

    pub fn has_rejections(&self) -> bool {
        !self.rejections.is_empty()
    }
}
