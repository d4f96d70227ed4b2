//! Error types for graph mutation
//!
//! Only malformed input is an error here. Duplicates, dangling edges and
//! self-loops are all accepted by the model.

/// Rejected node or edge input
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Node event without a usable id
    #[error("node event has no id")]
    MissingNodeId,

    /// Edge event without a usable id
    #[error("edge event has no id")]
    MissingEdgeId,

    /// Edge event missing its source or target
    #[error("edge {edge} has no {endpoint}")]
    MissingEndpoint {
        /// Id of the offending edge
        edge: String,
        /// `"source"` or `"target"`
        endpoint: &'static str,
    },
}

impl ValidationError {
    /// Create a missing-endpoint error
    #[inline]
    pub fn missing_endpoint(edge: impl Into<String>, endpoint: &'static str) -> Self {
        Self::MissingEndpoint {
            edge: edge.into(),
            endpoint,
        }
    }
}
