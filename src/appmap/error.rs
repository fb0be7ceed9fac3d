use super::types::NodeId;

/// Failures while mutating the graph.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
	/// An edge named an endpoint that was never added as a node.
	#[error("edge {a} -> {b} has an endpoint that is not in the graph")]
	InvalidEdge { a: NodeId, b: NodeId },
}

/// Failures while reading a trace document.
#[derive(Debug, thiserror::Error)]
pub enum TraceError {
	#[error("invalid trace JSON: {0}")]
	Parse(#[from] serde_json::Error),
	#[error("trace {index} contains no hops")]
	EmptyTrace { index: usize },
}
