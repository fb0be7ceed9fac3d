use std::collections::{HashMap, HashSet};

use super::error::GraphError;
use super::ingest::VisualMetadata;
use super::types::{NodeId, Vec3};

/// A system component seen in at least one trace.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
	/// Unique within a graph.
	pub id: NodeId,
	/// Display label, `"<type> #<id>"`.
	pub title: String,
	/// Type tag of the hop that created the node.
	pub type_tag: String,
	/// Glyph resolved from the type tag.
	pub visual: VisualMetadata,
	/// Scales this node's share of the layout forces; `None` behaves like `1.0`.
	pub force_multiplier: Option<f32>,
	/// Unset until the layout scatters the node.
	pub position: Option<Vec3>,
}

impl Node {
	/// Unplaced node titled after its trimmed type tag.
	pub fn new(id: NodeId, type_tag: impl Into<String>, visual: VisualMetadata) -> Self {
		let type_tag = type_tag.into();
		Self {
			id,
			title: format!("{} #{id}", type_tag.trim()),
			type_tag,
			visual,
			force_multiplier: None,
			position: None,
		}
	}

	/// Scales the layout force on this node.
	pub fn with_force_multiplier(mut self, multiplier: f32) -> Self {
		self.force_multiplier = Some(multiplier);
		self
	}
}

/// Undirected connection between two nodes. `from`/`to` keep the direction in which the
/// pair was first traversed; identity ignores it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Edge {
	/// Endpoint the pair was first traversed from.
	pub from: NodeId,
	/// Endpoint the pair was first traversed to.
	pub to: NodeId,
}

impl Edge {
	fn key(a: NodeId, b: NodeId) -> (NodeId, NodeId) {
		if a <= b { (a, b) } else { (b, a) }
	}

	/// Whether this edge joins `a` and `b`, in either order.
	pub fn connects(&self, a: NodeId, b: NodeId) -> bool {
		Self::key(self.from, self.to) == Self::key(a, b)
	}
}

/// Deduplicated nodes and undirected edges, in insertion order.
///
/// Topology only grows. Node positions are written by the layout and read by everyone else.
#[derive(Clone, Debug, Default)]
pub struct GraphModel {
	nodes: Vec<Node>,
	index_by_id: HashMap<NodeId, usize>,
	edges: Vec<Edge>,
	edge_keys: HashSet<(NodeId, NodeId)>,
}

impl GraphModel {
	/// Empty graph.
	pub fn new() -> Self {
		Self::default()
	}

	/// Inserts `node` unless its id is already present. Returns whether it was inserted.
	pub fn add_node(&mut self, node: Node) -> bool {
		if self.index_by_id.contains_key(&node.id) {
			return false;
		}
		self.index_by_id.insert(node.id, self.nodes.len());
		self.nodes.push(node);
		true
	}

	/// Connects `a` and `b`. Self-loops and pairs already connected in either direction are
	/// ignored and return `Ok(false)`.
	pub fn add_edge(&mut self, a: NodeId, b: NodeId) -> Result<bool, GraphError> {
		if !self.contains(a) || !self.contains(b) {
			return Err(GraphError::InvalidEdge { a, b });
		}
		if a == b || !self.edge_keys.insert(Edge::key(a, b)) {
			return Ok(false);
		}
		self.edges.push(Edge { from: a, to: b });
		Ok(true)
	}

	/// Whether a node with `id` exists.
	pub fn contains(&self, id: NodeId) -> bool {
		self.index_by_id.contains_key(&id)
	}

	/// Node by id.
	pub fn get_node(&self, id: NodeId) -> Option<&Node> {
		self.index_by_id.get(&id).map(|&index| &self.nodes[index])
	}

	/// Node by id, for the layout to move.
	pub fn get_node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
		let index = *self.index_by_id.get(&id)?;
		self.nodes.get_mut(index)
	}

	/// Current position of `id`, if the node exists and has been placed.
	pub fn position(&self, id: NodeId) -> Option<Vec3> {
		self.get_node(id).and_then(|node| node.position)
	}

	/// Nodes in insertion order.
	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	/// Nodes in insertion order, mutably.
	pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
		self.nodes.iter_mut()
	}

	/// Edges in insertion order.
	pub fn edges(&self) -> &[Edge] {
		&self.edges
	}

	/// Number of nodes.
	pub fn node_count(&self) -> usize {
		self.nodes.len()
	}

	/// Number of edges.
	pub fn edge_count(&self) -> usize {
		self.edges.len()
	}
}
