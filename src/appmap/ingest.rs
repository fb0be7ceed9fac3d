//! Turns recorded hop sequences into graph nodes and edges.

use std::collections::HashMap;

use log::{debug, error, info};

use super::graph::{GraphModel, Node};
use super::types::{HopRecord, NodeId};

/// Entry point of every recorded transaction.
pub const ROOT_NODE_ID: NodeId = 0;
/// Extra weight given to the entry point so the rest of the graph spreads around it.
pub const ROOT_FORCE_MULTIPLIER: f32 = 5.0;

/// How a node is drawn.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
	/// Plain box, the fallback glyph.
	Cube,
	/// A named model glyph, e.g. the database drum.
	Model(String),
}

/// Visuals attached to a node when it is created.
#[derive(Clone, Debug, PartialEq)]
pub struct VisualMetadata {
	/// Glyph drawn for the node.
	pub shape: Shape,
	/// Glyph size in world units.
	pub size: f32,
	/// CSS colour; nodes without one get a palette colour.
	pub color: Option<String>,
}

impl Default for VisualMetadata {
	fn default() -> Self {
		Self {
			shape: Shape::Cube,
			size: 60.0,
			color: None,
		}
	}
}

/// Resolves a type tag to visuals. Must be total: unknown tags get a fallback.
pub trait TypeLookup {
	fn resolve(&self, type_tag: &str) -> VisualMetadata;
}

impl<F> TypeLookup for F
where
	F: Fn(&str) -> VisualMetadata,
{
	fn resolve(&self, type_tag: &str) -> VisualMetadata {
		self(type_tag)
	}
}

/// Exact-match table of type tags with a fallback for everything else.
#[derive(Clone, Debug)]
pub struct TypeTable {
	entries: HashMap<String, VisualMetadata>,
	fallback: VisualMetadata,
}

impl TypeTable {
	/// Empty table resolving every tag to `fallback`.
	pub fn new(fallback: VisualMetadata) -> Self {
		Self {
			entries: HashMap::new(),
			fallback,
		}
	}

	/// Registers visuals for an exact type tag.
	pub fn with_entry(mut self, type_tag: impl Into<String>, visual: VisualMetadata) -> Self {
		self.entries.insert(type_tag.into(), visual);
		self
	}

	/// Visuals for unregistered tags.
	pub fn fallback(&self) -> &VisualMetadata {
		&self.fallback
	}
}

impl Default for TypeTable {
	/// Knows databases; everything else is a cube.
	fn default() -> Self {
		Self::new(VisualMetadata::default()).with_entry(
			"Database",
			VisualMetadata {
				shape: Shape::Model("db".into()),
				size: 90.0,
				color: Some("#2ca02c".into()),
			},
		)
	}
}

impl TypeLookup for TypeTable {
	fn resolve(&self, type_tag: &str) -> VisualMetadata {
		match self.entries.get(type_tag) {
			Some(visual) => visual.clone(),
			None => {
				debug!("no visuals registered for type {type_tag:?}, using fallback");
				self.fallback.clone()
			}
		}
	}
}

/// Counts of what a single [`PathIngestor::ingest`] call added.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IngestSummary {
	/// Nodes created by this call.
	pub nodes_added: usize,
	/// Edges created by this call.
	pub edges_added: usize,
}

/// Populates a [`GraphModel`] from hop sequences. Repeated calls merge into the same graph.
pub struct PathIngestor<L> {
	lookup: L,
	force_multipliers: HashMap<NodeId, f32>,
}

impl<L: TypeLookup> PathIngestor<L> {
	/// Ingestor that weights [`ROOT_NODE_ID`] by [`ROOT_FORCE_MULTIPLIER`].
	pub fn new(lookup: L) -> Self {
		Self {
			lookup,
			force_multipliers: HashMap::from([(ROOT_NODE_ID, ROOT_FORCE_MULTIPLIER)]),
		}
	}

	/// Attach `multiplier` to `id` when that node is first created.
	pub fn with_force_multiplier(mut self, id: NodeId, multiplier: f32) -> Self {
		self.force_multipliers.insert(id, multiplier);
		self
	}

	/// Adds the nodes and edges `hops` visits that `graph` does not have yet.
	pub fn ingest(&self, graph: &mut GraphModel, hops: &[HopRecord]) -> IngestSummary {
		let mut summary = IngestSummary::default();
		let mut previous: Option<NodeId> = None;

		for hop in hops {
			let current = hop.node_id;

			if !graph.contains(current) {
				let mut node = Node::new(current, &hop.type_tag, self.lookup.resolve(&hop.type_tag));
				if let Some(&multiplier) = self.force_multipliers.get(&current) {
					node = node.with_force_multiplier(multiplier);
				}
				if graph.add_node(node) {
					summary.nodes_added += 1;
				}
			}

			match previous {
				Some(prev) if prev != current => match graph.add_edge(prev, current) {
					Ok(true) => summary.edges_added += 1,
					Ok(false) => {}
					Err(err) => error!("skipping hop {prev} -> {current}: {err}"),
				},
				_ => {}
			}

			previous = Some(current);
		}

		info!(
			"ingested {} hops: {} new nodes, {} new edges",
			hops.len(),
			summary.nodes_added,
			summary.edges_added
		);
		summary
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::appmap::graph::Edge;

	fn hops(ids: &[NodeId]) -> Vec<HopRecord> {
		ids.iter()
			.map(|&id| HopRecord::new(id, 200, "AppServer"))
			.collect()
	}

	fn ingest_all(sequences: &[Vec<HopRecord>]) -> GraphModel {
		let ingestor = PathIngestor::new(TypeTable::default());
		let mut graph = GraphModel::new();
		for sequence in sequences {
			ingestor.ingest(&mut graph, sequence);
		}
		graph
	}

	fn has_edge(graph: &GraphModel, a: NodeId, b: NodeId) -> bool {
		graph.edges().iter().any(|edge| edge.connects(a, b))
	}

	#[test]
	fn repeated_hop_makes_no_self_edge() {
		let (a, b, c) = (1, 2, 3);
		let graph = ingest_all(&[hops(&[a, b, b, c, a])]);

		let ids = graph.nodes().iter().map(|n| n.id).collect::<Vec<_>>();
		assert_eq!(ids, vec![a, b, c]);
		assert_eq!(
			graph.edges(),
			&[
				Edge { from: a, to: b },
				Edge { from: b, to: c },
				Edge { from: c, to: a },
			]
		);
	}

	#[test]
	fn ingesting_twice_adds_nothing() {
		let sequence = hops(&[1, 2, 2, 3, 1]);
		let ingestor = PathIngestor::new(TypeTable::default());
		let mut graph = GraphModel::new();

		let first = ingestor.ingest(&mut graph, &sequence);
		let second = ingestor.ingest(&mut graph, &sequence);

		assert_eq!(first, IngestSummary { nodes_added: 3, edges_added: 3 });
		assert_eq!(second, IngestSummary::default());
		assert_eq!(graph.edge_count(), 3);
	}

	#[test]
	fn sequences_sharing_a_node_merge() {
		let graph = ingest_all(&[hops(&[0, 1, 2, 1, 0]), hops(&[0, 1, 6, 1, 0])]);

		assert_eq!(graph.node_count(), 4);
		assert_eq!(graph.nodes().iter().filter(|n| n.id == 1).count(), 1);
		assert_eq!(graph.edge_count(), 3);
		assert!(has_edge(&graph, 0, 1));
		assert!(has_edge(&graph, 1, 2));
		assert!(has_edge(&graph, 1, 6));
	}

	#[test]
	fn single_hop_only_creates_a_node() {
		let graph = ingest_all(&[hops(&[5])]);
		assert_eq!(graph.node_count(), 1);
		assert_eq!(graph.edge_count(), 0);
	}

	#[test]
	fn unknown_type_gets_fallback_visuals() {
		let table = TypeTable::default();
		let ingestor = PathIngestor::new(table.clone());
		let mut graph = GraphModel::new();
		ingestor.ingest(
			&mut graph,
			&[HopRecord::new(1, 10, "Database"), HopRecord::new(2, 10, "Foo")],
		);

		let database = graph.get_node(1).map(|n| n.visual.clone());
		let foo = graph.get_node(2).map(|n| n.visual.clone());
		assert_eq!(database.map(|v| v.shape), Some(Shape::Model("db".into())));
		assert_eq!(foo.as_ref(), Some(table.fallback()));
	}

	#[test]
	fn tag_matching_is_exact() {
		let table = TypeTable::default();
		assert_eq!(&table.resolve("Database "), table.fallback());
	}

	#[test]
	fn closures_work_as_lookups() {
		let lookup = |tag: &str| VisualMetadata {
			size: tag.len() as f32,
			..VisualMetadata::default()
		};
		let mut graph = GraphModel::new();
		PathIngestor::new(lookup).ingest(&mut graph, &[HopRecord::new(3, 1, "Queue")]);
		assert_eq!(graph.get_node(3).map(|n| n.visual.size), Some(5.0));
	}

	#[test]
	fn root_node_carries_force_multiplier() {
		let graph = ingest_all(&[hops(&[0, 1])]);
		assert_eq!(
			graph.get_node(ROOT_NODE_ID).and_then(|n| n.force_multiplier),
			Some(ROOT_FORCE_MULTIPLIER)
		);
		assert_eq!(graph.get_node(1).and_then(|n| n.force_multiplier), None);
	}

	#[test]
	fn extra_force_multipliers_apply_on_creation() {
		let ingestor = PathIngestor::new(TypeTable::default()).with_force_multiplier(2, 3.0);
		let mut graph = GraphModel::new();
		ingestor.ingest(&mut graph, &hops(&[0, 1, 2]));

		assert_eq!(graph.get_node(2).and_then(|n| n.force_multiplier), Some(3.0));
		assert_eq!(graph.get_node(0).and_then(|n| n.force_multiplier), Some(ROOT_FORCE_MULTIPLIER));
	}
}
