use serde::Deserialize;

/// World-space position of a node, walker or trail particle.
pub type Vec3 = nalgebra::Vector3<f32>;

/// Identifier of a system component inside a recorded trace.
pub type NodeId = u32;

/// One recorded hop of a transaction: the component it reached, how long it stayed there
/// and what kind of component it is.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct HopRecord {
	/// Component the transaction reached.
	#[serde(rename = "node")]
	pub node_id: NodeId,
	/// Time spent at the component, in milliseconds.
	#[serde(rename = "time")]
	pub dwell_millis: u64,
	/// Component type, resolved to visuals through a [`TypeLookup`](super::ingest::TypeLookup).
	#[serde(rename = "type")]
	pub type_tag: String,
}

impl HopRecord {
	/// Shorthand used by the demo traces and tests.
	pub fn new(node_id: NodeId, dwell_millis: u64, type_tag: impl Into<String>) -> Self {
		Self {
			node_id,
			dwell_millis,
			type_tag: type_tag.into(),
		}
	}
}

/// Ordered hops of a single transaction.
pub type HopSequence = Vec<HopRecord>;

/// Whether the layout scatters nodes on a plane or inside a cube.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub enum LayoutMode {
	/// Nodes live on the `z = 0` plane.
	#[default]
	#[serde(rename = "2d")]
	Planar,
	/// Nodes are scattered in depth as well.
	#[serde(rename = "3d")]
	Volumetric,
}

/// Recognised options for a transaction map.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppmapConfig {
	/// Planar or volumetric layout.
	pub layout_mode: LayoutMode,
	/// Number of particles kept in each walker's trail.
	pub trail_capacity: usize,
	/// Particles interpolated between two consecutive walker positions.
	pub particles_per_redraw: usize,
	/// Upper bound on layout steps before the layout reports finished.
	pub layout_iterations_budget: usize,
	/// Width of the initial scatter.
	pub layout_width: f32,
	/// Height of the initial scatter.
	pub layout_height: f32,
	/// Seed of the initial scatter, so two runs over the same traces look alike.
	pub layout_seed: u64,
	/// Largest per-step displacement at which the layout counts as settled.
	pub settle_threshold: f32,
	/// Draw node titles next to the glyphs.
	pub show_labels: bool,
}

impl Default for AppmapConfig {
	fn default() -> Self {
		Self {
			layout_mode: LayoutMode::Planar,
			trail_capacity: 60,
			particles_per_redraw: 4,
			layout_iterations_budget: 1000,
			layout_width: 2000.0,
			layout_height: 2000.0,
			layout_seed: 0x5eed_a99a,
			settle_threshold: 0.05,
			show_labels: false,
		}
	}
}

impl AppmapConfig {
	/// Parse a camelCase JSON config document; missing keys keep their defaults.
	pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(raw)
	}
}
