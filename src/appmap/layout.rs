//! Drives an iterative layout solver one step per frame.

use std::collections::HashMap;

use force_graph::{EdgeData, ForceGraph, NodeData, SimulationParameters};
use log::{info, warn};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::graph::GraphModel;
use super::types::{AppmapConfig, LayoutMode, NodeId, Vec3};

/// Solver time advanced by one layout step.
const STEP_SECONDS: f32 = 0.016;
const BASE_MASS: f32 = 10.0;
/// Steps always taken before a quiet step may count as converged.
const WARM_UP_STEPS: usize = 30;

/// An iterative layout solver that writes node positions into the graph.
pub trait LayoutEngine {
	/// Give every node an initial position and prepare solver state.
	fn init(&mut self, graph: &mut GraphModel);
	/// Advance by one unit of work. Must not block.
	fn generate(&mut self, graph: &mut GraphModel);
	fn finished(&self) -> bool;
	/// Stop for good, keeping the positions computed so far.
	fn stop_calculating(&mut self);
}

/// Lifecycle of a [`LayoutDriver`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutState {
	/// Created but not yet `init`ed.
	Uninitialized,
	/// Stepping once per frame.
	Running,
	/// The engine converged or spent its budget.
	Finished,
	/// Stopped from outside; terminal like `Finished`.
	Stopped,
}

/// Owns a [`LayoutEngine`] and the `Uninitialized -> Running -> Finished | Stopped` lifecycle.
pub struct LayoutDriver<E> {
	engine: E,
	state: LayoutState,
	steps: usize,
}

impl<E: LayoutEngine> LayoutDriver<E> {
	/// Driver around an engine that has not been initialised.
	pub fn new(engine: E) -> Self {
		Self {
			engine,
			state: LayoutState::Uninitialized,
			steps: 0,
		}
	}

	/// Places every node and starts running. Later calls do nothing.
	pub fn init(&mut self, graph: &mut GraphModel) {
		if self.state != LayoutState::Uninitialized {
			warn!("layout already initialised ({:?}), ignoring init", self.state);
			return;
		}
		self.engine.init(graph);
		self.state = if self.engine.finished() {
			LayoutState::Finished
		} else {
			LayoutState::Running
		};
	}

	/// Runs one solver step. Returns `false` without doing anything unless running.
	pub fn step(&mut self, graph: &mut GraphModel) -> bool {
		if self.state != LayoutState::Running {
			return false;
		}
		self.engine.generate(graph);
		self.steps += 1;
		if self.engine.finished() {
			info!("layout finished after {} steps", self.steps);
			self.state = LayoutState::Finished;
		}
		true
	}

	/// Freezes the layout. Irreversible; positions are kept.
	pub fn stop(&mut self) {
		if self.is_finished() {
			return;
		}
		self.engine.stop_calculating();
		info!("layout stopped after {} steps", self.steps);
		self.state = LayoutState::Stopped;
	}

	/// True once no further steps will run, whether converged or stopped.
	pub fn is_finished(&self) -> bool {
		matches!(self.state, LayoutState::Finished | LayoutState::Stopped)
	}

	/// Current lifecycle state.
	pub fn state(&self) -> LayoutState {
		self.state
	}

	/// Steps run so far.
	pub fn steps(&self) -> usize {
		self.steps
	}

	/// The wrapped engine.
	pub fn engine(&self) -> &E {
		&self.engine
	}
}

/// Parameters of [`ForceDirectedLayout`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutOptions {
	/// Planar or volumetric scatter.
	pub mode: LayoutMode,
	/// Width of the initial scatter box.
	pub width: f32,
	/// Height of the initial scatter box.
	pub height: f32,
	/// Step budget.
	pub iterations: usize,
	/// Scatter seed.
	pub seed: u64,
	/// Largest step displacement that counts as settled.
	pub settle_threshold: f32,
}

impl From<&AppmapConfig> for LayoutOptions {
	fn from(config: &AppmapConfig) -> Self {
		Self {
			mode: config.layout_mode,
			width: config.layout_width,
			height: config.layout_height,
			iterations: config.layout_iterations_budget,
			seed: config.layout_seed,
			settle_threshold: config.settle_threshold,
		}
	}
}

/// Spring/repulsion layout backed by [`force_graph`].
///
/// The solver is planar: it moves `x` and `y`, while depth keeps the value scattered at
/// init (always `0` in [`LayoutMode::Planar`]).
pub struct ForceDirectedLayout {
	options: LayoutOptions,
	solver: ForceGraph<NodeId, ()>,
	iteration: usize,
	finished: bool,
}

fn simulation_parameters() -> SimulationParameters {
	SimulationParameters {
		force_charge: 150.0,
		force_spring: 0.05,
		force_max: 100.0,
		node_speed: 3000.0,
		damping_factor: 0.9,
	}
}

impl ForceDirectedLayout {
	/// Engine that scatters and solves according to `options`.
	pub fn new(options: LayoutOptions) -> Self {
		Self {
			options,
			solver: ForceGraph::new(simulation_parameters()),
			iteration: 0,
			finished: false,
		}
	}

	/// Solver steps run so far.
	pub fn iteration(&self) -> usize {
		self.iteration
	}

	fn scatter(&self, rng: &mut SmallRng) -> Vec3 {
		let (half_w, half_h) = (self.options.width / 2.0, self.options.height / 2.0);
		let x = rng.gen_range(-half_w..=half_w);
		let y = rng.gen_range(-half_h..=half_h);
		let z = match self.options.mode {
			LayoutMode::Planar => 0.0,
			LayoutMode::Volumetric => rng.gen_range(-half_w..=half_w),
		};
		Vec3::new(x, y, z)
	}
}

impl LayoutEngine for ForceDirectedLayout {
	fn init(&mut self, graph: &mut GraphModel) {
		let mut rng = SmallRng::seed_from_u64(self.options.seed);
		let mut solver = ForceGraph::new(simulation_parameters());
		let mut index_by_id = HashMap::with_capacity(graph.node_count());

		for node in graph.nodes_mut() {
			let position = self.scatter(&mut rng);
			node.position = Some(position);
			let idx = solver.add_node(NodeData {
				x: position.x,
				y: position.y,
				mass: BASE_MASS * node.force_multiplier.unwrap_or(1.0),
				is_anchor: false,
				user_data: node.id,
			});
			index_by_id.insert(node.id, idx);
		}

		for edge in graph.edges() {
			if let (Some(&from), Some(&to)) = (index_by_id.get(&edge.from), index_by_id.get(&edge.to)) {
				solver.add_edge(from, to, EdgeData::default());
			}
		}

		self.solver = solver;
		self.iteration = 0;
		self.finished = graph.node_count() < 2 || self.options.iterations == 0;
		info!(
			"layout initialised: {} nodes, {} edges, budget {} steps, {:?}",
			graph.node_count(),
			graph.edge_count(),
			self.options.iterations,
			self.options.mode
		);
	}

	fn generate(&mut self, graph: &mut GraphModel) {
		if self.finished {
			return;
		}

		self.solver.update(STEP_SECONDS);
		self.iteration += 1;

		let mut max_shift = 0.0_f32;
		self.solver.visit_nodes(|node| {
			let Some(target) = graph.get_node_mut(node.data.user_data) else {
				return;
			};
			let depth = target.position.map_or(0.0, |p| p.z);
			let next = Vec3::new(node.x(), node.y(), depth);
			if let Some(previous) = target.position {
				max_shift = max_shift.max((next - previous).norm());
			}
			target.position = Some(next);
		});

		let settled = self.iteration >= WARM_UP_STEPS && max_shift < self.options.settle_threshold;
		if settled || self.iteration >= self.options.iterations {
			self.finished = true;
		}
	}

	fn finished(&self) -> bool {
		self.finished
	}

	fn stop_calculating(&mut self) {
		self.finished = true;
	}
}

#[cfg(test)]
pub(crate) mod testing {
	use super::*;

	/// Places node `i` (in insertion order) at `(100 * i, 0, 0)` and finishes after a fixed
	/// number of steps without moving anything.
	pub(crate) struct ScriptedLayout {
		steps_to_finish: usize,
		steps: usize,
		finished: bool,
	}

	impl ScriptedLayout {
		pub(crate) fn finishing_after(steps_to_finish: usize) -> Self {
			Self {
				steps_to_finish,
				steps: 0,
				finished: false,
			}
		}
	}

	impl LayoutEngine for ScriptedLayout {
		fn init(&mut self, graph: &mut GraphModel) {
			for (index, node) in graph.nodes_mut().enumerate() {
				node.position = Some(Vec3::new(100.0 * index as f32, 0.0, 0.0));
			}
			self.finished = self.steps_to_finish == 0;
		}

		fn generate(&mut self, _graph: &mut GraphModel) {
			self.steps += 1;
			self.finished = self.steps >= self.steps_to_finish;
		}

		fn finished(&self) -> bool {
			self.finished
		}

		fn stop_calculating(&mut self) {
			self.finished = true;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::testing::ScriptedLayout;
	use super::*;
	use crate::appmap::ingest::{PathIngestor, TypeTable};
	use crate::appmap::types::HopRecord;

	fn sample_graph() -> GraphModel {
		let hops = [0, 1, 2, 2, 1, 3, 4, 5, 4, 3, 1, 0]
			.into_iter()
			.map(|id| HopRecord::new(id, 200, "AppServer"))
			.collect::<Vec<_>>();
		let mut graph = GraphModel::new();
		PathIngestor::new(TypeTable::default()).ingest(&mut graph, &hops);
		graph
	}

	fn options(mode: LayoutMode, iterations: usize) -> LayoutOptions {
		LayoutOptions {
			iterations,
			mode,
			..LayoutOptions::from(&AppmapConfig::default())
		}
	}

	fn positions(graph: &GraphModel) -> Vec<Option<Vec3>> {
		graph.nodes().iter().map(|n| n.position).collect()
	}

	#[test]
	fn driver_walks_through_its_states() {
		let mut graph = sample_graph();
		let mut driver = LayoutDriver::new(ScriptedLayout::finishing_after(3));
		assert_eq!(driver.state(), LayoutState::Uninitialized);
		assert!(!driver.step(&mut graph));

		driver.init(&mut graph);
		assert_eq!(driver.state(), LayoutState::Running);
		assert!(driver.step(&mut graph));
		assert!(driver.step(&mut graph));
		assert!(!driver.is_finished());
		assert!(driver.step(&mut graph));
		assert_eq!(driver.state(), LayoutState::Finished);

		assert!(!driver.step(&mut graph));
		assert_eq!(driver.steps(), 3);
	}

	#[test]
	fn stop_is_terminal() {
		let mut graph = sample_graph();
		let mut driver = LayoutDriver::new(ScriptedLayout::finishing_after(100));
		driver.init(&mut graph);
		driver.step(&mut graph);
		driver.stop();

		assert_eq!(driver.state(), LayoutState::Stopped);
		assert!(driver.is_finished());
		assert!(!driver.step(&mut graph));
		assert!(graph.nodes().iter().all(|n| n.position.is_some()));

		driver.stop();
		assert_eq!(driver.state(), LayoutState::Stopped);
	}

	#[test]
	fn planar_scatter_stays_in_bounds() {
		let mut graph = sample_graph();
		let mut layout = ForceDirectedLayout::new(options(LayoutMode::Planar, 10));
		layout.init(&mut graph);

		for node in graph.nodes() {
			let p = node.position.expect("placed by init");
			assert!(p.x.abs() <= 1000.0 && p.y.abs() <= 1000.0);
			assert_eq!(p.z, 0.0);
		}
	}

	#[test]
	fn volumetric_scatter_uses_depth() {
		let mut graph = sample_graph();
		let mut layout = ForceDirectedLayout::new(options(LayoutMode::Volumetric, 10));
		layout.init(&mut graph);

		let depths = graph
			.nodes()
			.iter()
			.filter_map(|n| n.position)
			.map(|p| p.z)
			.collect::<Vec<_>>();
		assert_eq!(depths.len(), graph.node_count());
		assert!(depths.iter().all(|z| z.abs() <= 1000.0));
		assert!(depths.iter().any(|&z| z != 0.0));
	}

	#[test]
	fn same_seed_same_scatter() {
		let (mut first, mut second) = (sample_graph(), sample_graph());
		ForceDirectedLayout::new(options(LayoutMode::Planar, 10)).init(&mut first);
		ForceDirectedLayout::new(options(LayoutMode::Planar, 10)).init(&mut second);
		assert_eq!(positions(&first), positions(&second));
	}

	#[test]
	fn force_layout_finishes_within_budget() {
		let mut graph = sample_graph();
		let mut driver = LayoutDriver::new(ForceDirectedLayout::new(options(LayoutMode::Planar, 40)));
		driver.init(&mut graph);

		let mut steps = 0;
		while driver.step(&mut graph) {
			steps += 1;
			assert!(steps <= 40);
		}
		assert!(driver.is_finished());
		assert!(driver.engine().iteration() <= 40);

		let frozen = positions(&graph);
		assert!(!driver.step(&mut graph));
		assert_eq!(positions(&graph), frozen);
	}

	#[test]
	fn stepping_moves_nodes_in_the_plane() {
		let mut graph = sample_graph();
		let mut layout = ForceDirectedLayout::new(options(LayoutMode::Volumetric, 10));
		layout.init(&mut graph);
		let before = positions(&graph);
		layout.generate(&mut graph);
		let after = positions(&graph);

		assert_ne!(before, after);
		for (b, a) in before.iter().zip(after.iter()) {
			let (b, a) = (b.expect("placed"), a.expect("placed"));
			assert_eq!(b.z, a.z);
		}
	}

	#[test]
	fn lone_node_needs_no_layout() {
		let mut graph = GraphModel::new();
		PathIngestor::new(TypeTable::default()).ingest(&mut graph, &[HopRecord::new(9, 5, "BT")]);
		let mut driver = LayoutDriver::new(ForceDirectedLayout::new(options(LayoutMode::Planar, 10)));
		driver.init(&mut graph);

		assert_eq!(driver.state(), LayoutState::Finished);
		assert!(graph.position(9).is_some());
	}
}
