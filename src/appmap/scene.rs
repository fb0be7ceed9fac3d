//! Per-frame coordination of layout, walkers and trails.

use log::info;

use super::graph::GraphModel;
use super::ingest::{PathIngestor, TypeLookup};
use super::layout::{ForceDirectedLayout, LayoutDriver, LayoutEngine, LayoutOptions, LayoutState};
use super::trail::TrailBuffer;
use super::types::{AppmapConfig, HopSequence, Vec3};
use super::walker::WalkerScheduler;

/// Walker colours, assigned to traces in order.
pub const WALKER_COLORS: &[&str] = &["#ffff00", "#00ff00", "#ff7f0e", "#17becf", "#e377c2"];

/// One animated trace: its schedule, trail and colour.
#[derive(Clone, Debug)]
pub struct Walker {
	scheduler: WalkerScheduler,
	trail: TrailBuffer,
	color: &'static str,
}

impl Walker {
	/// Walker over `hops` with a trail sized by `config`.
	pub fn new(hops: HopSequence, color: &'static str, config: &AppmapConfig) -> Self {
		Self {
			scheduler: WalkerScheduler::new(hops),
			trail: TrailBuffer::new(config.trail_capacity, config.particles_per_redraw),
			color,
		}
	}

	/// Timeline and position state.
	pub fn scheduler(&self) -> &WalkerScheduler {
		&self.scheduler
	}

	/// Recent trail particles.
	pub fn trail(&self) -> &TrailBuffer {
		&self.trail
	}

	/// CSS colour of the walker and its trail.
	pub fn color(&self) -> &'static str {
		self.color
	}

	/// Current position, once there is one.
	pub fn position(&self) -> Option<Vec3> {
		self.scheduler.position()
	}
}

/// What happened during one [`AppmapScene::on_frame`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameReport {
	/// The layout ran a step this frame.
	pub layout_stepped: bool,
	/// The layout is finished or stopped after this frame.
	pub layout_finished: bool,
}

/// Graph size and layout status, for an info readout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SceneInfo {
	/// Nodes in the graph.
	pub node_count: usize,
	/// Edges in the graph.
	pub edge_count: usize,
	/// The layout is still being computed.
	pub calculating: bool,
}

/// Everything one transaction map animates: the graph, its layout and one walker per trace.
pub struct AppmapScene<E = ForceDirectedLayout> {
	config: AppmapConfig,
	graph: GraphModel,
	layout: LayoutDriver<E>,
	walkers: Vec<Walker>,
}

impl AppmapScene<ForceDirectedLayout> {
	/// Builds the graph from `traces` and starts the force-directed layout.
	pub fn new(config: AppmapConfig, traces: &[HopSequence], lookup: impl TypeLookup) -> Self {
		let engine = ForceDirectedLayout::new(LayoutOptions::from(&config));
		Self::with_engine(config, traces, lookup, engine)
	}
}

impl<E: LayoutEngine> AppmapScene<E> {
	/// Like [`AppmapScene::new`] with a caller-supplied layout engine.
	pub fn with_engine(
		config: AppmapConfig,
		traces: &[HopSequence],
		lookup: impl TypeLookup,
		engine: E,
	) -> Self {
		let mut graph = GraphModel::new();
		let ingestor = PathIngestor::new(lookup);
		for trace in traces {
			ingestor.ingest(&mut graph, trace);
		}

		let mut layout = LayoutDriver::new(engine);
		layout.init(&mut graph);

		let walkers = traces
			.iter()
			.enumerate()
			.map(|(i, trace)| Walker::new(trace.clone(), WALKER_COLORS[i % WALKER_COLORS.len()], &config))
			.collect::<Vec<_>>();

		info!(
			"scene ready: {} nodes, {} edges, {} walkers",
			graph.node_count(),
			graph.edge_count(),
			walkers.len()
		);

		Self {
			config,
			graph,
			layout,
			walkers,
		}
	}

	/// Runs one frame: layout step, then every walker, then every trail.
	pub fn on_frame(&mut self, delta_millis: f64) -> FrameReport {
		let layout_stepped = !self.layout.is_finished() && self.layout.step(&mut self.graph);
		let layout_finished = self.layout.is_finished();

		for walker in &mut self.walkers {
			let position = walker.scheduler.tick(delta_millis, &self.graph, layout_finished);
			// a walker held on the moving layout leaves no trail
			if let (Some(position), Some(_)) = (position, walker.scheduler.timeline()) {
				walker.trail.record(position);
			}
		}

		FrameReport {
			layout_stepped,
			layout_finished,
		}
	}

	/// Freezes the layout where it is; walkers keep moving over the frozen positions.
	pub fn stop_layout(&mut self) {
		self.layout.stop();
	}

	/// The shared graph.
	pub fn graph(&self) -> &GraphModel {
		&self.graph
	}

	/// One walker per trace, in trace order.
	pub fn walkers(&self) -> &[Walker] {
		&self.walkers
	}

	/// Counts and layout status for display.
	pub fn info(&self) -> SceneInfo {
		SceneInfo {
			node_count: self.graph.node_count(),
			edge_count: self.graph.edge_count(),
			calculating: !self.layout.is_finished(),
		}
	}

	/// Lifecycle state of the layout.
	pub fn layout_state(&self) -> LayoutState {
		self.layout.state()
	}

	/// Options the scene was built with.
	pub fn config(&self) -> &AppmapConfig {
		&self.config
	}
}
