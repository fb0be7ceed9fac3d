//! Cyclic timed animation of a walker retracing a hop sequence.

use log::{debug, info};

use super::graph::GraphModel;
use super::types::{HopRecord, HopSequence, NodeId, Vec3};

/// A single hold-then-move step from one node to the next.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimelineSegment {
	/// Departure node.
	pub from: NodeId,
	/// Arrival node.
	pub to: NodeId,
	/// Time spent moving, taken from the destination hop's dwell.
	pub transition_millis: f64,
	/// Time spent at `from` before moving, taken from the source hop's dwell.
	pub delay_millis: f64,
}

impl TimelineSegment {
	/// Hold plus move time.
	pub fn duration_millis(&self) -> f64 {
		self.delay_millis + self.transition_millis
	}

	/// Interpolation parameter in `[0, 1]` after `elapsed` milliseconds in this segment.
	pub fn progress(&self, elapsed: f64) -> f32 {
		if elapsed <= self.delay_millis {
			0.0
		} else if self.transition_millis <= 0.0 {
			1.0
		} else {
			((elapsed - self.delay_millis) / self.transition_millis).min(1.0) as f32
		}
	}
}

/// Ordered segments whose last one is followed by the first again.
///
/// A trace need not end where it starts. After the first lap the first segment leaves from
/// [`Timeline::wrap_origin`] instead of its own `from`, so the walker never jumps at the wrap.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Timeline {
	segments: Vec<TimelineSegment>,
}

impl Timeline {
	/// One segment per consecutive pair of hops.
	pub fn from_hops(hops: &[HopRecord]) -> Self {
		let segments = hops
			.windows(2)
			.map(|pair| TimelineSegment {
				from: pair[0].node_id,
				to: pair[1].node_id,
				transition_millis: pair[1].dwell_millis as f64,
				delay_millis: pair[0].dwell_millis as f64,
			})
			.collect();
		Self { segments }
	}

	/// Segments in play order.
	pub fn segments(&self) -> &[TimelineSegment] {
		&self.segments
	}

	/// Number of segments.
	pub fn len(&self) -> usize {
		self.segments.len()
	}

	/// Whether the trace had fewer than two hops.
	pub fn is_empty(&self) -> bool {
		self.segments.is_empty()
	}

	/// Segment chained after `index`; the last wraps to the first.
	pub fn next_index(&self, index: usize) -> usize {
		if self.segments.is_empty() {
			0
		} else {
			(index + 1) % self.segments.len()
		}
	}

	/// Node the first segment departs from on every lap after the first.
	pub fn wrap_origin(&self) -> Option<NodeId> {
		self.segments.last().map(|segment| segment.to)
	}

	/// Time for one full lap.
	pub fn loop_duration_millis(&self) -> f64 {
		self.segments.iter().map(TimelineSegment::duration_millis).sum()
	}
}

/// Where the walker is now and where it was on the previous tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WalkerState {
	/// Position after the latest tick.
	pub current_position: Vec3,
	/// Position after the tick before, if any.
	pub previous_position: Option<Vec3>,
}

/// Moves a point along a hop sequence forever.
///
/// Until the layout finishes the walker sits on the first hop's node. The timeline is built
/// on the first tick after that and then only ever advanced, so the animation phase is
/// never reset.
#[derive(Clone, Debug)]
pub struct WalkerScheduler {
	hops: HopSequence,
	timeline: Option<Timeline>,
	cursor: usize,
	elapsed_millis: f64,
	lapped: bool,
	state: Option<WalkerState>,
}

impl WalkerScheduler {
	/// Scheduler that has not built its timeline yet.
	pub fn new(hops: HopSequence) -> Self {
		Self {
			hops,
			timeline: None,
			cursor: 0,
			elapsed_millis: 0.0,
			lapped: false,
			state: None,
		}
	}

	/// Advances by `delta_millis` and returns the new position, if there is one yet.
	pub fn tick(&mut self, delta_millis: f64, graph: &GraphModel, layout_finished: bool) -> Option<Vec3> {
		let first = self.hops.first()?.node_id;

		if self.timeline.is_none() {
			if !layout_finished || !self.positions_ready(graph) {
				let held = graph.position(first);
				if let Some(position) = held {
					self.move_to(position);
				}
				return held;
			}
			self.build_timeline();
		}

		self.advance(delta_millis);
		if let Some(position) = self.sample(graph) {
			self.move_to(position);
		}
		self.position()
	}

	/// Builds the timeline unless it already exists. Returns whether it was built now.
	pub fn build_timeline(&mut self) -> bool {
		if self.timeline.is_some() {
			return false;
		}
		let timeline = Timeline::from_hops(&self.hops);
		info!(
			"walker timeline built: {} segments, {:.0} ms per loop",
			timeline.len(),
			timeline.loop_duration_millis()
		);
		self.timeline = Some(timeline);
		self.cursor = 0;
		self.elapsed_millis = 0.0;
		self.lapped = false;
		true
	}

	/// The timeline, once built.
	pub fn timeline(&self) -> Option<&Timeline> {
		self.timeline.as_ref()
	}

	/// Active segment index and time spent in it.
	pub fn cursor(&self) -> (usize, f64) {
		(self.cursor, self.elapsed_millis)
	}

	/// Current and previous position.
	pub fn state(&self) -> Option<&WalkerState> {
		self.state.as_ref()
	}

	/// Current position, once there is one.
	pub fn position(&self) -> Option<Vec3> {
		self.state.map(|state| state.current_position)
	}

	fn positions_ready(&self, graph: &GraphModel) -> bool {
		let ready = self.hops.iter().all(|hop| graph.position(hop.node_id).is_some());
		if !ready {
			debug!("walker waiting for node positions");
		}
		ready
	}

	fn advance(&mut self, delta_millis: f64) {
		let Some(timeline) = &self.timeline else {
			return;
		};
		let loop_millis = timeline.loop_duration_millis();
		if timeline.is_empty() || loop_millis <= 0.0 {
			return;
		}

		self.elapsed_millis += delta_millis.max(0.0);
		if self.elapsed_millis >= loop_millis {
			self.elapsed_millis %= loop_millis;
			self.lapped = true;
		}

		// Leftover time carries into the chained segment.
		loop {
			let duration = timeline.segments[self.cursor].duration_millis();
			if self.elapsed_millis < duration {
				break;
			}
			self.elapsed_millis -= duration;
			self.cursor = timeline.next_index(self.cursor);
			self.lapped |= self.cursor == 0;
		}
	}

	fn sample(&self, graph: &GraphModel) -> Option<Vec3> {
		let timeline = self.timeline.as_ref()?;
		let Some(segment) = timeline.segments.get(self.cursor) else {
			return self.hops.first().and_then(|hop| graph.position(hop.node_id));
		};
		let from_id = match timeline.wrap_origin() {
			Some(origin) if self.lapped && self.cursor == 0 => origin,
			_ => segment.from,
		};
		let from = graph.position(from_id)?;
		let to = graph.position(segment.to)?;
		Some(from.lerp(&to, segment.progress(self.elapsed_millis)))
	}

	fn move_to(&mut self, position: Vec3) {
		self.state = Some(WalkerState {
			current_position: position,
			previous_position: self.position(),
		});
	}
}
