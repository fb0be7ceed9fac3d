use crate::appmap::{AppmapConfig, AppmapScene, HopSequence, LayoutMode, TypeTable, Vec3};

pub const COLORS: &[&str] = &[
	"#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
	"#bcbd22", "#17becf",
];

/// Distance of the virtual eye from the `z = 0` plane, for depth scaling in 3D mode.
const CAMERA_DISTANCE: f32 = 5000.0;
/// Longer gaps (hidden tab, debugger pause) count as a single frame of this length.
const MAX_FRAME_MILLIS: f64 = 250.0;

#[derive(Clone, Debug, Default)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

/// Canvas-side state: the animated scene plus how it is framed on screen.
pub struct MapState {
	pub scene: AppmapScene,
	pub transform: ViewTransform,
	pub pan: PanState,
	pub width: f64,
	pub height: f64,
	last_frame_millis: Option<f64>,
}

impl MapState {
	pub fn new(traces: &[HopSequence], config: AppmapConfig, width: f64, height: f64) -> Self {
		let fit = (width / config.layout_width as f64)
			.min(height / config.layout_height as f64)
			.max(0.01)
			* 0.9;
		Self {
			scene: AppmapScene::new(config, traces, TypeTable::default()),
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: fit,
			},
			pan: PanState::default(),
			width,
			height,
			last_frame_millis: None,
		}
	}

	/// Advances the scene to `now_millis` (a wall-clock timestamp).
	pub fn tick(&mut self, now_millis: f64) {
		let delta = self
			.last_frame_millis
			.map_or(0.0, |last| (now_millis - last).clamp(0.0, MAX_FRAME_MILLIS));
		self.last_frame_millis = Some(now_millis);
		self.scene.on_frame(delta);
	}

	/// Drops a world position onto the drawing plane, with perspective in 3D mode.
	/// Returns the plane point and the size factor for things drawn there.
	pub fn project(&self, position: Vec3) -> (f64, f64, f64) {
		let scale = match self.scene.config().layout_mode {
			LayoutMode::Planar => 1.0,
			LayoutMode::Volumetric => CAMERA_DISTANCE / (CAMERA_DISTANCE - position.z).max(1.0),
		};
		(
			(position.x * scale) as f64,
			(position.y * scale) as f64,
			scale as f64,
		)
	}

	pub fn zoom_at(&mut self, x: f64, y: f64, zoom_in: bool) {
		let factor = if zoom_in { 1.1 } else { 0.9 };
		let new_k = (self.transform.k * factor).clamp(0.01, 10.0);
		let ratio = new_k / self.transform.k;
		self.transform.x = x - (x - self.transform.x) * ratio;
		self.transform.y = y - (y - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	pub fn start_pan(&mut self, x: f64, y: f64) {
		self.pan = PanState {
			active: true,
			start_x: x,
			start_y: y,
			transform_start_x: self.transform.x,
			transform_start_y: self.transform.y,
		};
	}

	pub fn pan_to(&mut self, x: f64, y: f64) {
		if self.pan.active {
			self.transform.x = self.pan.transform_start_x + (x - self.pan.start_x);
			self.transform.y = self.pan.transform_start_y + (y - self.pan.start_y);
		}
	}

	pub fn end_pan(&mut self) {
		self.pan.active = false;
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}
}
