use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use crate::appmap::{Shape, Walker};

use super::state::{COLORS, MapState};

const WALKER_RADIUS: f64 = 50.0;
const PARTICLE_RADIUS: f64 = 22.0;

pub fn render(state: &MapState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str("#1a1a2e");
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	draw_edges(state, ctx);
	draw_nodes(state, ctx);
	for walker in state.scene.walkers() {
		draw_trail(state, walker, ctx);
		draw_walker(state, walker, ctx);
	}
	ctx.restore();
	draw_info(state, ctx);
}

fn draw_info(state: &MapState, ctx: &CanvasRenderingContext2d) {
	let info = state.scene.info();
	ctx.set_font("12px sans-serif");
	ctx.set_fill_style_str("rgba(255, 255, 255, 0.7)");
	let _ = ctx.fill_text(&format!("Nodes {}", info.node_count), 12.0, 20.0);
	let _ = ctx.fill_text(&format!("Edges {}", info.edge_count), 12.0, 36.0);
	if info.calculating {
		ctx.set_fill_style_str("#ff4d4d");
		let _ = ctx.fill_text("Calculating layout...", 12.0, 52.0);
	}
}

fn draw_edges(state: &MapState, ctx: &CanvasRenderingContext2d) {
	let graph = state.scene.graph();
	ctx.set_stroke_style_str("rgba(153, 255, 204, 0.9)");
	ctx.set_line_width(1.5 / state.transform.k);

	for edge in graph.edges() {
		let (Some(from), Some(to)) = (graph.position(edge.from), graph.position(edge.to)) else {
			continue;
		};
		let ((x1, y1, _), (x2, y2, _)) = (state.project(from), state.project(to));
		ctx.begin_path();
		ctx.move_to(x1, y1);
		ctx.line_to(x2, y2);
		ctx.stroke();
	}
}

fn draw_nodes(state: &MapState, ctx: &CanvasRenderingContext2d) {
	let k = state.transform.k;
	let show_labels = state.scene.config().show_labels;

	for (index, node) in state.scene.graph().nodes().iter().enumerate() {
		let Some(position) = node.position else {
			continue;
		};
		let (x, y, depth) = state.project(position);
		let half = node.visual.size as f64 * depth / 2.0;
		let color = node
			.visual
			.color
			.as_deref()
			.unwrap_or(COLORS[index % COLORS.len()]);

		ctx.set_global_alpha(0.8);
		ctx.set_fill_style_str(color);
		ctx.begin_path();
		match &node.visual.shape {
			Shape::Cube => ctx.rect(x - half, y - half, half * 2.0, half * 2.0),
			Shape::Model(_) => {
				// database drum: a body with a rim
				ctx.rect(x - half, y - half * 0.6, half * 2.0, half * 1.2);
				let _ = ctx.ellipse(x, y - half * 0.6, half, half * 0.35, 0.0, 0.0, 2.0 * PI);
				let _ = ctx.ellipse(x, y + half * 0.6, half, half * 0.35, 0.0, 0.0, PI);
			}
		}
		ctx.fill();
		ctx.set_global_alpha(1.0);

		if show_labels {
			ctx.set_fill_style_str("rgba(255, 255, 255, 0.8)");
			ctx.set_font(&format!("{}px sans-serif", 12.0 / k.max(0.05)));
			let _ = ctx.fill_text(&node.title, x + half + 6.0 / k, y - half);
		}
	}
}

fn draw_trail(state: &MapState, walker: &Walker, ctx: &CanvasRenderingContext2d) {
	let trail = walker.trail();
	let count = trail.len();
	if count == 0 {
		return;
	}

	let _ = ctx.set_global_composite_operation("lighter");
	ctx.set_fill_style_str(walker.color());
	for (rank, particle) in trail.iter_by_recency() {
		let (x, y, depth) = state.project(*particle);
		// alpha rises towards the walker
		ctx.set_global_alpha(0.5 * (rank + 1).min(count) as f64 / count as f64);
		ctx.begin_path();
		let _ = ctx.arc(x, y, PARTICLE_RADIUS * depth, 0.0, 2.0 * PI);
		ctx.fill();
	}
	ctx.set_global_alpha(1.0);
	let _ = ctx.set_global_composite_operation("source-over");
}

fn draw_walker(state: &MapState, walker: &Walker, ctx: &CanvasRenderingContext2d) {
	let Some(position) = walker.position() else {
		return;
	};
	let (x, y, depth) = state.project(position);
	let radius = WALKER_RADIUS * depth;

	if let Ok(gradient) = ctx.create_radial_gradient(x, y, radius * 0.3, x, y, radius * 2.2) {
		let _ = gradient.add_color_stop(0.0, "rgba(255, 255, 255, 0.35)");
		let _ = gradient.add_color_stop(1.0, "rgba(255, 255, 255, 0)");
		ctx.begin_path();
		let _ = ctx.arc(x, y, radius * 2.2, 0.0, 2.0 * PI);
		#[allow(deprecated)]
		ctx.set_fill_style(&gradient);
		ctx.fill();
	}

	ctx.begin_path();
	let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
	ctx.set_fill_style_str(walker.color());
	ctx.fill();
}
