use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::palette::{self, BACKGROUND, LINK_COLOR, LINK_HIGHLIGHT, NODE_STROKE};
use super::state::InsightGraphState;
use super::types::NodeGroup;

const DIMMED_ALPHA: f64 = 0.25;

pub fn render(state: &InsightGraphState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	draw_links(state, ctx);
	draw_nodes(state, ctx);
	ctx.restore();
}

fn draw_links(state: &InsightGraphState, ctx: &CanvasRenderingContext2d) {
	let (bodies, k) = (state.simulation.bodies(), state.transform.k);
	let has_highlight = state.has_highlight();

	for link in state.graph.links() {
		let (Some(s), Some(t)) = (
			state.simulation.index_of(&link.source),
			state.simulation.index_of(&link.target),
		) else {
			continue;
		};
		let (a, b) = (&bodies[s], &bodies[t]);
		let lit = state.is_highlighted(&link.source) && state.is_highlighted(&link.target);

		ctx.set_global_alpha(if has_highlight && !lit { DIMMED_ALPHA } else { 1.0 });
		ctx.set_stroke_style_str(if lit { LINK_HIGHLIGHT } else { LINK_COLOR });
		ctx.set_line_width(link.strength.max(0.0).sqrt() / k.max(0.5));
		ctx.begin_path();
		ctx.move_to(a.x, a.y);
		ctx.line_to(b.x, b.y);
		ctx.stroke();
	}
	ctx.set_global_alpha(1.0);
}

fn draw_nodes(state: &InsightGraphState, ctx: &CanvasRenderingContext2d) {
	let k = state.transform.k;
	let has_highlight = state.has_highlight();
	let selected = state.controller.selected();

	for (node, body) in state.graph.nodes().iter().zip(state.simulation.bodies()) {
		let (x, y, radius) = (body.x, body.y, body.radius);
		let lit = state.is_highlighted(&node.key);
		let color = palette::node_color(node.group, node.mode);

		if selected == Some(node.key.as_str()) {
			draw_glow(ctx, x, y, radius);
		}

		ctx.set_global_alpha(if has_highlight && !lit { DIMMED_ALPHA } else { 1.0 });
		ctx.begin_path();
		let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(color);
		ctx.fill();
		ctx.set_stroke_style_str(NODE_STROKE);
		ctx.set_line_width(1.5 / k.max(0.5));
		ctx.stroke();

		// Entry labels only show up around the selection to keep the canvas legible.
		if node.group != NodeGroup::Entry || lit {
			ctx.set_fill_style_str("rgba(255, 255, 255, 0.85)");
			ctx.set_font(&format!("{}px sans-serif", 10.0 / k.max(0.5)));
			let _ = ctx.fill_text(&node.label, x + radius + 3.0, y + 3.0);
		}
	}
	ctx.set_global_alpha(1.0);
}

fn draw_glow(ctx: &CanvasRenderingContext2d, x: f64, y: f64, radius: f64) {
	let glow_radius = radius * 2.2;
	let Ok(gradient) = ctx.create_radial_gradient(x, y, radius * 0.3, x, y, glow_radius) else {
		return;
	};
	let stops: [(f32, &str); 3] = [
		(0.0, "rgba(255, 255, 255, 0.35)"),
		(0.6, "rgba(100, 255, 218, 0.12)"),
		(1.0, "rgba(255, 255, 255, 0)"),
	];
	if stops
		.iter()
		.any(|(offset, color)| gradient.add_color_stop(*offset, color).is_err())
	{
		return;
	}
	ctx.begin_path();
	let _ = ctx.arc(x, y, glow_radius, 0.0, 2.0 * PI);
	#[allow(deprecated)]
	ctx.set_fill_style(&gradient);
	ctx.fill();
}
