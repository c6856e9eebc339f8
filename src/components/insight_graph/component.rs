use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::{debug, error};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::config::SimulationConfig;
use super::palette::LEGEND;
use super::render;
use super::state::{InsightGraphState, Selection};
use super::types::{Graph, RecordSource};
use crate::error::{Error, Result};

const DEFAULT_WIDTH: f64 = 800.0;
const DEFAULT_HEIGHT: f64 = 400.0;

type Shared<T> = Rc<RefCell<Option<T>>>;

#[derive(Clone, Copy)]
struct CanvasSize {
	fullscreen: bool,
	width: Option<f64>,
	height: Option<f64>,
}

/// Canvas view of the record graph. Rebuilds the graph and restarts the
/// layout whenever `records` changes.
#[component]
pub fn InsightGraph(
	/// Record snapshot the graph is derived from.
	#[prop(into)]
	records: Signal<RecordSource>,
	/// Layout tuning; defaults apply when omitted.
	#[prop(optional)]
	config: Option<SimulationConfig>,
	/// Fill the window and follow its size.
	#[prop(default = false)]
	fullscreen: bool,
	/// Fixed width; otherwise the parent's width.
	#[prop(default = None)]
	width: Option<f64>,
	/// Fixed height; otherwise 400px.
	#[prop(default = None)]
	height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let selected = RwSignal::new(None::<Selection>);
	let state: Shared<InsightGraphState> = Rc::new(RefCell::new(None));
	let animate: Shared<Closure<dyn FnMut()>> = Rc::new(RefCell::new(None));
	let resize_cb: Shared<Closure<dyn FnMut()>> = Rc::new(RefCell::new(None));
	let config = config.unwrap_or_default();
	let size = CanvasSize {
		fullscreen,
		width,
		height,
	};
	let (state_init, animate_init, resize_cb_init) =
		(state.clone(), animate.clone(), resize_cb.clone());

	Effect::new(move |_| {
		let graph = records.with(RecordSource::build);
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let started = start(
			&canvas,
			graph,
			config.clone(),
			size,
			&state_init,
			&animate_init,
			&resize_cb_init,
		);
		match started {
			Ok(()) => selected.set(state_init.borrow().as_ref().and_then(InsightGraphState::selection)),
			Err(err) => error!("insight graph failed to start: {err}"),
		}
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = pointer_position(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_md.borrow_mut() {
			s.pointer_down(x, y);
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = pointer_position(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			s.pointer_move(x, y);
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |ev: MouseEvent| {
		let Some((x, y)) = pointer_position(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_mu.borrow_mut() {
			s.pointer_up(x, y);
			selected.set(s.selection());
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.pointer_leave();
		}
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = pointer_position(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			s.zoom(x, y, ev.delta_y());
		}
	};

	let legend = LEGEND
		.iter()
		.map(|(name, color)| view! { <span style=format!("color: {color}")>"● " {*name}</span> })
		.collect_view();

	view! {
		<div class="insight-graph">
			<canvas
				node_ref=canvas_ref
				class="insight-graph-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
				style="display: block; cursor: grab;"
			/>
			{move || {
				selected
					.get()
					.map(|sel| {
						view! {
							<div class="node-tooltip">
								<strong>{sel.label}</strong>
								{sel.full_text.map(|text| view! { <p>{text}</p> })}
								{sel.date.map(|date| view! { <span class="date">{date}</span> })}
							</div>
						}
					})
			}}
			<div class="graph-legend">{legend}</div>
		</div>
	}
}

/// First run: size the canvas, create the state and start the frame loop.
/// Later runs only swap the graph; the loop already running picks it up.
fn start(
	canvas: &HtmlCanvasElement,
	graph: Graph,
	config: SimulationConfig,
	size: CanvasSize,
	state: &Shared<InsightGraphState>,
	animate: &Shared<Closure<dyn FnMut()>>,
	resize_cb: &Shared<Closure<dyn FnMut()>>,
) -> Result<()> {
	if let Some(existing) = state.borrow_mut().as_mut() {
		existing.rebuild(graph);
		return Ok(());
	}
	if !canvas.is_connected() {
		return Err(Error::NoCanvas);
	}
	config.validate()?;

	let window = web_sys::window().ok_or(Error::NoWindow)?;
	let (w, h) = measure(size, &window, canvas)?;
	canvas.set_width(w as u32);
	canvas.set_height(h as u32);

	let ctx: CanvasRenderingContext2d = canvas
		.get_context("2d")?
		.ok_or(Error::NoContext)?
		.dyn_into()
		.map_err(|_| Error::NoContext)?;
	*state.borrow_mut() = Some(InsightGraphState::new(graph, config, w, h));

	if size.fullscreen {
		let (state_resize, canvas_resize) = (state.clone(), canvas.clone());
		*resize_cb.borrow_mut() = Some(Closure::new(move || {
			let Some((nw, nh)) = web_sys::window().and_then(|win| window_size(&win).ok()) else {
				return;
			};
			canvas_resize.set_width(nw as u32);
			canvas_resize.set_height(nh as u32);
			if let Some(ref mut s) = *state_resize.borrow_mut() {
				s.resize(nw, nh);
			}
		}));
		if let Some(ref cb) = *resize_cb.borrow() {
			window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref())?;
		}
	}

	let (state_anim, animate_inner, resize_inner, canvas_anim) =
		(state.clone(), animate.clone(), resize_cb.clone(), canvas.clone());
	*animate.borrow_mut() = Some(Closure::new(move || {
		// Unmounted: release the layout and stop scheduling frames.
		if !canvas_anim.is_connected() {
			if let Some(mut s) = state_anim.borrow_mut().take() {
				s.dispose();
				debug!("insight graph detached, tick loop stopped");
			}
			if let (Some(win), Some(cb)) = (web_sys::window(), resize_inner.borrow().as_ref()) {
				let _ = win.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
			return;
		}
		if let Some(ref mut s) = *state_anim.borrow_mut() {
			s.tick();
			render::render(s, &ctx);
		}
		if let (Some(win), Some(cb)) = (web_sys::window(), animate_inner.borrow().as_ref()) {
			let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	}));
	if let Some(ref cb) = *animate.borrow() {
		window.request_animation_frame(cb.as_ref().unchecked_ref())?;
	}
	Ok(())
}

fn measure(size: CanvasSize, window: &Window, canvas: &HtmlCanvasElement) -> Result<(f64, f64)> {
	if size.fullscreen {
		return window_size(window);
	}
	let parent_width = canvas
		.parent_element()
		.map(|p| p.client_width() as f64)
		.filter(|w| *w > 0.0);
	Ok((
		size.width.or(parent_width).unwrap_or(DEFAULT_WIDTH),
		size.height.unwrap_or(DEFAULT_HEIGHT),
	))
}

fn window_size(window: &Window) -> Result<(f64, f64)> {
	let dimension = |value: JsValue| value.as_f64().ok_or_else(|| Error::Js("window size is not a number".into()));
	Ok((dimension(window.inner_width()?)?, dimension(window.inner_height()?)?))
}

fn pointer_position(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}
