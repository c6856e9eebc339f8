use leptos::prelude::*;

use crate::components::insight_graph::{Entry, InsightGraph, Mode, Model, RecordId, RecordSource, Timestamp};

/// A few days of journaling to start from.
fn sample_records() -> RecordSource {
	let entry = |id: i64, mode: Mode, text: &str, model: Option<&str>| Entry {
		id: RecordId::Number(id),
		mode: Some(mode.as_str().to_owned()),
		text: Some(text.to_owned()),
		model: model.map(str::to_owned),
		ts: Some(Timestamp::Millis(id)),
	};
	let model = |name: &str, desc: &str| Model {
		name: name.to_owned(),
		desc: Some(desc.to_owned()),
		category: Some("Thinking".to_owned()),
	};

	RecordSource {
		entries: vec![
			entry(1_709_600_000_000, Mode::Observe, "Noticed my anxiety spikes before meetings", Some("Inversion")),
			entry(1_709_690_000_000, Mode::Pattern, "Poor sleep, then no focus the next day", None),
			entry(1_709_780_000_000, Mode::Question, "What decision am I avoiding out of fear?", Some("First Principles")),
			entry(1_709_870_000_000, Mode::Action, "Block the first hour for the one goal that matters", Some("Second-Order Thinking")),
			entry(1_709_960_000_000, Mode::Observe, "Energy dips at 3pm, every day this week", None),
		],
		models: vec![
			model("First Principles", "Break down to fundamental truths"),
			model("Inversion", "Ask what would guarantee failure"),
			model("Second-Order Thinking", "And then what? And then what?"),
		],
		notes: Vec::new(),
	}
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let records = RwSignal::new(sample_records());
	let (text, mode) = (RwSignal::new(String::new()), RwSignal::new(Mode::Observe));

	let add_entry = move |_| {
		let body = text.get_untracked();
		if body.trim().is_empty() {
			return;
		}
		let now = js_sys::Date::now() as i64;
		records.update(|r| {
			r.entries.push(Entry {
				id: RecordId::Number(now),
				mode: Some(mode.get_untracked().as_str().to_owned()),
				text: Some(body),
				model: None,
				ts: Some(Timestamp::Millis(now)),
			})
		});
		text.set(String::new());
	};

	view! {
		<div class="fullscreen-graph">
			<InsightGraph records=records fullscreen=true />
			<div class="graph-overlay">
				<h1>"Insight Graph"</h1>
				<p class="subtitle">"Drag nodes to reposition. Click to inspect. Scroll to zoom."</p>
				<div class="entry-form">
					<select on:change=move |ev| mode.set(Mode::parse(&event_target_value(&ev)).unwrap_or(Mode::Observe))>
						{Mode::ALL
							.into_iter()
							.map(|m| view! { <option value=m.as_str()>{m.to_string()}</option> })
							.collect_view()}
					</select>
					<input
						type="text"
						placeholder="What did you notice?"
						prop:value=move || text.get()
						on:input=move |ev| text.set(event_target_value(&ev))
					/>
					<button on:click=add_entry>"Add entry"</button>
				</div>
			</div>
		</div>
	}
}
