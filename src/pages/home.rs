use leptos::prelude::*;

use crate::appmap::{AppmapConfig, DEMO_TRACES, parse_traces};
use crate::components::transaction_map::TransactionMapCanvas;

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let config = AppmapConfig {
		show_labels: true,
		..AppmapConfig::default()
	};

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>
			{move || {
				let config = config.clone();
				parse_traces(DEMO_TRACES).map(|traces| {
					let traces = Signal::derive(move || traces.clone());
					view! {
						<div class="fullscreen-graph">
							<TransactionMapCanvas traces=traces config=config fullscreen=true />
							<div class="graph-overlay">
								<h1>"Transaction Map"</h1>
								<p class="subtitle">
									"Each dot retraces a recorded transaction. Scroll to zoom. Drag to pan."
								</p>
							</div>
						</div>
					}
				})
			}}
		</ErrorBoundary>
	}
}
