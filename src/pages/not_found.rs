use leptos::prelude::*;

/// 404 page
#[component]
pub fn NotFound() -> impl IntoView {
	view! { <h1>"Nothing recorded at this address"</h1> }
}
