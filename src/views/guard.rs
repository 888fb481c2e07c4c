use crate::Route;
use crate::state::UserContext;
use dioxus::prelude::*;

/// Renders the nested route only once a stored token was found. The check
/// runs on the client, after mount; without a token the user is sent to the
/// sign in page.
#[component]
pub fn Protected() -> Element {
    let session = use_context::<UserContext>();
    let navigator = use_navigator();
    let mut allowed = use_signal(|| false);

    use_effect(move || {
        if session.has_token() {
            allowed.set(true);
        } else {
            log::info!("No token stored, redirecting to sign in");
            navigator.replace(Route::SignIn {
                token: String::new(),
            });
        }
    });

    if !allowed() {
        return rsx! {
            p { class: "loading", "Loading..." }
        };
    }

    rsx! {
        Outlet::<Route> {}
    }
}
