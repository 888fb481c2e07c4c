use crate::Route;
use crate::state::UserContext;
use dioxus::prelude::*;

#[component]
pub fn Navbar() -> Element {
    let session = use_context::<UserContext>();
    let signed_in = session.user.read().as_ref().map(|user| user.email.clone());

    rsx! {
        div { id: "navbar",
            Link { to: Route::Home {}, "Home" }
            h1 { "Fund Admin" }
            Link { to: Route::AllUsers {}, "Users" }
            if let Some(email) = signed_in {
                span { class: "navbar-user", "{email}" }
            }
        }
        Outlet::<Route> {}
    }
}
