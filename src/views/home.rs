use crate::Route;
use crate::state::UserContext;
use crate::views::widgets::Avatar;
use dioxus::prelude::*;

#[component]
pub fn Home() -> Element {
    let session = use_context::<UserContext>();
    let navigator = use_navigator();
    let loading = session.loading;
    let user = session.user;

    let on_logout = move |_| {
        session.logout();
        navigator.replace(Route::SignIn {
            token: String::new(),
        });
    };

    rsx! {
        div { id: "home-page",
            h2 { "Profile" }
            match &*user.read() {
                Some(current) => rsx! {
                    div { class: "profile-card",
                        Avatar {
                            name: current.name.clone(),
                            url: current.profile_image_url.clone(),
                        }
                        div { class: "profile-details",
                            h3 { "{current.name}" }
                            p { "{current.email}" }
                            if current.admin {
                                span { class: "badge badge-info", "Administrator" }
                            }
                        }
                        button { class: "button-secondary", onclick: on_logout, "Log out" }
                    }
                },
                None if loading() => rsx! {
                    p { class: "loading", "Loading profile..." }
                },
                None => rsx! {
                    div { class: "profile-card",
                        p { "Could not load your profile." }
                        button { class: "button-secondary", onclick: on_logout, "Log out" }
                    }
                },
            }
        }
    }
}
