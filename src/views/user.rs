use crate::Route;
use crate::api::Api;
use crate::model::{StatusFlag, User};
use crate::views::account::AccountTab;
use crate::views::widgets::{Avatar, ProgressBar};
use dioxus::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Account,
    Holdings,
    Profile,
    Documents,
    Requests,
    Analytics,
}

impl Tab {
    const ALL: [Tab; 6] = [
        Tab::Account,
        Tab::Holdings,
        Tab::Profile,
        Tab::Documents,
        Tab::Requests,
        Tab::Analytics,
    ];

    fn label(&self) -> &'static str {
        match self {
            Tab::Account => "Account",
            Tab::Holdings => "Holdings",
            Tab::Profile => "Profile",
            Tab::Documents => "Documents",
            Tab::Requests => "Requests",
            Tab::Analytics => "Analytics",
        }
    }
}

/// Detail page of one user, at `/admin/users/view?id=`
#[component]
pub fn ViewUser(id: String) -> Element {
    // Keyed so a different id starts from a fresh page state
    rsx! {
        UserPage { key: "{id}", id: id.clone() }
    }
}

#[component]
fn UserPage(id: String) -> Element {
    let api = use_context::<Api>();
    let mut tab = use_signal(|| Tab::Account);
    let active_label = tab().label();

    let user_id = id.clone();
    let detail = use_resource(move || {
        let api = api.clone();
        let id = user_id.clone();
        async move {
            if id.is_empty() {
                return Ok(None);
            }
            api.user_detail(&id).await.map(Some)
        }
    });

    rsx! {
        div { id: "user-page",
            nav { class: "breadcrumb",
                Link { to: Route::AllUsers {}, "Users" }
                span { " > " }
                span { "View User" }
            }

            match &*detail.read() {
                None => rsx! {
                    p { class: "loading", "Loading user..." }
                },
                Some(Err(e)) => rsx! {
                    p { class: "error-message", "Error loading user: {e}" }
                },
                Some(Ok(None)) => rsx! {
                    p { "User not found." }
                },
                Some(Ok(Some(user))) => rsx! {
                    ProfileCard { user: user.clone() }
                    div { class: "tabs",
                        for entry in Tab::ALL {
                            button {
                                key: "{entry:?}",
                                class: if tab() == entry { "tab active" } else { "tab" },
                                onclick: move |_| tab.set(entry),
                                {entry.label()}
                            }
                        }
                    }
                    div { class: "tab-content",
                        if tab() == Tab::Account {
                            AccountTab { user_id: user.id.clone(), user_email: user.email.clone() }
                        } else {
                            p { class: "placeholder", "{active_label} content coming soon..." }
                        }
                    }
                },
            }
        }
    }
}

#[component]
fn ProfileCard(user: User) -> Element {
    let progress = user.onboarding_progress();
    let flags = user.flags();

    rsx! {
        div { class: "profile-card",
            Avatar { name: user.name.clone(), url: user.profile_image_url.clone() }
            div { class: "profile-details",
                h3 { "{user.name}" }
                p { "{user.email}" }
            }
            if user.awaiting_decision() {
                div { class: "decision",
                    button { class: "button-success", disabled: true, "Approve" }
                    button { class: "button-danger", disabled: true, "Decline" }
                }
            }
        }
        div { class: "onboarding",
            h4 { "Onboarding" }
            ProgressBar { percent: progress }
            ul { class: "flags",
                for (index, flag) in flags.into_iter().enumerate() {
                    FlagBadge { key: "{index}", flag }
                }
            }
        }
    }
}

#[component]
fn FlagBadge(flag: StatusFlag) -> Element {
    let tone = match (flag.tone, flag.value) {
        (Some(tone), _) => tone.css_class(),
        (None, Some(true)) => "tone-success",
        (None, Some(false)) => "tone-error",
        (None, None) => "tone-muted",
    };
    let mark = match flag.value {
        Some(true) => "✓",
        Some(false) => "✗",
        None => "?",
    };

    rsx! {
        li { class: "flag {tone}",
            span { class: "flag-mark", "{mark}" }
            " {flag.label}"
        }
    }
}
