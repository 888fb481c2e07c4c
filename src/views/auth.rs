use std::time::Duration;

use crate::Route;
use crate::api::Api;
use crate::error::FormError;
use crate::state::UserContext;
use crate::utils::sleep;
use dioxus::prelude::*;

const RESET_SENT: &str = "A reset link has been sent to your email if it exists in our system.";
const RESET_DONE: &str = "Password reset successfully. You can now sign in.";
const SIGNIN_REDIRECT_DELAY: Duration = Duration::from_secs(2);

/// Request/response status of an auth form
#[derive(Debug, Clone, PartialEq, Default)]
enum Outcome {
    #[default]
    Idle,
    Pending,
    Done(&'static str),
    Failed(String),
}

fn check_passwords(password: &str, repeat: &str) -> Result<(), FormError> {
    if password != repeat {
        return Err(FormError::PasswordMismatch);
    }
    Ok(())
}

/// Token sign in. A `?token=` in the link is stored right away.
#[component]
pub fn SignIn(token: String) -> Element {
    let session = use_context::<UserContext>();
    let navigator = use_navigator();
    let mut entered = use_signal(String::new);
    let mut remember = use_signal(|| true);

    let link_session = session.clone();
    use_effect(move || {
        if !token.is_empty() {
            log::info!("Signing in with token from link");
            link_session.sign_in(&token, true);
            navigator.replace(Route::Home {});
        }
    });

    let on_submit = move |evt: FormEvent| {
        evt.prevent_default();
        let token = entered.read().trim().to_string();
        if token.is_empty() {
            return;
        }
        session.sign_in(&token, remember());
        navigator.replace(Route::Home {});
    };

    rsx! {
        div { id: "auth-page",
            h1 { "Sign In" }
            form { class: "auth-form", onsubmit: on_submit,
                label { class: "field",
                    "Access token"
                    input {
                        r#type: "password",
                        value: "{entered}",
                        oninput: move |evt: FormEvent| entered.set(evt.value()),
                    }
                }
                label { class: "checkbox",
                    input {
                        r#type: "checkbox",
                        checked: remember(),
                        onchange: move |evt: FormEvent| remember.set(evt.checked()),
                    }
                    "Keep me logged in"
                }
                button { r#type: "submit", class: "button-primary", "Sign in" }
            }
            Link { to: Route::ForgotPassword {}, "Forgot password?" }
        }
    }
}

#[component]
pub fn ForgotPassword() -> Element {
    let api = use_context::<Api>();
    let mut email = use_signal(String::new);
    let mut outcome = use_signal(Outcome::default);

    let on_submit = move |evt: FormEvent| {
        evt.prevent_default();
        let api = api.clone();
        async move {
            outcome.set(Outcome::Pending);
            let address = email.read().trim().to_string();
            match api.request_password_reset(&address).await {
                Ok(()) => outcome.set(Outcome::Done(RESET_SENT)),
                Err(message) => outcome.set(Outcome::Failed(message)),
            }
        }
    };

    let pending = outcome() == Outcome::Pending;

    rsx! {
        div { id: "auth-page",
            h1 { "Forgot Password" }
            form { class: "auth-form", onsubmit: on_submit,
                label { class: "field",
                    "Email"
                    input {
                        r#type: "email",
                        required: true,
                        value: "{email}",
                        oninput: move |evt: FormEvent| email.set(evt.value()),
                    }
                }
                OutcomeLine { outcome: outcome() }
                button { r#type: "submit", class: "button-primary", disabled: pending,
                    if pending { "Sending..." } else { "Send Reset Link" }
                }
            }
            Link {
                to: Route::SignIn {
                    token: String::new(),
                },
                "Back to sign in"
            }
        }
    }
}

/// Sets a new password with the token from the reset link
#[component]
pub fn ResetPassword(token: String) -> Element {
    let api = use_context::<Api>();
    let navigator = use_navigator();
    let mut password = use_signal(String::new);
    let mut repeat = use_signal(String::new);
    let mut outcome = use_signal(Outcome::default);

    let on_submit = move |evt: FormEvent| {
        evt.prevent_default();
        let api = api.clone();
        let token = token.clone();
        async move {
            let new_password = password.read().clone();
            if let Err(e) = check_passwords(&new_password, &repeat.read()) {
                outcome.set(Outcome::Failed(e.to_string()));
                return;
            }
            outcome.set(Outcome::Pending);
            match api.reset_password(&token, &new_password).await {
                Ok(()) => {
                    outcome.set(Outcome::Done(RESET_DONE));
                    sleep(SIGNIN_REDIRECT_DELAY).await;
                    navigator.push(Route::SignIn {
                        token: String::new(),
                    });
                }
                Err(message) => outcome.set(Outcome::Failed(message)),
            }
        }
    };

    let pending = outcome() == Outcome::Pending;

    rsx! {
        div { id: "auth-page",
            h1 { "Reset Password" }
            form { class: "auth-form", onsubmit: on_submit,
                label { class: "field",
                    "New password"
                    input {
                        r#type: "password",
                        required: true,
                        value: "{password}",
                        oninput: move |evt: FormEvent| password.set(evt.value()),
                    }
                }
                label { class: "field",
                    "Repeat password"
                    input {
                        r#type: "password",
                        required: true,
                        value: "{repeat}",
                        oninput: move |evt: FormEvent| repeat.set(evt.value()),
                    }
                }
                OutcomeLine { outcome: outcome() }
                button { r#type: "submit", class: "button-primary", disabled: pending,
                    if pending { "Resetting..." } else { "Reset Password" }
                }
            }
        }
    }
}

#[component]
fn OutcomeLine(outcome: Outcome) -> Element {
    match outcome {
        Outcome::Done(message) => rsx! {
            div { class: "form-success", "{message}" }
        },
        Outcome::Failed(message) => rsx! {
            div { class: "form-error", "{message}" }
        },
        Outcome::Idle | Outcome::Pending => rsx! {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatched_passwords_rejected() {
        assert_eq!(check_passwords("secret1", "secret1"), Ok(()));
        assert_eq!(
            check_passwords("secret1", "secret2"),
            Err(FormError::PasswordMismatch)
        );
        assert_eq!(
            FormError::PasswordMismatch.to_string(),
            "Passwords do not match."
        );
    }
}
