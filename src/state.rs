//! Session state shared through the component tree
//!
//! [`UserContext`] is provided once by the root component. It owns the
//! current admin identity and the token tiers it was resolved from.

use std::rc::Rc;

use dioxus::prelude::*;

use crate::api::{AdminApi, Api};
use crate::model::CurrentUser;
use crate::storage::{TokenStorage, clear_token, read_token, store_token};

#[derive(Clone)]
pub struct UserContext {
    api: Api,
    storage: Rc<dyn TokenStorage>,
    pub user: Signal<Option<CurrentUser>>,
    pub loading: Signal<bool>,
}

impl UserContext {
    /// Must be called from a component, usually through `use_context_provider`
    pub fn new(api: Api, storage: Rc<dyn TokenStorage>) -> Self {
        UserContext {
            api,
            storage,
            user: Signal::new(None),
            loading: Signal::new(true),
        }
    }

    pub fn has_token(&self) -> bool {
        read_token(self.storage.as_ref()).is_some()
    }

    /// Re-resolves the current user in the background
    pub fn refresh(&self) {
        let this = self.clone();
        spawn(async move {
            this.reload().await;
        });
    }

    pub async fn reload(&self) {
        let mut loading = self.loading;
        let mut user = self.user;
        loading.set(true);
        let current = load_current_user(&*self.api, self.storage.as_ref()).await;
        user.set(current);
        loading.set(false);
    }

    pub fn sign_in(&self, token: &str, remember: bool) {
        store_token(self.storage.as_ref(), token, remember);
        self.refresh();
    }

    pub fn logout(&self) {
        clear_token(self.storage.as_ref());
        let mut user = self.user;
        user.set(None);
        log::info!("Signed out");
    }
}

/// Who is signed in. No token means nobody, without asking the server; a
/// failed lookup also means nobody.
pub async fn load_current_user(
    api: &dyn AdminApi,
    storage: &dyn TokenStorage,
) -> Option<CurrentUser> {
    if read_token(storage).is_none() {
        log::debug!("No stored token, skipping user lookup");
        return None;
    }
    match api.current_user().await {
        Ok(user) => {
            log::info!("Signed in as {}", user.email);
            Some(user)
        }
        Err(e) => {
            log::warn!("Failed to resolve current user: {}", e);
            None
        }
    }
}
