use std::rc::Rc;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{
    AdminApi, HoldingsQuery, ManualMovementRequest, MovementQuery, TransferRequest,
    UserHoldingsQuery, UserListQuery, candidates_from,
};
use crate::config::Config;
use crate::error::ApiError;
use crate::model::{
    CurrentUser, Holding, Movement, MovementType, Page, User, UserHolding, UserSummary,
};
use crate::storage::{TokenStorage, read_token};

const NETWORK_ERROR: &str = "Network error. Please try again.";

/// reqwest implementation of [`AdminApi`]
pub struct ApiClient {
    config: Config,
    http: reqwest::Client,
    storage: Rc<dyn TokenStorage>,
}

impl ApiClient {
    pub fn new(config: Config, storage: Rc<dyn TokenStorage>) -> Self {
        ApiClient {
            config,
            http: reqwest::Client::new(),
            storage,
        }
    }

    /// Request carrying the stored bearer token. Fails before any I/O when
    /// there is no token.
    fn authorized(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let token = read_token(self.storage.as_ref()).ok_or(ApiError::MissingToken)?;
        Ok(self.anonymous(method, path).bearer_auth(token))
    }

    fn anonymous(&self, method: Method, path: &str) -> RequestBuilder {
        log::debug!("{} {}", method, path);
        self.http.request(method, self.config.endpoint(path))
    }

    async fn execute(&self, builder: RequestBuilder, fallback: &str) -> Result<reqwest::Response, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let err = ApiError::rejected(status.as_u16(), status.canonical_reason(), &body, fallback);
        log::warn!("Request failed with {}: {}", status, err);
        Err(err)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
        fallback: &str,
    ) -> Result<T, ApiError> {
        let builder = self.authorized(Method::GET, path)?.query(query);
        let response = self.execute(builder, fallback).await?;
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Lists come back as `null` when empty on some endpoints
    async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
        fallback: &str,
    ) -> Result<Vec<T>, ApiError> {
        let list: Option<Vec<T>> = self.get_json(path, query, fallback).await?;
        Ok(list.unwrap_or_default())
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B, fallback: &str) -> Result<(), ApiError> {
        let builder = self.authorized(Method::POST, path)?.json(body);
        self.execute(builder, fallback).await?;
        Ok(())
    }

    async fn post_anonymous(&self, path: &str, body: serde_json::Value) -> Result<(bool, serde_json::Value), ApiError> {
        let response = self.anonymous(Method::POST, path).json(&body).send().await?;
        let ok = response.status().is_success();
        let text = response.text().await?;
        let value = serde_json::from_str(&text).unwrap_or(serde_json::Value::Null);
        Ok((ok, value))
    }
}

/// A reset link request only counts when the server answers 2xx with a `url`
fn reset_request_outcome(ok: bool, body: &serde_json::Value) -> Result<(), String> {
    if ok && body.get("url").is_some_and(|u| !u.is_null()) {
        return Ok(());
    }
    Err(body
        .get("error")
        .and_then(|e| e.as_str())
        .filter(|e| !e.is_empty())
        .unwrap_or("Failed to send reset link.")
        .to_string())
}

fn reset_outcome(body: &serde_json::Value) -> Result<(), String> {
    if body.get("success").and_then(|s| s.as_bool()) == Some(true) {
        return Ok(());
    }
    Err(body
        .get("message")
        .and_then(|m| m.as_str())
        .filter(|m| !m.is_empty())
        .unwrap_or("Failed to reset password.")
        .to_string())
}

#[async_trait(?Send)]
impl AdminApi for ApiClient {
    async fn current_user(&self) -> Result<CurrentUser, ApiError> {
        self.get_json("/users/me", &[], "Failed to fetch user").await
    }

    async fn list_users(&self, query: &UserListQuery) -> Result<Page<User>, ApiError> {
        self.get_json("/admin/users", &query.pairs(), "Failed to fetch users")
            .await
    }

    async fn search_users(&self, search: &str) -> Result<Vec<UserSummary>, ApiError> {
        let value: serde_json::Value = self
            .get_json("/admin/users", &[("search", search.to_string())], "Failed to search users")
            .await?;
        Ok(candidates_from(value))
    }

    async fn user_detail(&self, id: &str) -> Result<User, ApiError> {
        self.get_json("/admin/users", &[("id", id.to_string())], "Failed to fetch user")
            .await
    }

    async fn movements(&self, query: &MovementQuery) -> Result<Page<Movement>, ApiError> {
        self.get_json(
            "/admin/account-movements/by-user",
            &query.pairs(),
            "Failed to fetch movements",
        )
        .await
    }

    async fn user_holdings(&self, query: &UserHoldingsQuery) -> Result<Vec<UserHolding>, ApiError> {
        self.get_list(
            "/admin/account-movements/user-holdings",
            &query.pairs(),
            "Failed to fetch holdings",
        )
        .await
    }

    async fn movement_types(&self) -> Result<Vec<MovementType>, ApiError> {
        self.get_list(
            "/admin/account-movements/movement-types",
            &[],
            "Failed to fetch movement types",
        )
        .await
    }

    async fn holdings(&self, query: &HoldingsQuery) -> Result<Vec<Holding>, ApiError> {
        self.get_list(
            "/admin/account-movements/holdings",
            &query.pairs(),
            "Failed to fetch assets",
        )
        .await
    }

    async fn manual_deposit(&self, body: &ManualMovementRequest) -> Result<(), ApiError> {
        self.post(
            "/admin/account-movements/manual-deposit",
            body,
            "Failed to create the deposit",
        )
        .await
    }

    async fn manual_withdraw(&self, body: &ManualMovementRequest) -> Result<(), ApiError> {
        self.post(
            "/admin/account-movements/manual-withdraw",
            body,
            "Failed to create the withdrawal",
        )
        .await
    }

    async fn transfer(&self, body: &TransferRequest) -> Result<(), ApiError> {
        self.post(
            "/admin/account-movements/transfer",
            body,
            "Failed to complete the transfer",
        )
        .await
    }

    async fn request_password_reset(&self, email: &str) -> Result<(), String> {
        let (ok, body) = self
            .post_anonymous(
                "/auth/request-password-reset",
                serde_json::json!({ "email": email }),
            )
            .await
            .map_err(|e| {
                log::error!("Password reset request failed: {}", e);
                NETWORK_ERROR.to_string()
            })?;
        reset_request_outcome(ok, &body)
    }

    async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), String> {
        let (_, body) = self
            .post_anonymous(
                "/auth/reset-password",
                serde_json::json!({ "token": token, "newPassword": new_password }),
            )
            .await
            .map_err(|e| {
                log::error!("Password reset failed: {}", e);
                NETWORK_ERROR.to_string()
            })?;
        reset_outcome(&body)
    }
}
