//! Admin API surface
//!
//! Views never talk HTTP directly: they go through [`AdminApi`], which the
//! reqwest-backed [`ApiClient`] implements. Query builders live here so the
//! exact parameters sent for each screen can be checked without a server.

mod client;

pub use client::ApiClient;

use std::ops::Deref;
use std::rc::Rc;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::ApiError;
use crate::listing::{SortOrder, UserSortKey};
use crate::model::{
    CurrentUser, Holding, Movement, MovementType, Page, User, UserHolding, UserSummary,
};

pub type QueryPairs = Vec<(&'static str, String)>;

#[async_trait(?Send)]
pub trait AdminApi {
    /// `GET /users/me`
    async fn current_user(&self) -> Result<CurrentUser, ApiError>;
    /// `GET /admin/users` with paging, sorting and search
    async fn list_users(&self, query: &UserListQuery) -> Result<Page<User>, ApiError>;
    /// `GET /admin/users?search=` used as a typeahead
    async fn search_users(&self, search: &str) -> Result<Vec<UserSummary>, ApiError>;
    /// `GET /admin/users?id=`
    async fn user_detail(&self, id: &str) -> Result<User, ApiError>;
    async fn movements(&self, query: &MovementQuery) -> Result<Page<Movement>, ApiError>;
    async fn user_holdings(&self, query: &UserHoldingsQuery) -> Result<Vec<UserHolding>, ApiError>;
    async fn movement_types(&self) -> Result<Vec<MovementType>, ApiError>;
    async fn holdings(&self, query: &HoldingsQuery) -> Result<Vec<Holding>, ApiError>;
    async fn manual_deposit(&self, body: &ManualMovementRequest) -> Result<(), ApiError>;
    async fn manual_withdraw(&self, body: &ManualMovementRequest) -> Result<(), ApiError>;
    async fn transfer(&self, body: &TransferRequest) -> Result<(), ApiError>;
    /// Unauthenticated. Resolves to the failure message on refusal.
    async fn request_password_reset(&self, email: &str) -> Result<(), String>;
    /// Unauthenticated. Resolves to the failure message on refusal.
    async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), String>;
}

/// Shared handle put in the component context
#[derive(Clone)]
pub struct Api(Rc<dyn AdminApi>);

impl Api {
    pub fn new(api: Rc<dyn AdminApi>) -> Self {
        Api(api)
    }
}

impl Deref for Api {
    type Target = dyn AdminApi;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserListQuery {
    pub page: u32,
    pub limit: u32,
    pub sort_key: UserSortKey,
    pub sort_order: SortOrder,
    pub search: String,
}

impl UserListQuery {
    pub fn pairs(&self) -> QueryPairs {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
            ("sortKey", self.sort_key.as_param().to_string()),
            ("sortOrder", self.sort_order.as_param().to_string()),
        ];
        if !self.search.is_empty() {
            pairs.push(("search", self.search.clone()));
        }
        pairs
    }
}

/// Ledger query for one user. Empty id lists mean "no filter".
#[derive(Debug, Clone, PartialEq)]
pub struct MovementQuery {
    pub user_id: String,
    pub page: u32,
    pub account_holding_ids: Vec<String>,
    pub movement_type_ids: Vec<String>,
}

impl MovementQuery {
    pub fn pairs(&self) -> QueryPairs {
        let mut pairs = vec![
            ("userId", self.user_id.clone()),
            ("displayHiddenHoldings", "true".to_string()),
            ("showInactiveHoldings", "true".to_string()),
            ("page", self.page.to_string()),
        ];
        for id in &self.account_holding_ids {
            pairs.push(("accountHoldingIds", id.clone()));
        }
        for id in &self.movement_type_ids {
            pairs.push(("movementTypeIds", id.clone()));
        }
        pairs
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct UserHoldingsQuery {
    pub user_id: String,
    pub with_balances: bool,
    pub only_visible: bool,
    pub only_with_balance: bool,
    pub has_external_pair: Option<bool>,
    pub subtract_pending_requests: bool,
    pub holding_id: Option<i64>,
}

impl UserHoldingsQuery {
    /// Every balance line of the user, for the ledger filters
    pub fn all(user_id: &str) -> Self {
        UserHoldingsQuery {
            user_id: user_id.to_string(),
            with_balances: true,
            ..Default::default()
        }
    }

    fn spendable(user_id: &str, has_external_pair: bool) -> Self {
        UserHoldingsQuery {
            user_id: user_id.to_string(),
            with_balances: true,
            only_visible: true,
            only_with_balance: true,
            has_external_pair: Some(has_external_pair),
            subtract_pending_requests: true,
            holding_id: None,
        }
    }

    /// Visible holdings with an external pair and a positive balance net of pending requests
    pub fn withdrawable(user_id: &str) -> Self {
        Self::spendable(user_id, true)
    }

    /// Visible internal holdings with a positive balance net of pending requests
    pub fn transferable(user_id: &str) -> Self {
        Self::spendable(user_id, false)
    }

    /// Current balance of a single holding
    pub fn balance_of(user_id: &str, holding_id: i64) -> Self {
        UserHoldingsQuery {
            user_id: user_id.to_string(),
            with_balances: true,
            holding_id: Some(holding_id),
            ..Default::default()
        }
    }

    pub fn pairs(&self) -> QueryPairs {
        let mut pairs = vec![("userId", self.user_id.clone())];
        if self.only_visible {
            pairs.push(("onlyVisible", "true".to_string()));
        }
        if self.only_with_balance {
            pairs.push(("onlyWithBalance", "true".to_string()));
        }
        if let Some(external) = self.has_external_pair {
            pairs.push(("hasExternalPair", external.to_string()));
        }
        if self.with_balances {
            pairs.push(("withBalances", "true".to_string()));
        }
        if self.subtract_pending_requests {
            pairs.push(("subtractPendingRequests", "true".to_string()));
        }
        if let Some(id) = self.holding_id {
            pairs.push(("holdingId", id.to_string()));
        }
        pairs
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct HoldingsQuery {
    pub has_external_pair: Option<bool>,
    pub holding_id: Option<i64>,
}

impl HoldingsQuery {
    /// Assets that can be deposited from outside
    pub fn externally_paired() -> Self {
        HoldingsQuery {
            has_external_pair: Some(true),
            holding_id: None,
        }
    }

    /// Price lookup for one asset
    pub fn single(holding_id: i64) -> Self {
        HoldingsQuery {
            has_external_pair: None,
            holding_id: Some(holding_id),
        }
    }

    pub fn pairs(&self) -> QueryPairs {
        let mut pairs = Vec::new();
        if let Some(external) = self.has_external_pair {
            pairs.push(("hasExternalPair", external.to_string()));
        }
        if let Some(id) = self.holding_id {
            pairs.push(("holding_id", id.to_string()));
        }
        pairs
    }
}

/// Body of `manual-deposit` and `manual-withdraw`
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ManualMovementRequest {
    pub user_id: String,
    pub amount: f64,
    pub movement_type_id: i64,
    pub tx_hash: String,
    pub notes: String,
    pub asset_provided_id: i64,
    #[serde(rename = "price_usd")]
    pub price_usd: f64,
}

/// Body of `transfer`
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub sender_user_id: String,
    pub receiver_user_id: String,
    pub holding_id: i64,
    pub amount: f64,
    #[serde(rename = "price_usd")]
    pub price_usd: f64,
    pub sender_email: String,
    pub receiver_email: String,
    pub tx_hash: String,
    pub notes: String,
}

/// Typeahead results: `data` when it is an array of users, otherwise nothing
pub fn candidates_from(value: serde_json::Value) -> Vec<UserSummary> {
    match value.get("data") {
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .filter_map(|item| serde_json::from_value(item.clone()).ok())
            .collect(),
        _ => Vec::new(),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_list_pairs() {
        let query = UserListQuery {
            page: 2,
            limit: 10,
            sort_key: UserSortKey::Email,
            sort_order: SortOrder::Desc,
            search: String::new(),
        };
        assert_eq!(
            query.pairs(),
            vec![
                ("page", "2".to_string()),
                ("limit", "10".to_string()),
                ("sortKey", "email".to_string()),
                ("sortOrder", "DESC".to_string()),
            ]
        );

        let with_search = UserListQuery { search: "ana".into(), ..query };
        assert_eq!(with_search.pairs().last(), Some(&("search", "ana".to_string())));
    }

    #[test]
    fn test_movement_filters_are_repeated() {
        let query = MovementQuery {
            user_id: "u-1".into(),
            page: 3,
            account_holding_ids: vec!["a".into(), "b".into()],
            movement_type_ids: vec!["1".into(), "4".into()],
        };
        let pairs = query.pairs();
        let holdings: Vec<_> = pairs.iter().filter(|(k, _)| *k == "accountHoldingIds").collect();
        let types: Vec<_> = pairs.iter().filter(|(k, _)| *k == "movementTypeIds").collect();
        assert_eq!(holdings.len(), 2);
        assert_eq!(types.len(), 2);
        assert!(pairs.contains(&("displayHiddenHoldings", "true".to_string())));
        assert!(pairs.contains(&("page", "3".to_string())));
    }

    #[test]
    fn test_withdrawable_and_transferable_flags() {
        let withdraw = UserHoldingsQuery::withdrawable("u-1").pairs();
        assert!(withdraw.contains(&("hasExternalPair", "true".to_string())));
        assert!(withdraw.contains(&("subtractPendingRequests", "true".to_string())));
        assert!(withdraw.contains(&("onlyWithBalance", "true".to_string())));

        let transfer = UserHoldingsQuery::transferable("u-1").pairs();
        assert!(transfer.contains(&("hasExternalPair", "false".to_string())));

        let balance = UserHoldingsQuery::balance_of("u-1", 9).pairs();
        assert_eq!(
            balance,
            vec![
                ("userId", "u-1".to_string()),
                ("withBalances", "true".to_string()),
                ("holdingId", "9".to_string()),
            ]
        );
    }

    #[test]
    fn test_holdings_query_pairs() {
        assert_eq!(
            HoldingsQuery::externally_paired().pairs(),
            vec![("hasExternalPair", "true".to_string())]
        );
        assert_eq!(
            HoldingsQuery::single(5).pairs(),
            vec![("holding_id", "5".to_string())]
        );
    }

    #[test]
    fn test_deposit_body_field_names() {
        let body = ManualMovementRequest {
            user_id: "u-1".into(),
            amount: 100.0,
            movement_type_id: 1,
            tx_hash: String::new(),
            notes: "n".into(),
            asset_provided_id: 3,
            price_usd: 1.0,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["userId"], json!("u-1"));
        assert_eq!(value["movementTypeId"], json!(1));
        assert_eq!(value["assetProvidedId"], json!(3));
        assert_eq!(value["price_usd"].as_f64(), Some(1.0));
        assert!(value["amount"].is_number());
    }

    #[test]
    fn test_candidates_require_array() {
        let users = candidates_from(json!({
            "data": [{ "id": "u-2", "email": "bo@example.com", "name": "Bo" }]
        }));
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].email, "bo@example.com");

        assert!(candidates_from(json!({ "data": { "id": "u-2" } })).is_empty());
        assert!(candidates_from(json!(null)).is_empty());
    }
}
