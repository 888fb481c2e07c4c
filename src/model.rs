//! View models for the payloads the admin API returns
//!
//! Everything here is a transient copy of server-owned data. The backend is not
//! always consistent about numbers (some come back as strings), so numeric
//! fields that are displayed go through [`lenient`].

use serde::{Deserialize, Serialize};

/// Identity returned by `GET /users/me`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub profile_image_url: Option<String>,
    #[serde(default)]
    pub admin: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ApprovalStatus {
    pub code: String,
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// The seven onboarding steps, each tracked independently
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct OnboardingStatus {
    #[serde(default)]
    pub profile_completed: bool,
    #[serde(default)]
    pub risk_profile_completed: bool,
    #[serde(default)]
    pub aml_form_completed: bool,
    #[serde(default)]
    pub kyc_completed: bool,
    #[serde(default)]
    pub agreement_signed: bool,
    #[serde(default, rename = "emailVerified")]
    pub email_verified: bool,
    #[serde(default, rename = "phoneVerified")]
    pub phone_verified: bool,
}

impl OnboardingStatus {
    fn steps(&self) -> [bool; 7] {
        [
            self.profile_completed,
            self.risk_profile_completed,
            self.aml_form_completed,
            self.kyc_completed,
            self.agreement_signed,
            self.email_verified,
            self.phone_verified,
        ]
    }

    /// Completed steps as a rounded percentage
    pub fn progress(&self) -> u8 {
        let steps = self.steps();
        let completed = steps.iter().filter(|done| **done).count();
        ((completed as f64 / steps.len() as f64) * 100.0).round() as u8
    }
}

/// A user as listed by `GET /admin/users` and detailed by `GET /admin/users?id=`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub profile_image_url: Option<String>,
    pub admin: bool,
    pub approval_status: Option<ApprovalStatus>,
    pub approval_status_code: Option<String>,
    pub approval_status_label: Option<String>,
    pub onboarding_status: Option<OnboardingStatus>,
    pub created_at: Option<String>,
    pub failed_login_attempts: u32,
    pub lockout_expires_at: Option<String>,
    pub last_login_ip: Option<String>,
    pub last_login_at: Option<String>,
    pub referral: Option<String>,
}

/// Colour family used to render an approval status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalTone {
    Success,
    Error,
    Gray,
    Emerald,
    Warning,
}

impl ApprovalTone {
    pub fn from_code(code: Option<&str>) -> Self {
        match code {
            Some("approved") => ApprovalTone::Success,
            Some("declined") => ApprovalTone::Error,
            Some("unverified") => ApprovalTone::Gray,
            Some("ready") => ApprovalTone::Emerald,
            _ => ApprovalTone::Warning,
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            ApprovalTone::Success => "tone-success",
            ApprovalTone::Error => "tone-error",
            ApprovalTone::Gray => "tone-gray",
            ApprovalTone::Emerald => "tone-emerald",
            ApprovalTone::Warning => "tone-warning",
        }
    }
}

/// One badge on the user detail card. `value` is `None` when the backend did
/// not report the step at all.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusFlag {
    pub label: String,
    pub value: Option<bool>,
    pub tone: Option<ApprovalTone>,
}

impl User {
    fn status_code(&self) -> Option<&str> {
        self.approval_status_code
            .as_deref()
            .or_else(|| self.approval_status.as_ref().map(|s| s.code.as_str()))
    }

    pub fn approval_label(&self) -> &str {
        self.approval_status_label
            .as_deref()
            .or_else(|| self.approval_status.as_ref().map(|s| s.label.as_str()))
            .filter(|label| !label.is_empty())
            .unwrap_or("Unknown")
    }

    pub fn approval_tone(&self) -> ApprovalTone {
        ApprovalTone::from_code(self.status_code())
    }

    /// Whether the user is waiting for an approve/decline decision
    pub fn awaiting_decision(&self) -> bool {
        self.status_code() == Some("ready")
    }

    pub fn onboarding_progress(&self) -> u8 {
        self.onboarding_status
            .as_ref()
            .map(OnboardingStatus::progress)
            .unwrap_or(0)
    }

    pub fn flags(&self) -> Vec<StatusFlag> {
        let onboarding = self.onboarding_status.as_ref();
        let step = |f: fn(&OnboardingStatus) -> bool| onboarding.map(f);

        vec![
            StatusFlag {
                label: self.approval_label().to_string(),
                value: Some(self.status_code() == Some("approved")),
                tone: Some(self.approval_tone()),
            },
            flag("AML", step(|o| o.aml_form_completed)),
            flag("KYC", step(|o| o.kyc_completed)),
            flag("Agreement Signed", step(|o| o.agreement_signed)),
            flag("Email Verified", step(|o| o.email_verified)),
            flag("Phone Verified", step(|o| o.phone_verified)),
            flag("Risk Profile", step(|o| o.risk_profile_completed)),
            flag("Profile Completed", step(|o| o.profile_completed)),
        ]
    }
}

fn flag(label: &str, value: Option<bool>) -> StatusFlag {
    StatusFlag {
        label: label.to_string(),
        value,
        tone: None,
    }
}

/// Typeahead candidate for the transfer recipient search
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserSummary {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
}

/// Paginated envelope shared by list endpoints
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default = "one")]
    pub total_pages: u32,
    #[serde(default)]
    pub total: u64,
}

fn one() -> u32 {
    1
}

/// Catalog entry for an operation type, e.g. `deposito` or `retiro`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MovementType {
    pub id: i64,
    pub code: String,
    pub name: String,
}

/// Looks up the catalog id for an operation code
pub fn movement_type_id(types: &[MovementType], code: &str) -> Option<i64> {
    types.iter().find(|mt| mt.code == code).map(|mt| mt.id)
}

/// Asset definition from `GET /admin/account-movements/holdings`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Holding {
    pub holding_id: i64,
    pub name: String,
    #[serde(default, deserialize_with = "lenient::number_only")]
    pub price: Option<f64>,
    #[serde(default, rename = "staticPrice")]
    pub static_price: bool,
}

/// The asset half of a user holding
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HoldingRef {
    pub holding_id: i64,
    pub name: String,
}

/// A user's balance line for one asset
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserHolding {
    #[serde(deserialize_with = "lenient::string_or_number")]
    pub account_holding_id: String,
    pub holding_id: HoldingRef,
    #[serde(default, deserialize_with = "lenient::number_only")]
    pub balance: Option<f64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Named {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct MovementHolding {
    #[serde(default)]
    pub holding_id: Option<Named>,
}

/// One ledger entry
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Movement {
    #[serde(default)]
    pub movement_id: Option<i64>,
    pub timestamp: String,
    #[serde(default)]
    pub account_holding_id: Option<MovementHolding>,
    #[serde(default)]
    pub movement_type_id: Option<Named>,
    #[serde(default, deserialize_with = "lenient::number_or_numeric_string")]
    pub value_usd: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number_or_numeric_string")]
    pub units_delta: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number_or_numeric_string")]
    pub units_after: Option<f64>,
    #[serde(default)]
    pub tx_hash: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

const EXPLORER_TX_URL: &str = "https://etherscan.io/tx/";

impl Movement {
    pub fn asset_name(&self) -> Option<&str> {
        self.account_holding_id
            .as_ref()
            .and_then(|ah| ah.holding_id.as_ref())
            .and_then(|h| h.name.as_deref())
    }

    pub fn type_name(&self) -> Option<&str> {
        self.movement_type_id.as_ref().and_then(|t| t.name.as_deref())
    }

    /// Units credited, if this entry increased the balance
    pub fn credit(&self) -> Option<f64> {
        self.units_delta.filter(|d| *d > 0.0)
    }

    /// Units debited (as a positive number), if this entry decreased the balance
    pub fn debit(&self) -> Option<f64> {
        self.units_delta.filter(|d| *d < 0.0).map(f64::abs)
    }

    pub fn tx_hash(&self) -> Option<&str> {
        self.tx_hash.as_deref().filter(|h| !h.is_empty())
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref().filter(|n| !n.is_empty())
    }

    pub fn explorer_url(&self) -> Option<String> {
        self.tx_hash().map(|hash| format!("{}{}", EXPLORER_TX_URL, hash))
    }

    /// Row key: the server id when present, else the row position
    pub fn row_key(&self, index: usize) -> String {
        self.movement_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| format!("row-{}", index))
    }
}

mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Accepts a JSON number; anything else is treated as absent.
    pub fn number_only<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.and_then(|v| v.as_f64()))
    }

    /// Accepts a JSON number or a string holding one.
    pub fn number_or_numeric_string<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        })
    }

    pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(serde::de::Error::custom(format!(
                "expected string or number, got {}",
                other
            ))),
        }
    }
}
