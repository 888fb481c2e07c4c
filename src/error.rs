use std::{error::Error, fmt::Debug};

/// Failures talking to the admin API
#[derive(thiserror::Error)]
pub enum ApiError {
    #[error("No session token found, please sign in again")]
    MissingToken,

    #[error("Network error. Please try again.")]
    Transport(#[source] reqwest::Error),

    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Unexpected response from server")]
    Decode(#[source] serde_json::Error),
}

impl Debug for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)?;
        if let Some(source) = self.source() {
            write!(f, " (Caused by: {})", source)?;
        }
        Ok(())
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Transport(e)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(e)
    }
}

impl ApiError {
    /// Builds the error for a non-2xx response.
    ///
    /// The message is the body's `message`, then its `error`, then the status
    /// reason phrase, then `fallback`.
    pub fn rejected(status: u16, reason: Option<&str>, body: &str, fallback: &str) -> Self {
        let from_body = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|value| {
                ["message", "error"].iter().find_map(|field| {
                    value
                        .get(field)
                        .and_then(|v| v.as_str())
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                })
            });

        let message = from_body
            .or_else(|| reason.filter(|r| !r.is_empty()).map(str::to_string))
            .unwrap_or_else(|| fallback.to_string());

        ApiError::Rejected { status, message }
    }
}

/// Client-side precondition failures, raised before any request is made
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum FormError {
    #[error("Select an asset")]
    SelectAsset,

    #[error("Enter a valid amount")]
    InvalidAmount,

    #[error("Enter a valid USD rate")]
    InvalidRate,

    #[error("Movement type \"{0}\" not found")]
    MissingMovementType(&'static str),

    #[error("Selected asset not found")]
    AssetNotFound,

    #[error("Complete all required fields")]
    Incomplete,

    #[error("Recipient email does not match the selected user")]
    RecipientMismatch,

    #[error("Passwords do not match.")]
    PasswordMismatch,

    #[error("Please wait for the current request to finish")]
    Busy,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message_of(err: ApiError) -> String {
        match err {
            ApiError::Rejected { message, .. } => message,
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_rejected_prefers_body_message() {
        let err = ApiError::rejected(
            400,
            Some("Bad Request"),
            r#"{"message":"Insufficient balance","error":"Bad Request"}"#,
            "Deposit failed",
        );
        assert_eq!(message_of(err), "Insufficient balance");
    }

    #[test]
    fn test_rejected_falls_back_to_error_field() {
        let err = ApiError::rejected(422, Some("Unprocessable Entity"), r#"{"error":"bad asset"}"#, "x");
        assert_eq!(message_of(err), "bad asset");
    }

    #[test]
    fn test_rejected_falls_back_to_status_then_generic() {
        let err = ApiError::rejected(500, Some("Internal Server Error"), "<html>", "x");
        assert_eq!(message_of(err), "Internal Server Error");

        let err = ApiError::rejected(599, None, "", "Transfer failed");
        assert_eq!(message_of(err), "Transfer failed");
    }

    #[test]
    fn test_form_error_messages() {
        assert_eq!(FormError::SelectAsset.to_string(), "Select an asset");
        assert_eq!(
            FormError::MissingMovementType("retiro").to_string(),
            "Movement type \"retiro\" not found"
        );
    }
}
