//! Input fields shared by the operation forms

use crate::error::FormError;
use crate::model::{Holding, UserSummary};

pub const DEFAULT_RATE: &str = "1";

/// Keystroke filter for amount and rate inputs: digits with at most one dot
pub fn accepts_decimal_input(text: &str) -> bool {
    let mut seen_dot = false;
    text.chars().all(|c| match c {
        '0'..='9' => true,
        '.' if !seen_dot => {
            seen_dot = true;
            true
        }
        _ => false,
    })
}

/// Amount to submit: a finite number strictly above zero
pub fn parse_amount(text: &str) -> Result<f64, FormError> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value > 0.0)
        .ok_or(FormError::InvalidAmount)
}

/// USD value of one unit of the selected asset
#[derive(Debug, Clone, PartialEq)]
pub struct RateField {
    value: String,
    locked: bool,
}

impl Default for RateField {
    fn default() -> Self {
        RateField {
            value: DEFAULT_RATE.to_string(),
            locked: false,
        }
    }
}

impl RateField {
    pub fn empty() -> Self {
        RateField {
            value: String::new(),
            locked: false,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn unlock(&mut self) {
        self.locked = false;
    }

    /// Manual edit. Ignored while locked or when the keystroke is not a decimal.
    pub fn edit(&mut self, text: &str) -> bool {
        if self.locked || !accepts_decimal_input(text) {
            return false;
        }
        self.value = text.to_string();
        true
    }

    /// Applies a price lookup. A numeric price replaces the value; a static
    /// price also locks the field. No holding at all means the price is
    /// unknown: the current value stays and the field is editable.
    pub fn apply_quote(&mut self, holding: Option<&Holding>) {
        match holding {
            Some(holding) => {
                if let Some(price) = holding.price {
                    self.value = price.to_string();
                }
                self.locked = holding.static_price;
            }
            None => self.locked = false,
        }
    }

    /// Replaces the rate by its reciprocal. No-op when locked or when the
    /// current value is not a positive number.
    pub fn invert(&mut self) -> bool {
        if self.locked {
            return false;
        }
        match self.value.trim().parse::<f64>() {
            Ok(rate) if rate > 0.0 => {
                self.value = format!("{:.8}", 1.0 / rate);
                true
            }
            _ => false,
        }
    }

    pub fn parse(&self) -> Result<f64, FormError> {
        self.value
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|rate| rate.is_finite() && *rate > 0.0)
            .ok_or(FormError::InvalidRate)
    }
}

/// Recipient picker of the transfer form.
///
/// The typed text and the resolved user are kept apart: any edit of the text
/// drops the resolved user, so a stale id can never be submitted with new text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipientSearch {
    text: String,
    recipient: Option<UserSummary>,
    candidates: Vec<UserSummary>,
    loading: bool,
    open: bool,
}

impl RecipientSearch {
    #[cfg(test)]
    pub(crate) fn resolved_as(text: &str, user: &UserSummary) -> Self {
        RecipientSearch {
            text: text.to_string(),
            recipient: Some(user.clone()),
            ..Default::default()
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn recipient(&self) -> Option<&UserSummary> {
        self.recipient.as_ref()
    }

    pub fn candidates(&self) -> &[UserSummary] {
        &self.candidates
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_open(&self) -> bool {
        self.open && !self.text.is_empty()
    }

    pub fn edit(&mut self, text: &str) {
        self.text = text.to_string();
        self.recipient = None;
        if text.is_empty() {
            self.candidates.clear();
            self.loading = false;
            self.open = false;
        } else {
            self.open = true;
        }
    }

    /// Whether a lookup for `query` should go out. Empty or outdated queries
    /// are answered locally with no request.
    pub fn begin_lookup(&mut self, query: &str) -> bool {
        if query.is_empty() {
            self.candidates.clear();
            self.loading = false;
            return false;
        }
        if query != self.text {
            return false;
        }
        self.loading = true;
        true
    }

    /// Stores lookup results, unless the text moved on since the request left
    pub fn finish_lookup(&mut self, query: &str, candidates: Vec<UserSummary>) -> bool {
        if query != self.text {
            log::debug!("Discarding recipient lookup for outdated query {:?}", query);
            return false;
        }
        self.candidates = candidates;
        self.loading = false;
        true
    }

    pub fn choose(&mut self, user: &UserSummary) {
        self.text = user.email.clone();
        self.recipient = Some(user.clone());
        self.loading = false;
        self.open = false;
    }

    pub fn focus(&mut self) {
        self.open = true;
    }

    pub fn blur(&mut self) {
        self.open = false;
    }
}
