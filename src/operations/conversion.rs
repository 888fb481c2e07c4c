//! Asset conversion form.
//!
//! Only the form exists: there are no eligible asset lists, no validation and
//! no endpoint yet, so it can never be submitted.

use super::{RateField, accepts_decimal_input};

#[derive(Debug, Clone, PartialEq)]
pub struct ConversionForm {
    pub from_asset: String,
    pub to_asset: String,
    pub amount: String,
    pub rate: RateField,
    pub tx_hash: String,
    pub notes: String,
    open: bool,
}

impl Default for ConversionForm {
    fn default() -> Self {
        ConversionForm {
            from_asset: String::new(),
            to_asset: String::new(),
            amount: String::new(),
            rate: RateField::empty(),
            tx_hash: String::new(),
            notes: String::new(),
            open: false,
        }
    }
}

impl ConversionForm {
    pub fn open(&mut self) {
        *self = ConversionForm {
            open: true,
            ..Default::default()
        };
    }

    pub fn close(&mut self) {
        *self = ConversionForm::default();
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn edit_amount(&mut self, text: &str) -> bool {
        if !accepts_decimal_input(text) {
            return false;
        }
        self.amount = text.to_string();
        true
    }

    pub fn can_submit(&self) -> bool {
        false
    }
}
