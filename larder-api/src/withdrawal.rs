//! Partial stock withdrawal.
//!
//! The amount a user types is checked against the quantity on hand before
//! anything is sent. A [`ValidatedWithdrawal`] can only be obtained through
//! that check, and it is the only way to build the withdrawal mutation.

use std::num::IntErrorKind;

use crate::error::WithdrawalError;
use crate::types::{InventoryItem, ItemId, ItemUpdate};

/// Parses a withdrawal amount. Only positive whole numbers are accepted.
pub fn parse_amount(input: &str) -> Result<u64, WithdrawalError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(WithdrawalError::Empty);
    }

    let amount: i128 = match trimmed.parse() {
        Ok(amount) => amount,
        // Too many digits is still a whole number, just more than any stock.
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => return Ok(u64::MAX),
        Err(e) if *e.kind() == IntErrorKind::NegOverflow => {
            return Err(WithdrawalError::NotPositive);
        }
        Err(_) => return Err(WithdrawalError::NotAnInteger(trimmed.to_string())),
    };
    if amount <= 0 {
        return Err(WithdrawalError::NotPositive);
    }

    Ok(u64::try_from(amount).unwrap_or(u64::MAX))
}

/// Checks `amount` against `available` and returns the remaining quantity.
pub fn remaining_after(
    available: u32,
    amount: u64,
    unit: Option<&str>,
) -> Result<u32, WithdrawalError> {
    if amount > u64::from(available) {
        return Err(WithdrawalError::ExceedsAvailable {
            requested: amount,
            available,
            unit: unit.map(String::from),
        });
    }
    // amount <= available, so this fits.
    Ok(available - amount as u32)
}

/// A withdrawal that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedWithdrawal {
    item_id: ItemId,
    amount: u32,
    new_quantity: u32,
}

impl ValidatedWithdrawal {
    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    pub fn amount(&self) -> u32 {
        self.amount
    }

    pub fn new_quantity(&self) -> u32 {
        self.new_quantity
    }

    /// The partial update sent to the API: the new quantity and nothing else.
    pub fn to_update(&self) -> ItemUpdate {
        ItemUpdate::quantity(self.new_quantity)
    }
}

/// State of an open withdrawal workflow for one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawalDraft {
    pub item_id: ItemId,
    pub item_name: String,
    pub unit: Option<String>,
    pub available: u32,
    pub input: String,
}

impl WithdrawalDraft {
    pub fn new(item: &InventoryItem) -> Self {
        Self {
            item_id: item.id,
            item_name: item.name.clone(),
            unit: item.unit.clone(),
            available: item.quantity,
            input: String::new(),
        }
    }

    /// Tentative quantity left after withdrawing the current input.
    pub fn preview(&self) -> Result<u32, WithdrawalError> {
        let amount = parse_amount(&self.input)?;
        remaining_after(self.available, amount, self.unit.as_deref())
    }

    pub fn can_submit(&self) -> bool {
        self.preview().is_ok()
    }

    pub fn validate(&self) -> Result<ValidatedWithdrawal, WithdrawalError> {
        let new_quantity = self.preview()?;
        Ok(ValidatedWithdrawal {
            item_id: self.item_id,
            amount: self.available - new_quantity,
            new_quantity,
        })
    }
}
