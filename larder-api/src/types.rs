use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Items with fewer units than this are flagged as low stock.
pub const LOW_STOCK_THRESHOLD: u32 = 100;

/// Server-assigned item identifier.
pub type ItemId = i64;

/// A stock-keeping unit as returned by `GET /inventory`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: ItemId,
    #[serde(rename = "item_name")]
    pub name: String,
    pub quantity: u32,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
}

impl InventoryItem {
    pub fn is_low_stock(&self) -> bool {
        self.quantity < LOW_STOCK_THRESHOLD
    }

    /// Price times quantity. Unpriced items are worth nothing. `None` when
    /// the product does not fit in a [`Decimal`].
    pub fn value(&self) -> Option<Decimal> {
        self.price
            .unwrap_or(Decimal::ZERO)
            .checked_mul(Decimal::from(self.quantity))
    }

    /// Value with two decimal places, or `overflow`.
    pub fn value_display(&self) -> String {
        format_value(self.value())
    }
}

/// Body of `POST /inventory`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewItem {
    pub item_name: String,
    pub quantity: u32,
    pub unit: Option<String>,
    pub price: Option<Decimal>,
}

/// Body of `PUT /inventory/{id}`. Only fields that are set go on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
}

impl ItemUpdate {
    /// Partial update carrying only a new quantity.
    pub fn quantity(quantity: u32) -> Self {
        Self {
            quantity: Some(quantity),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.item_name.is_none()
            && self.quantity.is_none()
            && self.unit.is_none()
            && self.price.is_none()
    }
}

/// Aggregate figures shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InventorySummary {
    pub total_items: usize,
    pub low_stock: usize,
    /// `None` when the total overflowed.
    pub total_value: Option<Decimal>,
}

impl InventorySummary {
    pub fn from_items(items: &[InventoryItem]) -> Self {
        let total_value = items
            .iter()
            .try_fold(Decimal::ZERO, |total, item| total.checked_add(item.value()?));
        Self {
            total_items: items.len(),
            low_stock: items.iter().filter(|i| i.is_low_stock()).count(),
            total_value: total_value.map(|v| v.round_dp(2)),
        }
    }

    /// Total value with exactly two decimal places, or `overflow`.
    pub fn total_value_display(&self) -> String {
        format_value(self.total_value)
    }
}

fn format_value(value: Option<Decimal>) -> String {
    match value {
        Some(value) => format!("{:.2}", value),
        None => "overflow".to_string(),
    }
}

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(alias = "token")]
    pub access_token: String,
}
