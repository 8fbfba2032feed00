//! Client for a remote inventory REST service.
//!
//! All business rules live in the API. This crate holds the session, decodes
//! bearer tokens for display, validates stock withdrawals before they are
//! sent and keeps a cached copy of the item list that is re-fetched in full
//! after every change.
//!
//! # Example
//!
//! ```ignore
//! use larder_api::{InventoryClient, MemoryTokenStore, Mutation, WithdrawalDraft};
//! use larder_api::{apply, start_session};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = InventoryClient::with_base_url("http://localhost:8000");
//!     let store = MemoryTokenStore::new();
//!
//!     let token = client.login("chef", "secret").await.unwrap();
//!     let session = start_session(&store, token).unwrap();
//!
//!     let items = client.list_items(&session).await.unwrap();
//!     let mut draft = WithdrawalDraft::new(&items[0]);
//!     draft.input = "5".to_string();
//!
//!     // Rejected locally if more than the available quantity.
//!     let withdrawal = draft.validate().unwrap();
//!     let items = apply(&client, &session, Mutation::Withdraw(withdrawal)).await.unwrap();
//! }
//! ```

mod client;
mod error;
mod inventory;
mod session;
mod token;
mod types;
mod withdrawal;

pub use client::{DEFAULT_BASE_URL, InventoryClient};
pub use error::{ApiError, TokenError, WithdrawalError};
pub use inventory::{Inventory, InventoryApi, Mutation, apply, refresh};
pub use session::{
    Guard, MemoryTokenStore, Session, StartSessionError, TokenStore, end_session, require_session,
    start_session,
};
pub use token::{DecodedIdentity, Subject, check_format, decode_identity};
pub use types::{
    InventoryItem, InventorySummary, ItemId, ItemUpdate, LOW_STOCK_THRESHOLD, NewItem,
};
pub use withdrawal::{ValidatedWithdrawal, WithdrawalDraft, parse_amount, remaining_after};
