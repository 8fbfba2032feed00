//! The fetch/mutate cycle and the in-memory item list.
//!
//! Every mutation is followed by a fetch of the whole collection, and the
//! local list is replaced wholesale with the result. There is no patching,
//! no retry and no de-duplication of requests.

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::error::ApiError;
use crate::session::Session;
use crate::types::{InventoryItem, InventorySummary, ItemId, ItemUpdate, NewItem};
use crate::withdrawal::ValidatedWithdrawal;

/// Remote operations on the inventory collection.
#[async_trait]
pub trait InventoryApi: Send + Sync {
    async fn list(&self, session: &Session) -> Result<Vec<InventoryItem>, ApiError>;

    async fn create(&self, session: &Session, item: &NewItem) -> Result<InventoryItem, ApiError>;

    async fn update(
        &self,
        session: &Session,
        id: ItemId,
        update: &ItemUpdate,
    ) -> Result<InventoryItem, ApiError>;

    async fn delete(&self, session: &Session, id: ItemId) -> Result<(), ApiError>;
}

/// A change to send to the API.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Create(NewItem),
    Update { id: ItemId, update: ItemUpdate },
    Delete(ItemId),
    Withdraw(ValidatedWithdrawal),
}

impl Mutation {
    pub fn describe(&self) -> String {
        match self {
            Mutation::Create(item) => format!("create {}", item.item_name),
            Mutation::Update { id, .. } => format!("update #{}", id),
            Mutation::Delete(id) => format!("delete #{}", id),
            Mutation::Withdraw(w) => format!("withdraw {} from #{}", w.amount(), w.item_id()),
        }
    }
}

/// Fetches the whole collection.
pub async fn refresh<A: InventoryApi + ?Sized>(
    api: &A,
    session: &Session,
) -> Result<Vec<InventoryItem>, ApiError> {
    api.list(session).await
}

/// Sends one mutation, then re-fetches the whole collection.
#[instrument(skip(api, session), fields(op = %mutation.describe()))]
pub async fn apply<A: InventoryApi + ?Sized>(
    api: &A,
    session: &Session,
    mutation: Mutation,
) -> Result<Vec<InventoryItem>, ApiError> {
    match &mutation {
        Mutation::Create(item) => {
            api.create(session, item).await?;
        }
        Mutation::Update { id, update } => {
            api.update(session, *id, update).await?;
        }
        Mutation::Delete(id) => {
            api.delete(session, *id).await?;
        }
        Mutation::Withdraw(withdrawal) => {
            api.update(session, withdrawal.item_id(), &withdrawal.to_update())
                .await?;
        }
    }

    debug!("Mutation accepted, refreshing inventory");
    refresh(api, session).await
}

/// Client-side view of the inventory.
#[derive(Debug, Default)]
pub struct Inventory {
    items: Vec<InventoryItem>,
    loading: bool,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[InventoryItem] {
        &self.items
    }

    pub fn get(&self, id: ItemId) -> Option<&InventoryItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn low_stock(&self) -> impl Iterator<Item = &InventoryItem> {
        self.items.iter().filter(|item| item.is_low_stock())
    }

    pub fn summary(&self) -> InventorySummary {
        InventorySummary::from_items(&self.items)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Marks a request as in flight. Returns false if one already is.
    pub fn try_begin(&mut self) -> bool {
        if self.loading {
            return false;
        }
        self.loading = true;
        true
    }

    /// Finishes the in-flight request. On success the cached list is
    /// replaced; on failure it is kept as is and the error handed back.
    pub fn complete(
        &mut self,
        result: Result<Vec<InventoryItem>, ApiError>,
    ) -> Result<(), ApiError> {
        self.loading = false;
        self.items = result?;
        Ok(())
    }

    /// Stops waiting for the in-flight request. The request itself still
    /// runs to completion; its result is simply never applied.
    pub fn abandon(&mut self) {
        self.loading = false;
    }

    /// Drops the cached list, e.g. on logout.
    pub fn clear(&mut self) {
        self.items.clear();
        self.loading = false;
    }
}
