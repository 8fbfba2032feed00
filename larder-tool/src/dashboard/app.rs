use std::sync::Arc;

use larder_api::{
    ApiError, Guard, Inventory, InventoryClient, InventoryItem, ItemId, ItemUpdate, Mutation,
    NewItem, Session, WithdrawalDraft, apply, end_session, refresh, require_session,
    start_session,
};
use tokio::sync::oneshot;
use tracing::{error, info, warn};

use super::field::TextField;
use crate::commands::AppContext;
use crate::error::LrdError;
use crate::fields::{optional, optional_text, parse_name, parse_price, parse_quantity};
use crate::store::FileTokenStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Home,
    Inventory,
}

pub const FORM_LABELS: [&str; 4] = ["Name", "Quantity", "Unit", "Price"];

/// Create/edit form for one item.
#[derive(Debug, Clone, Default)]
pub struct ItemForm {
    pub editing: Option<ItemId>,
    pub fields: [TextField; 4],
    pub focus: usize,
}

impl ItemForm {
    pub fn for_item(item: &InventoryItem) -> Self {
        Self {
            editing: Some(item.id),
            fields: [
                TextField::with_text(item.name.clone()),
                TextField::with_text(item.quantity.to_string()),
                TextField::with_text(item.unit.clone().unwrap_or_default()),
                TextField::with_text(item.price.map(|p| p.to_string()).unwrap_or_default()),
            ],
            focus: 0,
        }
    }

    pub fn focused(&mut self) -> &mut TextField {
        &mut self.fields[self.focus]
    }

    pub fn next_field(&mut self) {
        self.focus = (self.focus + 1) % self.fields.len();
    }

    pub fn prev_field(&mut self) {
        self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
    }

    pub fn to_mutation(&self) -> Result<Mutation, String> {
        let name = parse_name(&self.fields[0].text)?;
        let quantity = parse_quantity(&self.fields[1].text)?;
        let unit = optional_text(&self.fields[2].text);
        let price = optional(&self.fields[3].text, parse_price)?;

        Ok(match self.editing {
            // A cleared unit goes out as an empty string, like `lrd edit --unit ""`.
            // A blank price has no wire form and keeps the stored one.
            Some(id) => Mutation::Update {
                id,
                update: ItemUpdate {
                    item_name: Some(name),
                    quantity: Some(quantity),
                    unit: Some(unit.unwrap_or_default()),
                    price,
                },
            },
            None => Mutation::Create(NewItem {
                item_name: name,
                quantity,
                unit,
                price,
            }),
        })
    }
}

/// Open withdrawal workflow: the draft plus the text field feeding it.
#[derive(Debug, Clone)]
pub struct WithdrawForm {
    pub draft: WithdrawalDraft,
    pub field: TextField,
}

impl WithdrawForm {
    pub fn new(item: &InventoryItem) -> Self {
        Self {
            draft: WithdrawalDraft::new(item),
            field: TextField::new(),
        }
    }

    /// Copies the edited text into the draft so the preview follows it.
    pub fn sync(&mut self) {
        self.draft.input = self.field.text.clone();
    }
}

#[derive(Debug, Clone)]
pub enum Modal {
    ItemForm(ItemForm),
    Withdraw(WithdrawForm),
    ConfirmDelete { id: ItemId, name: String },
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub username: TextField,
    pub password: TextField,
    pub on_password: bool,
}

impl LoginForm {
    pub fn focused(&mut self) -> &mut TextField {
        if self.on_password {
            &mut self.password
        } else {
            &mut self.username
        }
    }
}

enum Outcome {
    LoggedIn(Result<String, ApiError>),
    Items(Result<Vec<InventoryItem>, ApiError>),
}

pub struct DashboardApp {
    pub screen: Screen,
    pub modal: Option<Modal>,
    pub should_quit: bool,
    pub client: Arc<InventoryClient>,
    pub store: FileTokenStore,
    pub session: Option<Session>,
    pub inventory: Inventory,
    pub selected: usize,
    pub login: LoginForm,
    pub show_token: bool,
    pub notice: Option<String>,
    pub last_error: Option<String>,
    response_rx: Option<oneshot::Receiver<Outcome>>,
}

impl DashboardApp {
    pub fn new(ctx: AppContext) -> Result<Self, LrdError> {
        let session = match require_session(&ctx.store)? {
            Guard::Authenticated(session) => Some(session),
            Guard::Login => None,
        };
        let screen = if session.is_some() {
            Screen::Home
        } else {
            Screen::Login
        };

        Ok(Self {
            screen,
            modal: None,
            should_quit: false,
            client: Arc::new(ctx.client),
            store: ctx.store,
            session,
            inventory: Inventory::new(),
            selected: 0,
            login: LoginForm::default(),
            show_token: false,
            notice: None,
            last_error: None,
            response_rx: None,
        })
    }

    pub fn is_loading(&self) -> bool {
        self.response_rx.is_some()
    }

    pub fn selected_item(&self) -> Option<&InventoryItem> {
        self.inventory.items().get(self.selected)
    }

    pub fn submit_login(&mut self) {
        if self.is_loading() {
            return;
        }
        let username = self.login.username.text.trim().to_string();
        let password = self.login.password.text.clone();
        if username.is_empty() || password.is_empty() {
            self.last_error = Some("Enter username and password".to_string());
            return;
        }

        let (tx, rx) = oneshot::channel();
        let client = Arc::clone(&self.client);

        tokio::spawn(async move {
            let result = client.login(&username, &password).await;
            let _ = tx.send(Outcome::LoggedIn(result));
        });

        self.response_rx = Some(rx);
        self.last_error = None;
    }

    /// Re-fetches the whole list.
    pub fn refresh(&mut self) {
        self.spawn_items(None);
    }

    /// Sends a mutation; the list is re-fetched once it succeeds.
    fn submit(&mut self, mutation: Mutation) {
        self.spawn_items(Some(mutation));
    }

    fn spawn_items(&mut self, mutation: Option<Mutation>) {
        let Some(session) = self.session.clone() else {
            self.screen = Screen::Login;
            return;
        };
        if !self.inventory.try_begin() {
            return;
        }

        let (tx, rx) = oneshot::channel();
        let client = Arc::clone(&self.client);

        tokio::spawn(async move {
            let result = match mutation {
                Some(mutation) => apply(client.as_ref(), &session, mutation).await,
                None => refresh(client.as_ref(), &session).await,
            };
            let _ = tx.send(Outcome::Items(result));
        });

        self.response_rx = Some(rx);
        self.last_error = None;
    }

    pub fn poll_response(&mut self) {
        let Some(ref mut rx) = self.response_rx else {
            return;
        };

        match rx.try_recv() {
            Ok(outcome) => {
                self.response_rx = None;
                self.handle_outcome(outcome);
            }
            Err(oneshot::error::TryRecvError::Empty) => {
                // Still waiting
            }
            Err(oneshot::error::TryRecvError::Closed) => {
                self.response_rx = None;
                self.inventory.abandon();
                self.last_error = Some("Request failed".to_string());
            }
        }
    }

    fn handle_outcome(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::LoggedIn(Ok(token)) => match start_session(&self.store, token) {
                Ok(session) => {
                    info!(user = session.display_name(), "Logged in");
                    self.session = Some(session);
                    self.login = LoginForm::default();
                    self.screen = Screen::Home;
                    self.refresh();
                }
                Err(e) => {
                    error!("Could not start session: {}", e);
                    self.last_error = Some(e.to_string());
                }
            },
            Outcome::LoggedIn(Err(e)) => {
                warn!("Login failed: {}", e);
                self.login.password.clear();
                self.last_error = Some(e.user_message());
            }
            Outcome::Items(result) => match self.inventory.complete(result) {
                Ok(()) => {
                    let len = self.inventory.items().len();
                    self.selected = self.selected.min(len.saturating_sub(1));
                    if let Some(notice) = self.closed_modal_notice() {
                        self.notice = Some(notice);
                    }
                    self.modal = None;
                }
                Err(e) if e.is_unauthorized() => {
                    warn!("Session rejected by the API: {}", e);
                    self.logout();
                    self.last_error = Some(format!("Session ended: {}", e.user_message()));
                }
                Err(e) => {
                    error!("Inventory request failed: {}", e);
                    self.last_error = Some(e.user_message());
                }
            },
        }
    }

    fn closed_modal_notice(&self) -> Option<String> {
        match self.modal.as_ref()? {
            Modal::ItemForm(form) if form.editing.is_some() => Some("Item updated".to_string()),
            Modal::ItemForm(_) => Some("Item added".to_string()),
            Modal::Withdraw(form) => Some(format!("Withdrew from {}", form.draft.item_name)),
            Modal::ConfirmDelete { name, .. } => Some(format!("Deleted {}", name)),
        }
    }

    /// Stops waiting for the in-flight request.
    pub fn abandon_request(&mut self) {
        self.response_rx = None;
        self.inventory.abandon();
        self.last_error = Some("Request abandoned".to_string());
    }

    pub fn logout(&mut self) {
        if let Err(e) = end_session(&self.store) {
            error!("Could not remove stored token: {}", e);
        }
        self.session = None;
        self.inventory.clear();
        self.modal = None;
        self.show_token = false;
        self.selected = 0;
        self.screen = Screen::Login;
    }

    pub fn toggle_screen(&mut self) {
        self.screen = match self.screen {
            Screen::Home => Screen::Inventory,
            Screen::Inventory => Screen::Home,
            Screen::Login => Screen::Login,
        };
    }

    pub fn select_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_down(&mut self) {
        if self.selected + 1 < self.inventory.items().len() {
            self.selected += 1;
        }
    }

    pub fn open_create(&mut self) {
        self.last_error = None;
        self.modal = Some(Modal::ItemForm(ItemForm::default()));
    }

    pub fn open_edit(&mut self) {
        if let Some(item) = self.selected_item() {
            let form = ItemForm::for_item(item);
            self.last_error = None;
            self.modal = Some(Modal::ItemForm(form));
        }
    }

    pub fn open_withdraw(&mut self) {
        if let Some(item) = self.selected_item() {
            let form = WithdrawForm::new(item);
            self.last_error = None;
            self.modal = Some(Modal::Withdraw(form));
        }
    }

    pub fn open_delete(&mut self) {
        if let Some(item) = self.selected_item() {
            let modal = Modal::ConfirmDelete {
                id: item.id,
                name: item.name.clone(),
            };
            self.last_error = None;
            self.modal = Some(modal);
        }
    }

    pub fn close_modal(&mut self) {
        self.modal = None;
        self.last_error = None;
    }

    /// Submits the open modal. Invalid input never reaches the API.
    pub fn submit_modal(&mut self) {
        if self.is_loading() {
            return;
        }
        let mutation = match &self.modal {
            Some(Modal::ItemForm(form)) => form.to_mutation(),
            Some(Modal::Withdraw(form)) => form
                .draft
                .validate()
                .map(Mutation::Withdraw)
                .map_err(|e| e.to_string()),
            Some(Modal::ConfirmDelete { id, .. }) => Ok(Mutation::Delete(*id)),
            None => return,
        };

        match mutation {
            Ok(mutation) => self.submit(mutation),
            Err(message) => self.last_error = Some(message),
        }
    }
}
