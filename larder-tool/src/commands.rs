use std::io::{self, BufRead, Write};

use chrono::Utc;
use larder_api::{
    ApiError, Guard, InventoryClient, InventoryItem, InventorySummary, ItemId, ItemUpdate,
    Mutation, NewItem, Session, WithdrawalDraft, apply, end_session, refresh, require_session,
    start_session,
};
use rust_decimal::Decimal;
use tracing::info;

use crate::error::LrdError;
use crate::store::FileTokenStore;

pub struct AppContext {
    pub client: InventoryClient,
    pub store: FileTokenStore,
}

impl AppContext {
    pub fn new(client: InventoryClient, store: FileTokenStore) -> Self {
        Self { client, store }
    }

    /// Runs the session guard. No session means the user has to log in.
    pub fn session(&self) -> Result<Session, LrdError> {
        match require_session(&self.store)? {
            Guard::Authenticated(session) => Ok(session),
            Guard::Login => Err(LrdError::NotLoggedIn),
        }
    }

    /// Ends the session when the API answered 401.
    fn checked<T>(&self, result: Result<T, ApiError>) -> Result<T, LrdError> {
        match result {
            Err(ApiError::Unauthorized(message)) => {
                end_session(&self.store)?;
                Err(LrdError::SessionEnded(message))
            }
            other => Ok(other?),
        }
    }

    async fn mutate(&self, mutation: Mutation) -> Result<Vec<InventoryItem>, LrdError> {
        let session = self.session()?;
        self.checked(apply(&self.client, &session, mutation).await)
    }
}

pub async fn login(
    ctx: &AppContext,
    username: String,
    password: Option<String>,
) -> Result<(), LrdError> {
    let password = match password {
        Some(password) => password,
        None => prompt_password()?,
    };

    let token = ctx.client.login(&username, &password).await?;
    let session = start_session(&ctx.store, token)?;
    info!(user = session.display_name(), "Logged in");

    println!("Logged in as {}", session.display_name());
    if let Some(role) = session.role() {
        println!("Role: {}", role);
    }
    Ok(())
}

fn prompt_password() -> Result<String, LrdError> {
    eprint!("Password: ");
    io::stderr().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

pub fn logout(ctx: &AppContext) -> Result<(), LrdError> {
    end_session(&ctx.store)?;
    info!(path = %ctx.store.path().display(), "Removed stored token");
    println!("Logged out");
    Ok(())
}

pub fn whoami(ctx: &AppContext, show_token: bool) -> Result<(), LrdError> {
    let session = ctx.session()?;
    print!("{}", describe_session(&session, show_token));
    Ok(())
}

fn describe_session(session: &Session, show_token: bool) -> String {
    let mut out = format!("Welcome, {}!\n", session.display_name());
    out.push_str(&format!("Username:       {}\n", session.display_name()));
    if let Some(role) = session.role() {
        out.push_str(&format!("Role:           {}\n", role));
    }
    if let Some(identity) = session.identity() {
        if let Some(sub) = &identity.sub {
            out.push_str(&format!("Subject:        {}\n", sub));
        }
        if let Some(iat) = identity.issued_at {
            out.push_str(&format!("Issued at:      {}\n", iat.format("%Y-%m-%d %H:%M:%S UTC")));
        }
        if let Some(exp) = identity.expires_at {
            let note = if identity.is_expired(Utc::now()) {
                " (expired)"
            } else {
                ""
            };
            out.push_str(&format!(
                "Expires at:     {}{}\n",
                exp.format("%Y-%m-%d %H:%M:%S UTC"),
                note
            ));
        }
    }
    out.push_str("Account status: Active\n");
    if show_token {
        out.push_str(&format!("Token:          {}\n", session.token()));
    }
    out
}

pub async fn list(ctx: &AppContext, low_stock_only: bool) -> Result<(), LrdError> {
    let session = ctx.session()?;
    let items = ctx.checked(refresh(&ctx.client, &session).await)?;

    let summary = InventorySummary::from_items(&items);
    let shown: Vec<InventoryItem> = items
        .into_iter()
        .filter(|item| !low_stock_only || item.is_low_stock())
        .collect();

    print!("{}", format_table(&shown));
    println!("{}", format_summary(&summary));
    Ok(())
}

pub async fn add(ctx: &AppContext, item: NewItem) -> Result<(), LrdError> {
    let name = item.item_name.clone();
    let items = ctx.mutate(Mutation::Create(item)).await?;
    println!("Added {} ({} items in inventory)", name, items.len());
    Ok(())
}

pub async fn edit(ctx: &AppContext, id: ItemId, update: ItemUpdate) -> Result<(), LrdError> {
    if update.is_empty() {
        return Err(LrdError::InvalidInput(
            "nothing to change: pass at least one of --name, --quantity, --unit, --price"
                .to_string(),
        ));
    }
    ctx.mutate(Mutation::Update { id, update }).await?;
    println!("Updated item #{}", id);
    Ok(())
}

pub async fn remove(ctx: &AppContext, id: ItemId) -> Result<(), LrdError> {
    ctx.mutate(Mutation::Delete(id)).await?;
    println!("Deleted item #{}", id);
    Ok(())
}

pub async fn withdraw(ctx: &AppContext, id: ItemId, amount: String) -> Result<(), LrdError> {
    let session = ctx.session()?;
    let items = ctx.checked(refresh(&ctx.client, &session).await)?;
    let item = items
        .iter()
        .find(|item| item.id == id)
        .ok_or(LrdError::ItemNotFound(id))?;

    let mut draft = WithdrawalDraft::new(item);
    draft.input = amount;
    let withdrawal = draft.validate()?;

    let items = ctx.mutate(Mutation::Withdraw(withdrawal)).await?;
    let remaining = items
        .iter()
        .find(|item| item.id == id)
        .map(|item| item.quantity)
        .unwrap_or(withdrawal.new_quantity());
    println!(
        "Withdrew {} {} from {}. Remaining: {}",
        withdrawal.amount(),
        draft.unit.as_deref().unwrap_or("units"),
        draft.item_name,
        remaining
    );
    Ok(())
}

fn format_price(price: Option<Decimal>) -> String {
    price.map(|p| format!("{:.2}", p)).unwrap_or_else(|| "-".to_string())
}

pub fn format_table(items: &[InventoryItem]) -> String {
    let name_width = items
        .iter()
        .map(|item| item.name.chars().count())
        .max()
        .unwrap_or(0)
        .max(4);

    let mut out = format!(
        "{:>5}  {:<name_width$}  {:>8}  {:<6}  {:>10}  {:>12}\n",
        "ID", "Name", "Qty", "Unit", "Price", "Value"
    );
    for item in items {
        let flag = if item.is_low_stock() { "  LOW" } else { "" };
        out.push_str(&format!(
            "{:>5}  {:<name_width$}  {:>8}  {:<6}  {:>10}  {:>12}{}\n",
            item.id,
            item.name,
            item.quantity,
            item.unit.as_deref().unwrap_or("-"),
            format_price(item.price),
            item.value_display(),
            flag
        ));
    }
    out
}

pub fn format_summary(summary: &InventorySummary) -> String {
    format!(
        "{} items, {} low stock, total value {}",
        summary.total_items,
        summary.low_stock,
        summary.total_value_display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items() -> Vec<InventoryItem> {
        vec![
            InventoryItem {
                id: 1,
                name: "Chicken".to_string(),
                quantity: 50,
                unit: Some("kg".to_string()),
                price: Some(Decimal::new(1205, 1)),
            },
            InventoryItem {
                id: 2,
                name: "Rice".to_string(),
                quantity: 400,
                unit: None,
                price: None,
            },
        ]
    }

    #[test]
    fn test_table_flags_low_stock() {
        let table = format_table(&items());
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("Chicken"));
        assert!(lines[1].contains("120.50"));
        assert!(lines[1].contains("6025.00"));
        assert!(lines[1].ends_with("LOW"));
        assert!(!lines[2].ends_with("LOW"));
    }

    #[test]
    fn test_summary_line() {
        let summary = InventorySummary::from_items(&items());
        assert_eq!(
            format_summary(&summary),
            "2 items, 1 low stock, total value 6025.00"
        );
    }

    fn context(dir: &tempfile::TempDir) -> AppContext {
        AppContext::new(
            InventoryClient::new(),
            FileTokenStore::new(dir.path().join("token")),
        )
    }

    #[test]
    fn test_unauthorized_removes_stored_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");
        std::fs::write(&path, "h.p.s").unwrap();
        let ctx = context(&dir);
        assert!(ctx.session().is_ok());

        let result: Result<(), LrdError> =
            ctx.checked(Err(ApiError::Unauthorized("Token expired".to_string())));

        match result {
            Err(LrdError::SessionEnded(message)) => assert_eq!(message, "Token expired"),
            other => panic!("Expected SessionEnded, got {:?}", other),
        }
        assert!(!path.exists());
        assert!(matches!(ctx.session(), Err(LrdError::NotLoggedIn)));
    }

    #[test]
    fn test_other_api_errors_keep_stored_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");
        std::fs::write(&path, "h.p.s").unwrap();
        let ctx = context(&dir);

        let result: Result<(), LrdError> = ctx.checked(Err(ApiError::Api {
            status: 500,
            message: "Database unavailable".to_string(),
        }));

        assert!(matches!(result, Err(LrdError::Api(_))));
        assert!(path.exists());
        assert_eq!(ctx.checked(Ok(7)).unwrap(), 7);
    }

    #[test]
    fn test_describe_session() {
        // payload {"sub":1,"username":"chef","role":"admin"}
        let session = Session::from_token(
            "eyJhbGciOiJIUzI1NiJ9.eyJzdWIiOjEsInVzZXJuYW1lIjoiY2hlZiIsInJvbGUiOiJhZG1pbiJ9.sig",
        )
        .unwrap();

        let hidden = describe_session(&session, false);
        assert!(hidden.starts_with("Welcome, chef!"));
        assert!(hidden.contains("Role:           admin"));
        assert!(hidden.contains("Account status: Active"));
        assert!(!hidden.contains("sig"));

        let shown = describe_session(&session, true);
        assert!(shown.contains(session.token()));
    }

    #[test]
    fn test_describe_session_without_identity() {
        let session = Session::from_token("x.y.z").unwrap();
        let text = describe_session(&session, false);
        assert!(text.starts_with("Welcome, Guest!"));
        assert!(!text.contains("Role:"));
    }
}
