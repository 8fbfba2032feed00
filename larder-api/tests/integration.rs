//! End-to-end tests for the inventory client.
//!
//! Each test starts an in-process stub of the inventory API on an ephemeral
//! port and drives it through `InventoryClient`.

use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use larder_api::{
    ApiError, Guard, Inventory, InventoryClient, ItemUpdate, MemoryTokenStore, Mutation, NewItem,
    TokenStore, WithdrawalDraft, apply, end_session, refresh, require_session, start_session,
};
use rust_decimal::Decimal;
use serde_json::{Value, json};

// header {"alg":"HS256"}, payload {"sub":1,"username":"chef","role":"admin"}
const VALID_TOKEN: &str =
    "eyJhbGciOiJIUzI1NiJ9.eyJzdWIiOjEsInVzZXJuYW1lIjoiY2hlZiIsInJvbGUiOiJhZG1pbiJ9.sig";

#[derive(Default)]
struct StubState {
    items: Vec<Value>,
    next_id: i64,
    requests: Vec<String>,
}

type Shared = Arc<Mutex<StubState>>;

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {}", VALID_TOKEN))
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "detail": "Could not validate credentials" })),
    )
        .into_response()
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "detail": "Item not found" })),
    )
        .into_response()
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["username"] == "chef" && body["password"] == "secret" {
        Json(json!({ "access_token": VALID_TOKEN, "token_type": "bearer" })).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "Incorrect username or password" })),
        )
            .into_response()
    }
}

async fn list(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut state = state.lock().unwrap();
    state.requests.push("GET /inventory".to_string());
    Json(Value::Array(state.items.clone())).into_response()
}

async fn create(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut state = state.lock().unwrap();
    state.requests.push(format!("POST /inventory {}", body));
    state.next_id += 1;
    body["id"] = json!(state.next_id);
    state.items.push(body.clone());
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn update(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut state = state.lock().unwrap();
    state.requests.push(format!("PUT /inventory/{} {}", id, body));
    let Some(item) = state.items.iter_mut().find(|i| i["id"] == json!(id)) else {
        return not_found();
    };
    if let Some(fields) = body.as_object() {
        for (key, value) in fields {
            item[key] = value.clone();
        }
    }
    Json(item.clone()).into_response()
}

async fn delete(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut state = state.lock().unwrap();
    state.requests.push(format!("DELETE /inventory/{}", id));
    let before = state.items.len();
    state.items.retain(|i| i["id"] != json!(id));
    if state.items.len() == before {
        return not_found();
    }
    Json(json!({ "message": "Item deleted" })).into_response()
}

/// Starts the stub API and returns a client pointed at it.
async fn start_stub() -> (InventoryClient, Shared) {
    let state: Shared = Arc::new(Mutex::new(StubState::default()));
    let app = Router::new()
        .route("/auth/login", post(login))
        .route("/inventory", get(list).post(create))
        .route("/inventory/{id}", put(update).delete(delete))
        .with_state(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (InventoryClient::with_base_url(format!("http://{}", addr)), state)
}

fn chicken() -> NewItem {
    NewItem {
        item_name: "Chicken".to_string(),
        quantity: 50,
        unit: Some("kg".to_string()),
        price: Some(Decimal::new(1205, 1)),
    }
}

#[tokio::test]
async fn login_creates_session() {
    let (client, _) = start_stub().await;
    let store = MemoryTokenStore::new();

    let token = client.login("chef", "secret").await.unwrap();
    let session = start_session(&store, token).unwrap();

    assert_eq!(session.display_name(), "chef");
    assert_eq!(session.role(), Some("admin"));
    assert_eq!(store.load().unwrap().as_deref(), Some(VALID_TOKEN));
}

#[tokio::test]
async fn login_failure_reports_server_message() {
    let (client, _) = start_stub().await;

    let err = client.login("chef", "wrong").await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(err.user_message(), "Incorrect username or password");
}

#[tokio::test]
async fn create_then_list_round_trip() {
    let (client, _) = start_stub().await;
    let store = MemoryTokenStore::with_token(VALID_TOKEN);
    let Guard::Authenticated(session) = require_session(&store).unwrap() else {
        panic!("Expected a session");
    };

    let items = apply(&client, &session, Mutation::Create(chicken()))
        .await
        .unwrap();

    assert_eq!(items.len(), 1);
    let item = &items[0];
    assert_eq!(item.id, 1);
    assert_eq!(item.name, "Chicken");
    assert_eq!(item.quantity, 50);
    assert_eq!(item.unit.as_deref(), Some("kg"));
    assert_eq!(item.price, Some(Decimal::new(1205, 1)));
}

#[tokio::test]
async fn withdrawal_updates_quantity_only() {
    let (client, state) = start_stub().await;
    let session = start_session(&MemoryTokenStore::new(), VALID_TOKEN).unwrap();
    let items = apply(&client, &session, Mutation::Create(chicken()))
        .await
        .unwrap();

    let mut draft = WithdrawalDraft::new(&items[0]);
    draft.input = "20".to_string();
    let withdrawal = draft.validate().unwrap();
    let items = apply(&client, &session, Mutation::Withdraw(withdrawal))
        .await
        .unwrap();

    assert_eq!(items[0].quantity, 30);
    let requests = state.lock().unwrap().requests.clone();
    assert_eq!(requests[2], r#"PUT /inventory/1 {"quantity":30}"#);
    assert_eq!(requests[3], "GET /inventory");
}

#[tokio::test]
async fn over_withdrawal_never_reaches_the_server() {
    let (client, state) = start_stub().await;
    let session = start_session(&MemoryTokenStore::new(), VALID_TOKEN).unwrap();
    let items = apply(&client, &session, Mutation::Create(chicken()))
        .await
        .unwrap();
    let sent_before = state.lock().unwrap().requests.len();

    let mut draft = WithdrawalDraft::new(&items[0]);
    draft.input = "51".to_string();

    let err = draft.validate().unwrap_err();
    assert_eq!(
        err.to_string(),
        "Cannot withdraw more than available. Available: 50 kg"
    );
    assert_eq!(state.lock().unwrap().requests.len(), sent_before);
}

#[tokio::test]
async fn update_and_delete_refetch_everything() {
    let (client, _) = start_stub().await;
    let session = start_session(&MemoryTokenStore::new(), VALID_TOKEN).unwrap();
    let mut inventory = Inventory::new();

    for mutation in [
        Mutation::Create(chicken()),
        Mutation::Create(NewItem {
            item_name: "Basil".to_string(),
            quantity: 300,
            unit: None,
            price: None,
        }),
    ] {
        assert!(inventory.try_begin());
        inventory
            .complete(apply(&client, &session, mutation).await)
            .unwrap();
    }
    assert_eq!(inventory.items().len(), 2);
    assert_eq!(inventory.low_stock().count(), 1);
    assert_eq!(inventory.summary().total_value_display(), "6025.00");

    let rename = ItemUpdate {
        item_name: Some("Thai basil".to_string()),
        ..ItemUpdate::default()
    };
    inventory.try_begin();
    inventory
        .complete(apply(&client, &session, Mutation::Update { id: 2, update: rename }).await)
        .unwrap();
    assert_eq!(inventory.get(2).unwrap().name, "Thai basil");

    inventory.try_begin();
    inventory
        .complete(apply(&client, &session, Mutation::Delete(1)).await)
        .unwrap();
    assert!(inventory.get(1).is_none());
    assert_eq!(inventory.items().len(), 1);
}

#[tokio::test]
async fn server_errors_surface_verbatim() {
    let (client, _) = start_stub().await;
    let session = start_session(&MemoryTokenStore::new(), VALID_TOKEN).unwrap();

    let err = apply(
        &client,
        &session,
        Mutation::Update {
            id: 99,
            update: ItemUpdate::quantity(1),
        },
    )
    .await
    .unwrap_err();

    match err {
        ApiError::Api { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Item not found");
        }
        other => panic!("Expected API error, got {:?}", other),
    }
}

#[tokio::test]
async fn unauthorized_response_ends_session() {
    let (client, _) = start_stub().await;
    // Well-formed but unknown to the server: passes the guard, fails at the API.
    let stale = "eyJhbGciOiJIUzI1NiJ9.eyJ1c2VybmFtZSI6Im9sZCJ9.sig";
    let store = MemoryTokenStore::with_token(stale);
    let Guard::Authenticated(session) = require_session(&store).unwrap() else {
        panic!("Expected a session");
    };

    let err = refresh(&client, &session).await.unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(err.user_message(), "Could not validate credentials");

    end_session(&store).unwrap();
    assert!(matches!(require_session(&store).unwrap(), Guard::Login));
}
