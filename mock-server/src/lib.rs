use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::{Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;
use uuid::Uuid;

/// Field holding a record's identifier.
pub const ID_FIELD: &str = "_id";

/// Field that makes the server answer with the given status instead of
/// storing the record.
pub const STATUS_FIELD: &str = "_status";

pub type Record = Map<String, Value>;

#[derive(Default)]
struct Inner {
    collections: HashMap<String, HashMap<String, Record>>,
    arrivals: Vec<String>,
}

/// Shared in-memory state. Clones point at the same records.
#[derive(Clone, Default)]
pub struct Store(Arc<RwLock<Inner>>);

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every request seen so far as `"METHOD /path"`, in arrival order.
    pub async fn arrivals(&self) -> Vec<String> {
        self.0.read().await.arrivals.clone()
    }

    pub async fn get(&self, collection: &str, id: &str) -> Option<Record> {
        let inner = self.0.read().await;
        inner.collections.get(collection)?.get(id).cloned()
    }

    pub async fn len(&self, collection: &str) -> usize {
        let inner = self.0.read().await;
        inner.collections.get(collection).map_or(0, HashMap::len)
    }
}

pub fn app() -> Router {
    router(Store::new())
}

pub fn router(store: Store) -> Router {
    Router::new()
        .route("/{collection}", post(create_record).get(list_records))
        .route("/{collection}/{id}", post(update_record).delete(delete_record))
        .layer(middleware::from_fn_with_state(store.clone(), record_arrival))
        .with_state(store)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with(listener, Store::new()).await
}

pub async fn run_with(listener: TcpListener, store: Store) -> Result<(), std::io::Error> {
    axum::serve(listener, router(store)).await
}

async fn record_arrival(State(store): State<Store>, request: Request, next: Next) -> Response {
    let arrival = format!("{} {}", request.method(), request.uri().path());
    debug!(%arrival, "request received");
    store.0.write().await.arrivals.push(arrival);
    next.run(request).await
}

/// Status requested through `STATUS_FIELD`, if any.
fn injected_status(record: &Record) -> Option<StatusCode> {
    let code = record.get(STATUS_FIELD)?.as_u64()?;
    StatusCode::from_u16(u16::try_from(code).ok()?).ok()
}

fn id_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

async fn list_records(
    State(store): State<Store>,
    Path(collection): Path<String>,
) -> Json<Vec<Record>> {
    let inner = store.0.read().await;
    let records = inner
        .collections
        .get(&collection)
        .map(|c| c.values().cloned().collect())
        .unwrap_or_default();
    Json(records)
}

async fn create_record(
    State(store): State<Store>,
    Path(collection): Path<String>,
    Json(mut record): Json<Record>,
) -> Response {
    if let Some(status) = injected_status(&record) {
        return (status, Json(record)).into_response();
    }
    let id = match record.get(ID_FIELD).and_then(id_of) {
        Some(id) => id,
        None => {
            let id = Uuid::new_v4().to_string();
            record.insert(ID_FIELD.to_string(), Value::String(id.clone()));
            id
        }
    };
    store
        .0
        .write()
        .await
        .collections
        .entry(collection)
        .or_default()
        .insert(id, record.clone());
    (StatusCode::CREATED, Json(record)).into_response()
}

async fn update_record(
    State(store): State<Store>,
    Path((collection, id)): Path<(String, String)>,
    Json(input): Json<Record>,
) -> Response {
    if let Some(status) = injected_status(&input) {
        return (status, Json(input)).into_response();
    }
    let mut inner = store.0.write().await;
    let Some(record) = inner.collections.get_mut(&collection).and_then(|c| c.get_mut(&id)) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    for (key, value) in input {
        record.insert(key, value);
    }
    Json(record.clone()).into_response()
}

async fn delete_record(
    State(store): State<Store>,
    Path((collection, id)): Path<(String, String)>,
) -> StatusCode {
    let mut inner = store.0.write().await;
    inner
        .collections
        .get_mut(&collection)
        .and_then(|c| c.remove(&id))
        .map(|_| StatusCode::NO_CONTENT)
        .unwrap_or(StatusCode::NOT_FOUND)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn injected_status_reads_status_field() {
        assert_eq!(
            injected_status(&record(json!({"_status": 500}))),
            Some(StatusCode::INTERNAL_SERVER_ERROR)
        );
        assert_eq!(injected_status(&record(json!({"_status": "500"}))), None);
        assert_eq!(injected_status(&record(json!({"name": "x"}))), None);
    }

    #[test]
    fn id_accepts_strings_and_numbers() {
        assert_eq!(id_of(&json!("a1")), Some("a1".to_string()));
        assert_eq!(id_of(&json!(7)), Some("7".to_string()));
        assert_eq!(id_of(&json!(null)), None);
        assert_eq!(id_of(&json!([1])), None);
    }

    #[tokio::test]
    async fn empty_store_has_no_arrivals() {
        let store = Store::new();
        assert!(store.arrivals().await.is_empty());
        assert_eq!(store.len("items").await, 0);
        assert!(store.get("items", "1").await.is_none());
    }
}
