use crate::state::{EntityView, Registry, Snapshot};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared state for the host query API
pub struct QueryAppState {
    pub registry: Arc<Registry>,
}

/// Query parameters for host listing
#[derive(Deserialize)]
pub struct HostQueryParams {
    /// Only hosts currently reporting this status
    pub status: Option<i32>,
}

/// Observable fields of one observation
#[derive(Serialize)]
pub struct ObservationResponse {
    pub name: String,
    pub address: Option<String>,
    pub status: i32,
    #[serde(rename = "observedAt")]
    pub observed_at: String,
}

/// Host response
#[derive(Serialize)]
pub struct HostResponse {
    pub id: u64,
    #[serde(flatten)]
    pub current: ObservationResponse,
    pub previous: Option<ObservationResponse>,
    pub changes: Vec<&'static str>,
}

impl From<&Snapshot> for ObservationResponse {
    fn from(snapshot: &Snapshot) -> Self {
        Self {
            name: snapshot.name.clone(),
            address: snapshot.address.map(|a| a.to_string()),
            status: snapshot.status.0,
            observed_at: snapshot.timestamp.to_rfc3339(),
        }
    }
}

impl From<EntityView> for HostResponse {
    fn from(view: EntityView) -> Self {
        Self {
            id: view.current.host_id,
            current: ObservationResponse::from(&view.current),
            previous: view.previous.as_ref().map(ObservationResponse::from),
            changes: view.changes.names(),
        }
    }
}

/// Error response
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Create host query router
pub fn create_query_router(state: Arc<QueryAppState>) -> Router {
    Router::new()
        .route("/api/hosts", get(list_hosts))
        .route("/api/hosts/:id", get(get_host))
        .with_state(state)
}

/// GET /api/hosts - List all hosts, ordered by id
///
/// Query parameters:
/// - `status`: only hosts whose current status equals this value (e.g. ?status=1)
async fn list_hosts(
    State(state): State<Arc<QueryAppState>>,
    Query(params): Query<HostQueryParams>,
) -> Result<Json<Vec<HostResponse>>, QueryError> {
    let mut views: Vec<EntityView> = state
        .registry
        .all()
        .values()
        .map(|entity| entity.view())
        .filter(|view| match params.status {
            Some(status) => view.current.status.0 == status,
            None => true,
        })
        .collect();
    views.sort_by_key(|view| view.current.host_id);

    Ok(Json(views.into_iter().map(HostResponse::from).collect()))
}

/// GET /api/hosts/:id - Get specific host
async fn get_host(
    State(state): State<Arc<QueryAppState>>,
    Path(id): Path<u64>,
) -> Result<Json<HostResponse>, QueryError> {
    let entity = state.registry.get(id).ok_or(QueryError::NotFound)?;
    Ok(Json(HostResponse::from(entity.view())))
}

/// Query error types
#[derive(Debug)]
enum QueryError {
    NotFound,
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            QueryError::NotFound => (StatusCode::NOT_FOUND, "Host not found"),
        };

        let body = Json(ErrorResponse {
            error: error_message.to_string(),
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Snapshot, StatusValue};
    use chrono::Utc;

    fn create_test_state() -> (Arc<Registry>, Arc<QueryAppState>) {
        let registry = Arc::new(Registry::new());
        let state = Arc::new(QueryAppState {
            registry: Arc::clone(&registry),
        });
        (registry, state)
    }

    fn observe(registry: &Registry, id: u64, name: &str, status: StatusValue) {
        registry.upsert(Snapshot::new(
            id,
            Utc::now(),
            name,
            "10.0.0.1".parse().ok(),
            status,
        ));
    }

    #[tokio::test]
    async fn test_list_hosts_no_filter() {
        let (registry, state) = create_test_state();
        observe(&registry, 30, "c", StatusValue::ONLINE);
        observe(&registry, 10, "a", StatusValue::OFFLINE);
        observe(&registry, 20, "b", StatusValue::IN_SESSION);

        let params = HostQueryParams { status: None };
        let result = list_hosts(State(state), Query(params)).await.unwrap();

        let ids: Vec<u64> = result.0.iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![10, 20, 30]);
        assert!(result.0.iter().all(|h| h.previous.is_none()));
        assert!(result.0[0].changes.contains(&"IS_NEW"));
    }

    #[tokio::test]
    async fn test_list_hosts_status_filter() {
        let (registry, state) = create_test_state();
        observe(&registry, 1, "a", StatusValue::ONLINE);
        observe(&registry, 2, "b", StatusValue::OFFLINE);
        observe(&registry, 3, "c", StatusValue::ONLINE);

        let params = HostQueryParams { status: Some(1) };
        let result = list_hosts(State(state), Query(params)).await.unwrap();

        assert_eq!(result.0.len(), 2);
        assert!(result.0.iter().all(|h| h.current.status == 1));
    }

    #[tokio::test]
    async fn test_get_host_with_previous() {
        let (registry, state) = create_test_state();
        observe(&registry, 42, "A", StatusValue::OFFLINE);
        observe(&registry, 42, "A", StatusValue::ONLINE);

        let result = get_host(State(state), Path(42)).await.unwrap();
        assert_eq!(result.0.id, 42);
        assert_eq!(result.0.current.status, 1);
        assert_eq!(result.0.previous.as_ref().unwrap().status, 0);
        assert_eq!(result.0.changes, vec!["CHANGED_STATUS"]);
        assert_eq!(result.0.current.address.as_deref(), Some("10.0.0.1"));
    }

    #[tokio::test]
    async fn test_get_host_not_found() {
        let (_registry, state) = create_test_state();
        let result = get_host(State(state), Path(99)).await;
        assert!(matches!(result, Err(QueryError::NotFound)));
    }
}
