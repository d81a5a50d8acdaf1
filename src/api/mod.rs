// HTTP status surface over the registry and scheduler

pub mod admin;
pub mod query;

pub use admin::{create_admin_router, AdminAppState};
pub use query::{create_query_router, QueryAppState};

use crate::watch::Scheduler;
use axum::Router;
use std::sync::Arc;

/// Full API router for one scheduler
pub fn create_router(scheduler: Arc<Scheduler>, admin_token: Option<String>) -> Router {
    let query = create_query_router(Arc::new(QueryAppState {
        registry: Arc::clone(scheduler.registry()),
    }));
    let admin = create_admin_router(AdminAppState {
        scheduler,
        admin_token,
    });
    query.merge(admin)
}
