//! API route table

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/orders", post(handlers::submit_order))
        .route("/orders/:order_id", delete(handlers::cancel_order))
        .route("/orders/:order_id", put(handlers::modify_order))
        .route("/depth/:symbol", get(handlers::get_depth))
        .route("/trades/:symbol", get(handlers::get_recent_trades))
        .route("/status", get(handlers::get_status))
        .route("/admin/halt/:symbol", post(handlers::halt_symbol))
        .route("/admin/resume/:symbol", post(handlers::resume_symbol))
        .with_state(state)
}
