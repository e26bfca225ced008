//! JSON API handlers

use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::debug;

use market_data::PublicTrade;
use matching_engine::book::order_book::Depth;
use matching_engine::MarketDataSink;
use types::ids::{OrderId, Symbol, UserId};

use crate::error::AppError;
use crate::models::{
    ApiOrderResponse, CancelOrderBody, CancelResult, CountQuery, LevelsQuery, ModifyOrderBody,
    ModifyResultBody, StatusResponse, SubmitOrderBody,
};
use crate::state::AppState;

/// How long a submit handler waits for the worker's response before
/// falling back to a PENDING report.
const RESPONSE_WINDOW: Duration = Duration::from_secs(5);

pub async fn submit_order(
    State(state): State<AppState>,
    Json(body): Json<SubmitOrderBody>,
) -> Result<Json<ApiOrderResponse>, AppError> {
    let request = body.into_request().map_err(AppError::BadRequest)?;
    let order_id = state.engine.submit(request)?;

    match state.responses.claim(order_id, RESPONSE_WINDOW).await {
        Some(response) => Ok(Json(response.into())),
        None => {
            debug!(%order_id, "response window expired, reporting PENDING");
            Ok(Json(ApiOrderResponse::pending(order_id)))
        }
    }
}

pub async fn cancel_order(
    State(state): State<AppState>,
    Path(order_id): Path<u64>,
    Json(body): Json<CancelOrderBody>,
) -> Json<CancelResult> {
    let cancelled = state
        .engine
        .cancel_order(OrderId::new(order_id), UserId::new(body.user_id));
    Json(CancelResult { cancelled })
}

pub async fn modify_order(
    State(state): State<AppState>,
    Path(order_id): Path<u64>,
    Json(body): Json<ModifyOrderBody>,
) -> Json<ModifyResultBody> {
    let modified = state.engine.modify_order(
        OrderId::new(order_id),
        UserId::new(body.user_id),
        body.quantity,
        body.price,
    );
    Json(ModifyResultBody { modified })
}

pub async fn get_depth(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<LevelsQuery>,
) -> Result<Json<Depth>, AppError> {
    let symbol = Symbol::try_new(symbol).ok_or_else(|| AppError::BadRequest("empty symbol".into()))?;
    let levels = query.levels.unwrap_or(state.depth_levels);
    state
        .engine
        .depth(&symbol, levels)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("unknown symbol {symbol}")))
}

pub async fn get_recent_trades(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<CountQuery>,
) -> Result<Json<Vec<PublicTrade>>, AppError> {
    let symbol = Symbol::try_new(symbol).ok_or_else(|| AppError::BadRequest("empty symbol".into()))?;
    if !state.engine.has_symbol(&symbol) {
        return Err(AppError::NotFound(format!("unknown symbol {symbol}")));
    }
    let count = query.count.unwrap_or(100);
    Ok(Json(state.hub.recent_public_trades(&symbol, count)))
}

pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: state.engine.status(),
        queue_len: state.engine.queue_len(),
        stats: state.engine.stats(),
    })
}

pub async fn halt_symbol(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let symbol = Symbol::try_new(symbol).ok_or_else(|| AppError::BadRequest("empty symbol".into()))?;
    if !state.engine.has_symbol(&symbol) {
        return Err(AppError::NotFound(format!("unknown symbol {symbol}")));
    }
    state
        .engine
        .risk()
        .halt_symbol(&symbol, "operator halt", matching_engine::clock::wall_ns());
    state.hub.on_halt(Some(&symbol), "operator halt");
    Ok(Json(serde_json::json!({ "halted": symbol.as_str() })))
}

pub async fn resume_symbol(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let symbol = Symbol::try_new(symbol).ok_or_else(|| AppError::BadRequest("empty symbol".into()))?;
    if !state.engine.has_symbol(&symbol) {
        return Err(AppError::NotFound(format!("unknown symbol {symbol}")));
    }
    state
        .engine
        .risk()
        .resume_symbol(&symbol, matching_engine::clock::wall_ns());
    state.hub.publish(
        market_data::topics::STATUS.to_string(),
        serde_json::json!({ "resumed": symbol.as_str() }).to_string(),
    );
    Ok(Json(serde_json::json!({ "resumed": symbol.as_str() })))
}
