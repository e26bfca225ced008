//! API request and response bodies

use serde::{Deserialize, Serialize};

use matching_engine::stats::StatsSnapshot;
use matching_engine::EngineStatus;
use types::ids::{OrderId, Symbol, UserId};
use types::numeric::{Price, Quantity};
use types::order::{OrderKind, OrderRequest, OrderResponse, OrderStatus, Side};

/// Body of `POST /orders`.
///
/// The order kind is an internally tagged `type` field, so an iceberg
/// submission reads `{"type": "ICEBERG", "peak": "100", ...}`.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitOrderBody {
    pub user_id: u64,
    pub symbol: String,
    pub side: Side,
    #[serde(flatten)]
    pub kind: OrderKind,
    #[serde(default)]
    pub price: Option<Price>,
    pub quantity: Quantity,
    #[serde(default)]
    pub client_order_id: Option<String>,
}

impl SubmitOrderBody {
    pub fn into_request(self) -> Result<OrderRequest, String> {
        let symbol =
            Symbol::try_new(self.symbol).ok_or_else(|| "symbol must not be empty".to_string())?;
        Ok(OrderRequest {
            user_id: UserId::new(self.user_id),
            symbol,
            side: self.side,
            kind: self.kind,
            price: self.price,
            quantity: self.quantity,
            client_order_id: self.client_order_id,
        })
    }
}

/// Body of `DELETE /orders/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct CancelOrderBody {
    pub user_id: u64,
}

/// Body of `PUT /orders/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ModifyOrderBody {
    pub user_id: u64,
    pub quantity: Quantity,
    #[serde(default)]
    pub price: Option<Price>,
}

/// Terminal order report returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct ApiOrderResponse {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub filled_qty: Quantity,
    pub avg_price: Option<Price>,
    pub message: String,
}

impl From<OrderResponse> for ApiOrderResponse {
    fn from(response: OrderResponse) -> Self {
        Self {
            order_id: response.order_id,
            status: response.status,
            filled_qty: response.filled_quantity,
            avg_price: response.average_price,
            message: response.message,
        }
    }
}

/// Accepted-but-still-processing report (response window expired).
impl ApiOrderResponse {
    pub fn pending(order_id: OrderId) -> Self {
        Self {
            order_id,
            status: OrderStatus::Pending,
            filled_qty: Quantity::ZERO,
            avg_price: None,
            message: "order accepted".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CancelResult {
    pub cancelled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModifyResultBody {
    pub modified: bool,
}

/// `GET /status` body.
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub status: EngineStatus,
    pub queue_len: usize,
    pub stats: StatsSnapshot,
}

/// Query for depth and trade endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct LevelsQuery {
    #[serde(default)]
    pub levels: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CountQuery {
    #[serde(default)]
    pub count: Option<usize>,
}
