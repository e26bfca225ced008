//! Shared gateway state

use std::sync::Arc;

use market_data::FeedHub;
use matching_engine::Engine;
use types::ids::Symbol;

use crate::responses::ResponseRouter;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub responses: Arc<ResponseRouter>,
    pub hub: Arc<FeedHub>,
    /// Instrument the legacy text protocol trades.
    pub default_symbol: Symbol,
    pub depth_levels: usize,
}
