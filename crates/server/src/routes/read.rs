//! Read endpoints: every handler takes the controller's shared lock for the
//! duration of one query.

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures::stream::Stream;
use serde::Deserialize;

use sim_core::CandleInterval;
use simulation::{
    AgentSummary, InstrumentView, SimConfig, SimulationMetrics, StateView,
};
use types::{BookSnapshot, Candle, Symbol, Trade};

use crate::error::AppResult;
use crate::state::ServerState;

/// `GET /state`
pub async fn get_state(State(state): State<ServerState>) -> Json<StateView> {
    Json(state.controller.state())
}

/// `GET /instruments`
pub async fn get_instruments(State(state): State<ServerState>) -> Json<Vec<InstrumentView>> {
    Json(state.controller.instruments())
}

/// `GET /agents`
pub async fn get_agents(State(state): State<ServerState>) -> Json<Vec<AgentSummary>> {
    Json(state.controller.agent_summaries())
}

/// `GET /metrics`
pub async fn get_metrics(State(state): State<ServerState>) -> Json<SimulationMetrics> {
    Json(state.controller.metrics())
}

/// `GET /config`
pub async fn get_config(State(state): State<ServerState>) -> Json<SimConfig> {
    Json(state.controller.config())
}

#[derive(Debug, Deserialize)]
pub struct DepthQuery {
    #[serde(default = "default_depth")]
    pub depth: usize,
}

fn default_depth() -> usize {
    10
}

/// `GET /orderbook/{symbol}`
pub async fn get_order_book(
    State(state): State<ServerState>,
    Path(symbol): Path<String>,
    Query(query): Query<DepthQuery>,
) -> AppResult<Json<BookSnapshot>> {
    let snapshot = state.controller.order_book(&symbol, query.depth)?;
    Ok(Json(snapshot))
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    100
}

/// `GET /trades`
pub async fn get_trades(
    State(state): State<ServerState>,
    Query(query): Query<LimitQuery>,
) -> Json<Vec<Trade>> {
    Json(state.controller.recent_trades(query.limit))
}

#[derive(Debug, Deserialize)]
pub struct CountQuery {
    #[serde(default = "default_count")]
    pub count: usize,
}

fn default_count() -> usize {
    5
}

/// `GET /news/recent`
pub async fn get_news_recent(
    State(state): State<ServerState>,
    Query(query): Query<CountQuery>,
) -> Json<Vec<news::NewsEvent>> {
    Json(state.controller.recent_news(query.count))
}

/// `GET /news/history`
pub async fn get_news_history(State(state): State<ServerState>) -> Json<Vec<news::NewsEvent>> {
    Json(state.controller.news_history())
}

#[derive(Debug, Deserialize)]
pub struct CandleQuery {
    #[serde(default = "default_interval")]
    pub interval: String,
    #[serde(default)]
    pub since: u64,
    #[serde(default = "default_candle_limit")]
    pub limit: usize,
}

fn default_interval() -> String {
    "1m".to_string()
}

fn default_candle_limit() -> usize {
    500
}

/// `GET /candles/{symbol}`
pub async fn get_candles(
    State(state): State<ServerState>,
    Path(symbol): Path<String>,
    Query(query): Query<CandleQuery>,
) -> AppResult<Json<Vec<Candle>>> {
    let interval = CandleInterval::parse(&query.interval);
    let candles = state
        .controller
        .candles(&symbol, interval, query.since, query.limit)?;
    Ok(Json(candles))
}

/// `GET /candles`: bulk fetch for all symbols since a time cursor.
pub async fn get_candles_bulk(
    State(state): State<ServerState>,
    Query(query): Query<CandleQuery>,
) -> Json<BTreeMap<Symbol, Vec<Candle>>> {
    let interval = CandleInterval::parse(&query.interval);
    Json(state.controller.candles_bulk(interval, query.since))
}

/// `GET /stream`: long-lived SSE subscription that polls state at a fixed
/// interval under the shared lock.
pub async fn stream(
    State(state): State<ServerState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let interval = Duration::from_millis(state.stream_interval_ms);

    let stream = futures::stream::unfold(state, move |state| async move {
        tokio::time::sleep(interval).await;
        let view = state.controller.state();
        let event = Event::default().event("state").json_data(&view).ok()?;
        Some((Ok(event), state))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
