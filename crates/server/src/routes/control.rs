//! Write endpoints: control actions, news injection, manual orders,
//! configuration updates, populate/restore and export.
//!
//! Validation happens here at the boundary; the engine never sees a
//! malformed request.

use std::path::PathBuf;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use news::{NewsCategory, NewsSentiment};
use simulation::{ExternalOrderReport, RestoreSnapshot};
use types::{OrderSide, OrderType, Price};

use crate::error::{AppError, AppResult};
use crate::state::ServerState;

// ---------------------------------------------------------------------
// Control actions
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlAction {
    Start,
    Pause,
    Resume,
    Stop,
    Reset,
    Step,
}

#[derive(Debug, Deserialize)]
pub struct ControlRequest {
    pub action: ControlAction,
    /// Tick count for `step`; defaults to one.
    #[serde(default = "default_step_count")]
    pub count: u32,
}

fn default_step_count() -> u32 {
    1
}

#[derive(Debug, Serialize)]
pub struct AckResponse {
    pub ok: bool,
    pub message: String,
}

fn ack(message: impl Into<String>) -> Json<AckResponse> {
    Json(AckResponse {
        ok: true,
        message: message.into(),
    })
}

/// `POST /control`
pub async fn post_control(
    State(state): State<ServerState>,
    Json(req): Json<ControlRequest>,
) -> AppResult<Json<AckResponse>> {
    let controller = &state.controller;
    match req.action {
        ControlAction::Start => {
            controller.start();
            Ok(ack("started"))
        }
        ControlAction::Pause => {
            controller.pause();
            Ok(ack("paused"))
        }
        ControlAction::Resume => {
            controller.resume();
            Ok(ack("resumed"))
        }
        ControlAction::Stop => {
            controller.stop();
            Ok(ack("stopped"))
        }
        ControlAction::Reset => {
            controller.reset()?;
            Ok(ack("reset"))
        }
        ControlAction::Step => {
            if req.count == 0 {
                return Err(AppError::BadRequest("step count must be positive".into()));
            }
            controller.step(req.count)?;
            Ok(ack(format!("stepped {} ticks", req.count)))
        }
    }
}

// ---------------------------------------------------------------------
// News injection
// ---------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct NewsRequest {
    pub category: NewsCategory,
    pub sentiment: NewsSentiment,
    pub magnitude: f64,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub headline: String,
}

/// `POST /news`
pub async fn post_news(
    State(state): State<ServerState>,
    Json(req): Json<NewsRequest>,
) -> AppResult<Json<AckResponse>> {
    if req.magnitude < 0.0 {
        return Err(AppError::BadRequest("magnitude must be non-negative".into()));
    }
    state.controller.inject_news(
        req.category,
        req.sentiment,
        req.magnitude,
        req.symbol.as_deref(),
        req.industry.as_deref(),
        &req.headline,
    )?;
    Ok(ack("news queued for next tick"))
}

// ---------------------------------------------------------------------
// Manual orders
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderKind {
    Market,
    Limit,
}

#[derive(Debug, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: OrderSide,
    #[serde(rename = "type")]
    pub kind: OrderKind,
    #[serde(default)]
    pub price: Option<f64>,
    pub quantity: u64,
}

/// `POST /orders`: matched immediately against the live book.
pub async fn post_order(
    State(state): State<ServerState>,
    Json(req): Json<OrderRequest>,
) -> AppResult<Json<ExternalOrderReport>> {
    if req.quantity == 0 {
        return Err(AppError::BadRequest("quantity must be positive".into()));
    }

    let order_type = match req.kind {
        OrderKind::Market => OrderType::Market,
        OrderKind::Limit => {
            let price = req
                .price
                .ok_or_else(|| AppError::BadRequest("limit orders require a price".into()))?;
            if price <= 0.0 {
                return Err(AppError::BadRequest("limit price must be positive".into()));
            }
            OrderType::Limit {
                price: Price::from_float(price),
            }
        }
    };

    let report = state
        .controller
        .submit_order(&req.symbol, req.side, order_type, req.quantity)?;
    Ok(Json(report))
}

// ---------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------

/// `POST /config`: hot merge-patch of numeric parameters.
pub async fn post_config(
    State(state): State<ServerState>,
    Json(patch): Json<Value>,
) -> AppResult<Json<AckResponse>> {
    state.controller.patch_config(&patch)?;
    Ok(ack(
        "config updated (hot); use /reinitialize for structural changes",
    ))
}

/// `POST /reinitialize`: cold rebuild from the current configuration.
pub async fn post_reinitialize(
    State(state): State<ServerState>,
) -> AppResult<Json<AckResponse>> {
    state.controller.reinitialize()?;
    Ok(ack("reinitialized"))
}

// ---------------------------------------------------------------------
// Populate / restore / export
// ---------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct PopulateRequest {
    pub days: u32,
    #[serde(default = "default_start_date")]
    pub start_date: String,
}

fn default_start_date() -> String {
    "2025-01-01".to_string()
}

/// `POST /populate`: returns immediately; poll `/state` for completion.
pub async fn post_populate(
    State(state): State<ServerState>,
    Json(req): Json<PopulateRequest>,
) -> AppResult<Json<AckResponse>> {
    if req.days == 0 {
        return Err(AppError::BadRequest("days must be positive".into()));
    }
    state.controller.populate(req.days, &req.start_date)?;
    info!(days = req.days, start = %req.start_date, "populate accepted");
    Ok(ack(format!("populating {} days", req.days)))
}

/// `POST /restore`
pub async fn post_restore(
    State(state): State<ServerState>,
    Json(snapshot): Json<RestoreSnapshot>,
) -> AppResult<Json<AckResponse>> {
    state.controller.restore(&snapshot)?;
    Ok(ack("state restored"))
}

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub path: PathBuf,
    #[serde(default)]
    pub max_ticks: usize,
}

#[derive(Debug, Serialize)]
pub struct ExportResponse {
    pub rows: u64,
    pub path: PathBuf,
}

/// `POST /export`: write the tick history to a CSV archive.
pub async fn post_export(
    State(state): State<ServerState>,
    Json(req): Json<ExportRequest>,
) -> AppResult<Json<ExportResponse>> {
    let rows = state.controller.export_ticks(&req.path, req.max_ticks)?;
    Ok(Json(ExportResponse {
        rows,
        path: req.path,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_request_parsing() {
        let req: ControlRequest = serde_json::from_str(r#"{"action":"start"}"#).unwrap();
        assert_eq!(req.action, ControlAction::Start);
        assert_eq!(req.count, 1);

        let req: ControlRequest =
            serde_json::from_str(r#"{"action":"step","count":25}"#).unwrap();
        assert_eq!(req.action, ControlAction::Step);
        assert_eq!(req.count, 25);
    }

    #[test]
    fn test_order_request_parsing() {
        let req: OrderRequest = serde_json::from_str(
            r#"{"symbol":"NTX","side":"BUY","type":"LIMIT","price":101.5,"quantity":10}"#,
        )
        .unwrap();
        assert_eq!(req.side, OrderSide::Buy);
        assert_eq!(req.kind, OrderKind::Limit);
        assert_eq!(req.price, Some(101.5));
    }

    #[test]
    fn test_news_request_parsing() {
        let req: NewsRequest = serde_json::from_str(
            r#"{"category":"company","sentiment":"NEGATIVE","magnitude":0.4,"symbol":"NTX"}"#,
        )
        .unwrap();
        assert_eq!(req.category, NewsCategory::Company);
        assert_eq!(req.sentiment, NewsSentiment::Negative);
        assert_eq!(req.symbol.as_deref(), Some("NTX"));
    }
}
