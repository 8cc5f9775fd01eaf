//! Alert CRUD API.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};

use pricewatch_core::{AlertConfig, Condition};
use pricewatch_store::{AlertStore, Database, StoreError};

pub async fn serve(db: Database, addr: &str) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "alert API listening");
    axum::serve(listener, router(db)).await
}

fn router(db: Database) -> Router {
    Router::new()
        .route("/alerts", post(save_alert))
        .route("/alerts/:user_id", get(list_alerts))
        .route("/alerts/:user_id/:alert_id", delete(delete_alert))
        .with_state(db)
}

#[derive(Debug, Deserialize)]
struct SaveAlertRequest {
    #[serde(rename = "userID")]
    user_id: String,
    symbol: String,
    condition: String,
    price: Option<f64>,
    #[serde(rename = "upperBound")]
    upper_bound: Option<f64>,
    #[serde(rename = "lowerBound")]
    lower_bound: Option<f64>,
    email: String,
}

fn bad_request(message: impl Into<String>) -> (StatusCode, Json<Value>) {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message.into() })))
}

fn internal_error(err: StoreError) -> (StatusCode, Json<Value>) {
    error!(error = %err, "alert store request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Internal Server Error" })),
    )
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, host)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !host.is_empty()
        && host.contains('.')
        && !email.chars().any(char::is_whitespace)
}

async fn save_alert(
    State(db): State<Database>,
    Json(req): Json<SaveAlertRequest>,
) -> (StatusCode, Json<Value>) {
    if req.user_id.trim().is_empty() || req.symbol.trim().is_empty() {
        return bad_request("Missing required fields: userID, symbol");
    }
    if !is_valid_email(&req.email) {
        return bad_request("email must be a valid address");
    }

    let condition =
        match Condition::from_parts(&req.condition, req.price, req.upper_bound, req.lower_bound) {
            Ok(condition) => condition,
            Err(err) => return bad_request(err.to_string()),
        };

    let alert_id = format!(
        "{}-{}-{}",
        req.user_id,
        req.symbol.trim().to_lowercase(),
        Utc::now().timestamp_millis()
    );
    let alert = AlertConfig::new(req.user_id, alert_id, &req.symbol, condition, req.email);

    match db.put(&alert).await {
        Ok(()) => (
            StatusCode::CREATED,
            Json(json!({
                "message": "Alert saved successfully",
                "userID": alert.user_id,
                "alertID": alert.alert_id,
            })),
        ),
        Err(err) => internal_error(err),
    }
}

async fn list_alerts(
    State(db): State<Database>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<AlertConfig>>, (StatusCode, Json<Value>)> {
    match db.list_for_user(&user_id).await {
        Ok(alerts) => Ok(Json(alerts)),
        Err(err) => Err(internal_error(err)),
    }
}

async fn delete_alert(
    State(db): State<Database>,
    Path((user_id, alert_id)): Path<(String, String)>,
) -> (StatusCode, Json<Value>) {
    if user_id.trim().is_empty() || alert_id.trim().is_empty() {
        return bad_request("Missing required fields: userID or alertID");
    }

    match db.delete(&user_id, &alert_id).await {
        Ok(true) => (
            StatusCode::OK,
            Json(json!({ "message": "Alert deleted successfully." })),
        ),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "Alert not found",
                "message": format!("No alert found for userID: {user_id} and alertID: {alert_id}."),
            })),
        ),
        Err(err) => internal_error(err),
    }
}
