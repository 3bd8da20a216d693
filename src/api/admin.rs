/// Operator-facing endpoints: listings, summaries, revocation, bulk clear
///
/// Read handlers capture `Utc::now()` exactly once and classify a single
/// store snapshot against it, so each response is internally consistent.
use crate::{
    codes::classifier::{self, PersonAccess},
    codes::manager::RevokedCode,
    context::AppContext,
    error::{LockError, LockResult},
    gateway::GatewayCode,
    store::{AccessCode, ClearSummary, Purchase},
};
use axum::{
    extract::{Path, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::Serialize;

/// Build admin routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/admin/purchases", get(list_purchases))
        .route("/api/admin/purchases/:id", get(get_purchase))
        .route("/api/admin/access-codes", get(list_access_codes))
        .route("/api/admin/access-codes/active", get(list_active_codes))
        .route("/api/admin/access-codes/by-date/:date", get(list_codes_by_date))
        .route("/api/admin/access-codes/:id", get(get_access_code))
        .route("/api/admin/access-codes/:id", delete(revoke_access_code))
        .route("/api/admin/access-codes/:id/provider", get(get_provider_code))
        .route("/api/admin/people-with-access", get(people_with_access))
        .route("/api/admin/clear", post(clear_all))
        .route("/api/admin/email-config", get(get_email_config))
        .route("/api/admin/email-config", put(set_email_config))
}

/// All purchases, newest first
async fn list_purchases(State(ctx): State<AppContext>) -> Json<Vec<Purchase>> {
    Json(ctx.store.list_purchases().await)
}

/// A purchase together with its access codes
#[derive(Debug, Serialize)]
struct PurchaseDetail {
    purchase: Purchase,
    access_codes: Vec<AccessCode>,
}

async fn get_purchase(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> LockResult<Json<PurchaseDetail>> {
    let purchase = ctx.store.get_purchase(&id).await?;
    let access_codes = ctx.store.list_access_codes_by_purchase(&id).await;
    Ok(Json(PurchaseDetail {
        purchase,
        access_codes,
    }))
}

/// Every stored access code
async fn list_access_codes(State(ctx): State<AppContext>) -> Json<Vec<AccessCode>> {
    Json(ctx.store.list_access_codes().await)
}

/// Codes valid right now
async fn list_active_codes(State(ctx): State<AppContext>) -> Json<Vec<AccessCode>> {
    let now = Utc::now();
    let snapshot = ctx.store.list_access_codes().await;
    let active = classifier::active_codes(&snapshot, now)
        .into_iter()
        .cloned()
        .collect();
    Json(active)
}

/// Codes for one calendar date (YYYY-MM-DD)
async fn list_codes_by_date(
    State(ctx): State<AppContext>,
    Path(date): Path<String>,
) -> LockResult<Json<Vec<AccessCode>>> {
    let date: NaiveDate = date
        .parse()
        .map_err(|_| LockError::Validation(format!("invalid date: {}", date)))?;
    Ok(Json(ctx.store.list_access_codes_by_date(date).await))
}

async fn get_access_code(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> LockResult<Json<AccessCode>> {
    Ok(Json(ctx.store.get_access_code(&id).await?))
}

/// Provider-side view of a stored code, for verifying the lock actually
/// carries it
async fn get_provider_code(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> LockResult<Json<GatewayCode>> {
    let code = ctx.store.get_access_code(&id).await?;
    let gateway_code = ctx.gateway.get_code(&code.provider_code_id).await?;
    Ok(Json(gateway_code))
}

/// Revoke a code: remove locally and best-effort remove from the lock
async fn revoke_access_code(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> LockResult<Json<RevokedCode>> {
    let revoked = ctx.code_manager.revoke_code(&id).await?;
    Ok(Json(revoked))
}

/// Deduplicated person-level access summaries for the dashboard
async fn people_with_access(State(ctx): State<AppContext>) -> Json<Vec<PersonAccess>> {
    let now = Utc::now();
    let snapshot = ctx.store.list_access_codes().await;
    Json(classifier::people_with_access(&snapshot, now))
}

/// Delete every purchase and access code, keeping notification config
async fn clear_all(State(ctx): State<AppContext>) -> Json<ClearSummary> {
    let summary = ctx.store.clear_all().await;
    tracing::warn!(
        "Cleared store: {} purchases, {} access codes",
        summary.purchases_deleted,
        summary.access_codes_deleted
    );
    Json(summary)
}

async fn get_email_config(State(ctx): State<AppContext>) -> Json<serde_json::Value> {
    Json(ctx.store.get_email_config().await.unwrap_or(serde_json::Value::Null))
}

async fn set_email_config(
    State(ctx): State<AppContext>,
    Json(config): Json<serde_json::Value>,
) -> Json<serde_json::Value> {
    ctx.store.set_email_config(config.clone()).await;
    Json(config)
}
