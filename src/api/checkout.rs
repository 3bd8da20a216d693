/// Day-pass checkout endpoint
use crate::{
    codes::manager::{CheckoutOutcome, CheckoutRequest},
    context::AppContext,
    error::LockResult,
    store::Purchase,
};
use axum::{extract::State, routing::post, Json, Router};
use serde::Serialize;

/// Build checkout routes
pub fn routes() -> Router<AppContext> {
    Router::new().route("/api/day-pass/checkout", post(checkout))
}

/// Checkout response body
#[derive(Debug, Serialize)]
struct CheckoutResponse {
    success: bool,
    purchase: Purchase,
    access_codes: Vec<crate::codes::manager::IssuedCode>,
    notifications: Vec<crate::codes::manager::CodeNotification>,
    /// Store flushes failed during this request; records exist in memory
    /// but durability is not guaranteed
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    storage_degraded: bool,
}

/// Process a day-pass checkout
async fn checkout(
    State(ctx): State<AppContext>,
    Json(request): Json<CheckoutRequest>,
) -> LockResult<Json<CheckoutResponse>> {
    tracing::info!(
        "checkout: {} dates, {} adults, {} children",
        request.selected_dates.len(),
        request.adults.len(),
        request.children
    );

    let CheckoutOutcome {
        purchase,
        codes,
        notifications,
    } = ctx.code_manager.checkout_day_passes(request).await?;

    Ok(Json(CheckoutResponse {
        success: true,
        purchase,
        access_codes: codes,
        notifications,
        storage_degraded: ctx.store.is_degraded(),
    }))
}
