/// Device endpoints proxied to the lock gateway
use crate::{
    context::AppContext,
    error::LockResult,
    gateway::{ActionAttempt, LockDevice},
};
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};

/// Build device routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/devices", get(list_devices))
        .route("/api/devices/:id/lock", post(lock_device))
        .route("/api/devices/:id/unlock", post(unlock_device))
}

/// List supported lock devices
async fn list_devices(State(ctx): State<AppContext>) -> LockResult<Json<Vec<LockDevice>>> {
    let devices = ctx.gateway.list_devices().await?;
    Ok(Json(devices))
}

/// Lock a device
async fn lock_device(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> LockResult<Json<ActionAttempt>> {
    let attempt = ctx.gateway.lock_device(&id).await?;
    Ok(Json(attempt))
}

/// Unlock a device
async fn unlock_device(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> LockResult<Json<ActionAttempt>> {
    let attempt = ctx.gateway.unlock_device(&id).await?;
    Ok(Json(attempt))
}
