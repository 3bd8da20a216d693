/// Payment confirmation intake
///
/// The webhook layer upstream is expected to have parsed and verified the
/// provider payload; this endpoint consumes the resulting event.
use crate::{
    codes::manager::{PaymentEvent, PaymentOutcome},
    context::AppContext,
    error::LockResult,
};
use axum::{extract::State, routing::post, Json, Router};

/// Build payment routes
pub fn routes() -> Router<AppContext> {
    Router::new().route("/api/payments/confirm", post(confirm_payment))
}

/// Handle a confirmed payment and issue an access code
async fn confirm_payment(
    State(ctx): State<AppContext>,
    Json(event): Json<PaymentEvent>,
) -> LockResult<Json<PaymentOutcome>> {
    tracing::info!("confirm_payment: payment {}", event.payment_id);
    let outcome = ctx.code_manager.confirm_payment(event).await?;
    Ok(Json(outcome))
}
