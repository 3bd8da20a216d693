/// API routes and handlers
pub mod admin;
pub mod checkout;
pub mod devices;
pub mod payments;

use crate::context::AppContext;
use axum::Router;

/// Build API routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .merge(checkout::routes())
        .merge(payments::routes())
        .merge(devices::routes())
        .merge(admin::routes())
}
