/// Lock gateway: the external service brokering physical lock hardware
///
/// Modeled as one capability with two backends selected at startup: a
/// network-backed Seam client and an in-memory demo stub. The lifecycle
/// engine's code path is identical regardless of which is active, and it
/// treats every gateway failure as soft: local records are still created
/// or deleted and the failure travels with the result.
pub mod demo;
pub mod seam;

pub use demo::DemoGateway;
pub use seam::SeamGateway;

use crate::error::LockResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A lock device known to the gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockDevice {
    pub device_id: String,
    pub name: String,
    pub device_type: String,
    pub manufacturer: String,
}

/// Provider-side view of an access code
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayCode {
    pub provider_code_id: String,
    pub device_id: String,
    pub name: String,
    pub code: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

/// Outcome of a lock/unlock action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionAttempt {
    pub action_attempt_id: String,
    pub status: String,
    pub action_type: String,
}

/// Gateway capability implemented by [`SeamGateway`] and [`DemoGateway`]
#[async_trait]
pub trait LockGateway: Send + Sync {
    /// Program a PIN onto a device for the given window; returns the
    /// provider-side handle
    async fn create_code(
        &self,
        device_id: &str,
        name: &str,
        code: &str,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> LockResult<String>;

    /// Remove a previously created code from its device
    async fn delete_code(&self, provider_code_id: &str) -> LockResult<()>;

    /// Fetch the provider-side state of a code
    async fn get_code(&self, provider_code_id: &str) -> LockResult<GatewayCode>;

    /// List devices of the supported manufacturer
    async fn list_devices(&self) -> LockResult<Vec<LockDevice>>;

    /// Lock a device (admin convenience, best-effort)
    async fn lock_device(&self, device_id: &str) -> LockResult<ActionAttempt>;

    /// Unlock a device (admin convenience, best-effort)
    async fn unlock_device(&self, device_id: &str) -> LockResult<ActionAttempt>;
}

/// Locally synthesized handle recorded when the gateway call failed, so
/// the store always carries some provider reference
pub fn placeholder_handle() -> String {
    format!("local_{}", Uuid::new_v4().simple())
}
