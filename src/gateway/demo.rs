/// In-memory demo gateway
///
/// Active when no gateway API key is configured. Keeps created codes in
/// memory and serves two seeded devices so checkout and the admin surface
/// work end to end without reachable lock hardware.
use crate::error::{LockError, LockResult};
use crate::gateway::{ActionAttempt, GatewayCode, LockDevice, LockGateway};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

/// Demo gateway backend
pub struct DemoGateway {
    devices: Vec<LockDevice>,
    codes: Mutex<Vec<GatewayCode>>,
}

impl DemoGateway {
    /// Create a demo gateway with the standard seeded devices
    pub fn new() -> Self {
        Self {
            devices: vec![
                LockDevice {
                    device_id: "demo_device_001".to_string(),
                    name: "Front Door Lock".to_string(),
                    device_type: "kwikset_lock".to_string(),
                    manufacturer: "kwikset".to_string(),
                },
                LockDevice {
                    device_id: "demo_device_002".to_string(),
                    name: "Back Door Lock".to_string(),
                    device_type: "kwikset_lock".to_string(),
                    manufacturer: "kwikset".to_string(),
                },
            ],
            codes: Mutex::new(Vec::new()),
        }
    }

    /// Number of codes currently held (test observability)
    pub async fn code_count(&self) -> usize {
        self.codes.lock().await.len()
    }
}

impl Default for DemoGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LockGateway for DemoGateway {
    async fn create_code(
        &self,
        device_id: &str,
        name: &str,
        code: &str,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> LockResult<String> {
        let provider_code_id = format!("demo_code_{}", Uuid::new_v4().simple());
        let gateway_code = GatewayCode {
            provider_code_id: provider_code_id.clone(),
            device_id: device_id.to_string(),
            name: name.to_string(),
            code: code.to_string(),
            starts_at,
            ends_at,
        };

        tracing::info!(
            "DEMO gateway: created code {} on {} ({} - {})",
            provider_code_id,
            device_id,
            starts_at,
            ends_at
        );
        self.codes.lock().await.push(gateway_code);
        Ok(provider_code_id)
    }

    async fn delete_code(&self, provider_code_id: &str) -> LockResult<()> {
        let mut codes = self.codes.lock().await;
        let idx = codes
            .iter()
            .position(|c| c.provider_code_id == provider_code_id)
            .ok_or_else(|| LockError::NotFound(format!("gateway code {}", provider_code_id)))?;
        codes.remove(idx);
        tracing::info!("DEMO gateway: deleted code {}", provider_code_id);
        Ok(())
    }

    async fn get_code(&self, provider_code_id: &str) -> LockResult<GatewayCode> {
        let codes = self.codes.lock().await;
        codes
            .iter()
            .find(|c| c.provider_code_id == provider_code_id)
            .cloned()
            .ok_or_else(|| LockError::NotFound(format!("gateway code {}", provider_code_id)))
    }

    async fn list_devices(&self) -> LockResult<Vec<LockDevice>> {
        Ok(self.devices.clone())
    }

    async fn lock_device(&self, device_id: &str) -> LockResult<ActionAttempt> {
        tracing::info!("DEMO gateway: locking device {}", device_id);
        Ok(ActionAttempt {
            action_attempt_id: format!("demo_action_{}", Uuid::new_v4().simple()),
            status: "success".to_string(),
            action_type: "LOCK_DOOR".to_string(),
        })
    }

    async fn unlock_device(&self, device_id: &str) -> LockResult<ActionAttempt> {
        tracing::info!("DEMO gateway: unlocking device {}", device_id);
        Ok(ActionAttempt {
            action_attempt_id: format!("demo_action_{}", Uuid::new_v4().simple()),
            status: "success".to_string(),
            action_type: "UNLOCK_DOOR".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_create_get_delete_cycle() {
        let gateway = DemoGateway::new();
        let starts_at = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let ends_at = Utc.with_ymd_and_hms(2025, 6, 1, 23, 59, 59).unwrap();

        let handle = gateway
            .create_code("demo_device_001", "Jane D", "482913", starts_at, ends_at)
            .await
            .unwrap();
        assert!(handle.starts_with("demo_code_"));

        let code = gateway.get_code(&handle).await.unwrap();
        assert_eq!(code.code, "482913");
        assert_eq!(code.device_id, "demo_device_001");

        gateway.delete_code(&handle).await.unwrap();
        assert!(gateway.get_code(&handle).await.is_err());
    }

    #[tokio::test]
    async fn test_seeded_devices_listed() {
        let gateway = DemoGateway::new();
        let devices = gateway.list_devices().await.unwrap();
        assert_eq!(devices.len(), 2);
        assert!(devices.iter().all(|d| d.manufacturer == "kwikset"));
    }
}
