/// Seam-backed lock gateway
///
/// Thin client over the Seam connect API. Every request carries the
/// configured bearer key and is bounded by the client timeout; the engine
/// never retries here.
use crate::config::GatewayConfig;
use crate::error::{LockError, LockResult};
use crate::gateway::{ActionAttempt, GatewayCode, LockDevice, LockGateway};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// The lock manufacturer this deployment supports
const SUPPORTED_MANUFACTURER: &str = "kwikset";

/// Network-backed gateway
pub struct SeamGateway {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct LocksListResponse {
    #[serde(default)]
    locks: Vec<SeamLock>,
}

#[derive(Debug, Deserialize)]
struct SeamLock {
    device_id: String,
    #[serde(default)]
    device_type: Option<String>,
    #[serde(default)]
    properties: Option<SeamLockProperties>,
    #[serde(default)]
    connected_account: Option<SeamConnectedAccount>,
}

#[derive(Debug, Deserialize)]
struct SeamLockProperties {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    manufacturer: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SeamConnectedAccount {
    #[serde(default)]
    provider: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AccessCodeResponse {
    access_code: SeamAccessCode,
}

#[derive(Debug, Deserialize)]
struct SeamAccessCode {
    access_code_id: String,
    device_id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    code: Option<String>,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct ActionAttemptResponse {
    action_attempt: SeamActionAttempt,
}

#[derive(Debug, Deserialize)]
struct SeamActionAttempt {
    action_attempt_id: String,
    status: String,
    action_type: String,
}

impl SeamGateway {
    /// Build a gateway client from configuration
    pub fn new(config: &GatewayConfig) -> LockResult<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .ok_or_else(|| LockError::Internal("Seam gateway requires an API key".to_string()))?;

        let mut headers = reqwest::header::HeaderMap::new();
        let mut auth = reqwest::header::HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|e| LockError::Internal(format!("Invalid API key: {}", e)))?;
        auth.set_sensitive(true);
        headers.insert(reqwest::header::AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LockError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Issue a request and decode the JSON body, folding transport and
    /// status failures into `GatewayUnavailable`
    async fn execute<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> LockResult<T> {
        let response = request
            .send()
            .await
            .map_err(|e| LockError::GatewayUnavailable(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LockError::GatewayUnavailable(format!(
                "gateway returned {}: {}",
                status, body
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| LockError::GatewayUnavailable(format!("invalid gateway response: {}", e)))
    }

    fn is_supported(lock: &SeamLock) -> bool {
        let by_manufacturer = lock
            .properties
            .as_ref()
            .and_then(|p| p.manufacturer.as_deref())
            .is_some_and(|m| m.eq_ignore_ascii_case(SUPPORTED_MANUFACTURER));
        let by_provider = lock
            .connected_account
            .as_ref()
            .and_then(|a| a.provider.as_deref())
            .is_some_and(|p| p.eq_ignore_ascii_case(SUPPORTED_MANUFACTURER));
        let by_type = lock
            .device_type
            .as_deref()
            .is_some_and(|t| t.to_ascii_lowercase().contains(SUPPORTED_MANUFACTURER));

        by_manufacturer || by_provider || by_type
    }
}

#[async_trait]
impl LockGateway for SeamGateway {
    async fn create_code(
        &self,
        device_id: &str,
        name: &str,
        code: &str,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> LockResult<String> {
        let body = json!({
            "device_id": device_id,
            "name": name,
            "code": code,
            "starts_at": starts_at.to_rfc3339(),
            "ends_at": ends_at.to_rfc3339(),
        });

        let response: AccessCodeResponse = self
            .execute(self.client.post(self.url("/access_codes/create")).json(&body))
            .await?;

        tracing::info!(
            "Gateway created code {} on device {}",
            response.access_code.access_code_id,
            device_id
        );
        Ok(response.access_code.access_code_id)
    }

    async fn delete_code(&self, provider_code_id: &str) -> LockResult<()> {
        let body = json!({ "access_code_id": provider_code_id });

        // Seam returns an action attempt here; we only care that it accepted
        let _: serde_json::Value = self
            .execute(self.client.post(self.url("/access_codes/delete")).json(&body))
            .await?;

        tracing::info!("Gateway deleted code {}", provider_code_id);
        Ok(())
    }

    async fn get_code(&self, provider_code_id: &str) -> LockResult<GatewayCode> {
        let response: AccessCodeResponse = self
            .execute(
                self.client
                    .get(self.url("/access_codes/get"))
                    .query(&[("access_code_id", provider_code_id)]),
            )
            .await?;

        let code = response.access_code;
        Ok(GatewayCode {
            provider_code_id: code.access_code_id,
            device_id: code.device_id,
            name: code.name.unwrap_or_default(),
            code: code.code.unwrap_or_default(),
            starts_at: code.starts_at,
            ends_at: code.ends_at,
        })
    }

    async fn list_devices(&self) -> LockResult<Vec<LockDevice>> {
        let response: LocksListResponse =
            self.execute(self.client.get(self.url("/locks/list"))).await?;

        Ok(response
            .locks
            .into_iter()
            .filter(Self::is_supported)
            .map(|lock| LockDevice {
                name: lock
                    .properties
                    .as_ref()
                    .and_then(|p| p.name.clone())
                    .unwrap_or_else(|| lock.device_id.clone()),
                manufacturer: lock
                    .properties
                    .as_ref()
                    .and_then(|p| p.manufacturer.clone())
                    .unwrap_or_else(|| SUPPORTED_MANUFACTURER.to_string()),
                device_type: lock.device_type.unwrap_or_default(),
                device_id: lock.device_id,
            })
            .collect())
    }

    async fn lock_device(&self, device_id: &str) -> LockResult<ActionAttempt> {
        let body = json!({ "device_id": device_id });
        let response: ActionAttemptResponse = self
            .execute(self.client.post(self.url("/locks/lock_door")).json(&body))
            .await?;

        Ok(ActionAttempt {
            action_attempt_id: response.action_attempt.action_attempt_id,
            status: response.action_attempt.status,
            action_type: response.action_attempt.action_type,
        })
    }

    async fn unlock_device(&self, device_id: &str) -> LockResult<ActionAttempt> {
        let body = json!({ "device_id": device_id });
        let response: ActionAttemptResponse = self
            .execute(self.client.post(self.url("/locks/unlock_door")).json(&body))
            .await?;

        Ok(ActionAttempt {
            action_attempt_id: response.action_attempt.action_attempt_id,
            status: response.action_attempt.status,
            action_type: response.action_attempt.action_type,
        })
    }
}
