/// Lifecycle orchestration: issue, revoke, checkout, payment intake
///
/// Validation happens before any side effect. Gateway and notification
/// failures are soft: they travel with the result and never abort the
/// local record.
use crate::codes::{generator, window};
use crate::config::ServerConfig;
use crate::error::{LockError, LockResult};
use crate::gateway::{self, LockGateway};
use crate::notify::{NotificationReport, Notifier};
use crate::store::{AccessCode, CodeStore, Guest, NewAccessCode, NewPurchase, PaymentSummary, Purchase};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Maximum display-label length the locks accept
const MAX_CODE_NAME_LEN: usize = 14;
/// Labels are built from the first characters of the customer name
const NAME_TRUNCATE_LEN: usize = 12;

/// Inbound request for a single access code
#[derive(Debug, Clone, Deserialize)]
pub struct IssueRequest {
    pub customer_name: String,
    pub customer_email: String,
    #[serde(default)]
    pub customer_phone: Option<String>,
    pub device_id: String,
    pub requested_start: DateTime<Utc>,
    pub requested_end: DateTime<Utc>,
    pub purchase_id: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub code_length: Option<usize>,
}

/// A created code plus the soft outcomes attached to it
#[derive(Debug, Clone, Serialize)]
pub struct IssuedCode {
    pub code: AccessCode,
    /// Gateway create failed; the stored `provider_code_id` is a local
    /// placeholder
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_error: Option<String>,
    /// The window was already past at creation time
    pub already_expired: bool,
}

/// Result of revoking a code
#[derive(Debug, Clone, Serialize)]
pub struct RevokedCode {
    pub code: AccessCode,
    /// Gateway-side revocation failed; the local deletion stands
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_error: Option<String>,
}

/// Card details submitted at checkout
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentInfo {
    pub card_number: String,
    pub expiry: String,
    pub cvv: String,
}

/// Day-pass checkout request
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub selected_dates: Vec<NaiveDate>,
    pub adults: Vec<Guest>,
    #[serde(default)]
    pub children: u32,
    pub payment: PaymentInfo,
}

/// Notification report tied back to its code
#[derive(Debug, Clone, Serialize)]
pub struct CodeNotification {
    pub access_code_id: String,
    #[serde(flatten)]
    pub report: NotificationReport,
}

/// Day-pass checkout outcome
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutOutcome {
    pub purchase: Purchase,
    pub codes: Vec<IssuedCode>,
    pub notifications: Vec<CodeNotification>,
}

/// Confirmed-payment event from the payment provider webhook layer
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentEvent {
    pub payment_id: String,
    pub status: String,
    pub customer_name: String,
    pub customer_email: String,
    #[serde(default)]
    pub customer_phone: Option<String>,
    pub device_id: String,
    pub check_in: DateTime<Utc>,
    pub check_out: DateTime<Utc>,
    pub amount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "USD".to_string()
}

/// Outcome of a confirmed payment
#[derive(Debug, Clone, Serialize)]
pub struct PaymentOutcome {
    pub payment_id: String,
    pub purchase: Purchase,
    pub issued: IssuedCode,
    pub notification: NotificationReport,
}

/// Access code lifecycle manager
pub struct AccessCodeManager {
    store: Arc<CodeStore>,
    gateway: Arc<dyn LockGateway>,
    notifier: Arc<Notifier>,
    config: Arc<ServerConfig>,
}

impl AccessCodeManager {
    /// Create a new manager
    pub fn new(
        store: Arc<CodeStore>,
        gateway: Arc<dyn LockGateway>,
        notifier: Arc<Notifier>,
        config: Arc<ServerConfig>,
    ) -> Self {
        Self {
            store,
            gateway,
            notifier,
            config,
        }
    }

    fn property_offset(&self) -> FixedOffset {
        // validate() bounds the configured offset, so this cannot miss;
        // fall back to UTC rather than panic if it somehow does
        FixedOffset::east_opt(self.config.codes.property_utc_offset_minutes * 60)
            .unwrap_or_else(|| Utc.fix())
    }

    /// Build the display label programmed onto the lock: the customer
    /// name truncated to 12 characters, padded to the 2-character minimum
    fn build_code_name(customer_name: &str) -> LockResult<String> {
        let trimmed = customer_name.trim();
        if trimmed.is_empty() {
            return Err(LockError::InvalidCodeName(
                "customer name is empty".to_string(),
            ));
        }

        let mut name: String = trimmed.chars().take(NAME_TRUNCATE_LEN).collect();
        while name.chars().count() < 2 {
            name.push('X');
        }

        debug_assert!(name.chars().count() <= MAX_CODE_NAME_LEN);
        Ok(name)
    }

    /// Issue one access code: validate, normalize the window, generate a
    /// PIN, program the gateway (best-effort), persist, return.
    ///
    /// The persisted window is always the intended one; a same-day
    /// gateway bump never reaches the store.
    pub async fn issue_code(&self, request: IssueRequest) -> LockResult<IssuedCode> {
        let code_name = Self::build_code_name(&request.customer_name)?;

        let pin_length = request.code_length.unwrap_or(self.config.codes.pin_length);
        if !(generator::MIN_PIN_LENGTH..=generator::MAX_PIN_LENGTH).contains(&pin_length) {
            return Err(LockError::InvalidCodeLength(pin_length));
        }

        let now = Utc::now();
        let normalized = window::normalize(
            request.requested_start,
            request.requested_end,
            now,
            Duration::minutes(self.config.codes.lead_time_minutes),
            self.property_offset(),
        )?;

        let pin_code = generator::generate_pin(pin_length);

        // Best-effort gateway call; a failure leaves a local placeholder
        let (provider_code_id, gateway_error) = match self
            .gateway
            .create_code(
                &request.device_id,
                &code_name,
                &pin_code,
                normalized.gateway_starts_at,
                normalized.ends_at,
            )
            .await
        {
            Ok(handle) => (handle, None),
            Err(e) => {
                tracing::warn!(
                    "Gateway create failed for device {}, recording locally: {}",
                    request.device_id,
                    e
                );
                (gateway::placeholder_handle(), Some(e.to_string()))
            }
        };

        let code = self
            .store
            .create_access_code(NewAccessCode {
                purchase_id: request.purchase_id,
                device_id: request.device_id,
                provider_code_id,
                pin_code,
                code_name,
                customer_name: request.customer_name,
                customer_email: request.customer_email,
                customer_phone: request.customer_phone,
                date: request.date,
                starts_at: normalized.starts_at,
                ends_at: normalized.ends_at,
            })
            .await;

        tracing::info!(
            "Issued access code {} for {} on device {}",
            code.id,
            code.customer_email,
            code.device_id
        );

        Ok(IssuedCode {
            code,
            gateway_error,
            already_expired: normalized.already_expired,
        })
    }

    /// Revoke a code: delete the local record, then best-effort remove it
    /// from the lock
    pub async fn revoke_code(&self, id: &str) -> LockResult<RevokedCode> {
        let code = self.store.delete_access_code(id).await?;

        // Placeholder handles were never programmed onto a lock
        let gateway_error = if code.provider_code_id.starts_with("local_") {
            None
        } else {
            match self.gateway.delete_code(&code.provider_code_id).await {
                Ok(()) => None,
                Err(e) => {
                    tracing::warn!(
                        "Gateway revocation of {} failed (local deletion stands): {}",
                        code.provider_code_id,
                        e
                    );
                    Some(e.to_string())
                }
            }
        };

        tracing::info!("Revoked access code {}", code.id);
        Ok(RevokedCode {
            code,
            gateway_error,
        })
    }

    /// Day-pass checkout: record the purchase, then issue one code per
    /// (date, adult) spanning each civil day at the property.
    ///
    /// Children are counted and priced but share the adults' codes.
    pub async fn checkout_day_passes(&self, request: CheckoutRequest) -> LockResult<CheckoutOutcome> {
        if request.selected_dates.is_empty() {
            return Err(LockError::Validation(
                "Please select at least one date".to_string(),
            ));
        }
        if request.adults.is_empty() {
            return Err(LockError::Validation(
                "At least one adult is required".to_string(),
            ));
        }
        if request.payment.card_number.trim().is_empty()
            || request.payment.expiry.trim().is_empty()
            || request.payment.cvv.trim().is_empty()
        {
            return Err(LockError::Validation(
                "Payment information is required".to_string(),
            ));
        }

        // Every guest must yield a usable code label before the purchase
        // is recorded; a blank name must not be priced in and then
        // silently skipped at issue time
        for adult in &request.adults {
            Self::build_code_name(&adult.name)?;
        }

        let card_number: String = request
            .payment
            .card_number
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        let last4 = card_number
            .chars()
            .rev()
            .take(4)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect::<String>();

        let people = request.adults.len() as u32 + request.children;
        let total_amount =
            request.selected_dates.len() as f64 * self.config.pricing.day_pass_price * f64::from(people);

        let purchase = self
            .store
            .create_purchase(NewPurchase {
                kind: "day_pass".to_string(),
                selected_dates: request.selected_dates.clone(),
                adults: request.adults.clone(),
                children: request.children,
                total_amount,
                payment: Some(PaymentSummary {
                    last4,
                    card_type: "card".to_string(),
                }),
                status: "completed".to_string(),
            })
            .await;

        tracing::info!(
            "Day-pass purchase {}: {} dates x {} people, total ${:.2}",
            purchase.id,
            request.selected_dates.len(),
            people,
            total_amount
        );

        let offset = self.property_offset();
        let device_id = self.config.gateway.day_pass_device_id.clone();
        let mut codes = Vec::new();
        let mut notifications = Vec::new();

        for date in &request.selected_dates {
            let (starts_at, ends_at) = window::day_window(*date, offset);

            for adult in &request.adults {
                let issued = match self
                    .issue_code(IssueRequest {
                        customer_name: adult.name.clone(),
                        customer_email: adult.email.clone(),
                        customer_phone: adult.phone.clone(),
                        device_id: device_id.clone(),
                        requested_start: starts_at,
                        requested_end: ends_at,
                        purchase_id: purchase.id.clone(),
                        date: Some(*date),
                        code_length: None,
                    })
                    .await
                {
                    Ok(issued) => issued,
                    Err(e) => {
                        // One bad guest entry must not sink the rest of
                        // the purchase
                        tracing::error!(
                            "Failed to issue code for {} on {}: {}",
                            adult.name,
                            date,
                            e
                        );
                        continue;
                    }
                };

                let report = self.notifier.send_access_code(&issued.code).await;
                notifications.push(CodeNotification {
                    access_code_id: issued.code.id.clone(),
                    report,
                });
                codes.push(issued);
            }
        }

        Ok(CheckoutOutcome {
            purchase,
            codes,
            notifications,
        })
    }

    /// Handle a confirmed payment for a stay: record the purchase, issue
    /// one code for the stay window, notify the customer
    pub async fn confirm_payment(&self, event: PaymentEvent) -> LockResult<PaymentOutcome> {
        match event.status.as_str() {
            "paid" | "succeeded" | "completed" => {}
            other => {
                return Err(LockError::PaymentNotConfirmed(format!(
                    "payment status \"{}\" does not allow access code creation",
                    other
                )));
            }
        }

        if event.payment_id.trim().is_empty()
            || event.customer_name.trim().is_empty()
            || event.customer_email.trim().is_empty()
            || event.device_id.trim().is_empty()
        {
            return Err(LockError::Validation(
                "Missing required payment data fields".to_string(),
            ));
        }

        // Validate the code inputs before the purchase ledger sees any of
        // it: a malformed window or name must leave no record behind
        Self::build_code_name(&event.customer_name)?;
        window::normalize(
            event.check_in,
            event.check_out,
            Utc::now(),
            Duration::minutes(self.config.codes.lead_time_minutes),
            self.property_offset(),
        )?;

        let purchase = self
            .store
            .create_purchase(NewPurchase {
                kind: "stay".to_string(),
                selected_dates: Vec::new(),
                adults: vec![Guest {
                    name: event.customer_name.clone(),
                    email: event.customer_email.clone(),
                    phone: event.customer_phone.clone(),
                }],
                children: 0,
                total_amount: event.amount,
                payment: None,
                status: event.status.clone(),
            })
            .await;

        let issued = self
            .issue_code(IssueRequest {
                customer_name: event.customer_name,
                customer_email: event.customer_email,
                customer_phone: event.customer_phone,
                device_id: event.device_id,
                requested_start: event.check_in,
                requested_end: event.check_out,
                purchase_id: purchase.id.clone(),
                date: None,
                code_length: None,
            })
            .await?;

        let notification = self.notifier.send_access_code(&issued.code).await;

        Ok(PaymentOutcome {
            payment_id: event.payment_id,
            purchase,
            issued,
            notification,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{ActionAttempt, DemoGateway, GatewayCode};
    use async_trait::async_trait;
    use tempfile::tempdir;

    /// Gateway that refuses everything, for placeholder/soft-failure paths
    struct UnreachableGateway;

    #[async_trait]
    impl LockGateway for UnreachableGateway {
        async fn create_code(
            &self,
            _device_id: &str,
            _name: &str,
            _code: &str,
            _starts_at: DateTime<Utc>,
            _ends_at: DateTime<Utc>,
        ) -> LockResult<String> {
            Err(LockError::GatewayUnavailable("connection refused".to_string()))
        }

        async fn delete_code(&self, _provider_code_id: &str) -> LockResult<()> {
            Err(LockError::GatewayUnavailable("connection refused".to_string()))
        }

        async fn get_code(&self, _provider_code_id: &str) -> LockResult<GatewayCode> {
            Err(LockError::GatewayUnavailable("connection refused".to_string()))
        }

        async fn list_devices(&self) -> LockResult<Vec<crate::gateway::LockDevice>> {
            Err(LockError::GatewayUnavailable("connection refused".to_string()))
        }

        async fn lock_device(&self, _device_id: &str) -> LockResult<ActionAttempt> {
            Err(LockError::GatewayUnavailable("connection refused".to_string()))
        }

        async fn unlock_device(&self, _device_id: &str) -> LockResult<ActionAttempt> {
            Err(LockError::GatewayUnavailable("connection refused".to_string()))
        }
    }

    fn test_config() -> Arc<ServerConfig> {
        use crate::config::*;
        Arc::new(ServerConfig {
            service: ServiceConfig {
                hostname: "localhost".to_string(),
                port: 0,
                version: "test".to_string(),
            },
            storage: StorageConfig {
                data_directory: "./data".into(),
                database_file: "./data/test.json".into(),
            },
            gateway: GatewayConfig {
                api_key: None,
                base_url: "https://connect.getseam.com".to_string(),
                timeout_secs: 10,
                day_pass_device_id: "demo_device_001".to_string(),
            },
            codes: CodeConfig {
                pin_length: 6,
                lead_time_minutes: 15,
                property_utc_offset_minutes: 0,
            },
            pricing: PricingConfig {
                day_pass_price: 15.0,
            },
            email: None,
            sms: None,
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        })
    }

    async fn manager_with(gateway: Arc<dyn LockGateway>) -> (AccessCodeManager, Arc<CodeStore>, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let store = Arc::new(CodeStore::open(dir.path().join("db.json")).await.unwrap());
        let notifier = Arc::new(Notifier::new(None, None).unwrap());
        let manager = AccessCodeManager::new(Arc::clone(&store), gateway, notifier, test_config());
        (manager, store, dir)
    }

    fn guest(name: &str, email: &str) -> Guest {
        Guest {
            name: name.to_string(),
            email: email.to_string(),
            phone: None,
        }
    }

    fn future_issue_request(purchase_id: &str) -> IssueRequest {
        let start = Utc::now() + Duration::days(30);
        IssueRequest {
            customer_name: "Jane Doe".to_string(),
            customer_email: "jane@example.com".to_string(),
            customer_phone: None,
            device_id: "demo_device_001".to_string(),
            requested_start: start,
            requested_end: start + Duration::days(1),
            purchase_id: purchase_id.to_string(),
            date: None,
            code_length: None,
        }
    }

    #[tokio::test]
    async fn test_issue_code_round_trip() {
        let (manager, store, _dir) = manager_with(Arc::new(DemoGateway::new())).await;

        let issued = manager.issue_code(future_issue_request("purchase_1")).await.unwrap();
        assert!(issued.gateway_error.is_none());
        assert!(!issued.already_expired);
        assert!(issued.code.provider_code_id.starts_with("demo_code_"));
        assert_eq!(issued.code.pin_code.len(), 6);

        let fetched = store.get_access_code(&issued.code.id).await.unwrap();
        assert_eq!(fetched, issued.code);
    }

    #[tokio::test]
    async fn test_unreachable_gateway_leaves_placeholder() {
        let (manager, store, _dir) = manager_with(Arc::new(UnreachableGateway)).await;

        let issued = manager.issue_code(future_issue_request("purchase_1")).await.unwrap();
        assert!(issued.gateway_error.is_some());
        assert!(issued.code.provider_code_id.starts_with("local_"));

        // Record is durable despite the gateway failure
        assert!(store.get_access_code(&issued.code.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_empty_customer_name_is_rejected_before_side_effects() {
        let (manager, store, _dir) = manager_with(Arc::new(DemoGateway::new())).await;

        let mut request = future_issue_request("purchase_1");
        request.customer_name = "   ".to_string();

        let err = manager.issue_code(request).await.unwrap_err();
        assert!(matches!(err, LockError::InvalidCodeName(_)));
        assert!(store.list_access_codes().await.is_empty());
    }

    #[tokio::test]
    async fn test_out_of_range_code_length_is_rejected() {
        let (manager, _store, _dir) = manager_with(Arc::new(DemoGateway::new())).await;

        let mut request = future_issue_request("purchase_1");
        request.code_length = Some(3);
        assert!(matches!(
            manager.issue_code(request).await.unwrap_err(),
            LockError::InvalidCodeLength(3)
        ));

        let mut request = future_issue_request("purchase_1");
        request.code_length = Some(9);
        assert!(matches!(
            manager.issue_code(request).await.unwrap_err(),
            LockError::InvalidCodeLength(9)
        ));
    }

    #[tokio::test]
    async fn test_code_name_truncation_and_padding() {
        assert_eq!(
            AccessCodeManager::build_code_name("Jonathan Longbottom III").unwrap(),
            "Jonathan Lon"
        );
        assert_eq!(AccessCodeManager::build_code_name("J").unwrap(), "JX");
        assert!(AccessCodeManager::build_code_name("").is_err());
    }

    #[tokio::test]
    async fn test_checkout_scenario_two_dates_two_adults() {
        let (manager, store, _dir) = manager_with(Arc::new(DemoGateway::new())).await;

        let d1 = NaiveDate::from_ymd_opt(2125, 6, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2125, 6, 2).unwrap();
        let outcome = manager
            .checkout_day_passes(CheckoutRequest {
                selected_dates: vec![d1, d2],
                adults: vec![
                    guest("Jane Doe", "jane@example.com"),
                    guest("John Doe", "john@example.com"),
                ],
                children: 0,
                payment: PaymentInfo {
                    card_number: "4242 4242 4242 4242".to_string(),
                    expiry: "12/30".to_string(),
                    cvv: "123".to_string(),
                },
            })
            .await
            .unwrap();

        // 2 days x 2 adults x $15
        assert_eq!(outcome.purchase.total_amount, 60.0);
        assert_eq!(outcome.purchase.total_days, 2);
        assert_eq!(outcome.purchase.total_adults, 2);
        assert_eq!(outcome.purchase.payment.as_ref().unwrap().last4, "4242");
        assert_eq!(outcome.codes.len(), 4);
        assert_eq!(outcome.notifications.len(), 4);

        for issued in &outcome.codes {
            let date = issued.code.date.unwrap();
            let (expected_start, expected_end) =
                window::day_window(date, FixedOffset::east_opt(0).unwrap());
            assert_eq!(issued.code.starts_at, expected_start);
            assert_eq!(issued.code.ends_at, expected_end);
        }

        let d1_codes = store.list_access_codes_by_date(d1).await;
        assert_eq!(d1_codes.len(), 2);
        assert_eq!(store.list_access_codes_by_purchase(&outcome.purchase.id).await.len(), 4);
    }

    #[tokio::test]
    async fn test_checkout_prices_children_without_codes() {
        let (manager, _store, _dir) = manager_with(Arc::new(DemoGateway::new())).await;

        let outcome = manager
            .checkout_day_passes(CheckoutRequest {
                selected_dates: vec![NaiveDate::from_ymd_opt(2125, 6, 1).unwrap()],
                adults: vec![guest("Jane Doe", "jane@example.com")],
                children: 2,
                payment: PaymentInfo {
                    card_number: "4242424242424242".to_string(),
                    expiry: "12/30".to_string(),
                    cvv: "123".to_string(),
                },
            })
            .await
            .unwrap();

        // 1 day x (1 adult + 2 children) x $15, but only the adult gets a code
        assert_eq!(outcome.purchase.total_amount, 45.0);
        assert_eq!(outcome.codes.len(), 1);
    }

    #[tokio::test]
    async fn test_checkout_validation() {
        let (manager, _store, _dir) = manager_with(Arc::new(DemoGateway::new())).await;
        let payment = PaymentInfo {
            card_number: "4242424242424242".to_string(),
            expiry: "12/30".to_string(),
            cvv: "123".to_string(),
        };

        let err = manager
            .checkout_day_passes(CheckoutRequest {
                selected_dates: vec![],
                adults: vec![guest("Jane Doe", "jane@example.com")],
                children: 0,
                payment: payment.clone(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, LockError::Validation(_)));

        let err = manager
            .checkout_day_passes(CheckoutRequest {
                selected_dates: vec![NaiveDate::from_ymd_opt(2125, 6, 1).unwrap()],
                adults: vec![],
                children: 0,
                payment,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, LockError::Validation(_)));
    }

    #[tokio::test]
    async fn test_checkout_with_blank_guest_name_leaves_no_purchase() {
        let (manager, store, _dir) = manager_with(Arc::new(DemoGateway::new())).await;

        let err = manager
            .checkout_day_passes(CheckoutRequest {
                selected_dates: vec![NaiveDate::from_ymd_opt(2125, 6, 1).unwrap()],
                adults: vec![
                    guest("Jane Doe", "jane@example.com"),
                    guest("   ", "john@example.com"),
                ],
                children: 0,
                payment: PaymentInfo {
                    card_number: "4242424242424242".to_string(),
                    expiry: "12/30".to_string(),
                    cvv: "123".to_string(),
                },
            })
            .await
            .unwrap_err();

        // The blank guest aborts the whole checkout before anything is
        // recorded or charged
        assert!(matches!(err, LockError::InvalidCodeName(_)));
        assert!(store.list_purchases().await.is_empty());
        assert!(store.list_access_codes().await.is_empty());
    }

    #[tokio::test]
    async fn test_revoke_deletes_locally_even_when_gateway_fails() {
        let (demo_manager, store, _dir) = manager_with(Arc::new(DemoGateway::new())).await;
        let issued = demo_manager
            .issue_code(future_issue_request("purchase_1"))
            .await
            .unwrap();

        // Same store, but the gateway has gone away since creation
        let notifier = Arc::new(Notifier::new(None, None).unwrap());
        let broken_manager = AccessCodeManager::new(
            Arc::clone(&store),
            Arc::new(UnreachableGateway),
            notifier,
            test_config(),
        );

        let revoked = broken_manager.revoke_code(&issued.code.id).await.unwrap();
        assert!(revoked.gateway_error.is_some());
        assert!(store.get_access_code(&issued.code.id).await.is_err());
    }

    #[tokio::test]
    async fn test_revoke_skips_gateway_for_placeholder_handles() {
        let (manager, _store, _dir) = manager_with(Arc::new(UnreachableGateway)).await;

        let issued = manager.issue_code(future_issue_request("purchase_1")).await.unwrap();
        assert!(issued.code.provider_code_id.starts_with("local_"));

        // Gateway would error, but placeholder handles never reach it
        let revoked = manager.revoke_code(&issued.code.id).await.unwrap();
        assert!(revoked.gateway_error.is_none());
    }

    #[tokio::test]
    async fn test_unconfirmed_payment_is_rejected() {
        let (manager, store, _dir) = manager_with(Arc::new(DemoGateway::new())).await;

        let start = Utc::now() + Duration::days(10);
        let err = manager
            .confirm_payment(PaymentEvent {
                payment_id: "pay_1".to_string(),
                status: "pending".to_string(),
                customer_name: "Jane Doe".to_string(),
                customer_email: "jane@example.com".to_string(),
                customer_phone: None,
                device_id: "demo_device_001".to_string(),
                check_in: start,
                check_out: start + Duration::days(2),
                amount: 200.0,
                currency: "USD".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, LockError::PaymentNotConfirmed(_)));
        assert!(store.list_purchases().await.is_empty());
    }

    #[tokio::test]
    async fn test_confirmed_payment_issues_one_code() {
        let (manager, store, _dir) = manager_with(Arc::new(DemoGateway::new())).await;

        let start = Utc::now() + Duration::days(10);
        let outcome = manager
            .confirm_payment(PaymentEvent {
                payment_id: "pay_1".to_string(),
                status: "succeeded".to_string(),
                customer_name: "Jane Doe".to_string(),
                customer_email: "jane@example.com".to_string(),
                customer_phone: Some("+15551234567".to_string()),
                check_in: start,
                check_out: start + Duration::days(2),
                device_id: "demo_device_001".to_string(),
                amount: 200.0,
                currency: "USD".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(outcome.payment_id, "pay_1");
        assert_eq!(outcome.purchase.kind, "stay");
        assert_eq!(outcome.issued.code.starts_at, start);
        assert_eq!(store.list_access_codes_by_purchase(&outcome.purchase.id).await.len(), 1);
    }

    #[tokio::test]
    async fn test_inverted_stay_window_leaves_no_purchase() {
        let (manager, store, _dir) = manager_with(Arc::new(DemoGateway::new())).await;

        // Check-out a day before check-in
        let check_in = Utc::now() + Duration::days(10);
        let err = manager
            .confirm_payment(PaymentEvent {
                payment_id: "pay_1".to_string(),
                status: "succeeded".to_string(),
                customer_name: "Jane Doe".to_string(),
                customer_email: "jane@example.com".to_string(),
                customer_phone: None,
                device_id: "demo_device_001".to_string(),
                check_in,
                check_out: check_in - Duration::days(1),
                amount: 200.0,
                currency: "USD".to_string(),
            })
            .await
            .unwrap_err();

        // The rejection must not strand a stay purchase in the ledger
        assert!(matches!(err, LockError::InvalidWindow(_)));
        assert!(store.list_purchases().await.is_empty());
        assert!(store.list_access_codes().await.is_empty());
    }
}
