/// Code store: the persisted collection of purchases and access codes
///
/// The entire state is one JSON document rewritten on every mutation
/// (write-through). Mutations serialize on a write lock because the flush
/// step rewrites the whole collection; interleaved writers would clobber
/// each other's appended records. Reads share a read lock and observe
/// either the pre- or post-state of a mutation, never a partial write:
/// the flush goes to a temp file first and is renamed into place.
pub mod records;

pub use records::{AccessCode, Guest, PaymentSummary, Purchase};

use crate::error::{LockError, LockResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::fs;
use tokio::sync::RwLock;
use uuid::Uuid;

/// On-disk document layout
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreState {
    #[serde(default)]
    purchases: Vec<Purchase>,
    #[serde(default)]
    access_codes: Vec<AccessCode>,
    /// Opaque notification configuration blob; not interpreted by the
    /// store and preserved across `clear_all`
    #[serde(default)]
    email_config: Option<serde_json::Value>,
    #[serde(default)]
    last_updated: Option<DateTime<Utc>>,
}

/// Fields supplied by the caller when recording a purchase
#[derive(Debug, Clone)]
pub struct NewPurchase {
    pub kind: String,
    pub selected_dates: Vec<NaiveDate>,
    pub adults: Vec<Guest>,
    pub children: u32,
    pub total_amount: f64,
    pub payment: Option<PaymentSummary>,
    pub status: String,
}

/// Fields supplied by the caller when recording an access code
#[derive(Debug, Clone)]
pub struct NewAccessCode {
    pub purchase_id: String,
    pub device_id: String,
    pub provider_code_id: String,
    pub pin_code: String,
    pub code_name: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub date: Option<NaiveDate>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

/// Counts returned by a bulk clear
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearSummary {
    pub purchases_deleted: usize,
    pub access_codes_deleted: usize,
}

/// Durable store for purchases and access codes
pub struct CodeStore {
    path: PathBuf,
    state: RwLock<StoreState>,
    degraded: AtomicBool,
}

impl CodeStore {
    /// Open the store at the given path, loading existing state.
    ///
    /// A missing or unreadable document starts the store empty rather than
    /// failing startup; the condition is logged.
    pub async fn open(path: impl AsRef<Path>) -> LockResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let state = match fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<StoreState>(&bytes) {
                Ok(state) => {
                    tracing::info!(
                        "Loaded store from {:?}: {} purchases, {} access codes",
                        path,
                        state.purchases.len(),
                        state.access_codes.len()
                    );
                    state
                }
                Err(e) => {
                    tracing::warn!("Store document at {:?} unreadable ({}), starting empty", path, e);
                    StoreState::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No store document at {:?}, starting empty", path);
                StoreState::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read store at {:?} ({}), starting empty", path, e);
                StoreState::default()
            }
        };

        Ok(Self {
            path,
            state: RwLock::new(state),
            degraded: AtomicBool::new(false),
        })
    }

    /// Serialize the given state to disk atomically (temp file + rename).
    ///
    /// Called with the write lock held so flushes never interleave. A flush
    /// failure does not roll back the in-memory mutation; it marks the
    /// store degraded and is logged at error severity.
    async fn flush_state(&self, state: &mut StoreState) {
        state.last_updated = Some(Utc::now());

        let result = async {
            let bytes = serde_json::to_vec_pretty(state)
                .map_err(|e| LockError::Internal(format!("Failed to serialize store: {}", e)))?;

            let tmp_path = self.path.with_extension("json.tmp");
            fs::write(&tmp_path, &bytes).await?;
            fs::rename(&tmp_path, &self.path).await?;
            Ok::<(), LockError>(())
        }
        .await;

        match result {
            Ok(()) => {
                self.degraded.store(false, Ordering::Relaxed);
            }
            Err(e) => {
                self.degraded.store(true, Ordering::Relaxed);
                tracing::error!(
                    "Store flush to {:?} failed, running degraded (in-memory only): {}",
                    self.path,
                    e
                );
            }
        }
    }

    /// Force a flush of the current state; used on shutdown
    pub async fn flush(&self) -> LockResult<()> {
        let mut state = self.state.write().await;
        self.flush_state(&mut state).await;
        if self.degraded.load(Ordering::Relaxed) {
            return Err(LockError::StorageDegraded(format!(
                "flush to {:?} failed",
                self.path
            )));
        }
        Ok(())
    }

    /// Whether the most recent flush failed
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Relaxed)
    }

    /// Record a purchase; durable before returning
    pub async fn create_purchase(&self, data: NewPurchase) -> Purchase {
        let purchase = Purchase {
            id: format!("purchase_{}", Uuid::new_v4().simple()),
            kind: data.kind,
            total_days: data.selected_dates.len() as u32,
            total_adults: data.adults.len() as u32,
            selected_dates: data.selected_dates,
            adults: data.adults,
            children: data.children,
            total_amount: data.total_amount,
            payment: data.payment,
            status: data.status,
            created_at: Utc::now(),
        };

        let mut state = self.state.write().await;
        state.purchases.push(purchase.clone());
        self.flush_state(&mut state).await;

        purchase
    }

    /// Record an access code; durable before returning
    pub async fn create_access_code(&self, data: NewAccessCode) -> AccessCode {
        let code = AccessCode {
            id: format!("code_{}", Uuid::new_v4().simple()),
            purchase_id: data.purchase_id,
            device_id: data.device_id,
            provider_code_id: data.provider_code_id,
            pin_code: data.pin_code,
            code_name: data.code_name,
            customer_name: data.customer_name,
            customer_email: data.customer_email,
            customer_phone: data.customer_phone,
            date: data.date,
            starts_at: data.starts_at,
            ends_at: data.ends_at,
            created_at: Utc::now(),
        };

        let mut state = self.state.write().await;
        state.access_codes.push(code.clone());
        self.flush_state(&mut state).await;

        code
    }

    /// Look up a purchase by id
    pub async fn get_purchase(&self, id: &str) -> LockResult<Purchase> {
        let state = self.state.read().await;
        state
            .purchases
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| LockError::NotFound(format!("purchase {}", id)))
    }

    /// Look up an access code by id
    pub async fn get_access_code(&self, id: &str) -> LockResult<AccessCode> {
        let state = self.state.read().await;
        state
            .access_codes
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| LockError::NotFound(format!("access code {}", id)))
    }

    /// All purchases, newest first
    pub async fn list_purchases(&self) -> Vec<Purchase> {
        let state = self.state.read().await;
        let mut purchases = state.purchases.clone();
        purchases.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        purchases
    }

    /// Snapshot of every access code, in insertion order
    pub async fn list_access_codes(&self) -> Vec<AccessCode> {
        let state = self.state.read().await;
        state.access_codes.clone()
    }

    /// Access codes belonging to a purchase
    pub async fn list_access_codes_by_purchase(&self, purchase_id: &str) -> Vec<AccessCode> {
        let state = self.state.read().await;
        state
            .access_codes
            .iter()
            .filter(|c| c.purchase_id == purchase_id)
            .cloned()
            .collect()
    }

    /// Access codes for a calendar date; falls back to the UTC date of
    /// `starts_at` for records without an explicit date
    pub async fn list_access_codes_by_date(&self, date: NaiveDate) -> Vec<AccessCode> {
        let state = self.state.read().await;
        crate::codes::classifier::codes_for_date(&state.access_codes, date)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Remove an access code from the store.
    ///
    /// Gateway-side revocation is the caller's concern; the store only
    /// deletes the local record.
    pub async fn delete_access_code(&self, id: &str) -> LockResult<AccessCode> {
        let mut state = self.state.write().await;
        let idx = state
            .access_codes
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| LockError::NotFound(format!("access code {}", id)))?;
        let removed = state.access_codes.remove(idx);
        self.flush_state(&mut state).await;
        Ok(removed)
    }

    /// Opaque notification configuration blob
    pub async fn get_email_config(&self) -> Option<serde_json::Value> {
        let state = self.state.read().await;
        state.email_config.clone()
    }

    /// Replace the notification configuration blob
    pub async fn set_email_config(&self, config: serde_json::Value) {
        let mut state = self.state.write().await;
        state.email_config = Some(config);
        self.flush_state(&mut state).await;
    }

    /// Delete all purchases and access codes, keeping the configuration blob
    pub async fn clear_all(&self) -> ClearSummary {
        let mut state = self.state.write().await;
        let summary = ClearSummary {
            purchases_deleted: state.purchases.len(),
            access_codes_deleted: state.access_codes.len(),
        };
        state.purchases.clear();
        state.access_codes.clear();
        self.flush_state(&mut state).await;
        summary
    }
}
