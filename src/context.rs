/// Application context and dependency injection
use crate::{
    codes::AccessCodeManager,
    config::ServerConfig,
    error::LockResult,
    gateway::{DemoGateway, LockGateway, SeamGateway},
    notify::Notifier,
    store::CodeStore,
};
use std::sync::Arc;

/// Application context holding all shared services.
///
/// Built once at process start; every operation receives its dependencies
/// from here instead of reaching for globals.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub store: Arc<CodeStore>,
    pub gateway: Arc<dyn LockGateway>,
    pub notifier: Arc<Notifier>,
    pub code_manager: Arc<AccessCodeManager>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> LockResult<Self> {
        config.validate()?;

        // Explicit store init: load existing state or start empty
        let store = Arc::new(CodeStore::open(&config.storage.database_file).await?);

        // Gateway backend is chosen once here; the engine never branches
        // on demo mode again
        let gateway: Arc<dyn LockGateway> = if config.demo_mode() {
            tracing::warn!("No gateway API key configured; running in DEMO mode");
            Arc::new(DemoGateway::new())
        } else {
            tracing::info!("Using lock gateway at {}", config.gateway.base_url);
            Arc::new(SeamGateway::new(&config.gateway)?)
        };

        let notifier = Arc::new(Notifier::new(config.email.clone(), config.sms.clone())?);

        let config = Arc::new(config);
        let code_manager = Arc::new(AccessCodeManager::new(
            Arc::clone(&store),
            Arc::clone(&gateway),
            Arc::clone(&notifier),
            Arc::clone(&config),
        ));

        Ok(Self {
            config,
            store,
            gateway,
            notifier,
            code_manager,
        })
    }

    /// Final flush before the process exits
    pub async fn shutdown(&self) {
        if let Err(e) = self.store.flush().await {
            tracing::error!("Final store flush failed: {}", e);
        } else {
            tracing::info!("Store flushed, shutting down");
        }
    }

    /// Get service URL
    pub fn service_url(&self) -> String {
        format!(
            "http://{}:{}",
            self.config.service.hostname, self.config.service.port
        )
    }
}
