/// Lockside - smart-lock access code service
use lockside::{config::ServerConfig, context::AppContext, error::LockResult, server};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> LockResult<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lockside=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    print_banner();

    // Load configuration
    let config = ServerConfig::from_env()?;

    // Create application context (loads or creates the store)
    let ctx = AppContext::new(config).await?;

    // Serve until shutdown, then flush the store one last time
    server::serve(ctx.clone()).await?;
    ctx.shutdown().await;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
    __               __        _     __
   / /   ____  _____/ /_______(_)___/ /__
  / /   / __ \/ ___/ //_/ ___/ / __  / _ \
 / /___/ /_/ / /__/ ,< (__  ) / /_/ /  __/
/_____/\____/\___/_/|_/____/_/\__,_/\___/

        Smart-lock access code service v{}
        "#,
        env!("CARGO_PKG_VERSION")
    );
}
