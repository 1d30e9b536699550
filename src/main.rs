use std::sync::Arc;

use rotor::config::Config;
use rotor::proxy::{BackendPool, ProxyHandler};
use rotor::{monitor, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load()?;

    // Fatal before serving: an empty or invalid pool never binds the listener
    let pool = BackendPool::new(cfg.backends.clone())?;
    let proxy = Arc::new(ProxyHandler::new(pool));

    if let Some(monitor_cfg) = cfg.monitor.clone().filter(|m| m.enabled) {
        tokio::spawn(async move {
            if let Err(e) = monitor::run(monitor_cfg).await {
                tracing::error!("Monitor error: {}", e);
            }
        });
    }

    if let Some(url_check_cfg) = cfg.url_check.clone().filter(|u| u.enabled) {
        tokio::spawn(async move {
            if let Err(e) = monitor::run_url_check(url_check_cfg).await {
                tracing::error!("URL checker error: {}", e);
            }
        });
    }

    tokio::select! {
        res = server::listener::run(&cfg.listen_addr, proxy) => {
            res?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
