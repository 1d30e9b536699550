use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::http::connection::Connection;
use crate::proxy::ProxyHandler;

pub async fn run(listen_addr: &str, proxy: Arc<ProxyHandler>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(listen_addr).await?;
    info!("Listening on {}", listen_addr);

    loop {
        let (socket, peer) = listener.accept().await?;
        info!("Accepted connection from {}", peer);

        // One task per connection, unbounded
        let proxy = proxy.clone();
        tokio::spawn(async move {
            let mut conn = Connection::new(socket, proxy);
            if let Err(e) = conn.run().await {
                tracing::error!("Connection error from {}: {}", peer, e);
            }
        });
    }
}
