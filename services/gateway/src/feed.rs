//! Market-data feed listener
//!
//! Streams two-frame feed messages (`<topic> <payload>`, newline
//! framed) to every connected subscriber. Each connection gets its own
//! bounded hub queue; a slow consumer only loses its own messages.

use std::sync::Arc;
use std::time::Duration;

use market_data::FeedHub;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info};

const DRAIN_INTERVAL: Duration = Duration::from_millis(10);

pub async fn serve(endpoint: &str, hub: Arc<FeedHub>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(endpoint).await?;
    info!(endpoint, "feed listening");
    loop {
        let (socket, peer) = listener.accept().await?;
        debug!(%peer, "feed subscriber connected");
        tokio::spawn(stream_to(socket, Arc::clone(&hub)));
    }
}

async fn stream_to(mut socket: TcpStream, hub: Arc<FeedHub>) {
    let id = hub.subscribe();
    'conn: loop {
        for message in hub.drain(id) {
            let mut line = message.encode();
            line.push('\n');
            if socket.write_all(line.as_bytes()).await.is_err() {
                break 'conn;
            }
        }
        tokio::time::sleep(DRAIN_INTERVAL).await;
    }
    hub.unsubscribe(id);
    debug!(subscriber = id, "feed subscriber disconnected");
}
