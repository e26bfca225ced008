//! Legacy text request/reply protocol
//!
//! Line-framed TCP, kept bug-compatible with the original clients:
//!
//! - `B <price> <qty>` — submit a BUY LIMIT on the default instrument
//! - `S <price> <qty>` — submit a SELL LIMIT
//! - `print` — textual dump of the book (asks ascending, bids
//!   descending)
//! - `exit` — client goodbye; the connection closes, the server stays
//!   up
//!
//! Submissions are acknowledged immediately on enqueue ("Order added"),
//! as the original server did; fills arrive on the feed.

use std::fmt::Write as _;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info};

use types::ids::UserId;
use types::numeric::{Price, Quantity};
use types::order::{OrderKind, OrderRequest, Side};

use crate::state::AppState;

/// Owner id for anonymous text-protocol clients.
const TEXT_CLIENT_USER: UserId = UserId::new(0);

pub async fn serve(endpoint: &str, state: AppState) -> anyhow::Result<()> {
    let listener = TcpListener::bind(endpoint).await?;
    info!(endpoint, "text protocol listening");
    loop {
        let (socket, peer) = listener.accept().await?;
        debug!(%peer, "text client connected");
        tokio::spawn(handle_client(socket, state.clone()));
    }
}

async fn handle_client(socket: TcpStream, state: AppState) {
    let (reader, mut writer) = socket.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" {
            break;
        }
        let reply = handle_request(line, &state);
        if writer.write_all(reply.as_bytes()).await.is_err() {
            break;
        }
        if writer.write_all(b"\n").await.is_err() {
            break;
        }
    }
    debug!("text client disconnected");
}

/// One request line in, one reply out.
pub fn handle_request(line: &str, state: &AppState) -> String {
    if line == "print" {
        return render_book(state);
    }

    let mut parts = line.split_whitespace();
    let side = match parts.next() {
        Some("B") => Side::Buy,
        Some("S") => Side::Sell,
        _ => return format!("Error: unknown request: {line}"),
    };
    let Some(price) = parts.next().and_then(|p| p.parse::<Price>().ok()) else {
        return format!("Error: invalid price in: {line}");
    };
    let quantity = match parts.next().map(|q| q.parse::<Quantity>()) {
        Some(Ok(quantity)) if !quantity.is_zero() => quantity,
        _ => return format!("Error: invalid quantity in: {line}"),
    };

    let request = OrderRequest {
        user_id: TEXT_CLIENT_USER,
        symbol: state.default_symbol.clone(),
        side,
        kind: OrderKind::Limit,
        price: Some(price),
        quantity,
        client_order_id: None,
    };
    match state.engine.submit(request) {
        Ok(_) => format!("Order added: {line}"),
        Err(err) => format!("Error: {err}"),
    }
}

/// The book dump the original clients parse.
fn render_book(state: &AppState) -> String {
    let Some((asks, bids)) = state.engine.book_orders(&state.default_symbol) else {
        return "Error: no book".to_string();
    };

    let mut out = String::from("SELL ORDERS:\n");
    for order in asks {
        let _ = writeln!(
            out,
            "ID: {} | {} @ ${}",
            order.order_id, order.quantity, order.price
        );
    }
    out.push_str("\nBUY ORDERS:\n");
    for order in bids {
        let _ = writeln!(
            out,
            "ID: {} | {} @ ${}",
            order.order_id, order.quantity, order.price
        );
    }
    out
}
