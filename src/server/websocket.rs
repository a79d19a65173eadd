/// WebSocket handler for live snapshot updates
///
/// Each client gets the current snapshot on connect, then one message per
/// refresh. Messages are `{"snapshot": ..., "summary": ...}`.

use axum::{
    extract::ws::{Message, WebSocket},
    extract::{State, WebSocketUpgrade},
    response::Response,
};
use futures::{sink::SinkExt, stream::StreamExt};
use serde::Serialize;
use tokio::sync::watch;

use super::handlers::AppState;
use crate::core::derived::DashboardSummary;
use crate::core::refresh::SharedSnapshot;
use crate::core::MetricsSnapshot;

#[derive(Serialize)]
struct SnapshotUpdate<'a> {
    snapshot: &'a MetricsSnapshot,
    summary: DashboardSummary,
}

pub fn update_message(snapshot: &MetricsSnapshot) -> serde_json::Result<String> {
    serde_json::to_string(&SnapshotUpdate {
        snapshot,
        summary: DashboardSummary::from_snapshot(snapshot),
    })
}

pub async fn ws_snapshot_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let updates = state.subscribe();
    ws.on_upgrade(move |socket| handle_snapshot_websocket(socket, updates))
}

async fn send_snapshot<S>(sender: &mut S, snapshot: &MetricsSnapshot) -> bool
where
    S: futures::Sink<Message> + Unpin,
{
    match update_message(snapshot) {
        Ok(json) => sender.send(Message::Text(json)).await.is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to serialize snapshot update");
            true
        }
    }
}

async fn handle_snapshot_websocket(socket: WebSocket, mut updates: watch::Receiver<SharedSnapshot>) {
    let (mut sender, mut receiver) = socket.split();

    let initial = updates.borrow_and_update().clone();
    if let Some(snapshot) = initial {
        if !send_snapshot(&mut sender, &snapshot).await {
            return;
        }
    }

    loop {
        tokio::select! {
            changed = updates.changed() => {
                // Refresh loop gone
                if changed.is_err() {
                    break;
                }

                let latest = updates.borrow_and_update().clone();
                if let Some(snapshot) = latest {
                    if !send_snapshot(&mut sender, &snapshot).await {
                        break;
                    }
                }
            }

            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    tracing::debug!("snapshot websocket closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::feed::reference_snapshot;

    #[test]
    fn test_update_message_carries_snapshot_and_summary() {
        let snapshot = reference_snapshot();
        let json: serde_json::Value = serde_json::from_str(&update_message(&snapshot).unwrap()).unwrap();

        assert_eq!(json["snapshot"]["green_area_hectares"], 135);
        assert_eq!(json["summary"]["cumulative_impact"]["total_co2_reduction"], 4300);
        assert_eq!(json["summary"]["station_counters_consistent"], true);
    }
}
