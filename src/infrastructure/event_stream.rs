// Server-sent event streaming of monitor events
use crate::domain::events::MonitorEvent;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use tokio::sync::broadcast;

/// Event name used on the wire for each variant.
fn event_name(event: &MonitorEvent) -> &'static str {
    match event {
        MonitorEvent::Status(_) => "status",
        MonitorEvent::Alert(_) => "alert",
        MonitorEvent::Error { .. } => "error",
        MonitorEvent::Stopped { .. } => "stopped",
    }
}

/// Encode a monitor event as one SSE frame with a JSON payload.
pub fn to_sse_event(event: &MonitorEvent) -> Option<Event> {
    match Event::default().event(event_name(event)).json_data(event) {
        Ok(frame) => Some(frame),
        Err(e) => {
            tracing::error!("Failed to encode monitor event: {}", e);
            None
        }
    }
}

/// Turn a broadcast receiver into a stream of SSE frames. Lagging
/// subscribers skip the events they missed.
pub fn event_stream(
    mut rx: broadcast::Receiver<MonitorEvent>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Some(frame) = to_sse_event(&event) {
                        yield Ok::<Event, Infallible>(frame);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Event subscriber lagged, skipped {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}

pub fn sse_from_receiver(
    rx: broadcast::Receiver<MonitorEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    Sse::new(event_stream(rx)).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_stream_ends_when_sender_dropped() {
        let (tx, rx) = broadcast::channel(4);
        tx.send(MonitorEvent::Stopped {
            name: "Rook".to_string(),
        })
        .unwrap();
        drop(tx);

        let frames: Vec<_> = event_stream(rx).collect().await;
        assert_eq!(frames.len(), 1);
    }

    #[tokio::test]
    async fn test_lagged_subscriber_keeps_streaming() {
        let (tx, rx) = broadcast::channel(1);
        for name in ["Rook", "Bishop", "Knight"] {
            tx.send(MonitorEvent::Stopped {
                name: name.to_string(),
            })
            .unwrap();
        }
        drop(tx);

        let frames: Vec<_> = event_stream(rx).collect().await;
        assert_eq!(frames.len(), 1);
    }

    #[test]
    fn test_event_names() {
        let stopped = MonitorEvent::Stopped {
            name: "Rook".to_string(),
        };
        assert_eq!(event_name(&stopped), "stopped");
        assert!(to_sse_event(&stopped).is_some());
    }
}
