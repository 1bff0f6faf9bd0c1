//! Server-sent event endpoint for booking change streams.
//!
//! Connection lifecycle:
//! 1. Parse the `(scope, id)` channel address from the path
//! 2. Join the channel in the [`ChannelHub`]
//! 3. Emit `connected`, then `message` per change and `heartbeat` on a timer
//! 4. Leave the hub when the client goes away

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::sse::{Event, Sse};
use futures::stream::{self, Stream, StreamExt};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

use super::messages::{ConnectedEvent, HeartbeatEvent, EVENT_CONNECTED, EVENT_HEARTBEAT, EVENT_MESSAGE};
use super::{ChannelHub, EdgeApiError, EdgeState, HubMessage};
use crate::domain::booking::ChannelAddress;
use crate::domain::foundation::ClientId;
use crate::ports::Clock;

/// Removes the client from the hub when the response stream is dropped.
struct LeaveGuard {
    hub: Arc<ChannelHub>,
    client_id: ClientId,
}

impl Drop for LeaveGuard {
    fn drop(&mut self) {
        let hub = self.hub.clone();
        let client_id = self.client_id;
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(async move {
                hub.leave(&client_id).await;
                tracing::debug!(client_id = %client_id, "Stream client disconnected");
            });
        }
    }
}

/// Per-connection state threaded through the event stream.
struct Subscription {
    rx: broadcast::Receiver<HubMessage>,
    heartbeat: Interval,
    clock: Arc<dyn Clock>,
    client_id: ClientId,
    // Declared last so the receiver is gone before the hub cleans up.
    _guard: LeaveGuard,
}

impl Subscription {
    async fn next_event(&mut self) -> Option<Event> {
        loop {
            tokio::select! {
                _ = self.heartbeat.tick() => {
                    let payload = HeartbeatEvent { time: self.clock.now().as_unix_secs() };
                    return Some(json_event(EVENT_HEARTBEAT, &payload));
                }
                received = self.rx.recv() => match received {
                    Ok(message) => {
                        return Some(Event::default().event(EVENT_MESSAGE).data(&*message));
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            client_id = %self.client_id,
                            skipped,
                            "Stream client lagged, messages dropped"
                        );
                    }
                    Err(RecvError::Closed) => return None,
                },
            }
        }
    }
}

fn json_event<T: serde::Serialize>(name: &str, payload: &T) -> Event {
    Event::default()
        .event(name)
        .data(serde_json::to_string(payload).unwrap_or_default())
}

/// Handle `GET /events/:scope/:id`.
pub async fn stream_handler(
    Path((scope, id)): Path<(String, String)>,
    State(state): State<EdgeState>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, EdgeApiError> {
    let channel = ChannelAddress::parse(&scope, &id)
        .map_err(|e| EdgeApiError::BadRequest(e.to_string()))?;

    Ok(Sse::new(open_stream(state, channel).await))
}

/// Join `channel` and build the event stream for one client.
pub async fn open_stream(
    state: EdgeState,
    channel: ChannelAddress,
) -> impl Stream<Item = Result<Event, Infallible>> {
    let client_id = ClientId::new();
    let rx = state.hub.join(channel, client_id).await;

    tracing::debug!(client_id = %client_id, channel = %channel, "Stream client connected");

    let connected = json_event(
        EVENT_CONNECTED,
        &ConnectedEvent::new(&channel, &client_id, state.clock.now()),
    );

    let mut heartbeat = interval_at(
        Instant::now() + state.heartbeat_interval,
        state.heartbeat_interval,
    );
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let subscription = Subscription {
        rx,
        heartbeat,
        clock: state.clock,
        client_id,
        _guard: LeaveGuard {
            hub: state.hub,
            client_id,
        },
    };

    let updates = stream::unfold(subscription, |mut sub| async move {
        sub.next_event().await.map(|event| (Ok(event), sub))
    });

    stream::once(async move { Ok(connected) }).chain(updates)
}
