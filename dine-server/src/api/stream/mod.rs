//! SSE streams over the fan-out bus
//!
//! `/changes` carries the durable change stream (subscribers re-fetch the
//! affected row); `/ephemeral` carries fire-and-forget events. Both are
//! filtered by `restaurant_id`. A subscriber that lags past the channel
//! capacity skips ahead; the change stream stays correct because deltas
//! carry ids only.

use axum::{
    Router,
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
};
use futures::Stream;
use serde::Deserialize;
use tokio::sync::broadcast;

use crate::server::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/stream/changes", get(changes))
        .route("/api/stream/ephemeral", get(ephemeral))
}

#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    pub restaurant_id: String,
}

async fn changes(
    State(state): State<AppState>,
    Query(query): Query<StreamQuery>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let rx = state.bus.subscribe_changes();
    let restaurant_id = query.restaurant_id;

    let stream = futures::stream::unfold((rx, restaurant_id), |(mut rx, restaurant_id)| async {
        loop {
            match rx.recv().await {
                Ok(ev) if ev.restaurant_id == restaurant_id => {
                    let event = Event::default().event("change").json_data(&ev);
                    return Some((event, (rx, restaurant_id)));
                }
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

async fn ephemeral(
    State(state): State<AppState>,
    Query(query): Query<StreamQuery>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let rx = state.bus.subscribe_ephemeral();
    let restaurant_id = query.restaurant_id;

    let stream = futures::stream::unfold((rx, restaurant_id), |(mut rx, restaurant_id)| async {
        loop {
            match rx.recv().await {
                Ok(ev) if ev.restaurant_id == restaurant_id => {
                    let event = Event::default().event("ephemeral").json_data(&ev);
                    return Some((event, (rx, restaurant_id)));
                }
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}
