use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures_util::{Stream, StreamExt};
use tracing::debug;

use crate::{identity::Teacher, AppState};

/// Live proctoring feed: one `data: <json>` message per published event.
///
/// The subscription lives inside the response body, so it is released as soon
/// as the client goes away and axum drops the stream.
pub async fn stream(
    Teacher(teacher): Teacher,
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let subscription = state.broadcaster.subscribe();

    debug!(
        "monitor {} attached for {:?}",
        subscription.id(),
        teacher.username
    );

    Sse::new(subscription.map(|event| Event::default().json_data(event)))
        .keep_alive(KeepAlive::new().interval(state.keep_alive).text("ping"))
}
