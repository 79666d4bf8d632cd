use axum::{
    extract::{RawQuery, State},
    http::StatusCode,
};
use std::sync::Arc;
use tracing::info;

use crate::state::AppState;

/// Extract the `text` query parameter.
///
/// Repeated values are joined with `,`; a missing parameter yields an empty
/// string. Never fails.
pub fn text_from_query(query: Option<&str>) -> String {
    let Some(query) = query else {
        return String::new();
    };

    url::form_urlencoded::parse(query.as_bytes())
        .filter(|(key, _)| key == "text")
        .map(|(_, value)| value.into_owned())
        .collect::<Vec<_>>()
        .join(",")
}

/// Relay text to the host speech engine
///
/// Queues the `text` query parameter for speaking and returns immediately.
/// The response is always `200 OK` with an empty body, whatever the engine
/// later does with the text.
#[cfg_attr(
    feature = "openapi",
    utoipa::path(
        post,
        path = "/_speak",
        params(
            ("text" = Option<String>, Query, description = "Text to speak; empty when omitted")
        ),
        responses(
            (status = 200, description = "Text queued for speaking")
        ),
        tag = "speech"
    )
)]
pub async fn speak_handler(
    State(state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
) -> StatusCode {
    let text = text_from_query(query.as_deref());
    info!("got {}", text);

    state.speech.submit(text);
    StatusCode::OK
}
