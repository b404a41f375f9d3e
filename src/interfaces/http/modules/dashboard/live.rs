//! Live dashboard over WebSocket
//!
//! The socket receives the full dashboard view on connect and again
//! whenever the live collections or the stats aggregate change the rendered
//! result. Clients switch tab or filter by sending a JSON object with any
//! of `tab`, `query` and `severity`.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
    Extension,
};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::select;
use tracing::{debug, info, warn};

use super::dto::ViewQuery;
use super::handlers::render_dashboard;
use crate::domain::Identity;
use crate::interfaces::http::common::ApiError;
use crate::interfaces::http::state::AppState;
use crate::views::DashboardView;

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum LiveFrame<'a> {
    Dashboard { view: &'a DashboardView },
    Error { message: String },
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/live",
    tag = "Dashboard",
    security(("bearer_auth" = [])),
    params(ViewQuery),
    responses(
        (status = 101, description = "Switching to the live dashboard feed"),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Signed in without the admin role"),
        (status = 422, description = "Unknown tab or severity")
    )
)]
pub async fn dashboard_live(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<ViewQuery>,
) -> Result<impl IntoResponse, ApiError> {
    query.tab()?;
    query.error_filter()?;

    info!(uid = %identity.uid, "Live dashboard connection");
    Ok(ws.on_upgrade(move |socket| handle_live_socket(socket, state, identity, query)))
}

fn frame(frame: &LiveFrame<'_>) -> Option<Message> {
    match serde_json::to_string(frame) {
        Ok(json) => Some(Message::Text(json.into())),
        Err(e) => {
            warn!(error = %e, "Failed to serialize live frame");
            None
        }
    }
}

async fn handle_live_socket(
    socket: WebSocket,
    state: AppState,
    identity: Identity,
    mut query: ViewQuery,
) {
    let (mut sender, mut receiver) = socket.split();
    let mut changes = state.dashboard.changes();
    let mut aggregate = state.dashboard.watch();
    let mut last_sent: Option<DashboardView> = None;

    loop {
        // `query` is always valid here; bad updates never replace it
        if let (Ok(tab), Ok(filter)) = (query.tab(), query.error_filter()) {
            let view = render_dashboard(&state.dashboard, tab, &filter);
            if last_sent.as_ref() != Some(&view) {
                let Some(message) = frame(&LiveFrame::Dashboard { view: &view }) else {
                    break;
                };
                if let Err(e) = sender.send(message).await {
                    debug!(error = %e, "Live dashboard send failed");
                    break;
                }
                last_sent = Some(view);
            }
        }

        select! {
            msg = receiver.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<ViewQuery>(text.as_str()) {
                        Ok(update) => {
                            let mut next = query.clone();
                            next.merge(update);
                            match next.tab().and(next.error_filter().map(|_| ())) {
                                Ok(()) => query = next,
                                Err(e) => {
                                    let reply = LiveFrame::Error { message: e.to_string() };
                                    if let Some(message) = frame(&reply) {
                                        if sender.send(message).await.is_err() {
                                            break;
                                        }
                                    }
                                }
                            }
                        }
                        Err(e) => debug!(error = %e, "Ignoring malformed live command"),
                    }
                }
                Some(Ok(Message::Ping(data))) => {
                    if sender.send(Message::Pong(data)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(e)) => {
                    warn!(error = %e, "Live dashboard socket error");
                    break;
                }
                Some(Ok(_)) => {}
            },
            changed = aggregate.changed() => {
                if changed.is_err() {
                    debug!("Dashboard aggregate closed");
                    break;
                }
            }
            change = changes.next() => {
                if change.is_none() {
                    debug!("Live bindings ended");
                    break;
                }
            }
        }
    }

    info!(uid = %identity.uid, "Live dashboard disconnected");
}
