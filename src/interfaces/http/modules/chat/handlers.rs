//! Chat handler
//!
//! Each client keeps its own stat context on the server, keyed by the
//! `X-Client-Id` header or, failing that, the peer address.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRequestParts, State},
    http::request::Parts,
    Json,
};

use super::dto::{ChatReply, ChatRequest};
use crate::interfaces::http::common::{ApiResponse, ApiResult, ValidatedJson};
use crate::interfaces::http::state::AppState;

pub const CLIENT_ID_HEADER: &str = "x-client-id";

/// Identifies the chat client a request belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientId(pub String);

impl<S> FromRequestParts<S> for ClientId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(CLIENT_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        let peer = || {
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        };
        Ok(ClientId(
            header.or_else(peer).unwrap_or_else(|| "anonymous".to_string()),
        ))
    }
}

#[utoipa::path(
    post,
    path = "/chat",
    tag = "Assistant",
    request_body = ChatRequest,
    params(("X-Client-Id" = Option<String>, Header, description = "Stable client identifier")),
    responses(
        (status = 200, description = "Assistant reply", body = ApiResponse<ChatReply>),
        (status = 422, description = "Message too long")
    )
)]
pub async fn chat(
    State(state): State<AppState>,
    client: ClientId,
    ValidatedJson(request): ValidatedJson<ChatRequest>,
) -> ApiResult<ChatReply> {
    let reply = state
        .chat
        .reply(&client.0, &request.message, request.stat_card_info)
        .await?;
    Ok(Json(ApiResponse::success(ChatReply { reply })))
}
