use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use application::{
    EditMessageRequest, MessageDto, ParticipantDto, PostMessageRequest,
};
use domain::{MessageId, MessageKind};

use crate::{error::ApiError, state::AppState};

#[derive(Debug, Deserialize)]
struct RegisterPayload {
    name: String,
}

#[derive(Debug, Deserialize)]
struct MessagePayload {
    to: String,
    text: String,
    #[serde(rename = "type")]
    kind: MessageKind,
}

#[derive(Debug, Deserialize)]
struct ListMessagesQuery {
    limit: Option<String>,
}

#[derive(Debug, Serialize)]
struct PostMessageResponse {
    id: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/participants",
            post(register_participant).get(list_participants),
        )
        .route("/messages", post(post_message).get(list_messages))
        .route(
            "/messages/{id}",
            axum::routing::delete(delete_message).put(edit_message),
        )
        .route("/status", post(heartbeat))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// 调用者身份：`User` 请求头里的显示名。
fn user_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get("user")
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

async fn register_participant(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<StatusCode, ApiError> {
    state.participant_service.register(&payload.name).await?;
    Ok(StatusCode::CREATED)
}

async fn list_participants(
    State(state): State<AppState>,
) -> Result<Json<Vec<ParticipantDto>>, ApiError> {
    let participants = state.participant_service.list().await?;
    Ok(Json(participants.into_iter().map(Into::into).collect()))
}

async fn post_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<MessagePayload>,
) -> Result<(StatusCode, Json<PostMessageResponse>), ApiError> {
    // 缺失的 User 头按空的 from 走校验，统一返回 422
    let user = user_header(&headers).unwrap_or_default();
    let id = state
        .message_service
        .post(PostMessageRequest {
            from: user,
            to: payload.to,
            text: payload.text,
            kind: payload.kind,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(PostMessageResponse { id: id.to_string() }),
    ))
}

async fn list_messages(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListMessagesQuery>,
) -> Result<Json<Vec<MessageDto>>, ApiError> {
    let user = user_header(&headers).unwrap_or_default();

    let limit = match query.limit {
        None => None,
        Some(raw) => Some(raw.parse::<i64>().map_err(|_| {
            ApiError::unprocessable("INVALID_LIMIT", "limit must be a positive integer")
        })?),
    };

    let messages = state.message_service.list(&user, limit).await?;
    Ok(Json(messages.into_iter().map(Into::into).collect()))
}

async fn delete_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let user = user_header(&headers).unwrap_or_default();
    state
        .message_service
        .remove(MessageId::from(id), &user)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn edit_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<MessagePayload>,
) -> Result<StatusCode, ApiError> {
    let user = user_header(&headers).unwrap_or_default();
    state
        .message_service
        .edit(
            MessageId::from(id),
            EditMessageRequest {
                caller: user,
                to: payload.to,
                text: payload.text,
                kind: payload.kind,
            },
        )
        .await?;
    Ok(StatusCode::OK)
}

async fn heartbeat(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    // 没有身份头时不触碰存储，直接 404
    let user = user_header(&headers)
        .ok_or_else(|| ApiError::not_found("PARTICIPANT_NOT_FOUND", "missing user header"))?;
    state.participant_service.heartbeat(&user).await?;
    Ok(StatusCode::OK)
}
