use axum::{
    Json,
    extract::{Query, State},
};
use axum_extra::extract::WithRejection;
use serde_json::json;

use couple_db::queries::{NewMessageRecord, new_id};
use couple_types::api::{
    ClearChatRequest, DeleteMessageRequest, EditMessageRequest, MessagesQuery,
    PinMessageRequest, ReactMessageRequest, SendMessageRequest, SuccessResponse, TypingRequest,
};
use couple_types::channel_key;
use couple_types::events::names;
use couple_types::models::Message;

use crate::error::{ApiError, ApiResult, required, required_str};
use crate::state::AppState;
use crate::{JsonBody, QueryParams};

/// Most recent messages returned for a chat.
const HISTORY_LIMIT: u32 = 500;

fn not_found() -> ApiError {
    ApiError::NotFound("Message not found".into())
}

/// Chat history of a pair, oldest first.
pub async fn get_messages(
    State(state): State<AppState>,
    WithRejection(Query(query), _): QueryParams<MessagesQuery>,
) -> ApiResult<Json<Vec<Message>>> {
    let user1 = required_str(query.user1, "user1 and user2 required")?;
    let user2 = required_str(query.user2, "user1 and user2 required")?;
    let chat_key = channel_key(&user1, &user2);

    let messages = state
        .with_db(move |db| db.get_messages(&chat_key, HISTORY_LIMIT))
        .await?;
    Ok(Json(messages))
}

/// Store a message under the pair's chat key. Re-posting an id updates it.
pub async fn send_message(
    State(state): State<AppState>,
    WithRejection(Json(req), _): JsonBody<SendMessageRequest>,
) -> ApiResult<Json<Message>> {
    let user1 = required_str(req.user1, "user1 and user2 required")?;
    let user2 = required_str(req.user2, "user1 and user2 required")?;
    let message = required(req.message, "Message required")?;
    let sender = required_str(message.sender, "Message sender required")?;

    let chat_key = channel_key(&user1, &user2);
    let record = NewMessageRecord {
        id: message.id.filter(|id| !id.is_empty()).unwrap_or_else(new_id),
        chat_key: chat_key.clone(),
        sender,
        text: message.text,
        kind: message.kind.unwrap_or_else(|| "text".into()),
        image_url: message.image_url,
        unlock_at: message.unlock_at,
        status: "sent".into(),
        is_pinned: message.is_pinned,
        timestamp: message.timestamp,
    };

    let stored = state.with_db(move |db| db.upsert_message(&record)).await?;
    state.publish(&chat_key, names::NEW_MESSAGE, &stored).await;
    Ok(Json(stored))
}

pub async fn edit_message(
    State(state): State<AppState>,
    WithRejection(Json(req), _): JsonBody<EditMessageRequest>,
) -> ApiResult<Json<Message>> {
    let id = required_str(req.message_id, "messageId required")?;
    let text = required_str(req.text, "text required")?;

    let message = state
        .with_db(move |db| db.edit_message(&id, &text))
        .await?
        .ok_or_else(not_found)?;

    state
        .publish(&message.chat_key, names::MESSAGE_EDITED, &message)
        .await;
    Ok(Json(message))
}

pub async fn delete_message(
    State(state): State<AppState>,
    WithRejection(Json(req), _): JsonBody<DeleteMessageRequest>,
) -> ApiResult<Json<SuccessResponse>> {
    let id = required_str(req.message_id, "messageId required")?;

    let deleted = {
        let id = id.clone();
        state
            .with_db(move |db| db.delete_message(&id))
            .await?
            .ok_or_else(not_found)?
    };

    state
        .publish(
            &deleted.chat_key,
            names::MESSAGE_DELETED,
            &json!({ "messageId": id }),
        )
        .await;
    Ok(Json(SuccessResponse::ok()))
}

pub async fn clear_chat(
    State(state): State<AppState>,
    WithRejection(Json(req), _): JsonBody<ClearChatRequest>,
) -> ApiResult<Json<SuccessResponse>> {
    let chat_key = required_str(req.chat_key, "chatKey required")?;

    let removed = {
        let chat_key = chat_key.clone();
        state.with_db(move |db| db.clear_chat(&chat_key)).await?
    };
    tracing::info!("Cleared {} messages from {}", removed, chat_key);

    state
        .publish(&chat_key, names::CLEAR_CHAT, &json!({ "chatKey": chat_key }))
        .await;
    Ok(Json(SuccessResponse::ok()))
}

/// Typing indicators are relayed only, never stored.
pub async fn typing(
    State(state): State<AppState>,
    WithRejection(Json(req), _): JsonBody<TypingRequest>,
) -> ApiResult<Json<SuccessResponse>> {
    let chat_key = required_str(req.chat_key, "chatKey and user required")?;
    let user = required_str(req.user, "chatKey and user required")?;

    state
        .publish(
            &chat_key,
            names::TYPING,
            &json!({ "user": user, "isTyping": req.is_typing }),
        )
        .await;
    Ok(Json(SuccessResponse::ok()))
}

pub async fn pin_message(
    State(state): State<AppState>,
    WithRejection(Json(req), _): JsonBody<PinMessageRequest>,
) -> ApiResult<Json<Message>> {
    let id = required_str(req.message_id, "messageId required")?;
    let pinned = required(req.is_pinned, "isPinned required")?;

    let message = state
        .with_db(move |db| db.set_message_pinned(&id, pinned))
        .await?
        .ok_or_else(not_found)?;

    let chat_key = req.chat_key.unwrap_or_else(|| message.chat_key.clone());
    state
        .publish(
            &chat_key,
            names::MESSAGE_PIN,
            &json!({ "messageId": message.id, "isPinned": message.is_pinned }),
        )
        .await;
    Ok(Json(message))
}

/// Toggle `user`'s `emoji` on a message.
pub async fn react_message(
    State(state): State<AppState>,
    WithRejection(Json(req), _): JsonBody<ReactMessageRequest>,
) -> ApiResult<Json<Message>> {
    let id = required_str(req.message_id, "messageId required")?;
    let emoji = required_str(req.emoji, "emoji and user required")?;
    let user = required_str(req.user, "emoji and user required")?;

    let message = state
        .with_db(move |db| db.toggle_message_reaction(&id, &user, &emoji))
        .await?
        .ok_or_else(not_found)?;

    let chat_key = req.chat_key.unwrap_or_else(|| message.chat_key.clone());
    state
        .publish(
            &chat_key,
            names::MESSAGE_REACTION,
            &json!({ "messageId": message.id, "reactions": message.reactions }),
        )
        .await;
    Ok(Json(message))
}
