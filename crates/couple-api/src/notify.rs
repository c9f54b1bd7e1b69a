use axum::{Json, extract::State};
use axum_extra::extract::WithRejection;
use lettre::message::Mailbox;

use couple_types::api::{
    MailResponse, MissingYouRequest, MoodNotifyRequest, SubscribeRequest, SuccessResponse,
};

use crate::JsonBody;
use crate::error::{ApiError, ApiResult, required, required_str};
use crate::mailer::{Delivery, Email, missing_you_email, mood_email};
use crate::state::AppState;

fn parse_recipient(raw: &str) -> ApiResult<Mailbox> {
    raw.parse()
        .map_err(|_| ApiError::bad_request(format!("Invalid email address: {}", raw)))
}

async fn deliver(state: &AppState, to: Mailbox, email: Email) -> ApiResult<Json<MailResponse>> {
    let delivery = state.mailer.send(to, email).await?;
    Ok(Json(MailResponse {
        success: true,
        simulated: delivery == Delivery::Simulated,
    }))
}

pub async fn mood_notify(
    State(state): State<AppState>,
    WithRejection(Json(req), _): JsonBody<MoodNotifyRequest>,
) -> ApiResult<Json<MailResponse>> {
    let from = required_str(req.from, "Missing required fields")?;
    let to_email = required_str(req.to_email, "Missing required fields")?;
    let mood = required_str(req.mood, "Missing required fields")?;
    let to = parse_recipient(&to_email)?;
    let email = mood_email(&from, &mood, state.mailer.app_url());
    deliver(&state, to, email).await
}

pub async fn send_missing_you(
    State(state): State<AppState>,
    WithRejection(Json(req), _): JsonBody<MissingYouRequest>,
) -> ApiResult<Json<MailResponse>> {
    let sender = required_str(req.sender, "Missing required fields")?;
    let recipient = required_str(req.recipient, "Missing required fields")?;
    let message = required_str(req.message, "Missing required fields")?;
    let to = parse_recipient(&recipient)?;
    let email = missing_you_email(&sender, &message, state.mailer.app_url());
    deliver(&state, to, email).await
}

/// Remember a browser push subscription for a participant.
pub async fn subscribe(
    State(state): State<AppState>,
    WithRejection(Json(req), _): JsonBody<SubscribeRequest>,
) -> ApiResult<Json<SuccessResponse>> {
    let subscription = required(req.subscription, "Missing data")?;
    let user_id = required_str(req.user_id, "Missing data")?;
    if subscription.endpoint.is_empty() {
        return Err(ApiError::bad_request("Missing data"));
    }

    state
        .with_db(move |db| {
            db.upsert_push_subscription(
                &user_id,
                &subscription.endpoint,
                &subscription.keys.p256dh,
                &subscription.keys.auth,
            )
        })
        .await?;
    Ok(Json(SuccessResponse::ok()))
}
