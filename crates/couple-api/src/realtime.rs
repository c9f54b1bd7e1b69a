//! Relay-only and presence endpoints: call signals, shared playlist state,
//! now-playing and location.

use axum::{Json, extract::State};
use axum_extra::extract::WithRejection;
use serde_json::json;
use tracing::debug;

use couple_types::api::{ChatMusicRequest, LocationRequest, MusicRequest, SuccessResponse};
use couple_types::channel::default_channel;
use couple_types::channel_key;
use couple_types::events::names;
use couple_types::models::Profile;
use couple_types::signal::SignalMessage;

use crate::JsonBody;
use crate::error::{ApiError, ApiResult, required, required_str};
use crate::state::AppState;

/// Forward a call signal to the sender/receiver channel. The payload is
/// opaque; only the envelope is checked.
pub async fn relay_signal(
    State(state): State<AppState>,
    WithRejection(Json(signal), _): JsonBody<SignalMessage>,
) -> ApiResult<Json<SuccessResponse>> {
    if signal.sender.is_empty() || signal.receiver.is_empty() {
        return Err(ApiError::bad_request("sender and receiver required"));
    }

    let channel = channel_key(&signal.sender, &signal.receiver);
    debug!(
        "Relaying {} from {} to {}",
        signal.kind.as_str(),
        signal.sender,
        signal.receiver
    );
    state.publish(&channel, names::SIGNAL, &signal).await;
    Ok(Json(SuccessResponse::ok()))
}

pub async fn chat_music(
    State(state): State<AppState>,
    WithRejection(Json(req), _): JsonBody<ChatMusicRequest>,
) -> ApiResult<Json<SuccessResponse>> {
    let chat_key = required_str(req.chat_key, "Missing chatKey")?;

    state
        .publish(
            &chat_key,
            names::MUSIC_UPDATE,
            &json!({
                "playlist": req.playlist,
                "index": req.index,
                "isPlaying": req.is_playing,
            }),
        )
        .await;
    Ok(Json(SuccessResponse::ok()))
}

pub async fn update_music(
    State(state): State<AppState>,
    WithRejection(Json(req), _): JsonBody<MusicRequest>,
) -> ApiResult<Json<Profile>> {
    let role = required_str(req.role, "Role required")?;

    let profile = {
        let role = role.clone();
        let (name, artist, image) = (
            req.track_name.clone(),
            req.track_artist.clone(),
            req.track_image.clone(),
        );
        let playing = req.is_playing;
        state
            .with_db(move |db| {
                db.update_now_playing(
                    &role,
                    name.as_deref(),
                    artist.as_deref(),
                    image.as_deref(),
                    playing,
                )
            })
            .await?
    };

    state
        .publish(
            &default_channel(),
            names::MUSIC_UPDATE,
            &json!({
                "role": role,
                "trackName": req.track_name,
                "trackArtist": req.track_artist,
                "trackImage": req.track_image,
                "isPlaying": req.is_playing,
            }),
        )
        .await;
    Ok(Json(profile))
}

pub async fn update_location(
    State(state): State<AppState>,
    WithRejection(Json(req), _): JsonBody<LocationRequest>,
) -> ApiResult<Json<Profile>> {
    let role = required_str(req.role, "Role required")?;
    let latitude = required(req.latitude, "latitude and longitude required")?;
    let longitude = required(req.longitude, "latitude and longitude required")?;

    let profile = {
        let role = role.clone();
        state
            .with_db(move |db| db.update_location(&role, latitude, longitude))
            .await?
    };

    state
        .publish(
            &default_channel(),
            names::LOCATION_UPDATE,
            &json!({ "role": role, "latitude": latitude, "longitude": longitude }),
        )
        .await;
    Ok(Json(profile))
}
