use axum::{Json, extract::State};
use axum_extra::extract::WithRejection;

use couple_types::api::{
    CreateSongRequest, CreateSongResponse, DeleteSongRequest, SuccessResponse,
    UpdateSettingsRequest,
};
use couple_types::channel::default_channel;
use couple_types::events::names;
use couple_types::models::{GlobalSettings, PlaylistSong};

use crate::JsonBody;
use crate::error::{ApiError, ApiResult, required, required_str};
use crate::state::AppState;

pub async fn get_settings(State(state): State<AppState>) -> ApiResult<Json<GlobalSettings>> {
    let settings = state.with_db(|db| db.get_or_create_settings()).await?;
    Ok(Json(settings))
}

/// Update the shared settings and push them to both dashboards.
pub async fn update_settings(
    State(state): State<AppState>,
    WithRejection(Json(req), _): JsonBody<UpdateSettingsRequest>,
) -> ApiResult<Json<GlobalSettings>> {
    let stop_effects = required(req.stop_effects, "stopEffects required")?;
    let updated_by = req.updated_by;

    let settings = state
        .with_db(move |db| db.upsert_settings(stop_effects, updated_by.as_deref()))
        .await?;

    state
        .publish(&default_channel(), names::GLOBAL_SETTINGS_UPDATE, &settings)
        .await;
    Ok(Json(settings))
}

pub async fn list_songs(State(state): State<AppState>) -> ApiResult<Json<Vec<PlaylistSong>>> {
    let songs = state.with_db(|db| db.list_songs()).await?;
    Ok(Json(songs))
}

pub async fn create_song(
    State(state): State<AppState>,
    WithRejection(Json(req), _): JsonBody<CreateSongRequest>,
) -> ApiResult<Json<CreateSongResponse>> {
    let url = required_str(req.url, "Missing url or title")?;
    let title = required_str(req.title, "Missing url or title")?;
    let effect = req
        .effect
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| "none".into());

    let song = state
        .with_db(move |db| db.create_song(&url, &title, &effect, &default_channel()))
        .await?;
    Ok(Json(CreateSongResponse {
        success: true,
        song,
    }))
}

pub async fn delete_song(
    State(state): State<AppState>,
    WithRejection(Json(req), _): JsonBody<DeleteSongRequest>,
) -> ApiResult<Json<SuccessResponse>> {
    let id = required_str(req.id, "Song id required")?;
    if !state.with_db(move |db| db.delete_song(&id)).await? {
        return Err(ApiError::NotFound("Song not found".into()));
    }
    Ok(Json(SuccessResponse::ok()))
}
