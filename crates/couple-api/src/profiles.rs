use axum::{
    Json,
    extract::{Query, State},
};
use axum_extra::extract::WithRejection;

use couple_types::api::{ProfileQuery, UpsertProfileRequest};
use couple_types::models::Profile;

use crate::error::{ApiResult, required_str};
use crate::state::AppState;
use crate::{JsonBody, QueryParams};

/// Fetch a profile, creating it on first access.
pub async fn get_profile(
    State(state): State<AppState>,
    WithRejection(Query(query), _): QueryParams<ProfileQuery>,
) -> ApiResult<Json<Profile>> {
    let role = required_str(query.role, "Role required")?;
    let profile = state
        .with_db(move |db| db.get_or_create_profile(&role))
        .await?;
    Ok(Json(profile))
}

pub async fn upsert_profile(
    State(state): State<AppState>,
    WithRejection(Json(req), _): JsonBody<UpsertProfileRequest>,
) -> ApiResult<Json<Profile>> {
    let role = required_str(req.role, "Role required")?;
    let name = req.name.filter(|name| !name.trim().is_empty());
    let avatar_url = req.avatar_url;

    let profile = state
        .with_db(move |db| db.upsert_profile(&role, name.as_deref(), avatar_url.as_deref()))
        .await?;
    Ok(Json(profile))
}
