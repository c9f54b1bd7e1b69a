use axum::{
    Json,
    extract::{Query, State},
};
use axum_extra::extract::WithRejection;

use couple_types::api::{
    ActivitiesQuery, CreateActivityRequest, CreateCommentRequest, UpdateActivityRequest,
};
use couple_types::channel::{activities_channel, default_channel, display_name};
use couple_types::events::names;
use couple_types::models::{Activity, ActivityComment};

use crate::error::{ApiError, ApiResult, required_str};
use crate::state::AppState;
use crate::{JsonBody, QueryParams};

pub async fn list_activities(
    State(state): State<AppState>,
    WithRejection(Query(query), _): QueryParams<ActivitiesQuery>,
) -> ApiResult<Json<Vec<Activity>>> {
    let date = required_str(query.date, "Date required")?;
    let activities = state
        .with_db(move |db| db.get_activities_by_date(&date))
        .await?;
    Ok(Json(activities))
}

/// Log an activity for today (UTC).
pub async fn create_activity(
    State(state): State<AppState>,
    WithRejection(Json(req), _): JsonBody<CreateActivityRequest>,
) -> ApiResult<Json<Activity>> {
    let text = required_str(req.text, "Text and sender required")?;
    let sender = required_str(req.sender, "Text and sender required")?;
    let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
    let image_url = req.image_url;

    let activity = state
        .with_db(move |db| db.create_activity(&text, image_url.as_deref(), &sender, &today))
        .await?;

    state
        .publish(&default_channel(), names::NEW_ACTIVITY, &activity)
        .await;
    Ok(Json(activity))
}

/// Apply one change to an activity: a status, a reaction toggle, or a
/// comment, checked in that order.
pub async fn update_activity(
    State(state): State<AppState>,
    WithRejection(Json(req), _): JsonBody<UpdateActivityRequest>,
) -> ApiResult<Json<Activity>> {
    let id = required_str(req.id, "Activity ID required")?;
    let present = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

    let updated = if let Some(status) = present(req.status) {
        state
            .with_db(move |db| db.set_activity_status(&id, &status))
            .await?
    } else if let Some(emoji) = present(req.reaction) {
        let sender = required_str(req.sender, "Sender required to react")?;
        state
            .with_db(move |db| db.toggle_activity_reaction(&id, &sender, &emoji))
            .await?
    } else if let (Some(comment), Some(sender)) =
        (present(req.comment), present(req.sender))
    {
        state
            .with_db(move |db| {
                if db.add_activity_comment(&id, &sender, &comment)?.is_none() {
                    return Ok(None);
                }
                db.get_activity(&id)
            })
            .await?
    } else {
        return Err(ApiError::bad_request(
            "One of status, reaction or comment with sender required",
        ));
    };

    let activity = updated.ok_or_else(|| ApiError::NotFound("Activity not found".into()))?;
    state
        .publish(&default_channel(), names::ACTIVITY_UPDATE, &activity)
        .await;
    Ok(Json(activity))
}

pub async fn add_comment(
    State(state): State<AppState>,
    WithRejection(Json(req), _): JsonBody<CreateCommentRequest>,
) -> ApiResult<Json<ActivityComment>> {
    let activity_id = required_str(req.activity_id, "Activity ID required")?;
    let text = required_str(req.text, "Text required")?;
    let user = required_str(req.user, "User required")?;

    let (comment, activity) = {
        let (text, user) = (text.clone(), user.clone());
        state
            .with_db(move |db| {
                let Some(comment) = db.add_activity_comment(&activity_id, &user, &text)? else {
                    return Ok(None);
                };
                let activity = db.get_activity(&activity_id)?;
                Ok(Some((comment, activity)))
            })
            .await?
            .ok_or_else(|| ApiError::NotFound("Activity not found".into()))?
    };

    if let Some(activity) = activity {
        state
            .publish(&activities_channel(&activity.date), names::UPDATE_ACTIVITY, &activity)
            .await;

        if activity.sender != user {
            let body = format!("{} commented: {}", display_name(&user), text);
            state.notify_user(&activity.sender, "New Comment", &body).await;
        }
    }

    Ok(Json(comment))
}
