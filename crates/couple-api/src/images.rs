use axum::{
    Json,
    extract::{Query, State},
};
use axum_extra::extract::WithRejection;
use tracing::info;

use couple_types::api::{
    ImagesQuery, UploadImageRequest, UploadImageResponse, ViewImageRequest, ViewImageResponse,
};
use couple_types::channel::ADMIN;
use couple_types::models::{Image, VIEW_ONE_TIME, VIEW_PERMANENT};

use crate::error::{ApiError, ApiResult, required_str};
use crate::state::AppState;
use crate::{JsonBody, QueryParams};

/// Record a shared image. `image` is the URL it is already hosted at.
pub async fn upload_image(
    State(state): State<AppState>,
    WithRejection(Json(req), _): JsonBody<UploadImageRequest>,
) -> ApiResult<Json<UploadImageResponse>> {
    let url = required_str(req.image, "Missing required fields")?;
    let sender = required_str(req.sender, "Missing required fields")?;
    let receiver = required_str(req.receiver, "Missing required fields")?;
    let view_type = req.view_type.unwrap_or_else(|| VIEW_PERMANENT.into());
    if view_type != VIEW_PERMANENT && view_type != VIEW_ONE_TIME {
        return Err(ApiError::bad_request(format!(
            "viewType must be {} or {}",
            VIEW_PERMANENT, VIEW_ONE_TIME
        )));
    }
    let storage_id = req.storage_id;

    let image = state
        .with_db(move |db| {
            db.create_image(storage_id.as_deref(), &url, &sender, &receiver, &view_type)
        })
        .await?;

    Ok(Json(UploadImageResponse {
        success: true,
        image,
    }))
}

/// Images a user sent or received, newest first. Without `user`, all images.
pub async fn list_images(
    State(state): State<AppState>,
    WithRejection(Query(query), _): QueryParams<ImagesQuery>,
) -> ApiResult<Json<Vec<Image>>> {
    let user = query.user.filter(|u| !u.is_empty());
    let images = state
        .with_db(move |db| db.list_images(user.as_deref()))
        .await?;
    Ok(Json(images))
}

/// Reveal an image to its receiver. A one-time image is marked viewed on the
/// first reveal and deleted on the next attempt.
pub async fn view_image(
    State(state): State<AppState>,
    WithRejection(Json(req), _): JsonBody<ViewImageRequest>,
) -> ApiResult<Json<ViewImageResponse>> {
    let image_id = required_str(req.image_id, "Missing required fields")?;
    let user = required_str(req.user, "Missing required fields")?;

    let image = {
        let image_id = image_id.clone();
        state
            .with_db(move |db| db.get_image(&image_id))
            .await?
            .ok_or_else(|| ApiError::NotFound("Image not found".into()))?
    };

    // Images addressed to the admin account are viewable by anyone.
    if image.receiver != user && image.receiver != ADMIN {
        return Err(ApiError::Forbidden("Unauthorized".into()));
    }

    if image.view_type == VIEW_ONE_TIME {
        if image.viewed {
            let id = image_id.clone();
            state.with_db(move |db| db.delete_image(&id)).await?;
            info!("One-time image {} deleted after second view attempt", image_id);
            return Err(ApiError::Gone("Image already viewed and deleted".into()));
        }
        state
            .with_db(move |db| db.mark_image_viewed(&image_id))
            .await?;
    }

    Ok(Json(ViewImageResponse {
        url: image.url,
        view_type: image.view_type,
    }))
}
