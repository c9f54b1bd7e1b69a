pub mod activities;
pub mod admin;
pub mod error;
pub mod health;
pub mod images;
pub mod mailer;
pub mod messages;
pub mod notify;
pub mod profiles;
pub mod push;
pub mod realtime;
pub mod state;

use axum::{
    Json, Router,
    extract::Query,
    routing::{get, post},
};
use axum_extra::extract::WithRejection;

pub use error::{ApiError, ApiResult};
pub use state::{AppState, AppStateInner};

/// JSON body whose parse failures answer 400 `{error}`.
pub(crate) type JsonBody<T> = WithRejection<Json<T>, ApiError>;
pub(crate) type QueryParams<T> = WithRejection<Query<T>, ApiError>;

/// Every HTTP endpoint except the gateway upgrade.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/api/activities",
            get(activities::list_activities)
                .post(activities::create_activity)
                .patch(activities::update_activity),
        )
        .route("/api/activities/comment", post(activities::add_comment))
        .route(
            "/api/messages",
            get(messages::get_messages)
                .post(messages::send_message)
                .patch(messages::edit_message)
                .delete(messages::delete_message),
        )
        .route("/api/messages/clear", post(messages::clear_chat))
        .route("/api/messages/typing", post(messages::typing))
        .route("/api/messages/pin", post(messages::pin_message))
        .route("/api/messages/react", post(messages::react_message))
        .route("/api/chat/signal", post(realtime::relay_signal))
        .route("/api/chat/music", post(realtime::chat_music))
        .route("/api/music", post(realtime::update_music))
        .route("/api/location", post(realtime::update_location))
        .route(
            "/api/profiles",
            get(profiles::get_profile).post(profiles::upsert_profile),
        )
        .route("/api/images", get(images::list_images).post(images::upload_image))
        .route("/api/images/view", post(images::view_image))
        .route("/api/mood-notify", post(notify::mood_notify))
        .route("/api/send-missing-you", post(notify::send_missing_you))
        .route("/api/notifications/subscribe", post(notify::subscribe))
        .route(
            "/api/admin/settings",
            get(admin::get_settings).post(admin::update_settings),
        )
        .route(
            "/api/admin/songs",
            get(admin::list_songs)
                .post(admin::create_song)
                .delete(admin::delete_song),
        )
        .with_state(state)
}
