mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    extract::{State, WebSocketUpgrade},
    http::HeaderValue,
    response::IntoResponse,
    routing::get,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use couple_api::mailer::Mailer;
use couple_api::push::{PushSender, VapidConfig};
use couple_api::{AppState, AppStateInner};
use couple_db::Database;
use couple_gateway::pusher::PusherClient;
use couple_gateway::{Broadcaster, Dispatcher, Publisher, connection};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "couple=debug,couple_api=debug,couple_gateway=debug,tower_http=debug".into()
            }),
        )
        .init();

    let db = Database::open(&config.db_path)?;

    // Relay: local gateway, mirrored to Pusher when configured
    let dispatcher = Dispatcher::new();
    let pusher = match config.pusher.clone() {
        Some(pusher_config) => {
            info!("Mirroring events to Pusher cluster {}", pusher_config.cluster);
            Some(PusherClient::new(pusher_config)?)
        }
        None => {
            info!("Pusher not configured, relaying through /gateway only");
            None
        }
    };
    let publisher: Arc<dyn Publisher> = Arc::new(Broadcaster::new(dispatcher.clone(), pusher));

    let mailer = match config.smtp.clone() {
        Some(smtp) => Mailer::new(smtp, config.app_url.clone())?,
        None => {
            warn!("SMTP credentials missing, emails will be simulated");
            Mailer::disabled(config.app_url.clone())
        }
    };

    let push = match &config.vapid {
        Some(vapid) => {
            let pem = std::fs::read_to_string(&vapid.private_key_path).with_context(|| {
                format!(
                    "reading VAPID private key {}",
                    vapid.private_key_path.display()
                )
            })?;
            PushSender::new(VapidConfig {
                subject: vapid.subject.clone(),
                public_key: vapid.public_key.clone(),
                private_key_pem: pem,
            })?
        }
        None => {
            info!("VAPID keys not configured, push notifications disabled");
            PushSender::disabled()
        }
    };

    let state: AppState = Arc::new(AppStateInner {
        db,
        publisher,
        mailer,
        push,
    });

    let gateway = Router::new()
        .route("/gateway", get(ws_upgrade))
        .with_state(dispatcher);

    let app = couple_api::router(state)
        .merge(gateway)
        .layer(cors_layer(&config.allowed_origins)?)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server_address().parse()?;
    info!("Couple server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Couple server stopped");
    Ok(())
}

async fn ws_upgrade(State(dispatcher): State<Dispatcher>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| connection::handle_connection(socket, dispatcher))
}

fn cors_layer(origins: &[String]) -> anyhow::Result<CorsLayer> {
    if origins.is_empty() {
        return Ok(CorsLayer::permissive());
    }
    let origins = origins
        .iter()
        .map(|o| HeaderValue::from_str(o).with_context(|| format!("Invalid origin {}", o)))
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
