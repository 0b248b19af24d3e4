//! Documentation of a raffle registration and drawing backend.
//!
//!
//!
//! # Flow
//!
//! - Participant registers with name, email, telegram, and WhatsApp
//! - A 6-digit verification code goes out over WhatsApp, valid 10 minutes
//! - Submitting the code validates the entry and locks in the ticket
//! - Codes can be resent after a server-side cool-down; a resend kills any
//!   earlier unused code, so at most one code is live per contact
//! - The admin triggers the draw: a random seed is generated, the winner is
//!   picked deterministically from the validated entrants, and the raffle
//!   closes permanently in the same step
//! - `(winner, drawnAt, seed)` stay published so anyone can re-run the
//!   selection over the recorded entrant order and confirm the result
//!
//!
//!
//! # Notes
//!
//! ## Determinism over uniformity
//!
//! The draw hashes the published seed (`h = h*31 + char`, signed 32-bit
//! wrap) and indexes the entrant list with `abs(h) % n`. That is auditable
//! but not cryptographically uniform; the seed is generated server-side
//! before the draw so nobody can grind it against the entrant list. See
//! `draw` for the trade-off.
//!
//! ## In-memory store
//!
//! Persistence sits behind the `Store` trait. The bundled `MemoryStore`
//! keeps everything in one process; swapping in a database only means
//! implementing the same handful of query shapes.
use std::time::Duration;

use axum::{
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post},
    Router,
};

use signal::{
    ctrl_c,
    unix::{signal, SignalKind},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

pub mod clock;
pub mod codes;
pub mod config;
pub mod draw;
pub mod error;
pub mod models;
pub mod notifier;
pub mod raffle;
pub mod routes;
pub mod state;
pub mod store;
pub mod utils;

use routes::{
    current_raffle_handler, draw_handler, historical_raffles_handler, participants_handler,
    register_handler, resend_handler, stats_handler, verify_handler,
};
use state::AppState;

pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = AppState::new();

    info!("Starting server...");

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    let app = Router::new()
        .route("/register", post(register_handler))
        .route("/verify-code", post(verify_handler))
        .route("/resend-code", post(resend_handler))
        .route("/draw-winner", post(draw_handler))
        .route("/participants", get(participants_handler))
        .route("/current-raffle", get(current_raffle_handler))
        .route("/raffle-stats", get(stats_handler))
        .route("/historical-raffles", get(historical_raffles_handler))
        .layer(cors)
        .with_state(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await.unwrap();
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    println!("Server shutting down...");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
