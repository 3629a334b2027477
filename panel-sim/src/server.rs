//! Bench stand-in for the panel's status page.
//!
//! Serves `/meters.xml` with an `OutputPower` reading that steps through a fixed sweep
//! around the default threshold. `POST /output` pins a value, `DELETE /output` releases it.

use std::{
    net::SocketAddr,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::Context;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use tokio::{net::TcpListener, sync::Mutex};
use tracing::{info, warn};

const SWEEP_STEP: Duration = Duration::from_secs(30);

#[derive(Clone)]
struct PanelState {
    started: Instant,
    pinned: Arc<Mutex<Option<f64>>>,
}

impl PanelState {
    fn new() -> Self {
        Self {
            started: Instant::now(),
            pinned: Arc::new(Mutex::new(None)),
        }
    }

    async fn output(&self) -> f64 {
        if let Some(pinned) = *self.pinned.lock().await {
            return pinned;
        }
        let tick = self.started.elapsed().as_secs() / SWEEP_STEP.as_secs();
        simulated_output(tick)
    }
}

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let port = std::env::var("PANEL_SIM_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let app = Router::new()
        .route("/meters.xml", get(handle_get_meters))
        .route(
            "/output",
            post(handle_pin_output).delete(handle_release_output),
        )
        .with_state(PanelState::new());

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind panel simulator at {addr}"))?;

    info!("panel simulator serving http://{addr}/meters.xml");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn handle_get_meters(State(state): State<PanelState>) -> impl IntoResponse {
    let output = state.output().await;
    (
        [(header::CONTENT_TYPE, "application/xml")],
        render_page(output),
    )
}

async fn handle_pin_output(State(state): State<PanelState>, body: String) -> impl IntoResponse {
    match parse_output(&body) {
        Some(value) => {
            *state.pinned.lock().await = Some(value);
            info!("output pinned at {value}");
            StatusCode::NO_CONTENT
        }
        None => {
            warn!("rejected output value {body:?}");
            StatusCode::BAD_REQUEST
        }
    }
}

async fn handle_release_output(State(state): State<PanelState>) -> impl IntoResponse {
    *state.pinned.lock().await = None;
    info!("output released to sweep");
    StatusCode::NO_CONTENT
}

/// Steps 0.4 to 1.1 in tenths, crossing the default 0.7 threshold twice per sweep.
fn simulated_output(tick: u64) -> f64 {
    0.4 + (tick % 8) as f64 * 0.1
}

fn parse_output(body: &str) -> Option<f64> {
    body.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

fn render_page(output: f64) -> String {
    format!(
        "<meters>\n<line1>x</line1>\n<OutputPower>{output:.2}</OutputPower>\n<line3>x</line3>\n</meters>\n"
    )
}
