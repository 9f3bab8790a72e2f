//! REST API implementation using rouille.
//!
//! GET handlers read [`SharedApiState`]; POST handlers translate the request
//! into an [`ApiCommand`] and send it to the refresh loop. Responses carry
//! `Access-Control-Allow-Origin: *` so the browser front-end can call in.

use crate::viewer::Controls;
use log::{error, info};
use rouille::{Request, Response};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock, mpsc};
use std::thread;

/// Commands sent from API handlers to the refresh loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCommand {
    /// Play the current selection, or set `(start, end)` first
    Play { range: Option<(i32, i32)> },
    Stop,
    PrevYear,
    NextYear,
    SelectSpectrum(String),
    Predict(i32),
}

/// Viewer state snapshot for API responses
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewerSnapshot {
    pub spectrum: String,
    pub year: i32,
    pub year_label: String,
    pub playing: bool,
    pub prediction: bool,
    pub range_start: i32,
    pub range_end: i32,
    pub controls: Controls,
    pub texture: Option<String>,
    pub spectra: Vec<String>,
}

/// Snapshot shared with HTTP handlers (written by the refresh loop)
#[derive(Default)]
pub struct SharedApiState {
    viewer: RwLock<ViewerSnapshot>,
}

impl SharedApiState {
    pub fn update(&self, snapshot: ViewerSnapshot) {
        *self.viewer.write().unwrap_or_else(|e| e.into_inner()) = snapshot;
    }

    pub fn snapshot(&self) -> ViewerSnapshot {
        self.viewer.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

/// Request body for `/api/play`
#[derive(Debug, Deserialize)]
struct PlayRequest {
    start: i32,
    end: i32,
}

/// Generic API response
#[derive(Serialize)]
struct ApiResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ApiResponse {
    fn ok() -> Self {
        Self { success: true, message: None, error: None }
    }

    fn ok_msg(msg: &str) -> Self {
        Self { success: true, message: Some(msg.to_string()), error: None }
    }

    fn err(msg: &str) -> Self {
        Self { success: false, message: None, error: Some(msg.to_string()) }
    }
}

/// REST API server
pub struct ApiServer {
    port: u16,
    state: Arc<SharedApiState>,
    command_tx: mpsc::Sender<ApiCommand>,
}

impl ApiServer {
    /// Start the server on a background thread.
    /// Returns the command receiver for the refresh loop to drain.
    pub fn start(port: u16, state: Arc<SharedApiState>) -> mpsc::Receiver<ApiCommand> {
        let (tx, rx) = mpsc::channel();
        let server = ApiServer {
            port,
            state,
            command_tx: tx,
        };
        thread::spawn(move || server.run());
        rx
    }

    fn run(self) {
        let addr = format!("0.0.0.0:{}", self.port);
        let state = self.state;
        let tx = self.command_tx;

        match rouille::Server::new(&addr, move |request| {
            Self::handle_request(request, &state, &tx)
        }) {
            Ok(server) => {
                info!("API server listening on http://{}", addr);
                server.run();
            }
            Err(e) => error!("API server failed to bind {}: {}", addr, e),
        }
    }

    fn handle_request(
        request: &Request,
        state: &SharedApiState,
        tx: &mpsc::Sender<ApiCommand>,
    ) -> Response {
        if request.method() == "OPTIONS" {
            return Response::empty_204()
                .with_additional_header("Access-Control-Allow-Origin", "*")
                .with_additional_header("Access-Control-Allow-Methods", "GET, POST, OPTIONS")
                .with_additional_header("Access-Control-Allow-Headers", "Content-Type");
        }

        Self::route(request, state, tx).with_additional_header("Access-Control-Allow-Origin", "*")
    }

    fn route(request: &Request, state: &SharedApiState, tx: &mpsc::Sender<ApiCommand>) -> Response {
        // Path parameters are matched by hand; router! is used for fixed paths
        let path = request.url();
        if request.method() == "POST" {
            if let Some(name) = path.strip_prefix("/api/spectrum/") {
                if name.is_empty() || name.contains('/') {
                    return Response::json(&ApiResponse::err("Invalid spectrum name"))
                        .with_status_code(400);
                }
                return Self::send_command(tx, ApiCommand::SelectSpectrum(name.to_string()));
            }
            if let Some(year_str) = path.strip_prefix("/api/predict/") {
                return match year_str.parse::<i32>() {
                    Ok(year) => Self::send_command(tx, ApiCommand::Predict(year)),
                    Err(_) => {
                        Response::json(&ApiResponse::err("Invalid year")).with_status_code(400)
                    }
                };
            }
        }

        rouille::router!(request,
            (GET) ["/api/health"] => {
                Response::json(&ApiResponse::ok_msg("terraplay API server"))
            },
            (GET) ["/api/status"] => {
                Response::json(&state.snapshot())
            },
            (POST) ["/api/play"] => {
                Self::handle_play(request, tx)
            },
            (POST) ["/api/stop"] => {
                Self::send_command(tx, ApiCommand::Stop)
            },
            (POST) ["/api/year/prev"] => {
                Self::send_command(tx, ApiCommand::PrevYear)
            },
            (POST) ["/api/year/next"] => {
                Self::send_command(tx, ApiCommand::NextYear)
            },
            _ => {
                Response::json(&ApiResponse::err("Not found")).with_status_code(404)
            }
        )
    }

    fn handle_play(request: &Request, tx: &mpsc::Sender<ApiCommand>) -> Response {
        // No body: play the current selection
        if request.header("Content-Type").is_none() {
            return Self::send_command(tx, ApiCommand::Play { range: None });
        }
        match rouille::input::json_input::<PlayRequest>(request) {
            Ok(req) => Self::send_command(
                tx,
                ApiCommand::Play {
                    range: Some((req.start, req.end)),
                },
            ),
            Err(e) => Response::json(&ApiResponse::err(&format!("Invalid JSON: {}", e)))
                .with_status_code(400),
        }
    }

    fn send_command(tx: &mpsc::Sender<ApiCommand>, cmd: ApiCommand) -> Response {
        match tx.send(cmd) {
            Ok(_) => Response::json(&ApiResponse::ok()),
            Err(e) => Response::json(&ApiResponse::err(&format!("Failed to send command: {}", e)))
                .with_status_code(500),
        }
    }
}
