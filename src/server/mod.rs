//! REST API server for remote control of the globe viewer.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────┐      mpsc::channel       ┌──────────────────────┐
//! │   API Server Thread     │  ──── ApiCommand ─────▶  │   Refresh loop       │
//! │   (rouille HTTP)        │                          │   (GlobeApp)         │
//! │                         │                          │                      │
//! │  POST /api/play         │  ──▶ Play { range } ──▶  │  app.play_range()    │
//! │  POST /api/predict/2040 │  ──▶ Predict(2040) ───▶  │  app.show_prediction │
//! └─────────────────────────┘                          └──────────────────────┘
//!          │                                                     │
//!          │  Arc<SharedApiState>                                │
//!          │◀──────────── read snapshots ────────────────────────│
//!          │                                         updated every refresh
//! ```
//!
//! # Endpoints
//!
//! | Method | Path                    | Description                        |
//! |--------|-------------------------|------------------------------------|
//! | GET    | `/api/health`           | Health check                       |
//! | GET    | `/api/status`           | Viewer snapshot                    |
//! | POST   | `/api/play`             | Play; optional `{"start","end"}`   |
//! | POST   | `/api/stop`             | Stop playback                      |
//! | POST   | `/api/year/prev`        | Previous year                      |
//! | POST   | `/api/year/next`        | Next year                          |
//! | POST   | `/api/spectrum/{name}`  | Select spectrum                    |
//! | POST   | `/api/predict/{year}`   | Show prediction for year           |

mod api;

pub use api::{ApiCommand, ApiServer, SharedApiState, ViewerSnapshot};
