//! # demvt-server
//!
//! HTTP edge of the demvt elevation tile service.
//!
//! | Route                             | Response                              |
//! |-----------------------------------|---------------------------------------|
//! | `GET /tiles.json`                 | TileJSON for the `dem` layer          |
//! | `GET /tiles/{z}/{x}/{y}.mvt`      | Mapbox vector tile, or 204 when empty |
//! | `GET /cross-section?z=&from=&to=` | footprints and elevations on a line   |
//!
//! Requests are parsed into a [`DemRequest`] before any work is done, and
//! successful bodies are compressed with the best coding the client accepts.

pub mod app;
pub mod config;
pub mod encoding;
mod error;
pub mod handlers;
pub mod request;
pub mod tilejson;

pub use app::{router, AppState};
pub use config::{AppSettings, Config};
pub use encoding::ContentCoding;
pub use error::ServerError;
pub use request::{CrossSectionQuery, DemRequest};
