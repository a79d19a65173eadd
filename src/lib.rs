//! Smart city sustainability dashboard
//!
//! `core` holds the snapshot model, the feeds that produce snapshots, the
//! derived-metric calculators and the refresh loop. `app` and `screens`
//! are the ratatui front end; `server` exposes the same data over HTTP.

pub mod app;
pub mod cli;
pub mod core;
pub mod screens;
pub mod utils;

#[cfg(feature = "server")]
pub mod server;
