#![forbid(unsafe_code)]

//! SenseBridge: ambient sound awareness and live speech captioning for deaf
//! and hard-of-hearing users.
//!
//! The crate is organized hexagonally: `domain` holds types and rules,
//! `ports` the trait seams, `adapters` the concrete backends (cpal capture,
//! spectral classification, whisper speech recognition, terminal dashboard,
//! socket wearable), `app` the shell, factory, and controller, `setup` the
//! workspace bootstrap, and `infrastructure` the logging stack.

pub mod adapters;
pub mod app;
pub mod domain;
pub mod infrastructure;
pub mod ports;
pub mod setup;

pub use app::{create_app, AppShell, RunOptions, SenseBridge};
pub use domain::{AppConfig, SenseError};
