//! civic-core library.
//!
//! Issue model, session-driven access guard, and the admin controller that
//! keeps a local issue collection in step with the remote tracker API.
//!
//! # Conventions
//!
//! - **Errors**: Library seams return typed `thiserror` errors ([`api::ApiError`],
//!   [`controller::AdminError`]); configuration and glue use `anyhow::Result`.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod api;
pub mod config;
pub mod controller;
pub mod error;
pub mod filter;
pub mod guard;
pub mod lock;
pub mod model;
pub mod notice;
pub mod session;
pub mod stats;

pub use api::IssueApi;
pub use controller::{AdminError, IssueAdminController};
pub use guard::{AccessGuard, GuardDecision};
pub use session::{Role, Session, SessionHandle};
