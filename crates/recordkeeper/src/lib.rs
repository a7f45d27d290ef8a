//! `recordkeeper` - a console record manager
//!
//! This library keeps a CSV file of people and their balances behind a
//! flat-file login with per-user lockout, and records activity in an
//! append-only log.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod editor;
pub mod error;
pub mod logging;
pub mod person;
pub mod prompt;
pub mod session;
pub mod storage;

pub use app::App;
pub use auth::{AuthOutcome, Authenticator};
pub use config::Config;
pub use editor::RecordBook;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use person::Person;
pub use session::Session;
pub use storage::{CredentialStore, RecordStore};
