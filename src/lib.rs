//! VaxBook CLI Library
//!
//! Core modules for the vaccine booking command-line client.

pub mod api;
pub mod auth;
pub mod commands;
pub mod logging;
pub mod storage;

use std::sync::Mutex;

use api::ApiClient;
use auth::AuthManager;
use storage::SessionStore;

/// Application state shared across commands
pub struct AppState {
    pub auth: Mutex<AuthManager>,
    pub storage: SessionStore,
    pub api: ApiClient,
}
