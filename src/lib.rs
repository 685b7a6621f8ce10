// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Account Resolver: link identity-provider logins to local users
//!
//! This crate turns a provider login assertion into a canonical local user,
//! creating users and logins as needed, and serves the session user's profile.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use services::AccountResolver;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub accounts: AccountResolver,
}
