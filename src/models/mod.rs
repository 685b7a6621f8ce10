// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod assertion;
pub mod login;
pub mod user;

pub use assertion::{LoginAssertion, ProfileEmail, ProfilePhoto};
pub use login::{login_identifier, Login, LoginFields, LoginSummary, PendingLogin};
pub use user::{User, UserFields};
