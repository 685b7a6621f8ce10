// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod account;

pub use account::{
    AccountResolver, LoginOutcome, LookupOutcome, Resolution, ResolveError, Resolved,
};
