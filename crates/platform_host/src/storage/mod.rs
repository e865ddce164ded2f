//! Persistence substrate contracts.

pub mod app_state;
