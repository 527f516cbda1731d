//! HTTP request handlers.

pub mod common;
pub mod environment;
pub mod grid;
pub mod health;
pub mod scenarios;
