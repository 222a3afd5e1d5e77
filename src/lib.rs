//! # Dayline Backend
//!
//! Backend for a personal daily planner. Users keep a list of dated tasks;
//! task titles are classified into categories (food, reading, gym, shopping)
//! and each category carries its own sub-record: nutrition logs, reading
//! progress, interval timer routines and shopping lists. The backend exposes
//! a REST API via Axum.
//!
//! ## Architecture
//!
//! The crate is organized into several logical modules:
//!
//! - [`api`]: core domain types shared across layers
//! - [`auth`]: password hashing, JWT issuance and reset tokens
//! - [`db`]: database operations, repository pattern, and persistence layer
//! - [`services`]: business logic, title classification and the interval
//!   timer state machine
//! - [`http`]: Axum-based HTTP server and request handlers

pub mod api;
pub mod auth;
pub mod db;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
