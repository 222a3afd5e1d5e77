//! High-level business logic on top of the repository layer.
//!
//! - [`account`]: registration, login, password reset
//! - [`tasks`]: task validation and keyword classification
//! - [`classifier`]: the keyword heuristics themselves
//! - [`timer`]: the interval timer state machine
//! - [`sessions`]: in-memory timer session registry and tick driver

pub mod account;
pub mod classifier;
pub mod sessions;
pub mod tasks;
pub mod timer;

pub use account::{AccountError, AccountResult};
pub use classifier::classify_title;
pub use sessions::{SessionSnapshot, TimerEvent, TimerRegistry};
pub use timer::{Cue, IntervalTimer, Phase, TimerError};
