//! Event system for decoupled inter-module communication.
//!
//! This module provides a simple publish/subscribe mechanism using Rust's
//! standard library `mpsc` channels. It is the queue boundary between the
//! latency-sensitive event-tap callback and the main loop.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Event tap  │     │ Launch menu │     │ Status bar  │
//! │  callback   │     │  selection  │     │  / hosts    │
//! └──────┬──────┘     └──────┬──────┘     └──────┬──────┘
//!        │ publish()         │ publish()         │ publish()
//!        ▼                   ▼                   ▼
//! ┌─────────────────────────────────────────────────────┐
//! │                     EventBus                        │
//! │                   (mpsc channel)                    │
//! └─────────────────────────┬───────────────────────────┘
//!                           │ try_recv()
//!                           ▼
//! ┌─────────────────────────────────────────────────────┐
//! │                    Dispatcher                       │
//! │              (main loop, 60fps timer)               │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Module Structure
//!
//! - [`types`]: Event definitions (`AppEvent` enum)
//! - [`bus`]: `EventBus` and `EventPublisher` types

pub mod bus;
pub mod types;

pub use bus::{EventBus, EventPublisher};
pub use types::{AppEvent, CaptureTarget};
