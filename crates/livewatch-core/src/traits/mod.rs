//! Core traits for livewatch
//!
//! This module defines the capability interfaces the core depends on.
//!
//! - [`StatusSource`]: Fetch the current broadcast status
//! - [`PushGateway`]: Best-effort push delivery
//! - [`SessionStore`]: Durable session bookkeeping

pub mod push_gateway;
pub mod session_store;
pub mod status_source;

pub use push_gateway::{
    DeliveryReceipt, PushGateway, PushMessage, PushTarget, TOPIC_LIVE_END, TOPIC_LIVE_START,
    dispatch,
};
pub use session_store::SessionStore;
pub use status_source::StatusSource;
