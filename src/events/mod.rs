//! Event system for team synchronization.
//!
//! Every mutation outcome is emitted as a [`SyncEvent`]. Listeners are
//! injected into the sync action per instance; there is no process-wide
//! registry. With no listeners attached, events are silently dropped.
//!
//! # Custom Listeners
//!
//! ```rust,ignore
//! use cohort::events::{Listener, SyncEvent};
//! use async_trait::async_trait;
//!
//! struct MetricsListener;
//!
//! #[async_trait]
//! impl Listener for MetricsListener {
//!     async fn handle(&self, event: &SyncEvent) {
//!         match event {
//!             SyncEvent::MemberAdded { .. } => {
//!                 // increment add counter
//!             }
//!             SyncEvent::AddFailed { .. } => {
//!                 // increment add failure counter
//!             }
//!             _ => {}
//!         }
//!     }
//! }
//! ```

mod event;
mod listener;

pub mod listeners;

pub use event::SyncEvent;
pub use listener::Listener;
