//! # bridge
//!
//! Host-integration core for the composer overlay.
//!
//! - [`NavigationWatcher`] notices SPA navigations from mutation batches
//! - [`ElementWaiter`] polls for the host's native composer once per frame
//! - [`IntegrationMounter`] hides the native composer and mounts the overlay
//!   beside it, discarding waits from stale navigation generations
//! - [`HostBridge`] writes text into the host composer and presses send
//!
//! [`Integration`] ties them together for a frame-driven embedding loop.

pub mod config;
mod integration;
mod location;
mod mount;
mod scope;
mod submit;
mod waiter;
mod watcher;

pub use config::{BridgeConfig, ConfigError, HostSelectors};
pub use integration::{FrameReport, Integration};
pub use location::CurrentLocation;
pub use mount::{
    IntegrationMounter, MountError, MountEvent, MountRecord, OverlayRenderer, TeardownReason,
};
pub use scope::ScopePredicate;
pub use submit::{HostBridge, HostElement, SubmitError, SubmitOutcome, SubmitRequest};
pub use waiter::{CancelToken, ElementWaiter, WaitPoll, WatchHandle};
pub use watcher::{Navigated, NavigationWatcher};
