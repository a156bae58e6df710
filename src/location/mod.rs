//! Device location feed
//!
//! Wraps the platform location provider behind a trait and drives the
//! one-shot and continuous update modes that feed the position overlay.

pub mod error;
pub mod provider;
pub mod feed;
pub mod mock;

pub use error::{LocationError, LocationResult};
pub use provider::{LocationProvider, LocationCallback, ListenerId};
pub use feed::{LocationFeedController, FeedSettings};
pub use mock::MockLocationProvider;
