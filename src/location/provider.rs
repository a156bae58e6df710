//! Location provider trait

use crate::core::Position;
use crate::location::LocationResult;
use std::sync::Arc;

/// Callback invoked with every delivered position
pub type LocationCallback = Arc<dyn Fn(Position) + Send + Sync>;

/// Identity of a registered listener, used to cancel it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u32);

impl ListenerId {
    pub fn new(id: u32) -> Self {
        ListenerId(id)
    }

    pub fn id(&self) -> u32 {
        self.0
    }
}

/// Platform location subsystem
///
/// Callbacks may run on any thread, in delivery order.
pub trait LocationProvider: Send + Sync {
    /// Request exactly one fix from `provider`
    fn request_single_update(
        &self,
        provider: &str,
        listener: ListenerId,
        callback: LocationCallback,
    ) -> LocationResult<()>;

    /// Subscribe to periodic fixes from `provider`
    fn request_periodic_updates(
        &self,
        provider: &str,
        interval_ms: u64,
        min_distance_m: f32,
        listener: ListenerId,
        callback: LocationCallback,
    ) -> LocationResult<()>;

    /// Cancel every request registered under `listener`. Unknown ids are a no-op.
    fn remove_updates(&self, listener: ListenerId);
}
