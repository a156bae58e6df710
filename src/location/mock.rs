//! Mock location provider for testing and the demo binary

use crate::core::Position;
use crate::location::{ListenerId, LocationCallback, LocationError, LocationProvider, LocationResult};
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A periodic subscription held by the mock
#[derive(Clone)]
struct Subscription {
    interval_ms: u64,
    min_distance_m: f32,
    callback: LocationCallback,
}

#[derive(Default)]
struct MockState {
    permission_granted: bool,
    reject_periodic: Option<String>,
    pending_single: VecDeque<(ListenerId, LocationCallback)>,
    subscriptions: BTreeMap<ListenerId, Subscription>,
    single_requests: u32,
    periodic_requests: u32,
    remove_calls: u32,
    last_provider: Option<String>,
}

/// Location provider whose fixes are pushed in by the test
pub struct MockLocationProvider {
    state: Mutex<MockState>,
}

impl MockLocationProvider {
    /// Create a provider with location permission granted
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                permission_granted: true,
                ..Default::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn deny_permission(&self) {
        self.lock().permission_granted = false;
    }

    pub fn grant_permission(&self) {
        self.lock().permission_granted = true;
    }

    /// Make periodic subscriptions fail with `ProviderRejected`
    pub fn reject_periodic(&self, reason: Option<&str>) {
        self.lock().reject_periodic = reason.map(str::to_string);
    }

    /// Answer the oldest pending single request. Returns false if none is pending.
    pub fn deliver_single(&self, position: Position) -> bool {
        let pending = self.lock().pending_single.pop_front();
        match pending {
            Some((_, callback)) => {
                callback(position);
                true
            }
            None => false,
        }
    }

    /// Deliver a fix to every active periodic subscription
    pub fn deliver_periodic(&self, position: Position) -> usize {
        let callbacks: Vec<LocationCallback> = self
            .lock()
            .subscriptions
            .values()
            .map(|s| s.callback.clone())
            .collect();
        for callback in &callbacks {
            callback(position);
        }
        callbacks.len()
    }

    /// Number of `request_single_update` calls seen
    pub fn single_request_count(&self) -> u32 {
        self.lock().single_requests
    }

    /// Number of `request_periodic_updates` calls seen
    pub fn periodic_request_count(&self) -> u32 {
        self.lock().periodic_requests
    }

    pub fn remove_call_count(&self) -> u32 {
        self.lock().remove_calls
    }

    pub fn active_subscriptions(&self) -> usize {
        self.lock().subscriptions.len()
    }

    pub fn pending_single_count(&self) -> usize {
        self.lock().pending_single.len()
    }

    /// Interval and minimum distance of the active subscription, if exactly one
    pub fn subscription_parameters(&self) -> Option<(u64, f32)> {
        let state = self.lock();
        if state.subscriptions.len() != 1 {
            return None;
        }
        state
            .subscriptions
            .values()
            .next()
            .map(|s| (s.interval_ms, s.min_distance_m))
    }

    pub fn last_provider(&self) -> Option<String> {
        self.lock().last_provider.clone()
    }
}

impl Default for MockLocationProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl LocationProvider for MockLocationProvider {
    fn request_single_update(
        &self,
        provider: &str,
        listener: ListenerId,
        callback: LocationCallback,
    ) -> LocationResult<()> {
        let mut state = self.lock();
        state.single_requests += 1;
        state.last_provider = Some(provider.to_string());

        if !state.permission_granted {
            return Err(LocationError::PermissionDenied {
                provider: provider.to_string(),
            });
        }

        state.pending_single.push_back((listener, callback));
        Ok(())
    }

    fn request_periodic_updates(
        &self,
        provider: &str,
        interval_ms: u64,
        min_distance_m: f32,
        listener: ListenerId,
        callback: LocationCallback,
    ) -> LocationResult<()> {
        let mut state = self.lock();
        state.periodic_requests += 1;
        state.last_provider = Some(provider.to_string());

        if !state.permission_granted {
            return Err(LocationError::PermissionDenied {
                provider: provider.to_string(),
            });
        }
        if let Some(reason) = state.reject_periodic.clone() {
            return Err(LocationError::ProviderRejected {
                provider: provider.to_string(),
                reason,
            });
        }

        state.subscriptions.insert(
            listener,
            Subscription {
                interval_ms,
                min_distance_m,
                callback,
            },
        );
        Ok(())
    }

    fn remove_updates(&self, listener: ListenerId) {
        let mut state = self.lock();
        state.remove_calls += 1;
        state.subscriptions.remove(&listener);
        state.pending_single.retain(|(id, _)| *id != listener);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn counting_callback() -> (LocationCallback, Arc<Mutex<Vec<Position>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback: LocationCallback = Arc::new(move |p: Position| sink.lock().unwrap().push(p));
        (callback, seen)
    }

    #[test]
    fn test_single_request_is_answered_once() {
        let provider = MockLocationProvider::new();
        let (callback, seen) = counting_callback();

        provider.request_single_update("gps", ListenerId::new(1), callback).unwrap();
        assert_eq!(provider.pending_single_count(), 1);

        assert!(provider.deliver_single(Position::new(1.0, 2.0, 3.0)));
        assert!(!provider.deliver_single(Position::new(4.0, 5.0, 6.0)));
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_permission_denied() {
        let provider = MockLocationProvider::new();
        provider.deny_permission();
        let (callback, _) = counting_callback();

        let result = provider.request_periodic_updates("gps", 15_000, 0.0, ListenerId::new(1), callback);
        assert!(matches!(result, Err(LocationError::PermissionDenied { .. })));
        assert_eq!(provider.active_subscriptions(), 0);
        assert_eq!(provider.periodic_request_count(), 1);
    }

    #[test]
    fn test_remove_unknown_listener_is_noop() {
        let provider = MockLocationProvider::new();
        provider.remove_updates(ListenerId::new(42));
        assert_eq!(provider.remove_call_count(), 1);
        assert_eq!(provider.active_subscriptions(), 0);
    }

    #[test]
    fn test_periodic_delivery_until_removed() {
        let provider = MockLocationProvider::new();
        let (callback, seen) = counting_callback();
        let id = ListenerId::new(7);

        provider.request_periodic_updates("gps", 15_000, 0.0, id, callback).unwrap();
        assert_eq!(provider.subscription_parameters(), Some((15_000, 0.0)));

        assert_eq!(provider.deliver_periodic(Position::new(1.0, 1.0, 1.0)), 1);
        provider.remove_updates(id);
        assert_eq!(provider.deliver_periodic(Position::new(2.0, 2.0, 2.0)), 0);
        assert_eq!(seen.lock().unwrap().len(), 1);
    }
}
