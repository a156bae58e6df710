//! Location feed controller
//!
//! State machine over {Idle, OneShotPending, ContinuousActive}. Every fix
//! is pushed into the position overlay. A one-shot fix recentres and zooms
//! the map; in continuous mode only the first fix recentres, after which
//! the user can pan freely.

use crate::core::{
    FeedMode, Position, CLOSE_ZOOM_LEVEL, GPS_PROVIDER, MIN_UPDATE_DISTANCE_M, UPDATE_INTERVAL_MS,
};
use crate::location::{ListenerId, LocationCallback, LocationProvider, LocationResult};
use crate::overlay::PositionOverlay;
use crate::render::MapViewport;
use log::{debug, error, info, trace};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Parameters of location requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedSettings {
    /// Provider identifier passed to the platform
    pub provider: String,
    /// Period of continuous updates (milliseconds)
    pub update_interval_ms: u64,
    /// Minimum distance between continuous updates (metres)
    pub min_distance_m: f32,
    /// Zoom level applied when centring on a fix
    pub close_zoom_level: u8,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            provider: GPS_PROVIDER.to_string(),
            update_interval_ms: UPDATE_INTERVAL_MS,
            min_distance_m: MIN_UPDATE_DISTANCE_M,
            close_zoom_level: CLOSE_ZOOM_LEVEL,
        }
    }
}

#[derive(Debug, Default)]
struct FeedState {
    mode: FeedMode,
    /// Most recent continuous fix; None until the first one arrives
    last_known: Option<Position>,
    /// Listener of the continuous subscription
    continuous_listener: Option<ListenerId>,
    /// Listener of the outstanding one-shot request
    one_shot_listener: Option<ListenerId>,
    listener_counter: u32,
}

impl FeedState {
    fn next_listener(&mut self) -> ListenerId {
        self.listener_counter += 1;
        ListenerId::new(self.listener_counter)
    }
}

/// Drives one-shot and continuous location requests
pub struct LocationFeedController {
    provider: Arc<dyn LocationProvider>,
    overlay: Arc<PositionOverlay>,
    map_view: Arc<dyn MapViewport>,
    settings: FeedSettings,
    state: Arc<Mutex<FeedState>>,
}

fn lock_state(state: &Mutex<FeedState>) -> MutexGuard<'_, FeedState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl LocationFeedController {
    pub fn new(
        provider: Arc<dyn LocationProvider>,
        overlay: Arc<PositionOverlay>,
        map_view: Arc<dyn MapViewport>,
    ) -> Self {
        Self::with_settings(provider, overlay, map_view, FeedSettings::default())
    }

    pub fn with_settings(
        provider: Arc<dyn LocationProvider>,
        overlay: Arc<PositionOverlay>,
        map_view: Arc<dyn MapViewport>,
        settings: FeedSettings,
    ) -> Self {
        Self {
            provider,
            overlay,
            map_view,
            settings,
            state: Arc::new(Mutex::new(FeedState::default())),
        }
    }

    /// Centre the map on a single GPS fix
    ///
    /// While continuous mode holds a fix, recentres on it without asking the
    /// provider. Permission failures are returned after reverting to Idle.
    pub fn request_one_shot(&self) -> LocationResult<()> {
        let listener = {
            let mut state = lock_state(&self.state);
            let mode = state.mode;
            match mode {
                FeedMode::ContinuousActive => {
                    let cached = state.last_known;
                    drop(state);
                    match cached {
                        Some(position) => {
                            debug!("Recentring on cached continuous fix");
                            self.center_close(position);
                        }
                        None => debug!("Continuous feed has no fix yet; nothing to centre on"),
                    }
                    return Ok(());
                }
                FeedMode::OneShotPending => {
                    debug!("One-shot request already pending");
                    return Ok(());
                }
                FeedMode::Idle => {
                    let listener = state.next_listener();
                    state.mode = FeedMode::OneShotPending;
                    state.one_shot_listener = Some(listener);
                    listener
                }
            }
        };

        let callback = self.one_shot_callback(listener);
        match self
            .provider
            .request_single_update(&self.settings.provider, listener, callback)
        {
            Ok(()) => {
                info!("Requested single location update from '{}'", self.settings.provider);
                Ok(())
            }
            Err(e) => {
                let mut state = lock_state(&self.state);
                if state.one_shot_listener == Some(listener) {
                    state.one_shot_listener = None;
                    if state.mode == FeedMode::OneShotPending {
                        state.mode = FeedMode::Idle;
                    }
                }
                error!("Single location request failed: {}", e);
                Err(e)
            }
        }
    }

    /// Start continuous updates, or stop them if running
    ///
    /// Returns the mode after the toggle.
    pub fn toggle_continuous(&self) -> LocationResult<FeedMode> {
        let (listener, stale) = {
            let mut state = lock_state(&self.state);
            if state.mode == FeedMode::ContinuousActive {
                let listener = state.continuous_listener.take();
                state.last_known = None;
                state.mode = FeedMode::Idle;
                drop(state);

                if let Some(listener) = listener {
                    self.provider.remove_updates(listener);
                }
                info!("Continuous location updates stopped");
                return Ok(FeedMode::Idle);
            }

            // Continuous mode supersedes a pending one-shot
            let stale = state.continuous_listener.take();
            let pending = state.one_shot_listener.take();
            let listener = state.next_listener();
            state.continuous_listener = Some(listener);
            state.last_known = None;
            state.mode = FeedMode::ContinuousActive;
            (listener, stale.into_iter().chain(pending))
        };

        // At most one platform request is ever live
        for stale in stale {
            self.provider.remove_updates(stale);
        }

        let callback = self.continuous_callback(listener);
        match self.provider.request_periodic_updates(
            &self.settings.provider,
            self.settings.update_interval_ms,
            self.settings.min_distance_m,
            listener,
            callback,
        ) {
            Ok(()) => {
                info!(
                    "Continuous location updates started (every {}ms, min distance {}m)",
                    self.settings.update_interval_ms, self.settings.min_distance_m
                );
                Ok(FeedMode::ContinuousActive)
            }
            Err(e) => {
                {
                    let mut state = lock_state(&self.state);
                    if state.continuous_listener == Some(listener) {
                        state.continuous_listener = None;
                        state.last_known = None;
                        state.mode = FeedMode::Idle;
                    }
                }
                self.provider.remove_updates(listener);
                error!("Continuous location request failed: {}", e);
                Err(e)
            }
        }
    }

    /// Cancel every outstanding request
    pub fn shutdown(&self) {
        let (continuous, one_shot) = {
            let mut state = lock_state(&self.state);
            state.mode = FeedMode::Idle;
            state.last_known = None;
            (state.continuous_listener.take(), state.one_shot_listener.take())
        };

        for listener in continuous.into_iter().chain(one_shot) {
            self.provider.remove_updates(listener);
        }
        debug!("Location feed shut down");
    }

    pub fn mode(&self) -> FeedMode {
        lock_state(&self.state).mode
    }

    pub fn is_continuous(&self) -> bool {
        self.mode() == FeedMode::ContinuousActive
    }

    pub fn last_known_position(&self) -> Option<Position> {
        lock_state(&self.state).last_known
    }

    pub fn settings(&self) -> &FeedSettings {
        &self.settings
    }

    fn center_close(&self, position: Position) {
        self.map_view.set_center(position.lat_long());
        self.map_view.set_zoom_level(self.settings.close_zoom_level);
    }

    fn one_shot_callback(&self, listener: ListenerId) -> LocationCallback {
        let state = Arc::clone(&self.state);
        let overlay = Arc::clone(&self.overlay);
        let map_view = Arc::clone(&self.map_view);
        let zoom = self.settings.close_zoom_level;

        Arc::new(move |position: Position| {
            {
                let mut state = lock_state(&state);
                if state.one_shot_listener != Some(listener) {
                    trace!("Dropping fix for cancelled one-shot listener {}", listener.id());
                    return;
                }
                state.one_shot_listener = None;
                if state.mode == FeedMode::OneShotPending {
                    state.mode = FeedMode::Idle;
                }
            }

            debug!("One-shot fix at ({}, {})", position.latitude, position.longitude);
            overlay.set_position(position.latitude, position.longitude, position.accuracy_m);
            map_view.set_center(position.lat_long());
            map_view.set_zoom_level(zoom);
        })
    }

    fn continuous_callback(&self, listener: ListenerId) -> LocationCallback {
        let state = Arc::clone(&self.state);
        let overlay = Arc::clone(&self.overlay);
        let map_view = Arc::clone(&self.map_view);

        Arc::new(move |position: Position| {
            let first_fix = {
                let mut state = lock_state(&state);
                if state.continuous_listener != Some(listener) {
                    trace!("Dropping fix for stale listener {}", listener.id());
                    return;
                }
                let first_fix = state.last_known.is_none();
                state.last_known = Some(position);
                first_fix
            };

            overlay.set_position(position.latitude, position.longitude, position.accuracy_m);
            if first_fix {
                debug!("First continuous fix; centring map");
                map_view.set_center(position.lat_long());
            }
        })
    }
}

impl Drop for LocationFeedController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LatLong;
    use crate::location::{LocationError, MockLocationProvider};
    use crate::render::{RecordingMapView, Viewport};

    struct Fixture {
        provider: Arc<MockLocationProvider>,
        overlay: Arc<PositionOverlay>,
        map_view: Arc<RecordingMapView>,
        controller: LocationFeedController,
    }

    fn fixture() -> Fixture {
        let provider = Arc::new(MockLocationProvider::new());
        let overlay = Arc::new(PositionOverlay::new());
        let map_view = Arc::new(RecordingMapView::new());
        let controller = LocationFeedController::new(provider.clone(), overlay.clone(), map_view.clone());
        Fixture {
            provider,
            overlay,
            map_view,
            controller,
        }
    }

    #[test]
    fn test_one_shot_centres_and_zooms() {
        let f = fixture();
        f.controller.request_one_shot().unwrap();
        assert_eq!(f.controller.mode(), FeedMode::OneShotPending);
        assert_eq!(f.provider.single_request_count(), 1);
        assert_eq!(f.provider.last_provider().as_deref(), Some("gps"));

        assert!(f.provider.deliver_single(Position::new(47.5, 19.0, 8.0)));

        assert_eq!(f.controller.mode(), FeedMode::Idle);
        assert_eq!(f.map_view.current_center(), Some(LatLong::new(47.5, 19.0)));
        assert_eq!(f.map_view.current_zoom_level(), Some(15));
        let command = f.overlay.render(&Viewport::world(15)).unwrap();
        assert_eq!(command.radius_m, 8.0);
    }

    #[test]
    fn test_one_shot_while_pending_does_not_reissue() {
        let f = fixture();
        f.controller.request_one_shot().unwrap();
        f.controller.request_one_shot().unwrap();
        assert_eq!(f.provider.single_request_count(), 1);
    }

    #[test]
    fn test_one_shot_permission_denied_is_surfaced() {
        let f = fixture();
        f.provider.deny_permission();

        let result = f.controller.request_one_shot();
        assert!(matches!(result, Err(LocationError::PermissionDenied { .. })));
        assert_eq!(f.controller.mode(), FeedMode::Idle);
        assert!(f.map_view.centers().is_empty());

        // A later attempt goes through once permission is granted
        f.provider.grant_permission();
        f.controller.request_one_shot().unwrap();
        assert_eq!(f.provider.single_request_count(), 2);
    }

    #[test]
    fn test_one_shot_uses_cached_continuous_fix() {
        let f = fixture();
        f.controller.toggle_continuous().unwrap();
        f.provider.deliver_periodic(Position::new(47.50, 19.03, 20.0));
        let centers_before = f.map_view.centers().len();

        f.controller.request_one_shot().unwrap();

        assert_eq!(f.provider.single_request_count(), 0);
        assert_eq!(f.map_view.centers().len(), centers_before + 1);
        assert_eq!(f.map_view.current_center(), Some(LatLong::new(47.50, 19.03)));
        assert_eq!(f.map_view.current_zoom_level(), Some(15));
        assert_eq!(f.controller.mode(), FeedMode::ContinuousActive);
    }

    #[test]
    fn test_one_shot_in_continuous_without_fix_is_noop() {
        let f = fixture();
        f.controller.toggle_continuous().unwrap();
        f.controller.request_one_shot().unwrap();

        assert_eq!(f.provider.single_request_count(), 0);
        assert!(f.map_view.centers().is_empty());
    }

    #[test]
    fn test_toggle_twice_returns_to_idle() {
        let f = fixture();
        assert_eq!(f.controller.toggle_continuous().unwrap(), FeedMode::ContinuousActive);
        assert_eq!(f.provider.active_subscriptions(), 1);
        assert_eq!(f.provider.subscription_parameters(), Some((15_000, 0.0)));

        f.provider.deliver_periodic(Position::new(1.0, 2.0, 3.0));
        assert!(f.controller.last_known_position().is_some());

        assert_eq!(f.controller.toggle_continuous().unwrap(), FeedMode::Idle);
        assert_eq!(f.controller.mode(), FeedMode::Idle);
        assert_eq!(f.provider.active_subscriptions(), 0);
        assert!(f.controller.last_known_position().is_none());
    }

    #[test]
    fn test_continuous_recentres_only_on_first_fix() {
        let f = fixture();
        f.controller.toggle_continuous().unwrap();

        let fixes = [
            Position::new(47.50, 19.03, 20.0),
            Position::new(47.51, 19.05, 5.0),
            Position::new(47.52, 19.06, 4.0),
            Position::new(47.53, 19.07, 3.0),
        ];
        for fix in fixes {
            f.provider.deliver_periodic(fix);
        }

        assert_eq!(f.map_view.centers(), vec![LatLong::new(47.50, 19.03)]);
        assert!(f.map_view.zoom_levels().is_empty());
        assert_eq!(f.controller.last_known_position(), Some(fixes[3]));
        let command = f.overlay.render(&Viewport::world(15)).unwrap();
        assert_eq!(command.center, LatLong::new(47.53, 19.07));
    }

    #[test]
    fn test_restart_recentres_again() {
        let f = fixture();
        f.controller.toggle_continuous().unwrap();
        f.provider.deliver_periodic(Position::new(1.0, 1.0, 1.0));
        f.controller.toggle_continuous().unwrap();
        f.controller.toggle_continuous().unwrap();
        f.provider.deliver_periodic(Position::new(2.0, 2.0, 1.0));

        assert_eq!(
            f.map_view.centers(),
            vec![LatLong::new(1.0, 1.0), LatLong::new(2.0, 2.0)]
        );
    }

    #[test]
    fn test_continuous_failure_reverts_and_unsubscribes() {
        let f = fixture();
        f.provider.deny_permission();

        let result = f.controller.toggle_continuous();
        assert!(matches!(result, Err(LocationError::PermissionDenied { .. })));
        assert_eq!(f.controller.mode(), FeedMode::Idle);
        assert_eq!(f.provider.remove_call_count(), 1);
        assert_eq!(f.provider.active_subscriptions(), 0);

        f.provider.grant_permission();
        f.provider.reject_periodic(Some("provider disabled"));
        let result = f.controller.toggle_continuous();
        assert!(matches!(result, Err(LocationError::ProviderRejected { .. })));
        assert_eq!(f.controller.mode(), FeedMode::Idle);

        f.provider.reject_periodic(None);
        assert_eq!(f.controller.toggle_continuous().unwrap(), FeedMode::ContinuousActive);
        assert_eq!(f.provider.active_subscriptions(), 1);
    }

    /// Provider that keeps delivering to listeners after they are removed
    #[derive(Default)]
    struct LateDeliveryProvider {
        callbacks: Mutex<Vec<LocationCallback>>,
    }

    impl LocationProvider for LateDeliveryProvider {
        fn request_single_update(&self, _: &str, _: ListenerId, callback: LocationCallback) -> LocationResult<()> {
            self.callbacks.lock().unwrap().push(callback);
            Ok(())
        }

        fn request_periodic_updates(
            &self,
            _: &str,
            _: u64,
            _: f32,
            _: ListenerId,
            callback: LocationCallback,
        ) -> LocationResult<()> {
            self.callbacks.lock().unwrap().push(callback);
            Ok(())
        }

        fn remove_updates(&self, _: ListenerId) {}
    }

    #[test]
    fn test_fixes_after_stop_are_ignored() {
        let provider = Arc::new(LateDeliveryProvider::default());
        let overlay = Arc::new(PositionOverlay::new());
        let map_view = Arc::new(RecordingMapView::new());
        let controller = LocationFeedController::new(provider.clone(), overlay.clone(), map_view.clone());

        controller.toggle_continuous().unwrap();
        controller.toggle_continuous().unwrap();

        let callbacks = provider.callbacks.lock().unwrap().clone();
        assert_eq!(callbacks.len(), 1);
        callbacks[0](Position::new(9.0, 9.0, 9.0));

        assert!(overlay.render(&Viewport::world(1)).is_none());
        assert!(map_view.centers().is_empty());
        assert!(controller.last_known_position().is_none());
    }

    #[test]
    fn test_continuous_start_while_one_shot_pending() {
        let f = fixture();
        f.controller.request_one_shot().unwrap();
        f.controller.toggle_continuous().unwrap();

        assert_eq!(f.provider.pending_single_count(), 0);
        assert!(!f.provider.deliver_single(Position::new(10.0, 20.0, 5.0)));
        assert_eq!(f.controller.mode(), FeedMode::ContinuousActive);
        assert!(f.overlay.state().current_position.is_none());
    }

    #[test]
    fn test_one_shot_after_continuous_round_trip_issues_one_request() {
        let f = fixture();
        f.controller.request_one_shot().unwrap();
        f.controller.toggle_continuous().unwrap();
        f.controller.toggle_continuous().unwrap();
        assert_eq!(f.controller.mode(), FeedMode::Idle);
        assert_eq!(f.provider.pending_single_count(), 0);

        f.controller.request_one_shot().unwrap();
        assert_eq!(f.provider.single_request_count(), 2);
        assert_eq!(f.provider.pending_single_count(), 1);

        assert!(f.provider.deliver_single(Position::new(47.5, 19.04, 8.0)));
        assert_eq!(f.controller.mode(), FeedMode::Idle);
        assert_eq!(f.provider.pending_single_count(), 0);
    }

    #[test]
    fn test_shutdown_cancels_everything() {
        let f = fixture();
        f.controller.toggle_continuous().unwrap();
        f.controller.shutdown();

        assert_eq!(f.controller.mode(), FeedMode::Idle);
        assert_eq!(f.provider.active_subscriptions(), 0);
        assert_eq!(f.provider.pending_single_count(), 0);
    }
}
