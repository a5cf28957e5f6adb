use foundation::time::PlaybackTime;
use layers::compose::{Scene, compose};
use runtime::clock::PlaybackClock;
use runtime::frame::Frame;
use scene::viewport::{Viewport, ViewportPatch};
use serde::Serialize;
use streaming::loader::LoadOutcome;
use streaming::source::Resource;
use streaming::store::{DataStore, DatasetStatus};

/// Everything that can change the viewer state.
#[derive(Debug)]
pub enum Event {
    /// An animation tick.
    Frame(Frame),
    /// The window was resized.
    Resize { width: u32, height: u32 },
    /// The user panned, zoomed or rotated the map.
    ViewportChanged(ViewportPatch),
    /// A dataset load finished, successfully or not.
    Loaded(LoadOutcome),
}

/// The whole viewer state, owned by the controller.
#[derive(Debug)]
pub struct AppState {
    pub viewport: Viewport,
    pub time: PlaybackTime,
    pub store: DataStore,
    /// Most recent animation tick.
    pub frame: Option<Frame>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            viewport: Viewport::DEFAULT,
            time: PlaybackTime::ZERO,
            store: DataStore::new(),
            frame: None,
        }
    }

    /// Applies one event and returns the next state.
    pub fn reduce(mut self, event: Event, clock: &impl PlaybackClock) -> Self {
        match event {
            Event::Frame(frame) => {
                self.time = clock.tick(self.time, frame.now_ms);
                self.frame = Some(frame);
            }
            Event::Resize { width, height } => {
                self.viewport = self.viewport.merge(&ViewportPatch::resize(width, height));
            }
            Event::ViewportChanged(patch) => {
                self.viewport = self.viewport.merge(&patch);
            }
            Event::Loaded(outcome) => {
                let resource = outcome.resource();
                if self.store.apply(outcome) && resource == Resource::Meta {
                    if let Some(meta) = self.store.meta().copied() {
                        self.viewport = self.viewport.merge(&ViewportPatch::center(meta.center()));
                        if let Some(origin) = clock.origin(meta.start_time) {
                            self.time = origin;
                        }
                    }
                }
            }
        }
        self
    }

    pub fn scene(&self, trail_length: f64) -> Scene {
        compose(
            &self.viewport,
            self.store.trips(),
            self.store.stops(),
            self.time,
            trail_length,
        )
    }

    pub fn status(&self) -> StatusReport {
        StatusReport {
            trips: self.store.status(Resource::Trips),
            stops: self.store.status(Resource::Stops),
            meta: self.store.status(Resource::Meta),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-dataset indicator shown alongside the scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub trips: DatasetStatus,
    pub stops: DatasetStatus,
    pub meta: DatasetStatus,
}

impl StatusReport {
    pub fn has_failures(&self) -> bool {
        [&self.trips, &self.stops, &self.meta]
            .iter()
            .any(|s| matches!(s, DatasetStatus::Failed { .. }))
    }

    /// One-line summary, e.g. `trips=loaded stops=failed (not found) meta=pending`.
    pub fn line(&self) -> String {
        fn one(s: &DatasetStatus) -> String {
            match s {
                DatasetStatus::Pending => "pending".to_string(),
                DatasetStatus::Loaded { fingerprint } => format!("loaded ({fingerprint})"),
                DatasetStatus::Failed { reason } => format!("failed ({reason})"),
            }
        }
        format!(
            "trips={} stops={} meta={}",
            one(&self.trips),
            one(&self.stops),
            one(&self.meta)
        )
    }
}
