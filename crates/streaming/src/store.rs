use serde::Serialize;
use tracing::warn;

use crate::error::LoadError;
use crate::loader::{LoadOutcome, Loaded};
use crate::records::{Meta, Stop, Trip};
use crate::source::Resource;

/// Lifecycle of one dataset: `Pending` → `Loaded` or `Pending` → `Failed`.
///
/// A loaded dataset is never replaced or invalidated.
#[derive(Debug)]
pub enum DatasetState<T> {
    Pending,
    Loaded(Loaded<T>),
    Failed(LoadError),
}

impl<T> DatasetState<T> {
    pub fn data(&self) -> Option<&T> {
        match self {
            DatasetState::Loaded(l) => Some(&l.data),
            DatasetState::Pending | DatasetState::Failed(_) => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, DatasetState::Loaded(_))
    }

    pub fn status(&self) -> DatasetStatus {
        match self {
            DatasetState::Pending => DatasetStatus::Pending,
            DatasetState::Loaded(l) => DatasetStatus::Loaded {
                fingerprint: l.fingerprint.short(),
            },
            DatasetState::Failed(err) => DatasetStatus::Failed {
                reason: err.to_string(),
            },
        }
    }

    /// Returns true if the stored value changed.
    fn apply(&mut self, resource: Resource, result: Result<Loaded<T>, LoadError>) -> bool {
        if let DatasetState::Loaded(current) = self {
            match result {
                Ok(next) => warn!(
                    %resource,
                    kept = %current.fingerprint.short(),
                    ignored = %next.fingerprint.short(),
                    "dataset already loaded, ignoring reload"
                ),
                Err(err) => {
                    warn!(%resource, "late load failure ignored, keeping loaded data: {err}")
                }
            }
            return false;
        }
        *self = match result {
            Ok(loaded) => DatasetState::Loaded(loaded),
            Err(err) => DatasetState::Failed(err),
        };
        true
    }
}

impl<T> Default for DatasetState<T> {
    fn default() -> Self {
        DatasetState::Pending
    }
}

/// Serializable summary of a dataset's state, for user-facing status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum DatasetStatus {
    Pending,
    Loaded { fingerprint: String },
    Failed { reason: String },
}

/// The three datasets behind the overlay.
#[derive(Debug, Default)]
pub struct DataStore {
    trips: DatasetState<Vec<Trip>>,
    stops: DatasetState<Vec<Stop>>,
    meta: DatasetState<Meta>,
}

impl DataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trips(&self) -> Option<&[Trip]> {
        self.trips.data().map(Vec::as_slice)
    }

    pub fn stops(&self) -> Option<&[Stop]> {
        self.stops.data().map(Vec::as_slice)
    }

    pub fn meta(&self) -> Option<&Meta> {
        self.meta.data()
    }

    /// Records a load completion. Returns true if the store changed.
    pub fn apply(&mut self, outcome: LoadOutcome) -> bool {
        let resource = outcome.resource();
        match outcome {
            LoadOutcome::Trips(r) => self.trips.apply(resource, r),
            LoadOutcome::Stops(r) => self.stops.apply(resource, r),
            LoadOutcome::Meta(r) => self.meta.apply(resource, r),
        }
    }

    pub fn status(&self, resource: Resource) -> DatasetStatus {
        match resource {
            Resource::Trips => self.trips.status(),
            Resource::Stops => self.stops.status(),
            Resource::Meta => self.meta.status(),
        }
    }

    /// True once every dataset has either loaded or failed.
    pub fn is_settled(&self) -> bool {
        Resource::ALL
            .iter()
            .all(|r| !matches!(self.status(*r), DatasetStatus::Pending))
    }
}
