use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::error::LoadError;
use crate::fingerprint::Fingerprint;
use crate::records::{Meta, Stop, Trip};
use crate::source::{DataPaths, DataSource, Resource};
use crate::validate::{ValidationError, validate_meta, validate_stops, validate_trips};

/// Exponential backoff for transient fetch failures.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Zero behaves like one.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    pub const fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// Wait before attempt `failed_attempts + 1`, doubling from
    /// `initial_backoff` and capped at `max_backoff`.
    pub fn backoff(&self, failed_attempts: u32) -> Duration {
        let shift = failed_attempts.saturating_sub(1).min(16);
        self.initial_backoff
            .saturating_mul(1u32 << shift)
            .min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(4),
        }
    }
}

/// A decoded, validated dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded<T> {
    pub data: T,
    pub fingerprint: Fingerprint,
}

/// Completion of one dataset load.
#[derive(Debug)]
pub enum LoadOutcome {
    Trips(Result<Loaded<Vec<Trip>>, LoadError>),
    Stops(Result<Loaded<Vec<Stop>>, LoadError>),
    Meta(Result<Loaded<Meta>, LoadError>),
}

impl LoadOutcome {
    pub fn resource(&self) -> Resource {
        match self {
            LoadOutcome::Trips(_) => Resource::Trips,
            LoadOutcome::Stops(_) => Resource::Stops,
            LoadOutcome::Meta(_) => Resource::Meta,
        }
    }

    pub fn is_ok(&self) -> bool {
        match self {
            LoadOutcome::Trips(r) => r.is_ok(),
            LoadOutcome::Stops(r) => r.is_ok(),
            LoadOutcome::Meta(r) => r.is_ok(),
        }
    }
}

/// Fetches `path`, retrying transient failures according to `policy`.
pub async fn fetch_with_retry(
    source: &dyn DataSource,
    path: &str,
    policy: &RetryPolicy,
) -> Result<Vec<u8>, LoadError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match source.fetch(path).await {
            Ok(bytes) => return Ok(bytes),
            Err(err) if err.is_retryable() && attempt < max_attempts => {
                let wait = policy.backoff(attempt);
                warn!(path, attempt, ?wait, "fetch failed, retrying: {err}");
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

async fn load<T, V>(
    source: &dyn DataSource,
    path: &str,
    policy: &RetryPolicy,
    validate: V,
) -> Result<Loaded<T>, LoadError>
where
    T: DeserializeOwned,
    V: FnOnce(&T) -> Result<(), ValidationError>,
{
    let bytes = fetch_with_retry(source, path, policy).await?;
    let fingerprint = Fingerprint::of(&bytes);
    let data: T = serde_json::from_slice(&bytes)?;
    validate(&data)?;
    debug!(path, bytes = bytes.len(), %fingerprint, "decoded payload");
    Ok(Loaded { data, fingerprint })
}

pub async fn load_trips(
    source: &dyn DataSource,
    paths: &DataPaths,
    policy: &RetryPolicy,
) -> Result<Loaded<Vec<Trip>>, LoadError> {
    load(source, &paths.trips, policy, |t: &Vec<Trip>| validate_trips(t)).await
}

pub async fn load_stops(
    source: &dyn DataSource,
    paths: &DataPaths,
    policy: &RetryPolicy,
) -> Result<Loaded<Vec<Stop>>, LoadError> {
    load(source, &paths.stops, policy, |s: &Vec<Stop>| validate_stops(s)).await
}

pub async fn load_meta(
    source: &dyn DataSource,
    paths: &DataPaths,
    policy: &RetryPolicy,
) -> Result<Loaded<Meta>, LoadError> {
    load(source, &paths.meta, policy, validate_meta).await
}

async fn load_resource(
    resource: Resource,
    source: &dyn DataSource,
    paths: &DataPaths,
    policy: &RetryPolicy,
) -> LoadOutcome {
    match resource {
        Resource::Trips => LoadOutcome::Trips(load_trips(source, paths, policy).await),
        Resource::Stops => LoadOutcome::Stops(load_stops(source, paths, policy).await),
        Resource::Meta => LoadOutcome::Meta(load_meta(source, paths, policy).await),
    }
}

/// In-flight dataset loads.
///
/// Dropping this aborts whatever has not completed yet.
#[derive(Debug)]
pub struct LoadTasks {
    set: JoinSet<()>,
}

impl LoadTasks {
    /// Aborts every load that has not delivered its outcome.
    pub fn cancel(&mut self) {
        if !self.set.is_empty() {
            debug!(pending = self.set.len(), "cancelling dataset loads");
        }
        self.set.abort_all();
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }
}

/// Starts the three dataset loads concurrently.
///
/// Each outcome is sent on `tx` as soon as its load finishes; completions
/// arrive in no particular order.
pub fn spawn_loads(
    source: Arc<dyn DataSource>,
    paths: DataPaths,
    policy: RetryPolicy,
    tx: mpsc::UnboundedSender<LoadOutcome>,
) -> LoadTasks {
    let mut set = JoinSet::new();
    for resource in Resource::ALL {
        let source = Arc::clone(&source);
        let paths = paths.clone();
        let tx = tx.clone();
        set.spawn(async move {
            let outcome = load_resource(resource, source.as_ref(), &paths, &policy).await;
            match &outcome {
                LoadOutcome::Trips(Ok(l)) => {
                    info!(
                        %resource,
                        trips = l.data.len(),
                        fingerprint = %l.fingerprint.short(),
                        "dataset loaded"
                    )
                }
                LoadOutcome::Stops(Ok(l)) => {
                    info!(
                        %resource,
                        stops = l.data.len(),
                        fingerprint = %l.fingerprint.short(),
                        "dataset loaded"
                    )
                }
                LoadOutcome::Meta(Ok(l)) => {
                    info!(%resource, lat = l.data.lat, lng = l.data.lng, "dataset loaded")
                }
                LoadOutcome::Trips(Err(err))
                | LoadOutcome::Stops(Err(err))
                | LoadOutcome::Meta(Err(err)) => {
                    warn!(%resource, source = %source.describe(), "dataset failed to load: {err}")
                }
            }
            let _ = tx.send(outcome);
        });
    }
    LoadTasks { set }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use tokio::sync::mpsc;

    use super::{LoadOutcome, RetryPolicy, fetch_with_retry, load_trips, spawn_loads};
    use crate::error::LoadError;
    use crate::source::{BoxFuture, DataPaths, DataSource, Resource};

    type Reply = Result<Vec<u8>, LoadError>;

    /// Replies from a per-path script; the last reply repeats.
    #[derive(Default)]
    struct ScriptedSource {
        script: Mutex<HashMap<String, VecDeque<fn() -> Reply>>>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn on(self, path: &str, replies: Vec<fn() -> Reply>) -> Self {
            self.script
                .lock()
                .unwrap()
                .insert(path.to_string(), replies.into());
            self
        }
    }

    impl DataSource for ScriptedSource {
        fn describe(&self) -> String {
            "scripted".to_string()
        }

        fn fetch<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Reply> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let reply = {
                let mut script = self.script.lock().unwrap();
                match script.get_mut(path) {
                    Some(q) if q.len() > 1 => q.pop_front(),
                    Some(q) => q.front().copied(),
                    None => None,
                }
            };
            Box::pin(async move {
                match reply {
                    Some(f) => f(),
                    None => Err(LoadError::NotFound {
                        location: path.to_string(),
                    }),
                }
            })
        }
    }

    /// Never answers.
    struct StalledSource;

    impl DataSource for StalledSource {
        fn describe(&self) -> String {
            "stalled".to_string()
        }

        fn fetch<'a>(&'a self, _path: &'a str) -> BoxFuture<'a, Reply> {
            Box::pin(std::future::pending())
        }
    }

    fn unavailable() -> Reply {
        Err(LoadError::Status {
            code: 503,
            location: "test".into(),
        })
    }

    fn trips_ok() -> Reply {
        Ok(br#"[{"vendor": 0, "segments": [[-43.9, -19.8, 0], [-43.8, -19.7, 10]]}]"#.to_vec())
    }

    fn stops_ok() -> Reply {
        Ok(br#"[[-19.8, -43.9]]"#.to_vec())
    }

    fn meta_ok() -> Reply {
        Ok(br#"{"lat": -19.8, "lng": -43.9}"#.to_vec())
    }

    fn garbage() -> Reply {
        Ok(b"<html>".to_vec())
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_millis(250));
        assert_eq!(policy.backoff(2), Duration::from_millis(500));
        assert_eq!(policy.backoff(3), Duration::from_secs(1));
        assert_eq!(policy.backoff(10), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_failures_with_backoff() {
        let source = ScriptedSource::default().on(
            "trips.json",
            vec![unavailable, unavailable, trips_ok],
        );
        let started = tokio::time::Instant::now();
        let loaded = load_trips(&source, &DataPaths::default(), &RetryPolicy::default())
            .await
            .unwrap();
        assert_eq!(loaded.data.len(), 1);
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
        let waited = started.elapsed();
        assert!(
            waited >= Duration::from_millis(750) && waited < Duration::from_millis(800),
            "waited {waited:?}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let source = ScriptedSource::default().on("trips.json", vec![unavailable]);
        let err = fetch_with_retry(&source, "trips.json", &RetryPolicy::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::Status { code: 503, .. }));
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn malformed_payload_is_not_retried() {
        let source = ScriptedSource::default().on("trips.json", vec![garbage]);
        let err = load_trips(&source, &DataPaths::default(), &RetryPolicy::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::Decode(_)));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn spawn_loads_delivers_every_outcome() {
        let source = ScriptedSource::default()
            .on("trips.json", vec![trips_ok])
            .on("buses.json", vec![stops_ok]);
        // coord.json is missing from the script.
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _tasks = spawn_loads(
            Arc::new(source),
            DataPaths::default(),
            RetryPolicy::no_retry(),
            tx,
        );

        let mut seen = HashMap::new();
        while let Some(outcome) = rx.recv().await {
            seen.insert(outcome.resource(), outcome.is_ok());
        }
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[&Resource::Trips], true);
        assert_eq!(seen[&Resource::Stops], true);
        assert_eq!(seen[&Resource::Meta], false);
    }

    #[tokio::test]
    async fn meta_loads_through_custom_paths() {
        let source = ScriptedSource::default().on("meta.json", vec![meta_ok]);
        let paths = DataPaths {
            meta: "meta.json".to_string(),
            ..DataPaths::default()
        };
        let loaded = super::load_meta(&source, &paths, &RetryPolicy::no_retry())
            .await
            .unwrap();
        assert_eq!(loaded.data.lat, -19.8);
    }

    #[tokio::test]
    async fn cancel_aborts_in_flight_loads() {
        let (tx, mut rx) = mpsc::unbounded_channel::<LoadOutcome>();
        let mut tasks = spawn_loads(
            Arc::new(StalledSource),
            DataPaths::default(),
            RetryPolicy::default(),
            tx,
        );
        assert_eq!(tasks.len(), 3);
        tasks.cancel();
        // Senders are dropped with the aborted tasks.
        assert!(rx.recv().await.is_none());
    }
}
