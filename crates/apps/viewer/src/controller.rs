use std::future::Future;
use std::io::{self, Write};
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use layers::compose::Scene;
use runtime::animation::{AnimationHandle, TimeSource, spawn_animation};
use runtime::clock::ClockKind;
use serde::Serialize;
use streaming::loader::{LoadOutcome, LoadTasks, RetryPolicy, spawn_loads};
use streaming::source::{DataPaths, DataSource};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::state::{AppState, Event, StatusReport};

/// One emitted frame: the scene plus the dataset indicators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneRecord {
    /// Index of the frame that produced this record, `None` before the first tick.
    pub frame: Option<u64>,
    pub status: StatusReport,
    pub scene: Scene,
}

/// Where composed scenes go.
pub trait SceneSink {
    fn emit(&mut self, record: &SceneRecord) -> io::Result<()>;
}

/// Writes one JSON object per line.
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> SceneSink for JsonLinesSink<W> {
    fn emit(&mut self, record: &SceneRecord) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, record)?;
        self.out.write_all(b"\n")?;
        self.out.flush()
    }
}

/// How a [`Controller::run`] ended.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
    pub emitted: u64,
}

/// Owns the viewer state and the tasks feeding it.
///
/// Frames, UI events and load completions all arrive over channels and are
/// applied one at a time by [`Controller::run`], so the state is never
/// touched concurrently.
pub struct Controller {
    state: AppState,
    clock: ClockKind,
    trail_length: f64,
    animation: Option<AnimationHandle>,
    loads: Option<LoadTasks>,
    events_tx: mpsc::UnboundedSender<Event>,
    events_rx: mpsc::UnboundedReceiver<Event>,
    loads_tx: mpsc::UnboundedSender<LoadOutcome>,
    loads_rx: mpsc::UnboundedReceiver<LoadOutcome>,
}

impl Controller {
    pub fn new(clock: ClockKind, trail_length: f64) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (loads_tx, loads_rx) = mpsc::unbounded_channel();
        Self {
            state: AppState::new(),
            clock,
            trail_length,
            animation: None,
            loads: None,
            events_tx,
            events_rx,
            loads_tx,
            loads_rx,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Handle for UI events (resize, pan, zoom) from outside the loop.
    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.events_tx.clone()
    }

    pub fn is_running(&self) -> bool {
        self.animation.as_ref().is_some_and(|a| !a.is_finished())
    }

    /// Applies one event immediately.
    pub fn dispatch(&mut self, event: Event) {
        let state = std::mem::take(&mut self.state);
        self.state = state.reduce(event, &self.clock);
    }

    /// Kicks off the three dataset loads and the frame loop.
    ///
    /// Must be called from within a tokio runtime. Calling it again
    /// replaces the previous loop and loads.
    pub fn start<S: TimeSource>(
        &mut self,
        source: Arc<dyn DataSource>,
        paths: DataPaths,
        policy: RetryPolicy,
        cadence: Duration,
        time_source: S,
    ) {
        self.shutdown();
        info!(source = %source.describe(), ?cadence, "starting viewer");

        self.loads = Some(spawn_loads(source, paths, policy, self.loads_tx.clone()));

        let frames = self.events_tx.clone();
        self.animation = Some(spawn_animation(cadence, time_source, move |frame| {
            match frames.send(Event::Frame(frame)) {
                Ok(()) => ControlFlow::Continue(()),
                Err(_) => ControlFlow::Break(()),
            }
        }));
    }

    /// Processes events until `max_frames` frames were applied or `shutdown`
    /// resolves, then stops the loop and any pending loads.
    ///
    /// Every `emit_every`th frame and every load completion is written to
    /// `sink`.
    pub async fn run<K, F>(
        &mut self,
        sink: &mut K,
        max_frames: Option<u64>,
        emit_every: u64,
        shutdown: F,
    ) -> io::Result<RunSummary>
    where
        K: SceneSink,
        F: Future<Output = ()>,
    {
        let emit_every = emit_every.max(1);
        let mut summary = RunSummary {
            frames: 0,
            emitted: 0,
        };
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!(frames = summary.frames, "shutdown requested");
                    break;
                }
                Some(outcome) = self.loads_rx.recv() => {
                    self.dispatch(Event::Loaded(outcome));
                    self.log_status();
                    self.emit(sink)?;
                    summary.emitted += 1;
                }
                Some(event) = self.events_rx.recv() => {
                    let is_frame = matches!(event, Event::Frame(_));
                    self.dispatch(event);
                    if !is_frame {
                        continue;
                    }
                    summary.frames += 1;
                    if (summary.frames - 1) % emit_every == 0 {
                        self.emit(sink)?;
                        summary.emitted += 1;
                    }
                    if max_frames.is_some_and(|max| summary.frames >= max) {
                        debug!(frames = summary.frames, "frame limit reached");
                        break;
                    }
                }
                else => break,
            }
        }

        self.shutdown();
        Ok(summary)
    }

    /// Stops the frame loop and aborts loads still in flight.
    pub fn shutdown(&mut self) {
        if let Some(mut animation) = self.animation.take() {
            animation.cancel();
        }
        if let Some(mut loads) = self.loads.take() {
            loads.cancel();
        }
    }

    fn emit(&self, sink: &mut impl SceneSink) -> io::Result<()> {
        sink.emit(&SceneRecord {
            frame: self.state.frame.map(|f| f.index),
            status: self.state.status(),
            scene: self.state.scene(self.trail_length),
        })
    }

    fn log_status(&self) {
        let status = self.state.status();
        if !self.state.store.is_settled() {
            debug!(status = %status.line(), "dataset state changed");
        } else if status.has_failures() {
            warn!(status = %status.line(), "datasets settled with failures, nothing will be drawn");
        } else {
            info!(status = %status.line(), "all datasets loaded");
        }
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.shutdown();
    }
}
