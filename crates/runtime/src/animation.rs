use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::task::JoinHandle;
use tracing::debug;

use crate::frame::Frame;

/// Display refresh cadence used when nothing else is configured (~60 Hz).
pub const DEFAULT_FRAME_CADENCE: Duration = Duration::from_millis(16);

/// Wall-clock reading for frames.
pub trait TimeSource: Send + Sync + 'static {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;
}

#[derive(Debug, Default, Copy, Clone)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Owner of a running animation loop.
///
/// The loop stops when [`AnimationHandle::cancel`] is called or the handle is
/// dropped. Cancellation is visible to the loop before `cancel` returns, so
/// no frame is scheduled afterwards.
#[derive(Debug)]
pub struct AnimationHandle {
    cancelled: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl AnimationHandle {
    pub fn cancel(&mut self) {
        self.cancelled.store(true, Ordering::Release);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// True once the loop has exited on its own or been cancelled.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(|t| t.is_finished())
    }
}

impl Drop for AnimationHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Starts a frame loop on the current tokio runtime.
///
/// Each frame is scheduled one `cadence` after the previous callback
/// completed (a chain of single-shot waits, not a fixed-rate timer), so a
/// slow callback delays every later frame. Returning `ControlFlow::Break`
/// from `on_frame` ends the loop.
pub fn spawn_animation<S, F>(cadence: Duration, source: S, mut on_frame: F) -> AnimationHandle
where
    S: TimeSource,
    F: FnMut(Frame) -> ControlFlow<()> + Send + 'static,
{
    let cancelled = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancelled);

    let task = tokio::spawn(async move {
        let mut frame = Frame::first(source.now_ms());
        loop {
            if flag.load(Ordering::Acquire) {
                break;
            }
            if on_frame(frame).is_break() {
                break;
            }
            tokio::time::sleep(cadence).await;
            frame = frame.next(source.now_ms());
        }
        debug!(frames = frame.index + 1, "animation loop stopped");
    });

    AnimationHandle {
        cancelled,
        task: Some(task),
    }
}

#[cfg(test)]
mod tests {
    use std::ops::ControlFlow;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Duration;

    use tokio::sync::mpsc;

    use super::{TimeSource, spawn_animation};
    use crate::frame::Frame;

    struct SteppingSource {
        next: AtomicU64,
        step: u64,
    }

    impl SteppingSource {
        fn new(start: u64, step: u64) -> Self {
            Self {
                next: AtomicU64::new(start),
                step,
            }
        }
    }

    impl TimeSource for SteppingSource {
        fn now_ms(&self) -> u64 {
            self.next.fetch_add(self.step, Ordering::SeqCst)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn delivers_frames_in_order() {
        let (tx, mut rx) = mpsc::unbounded_channel::<Frame>();
        let _handle = spawn_animation(
            Duration::from_millis(16),
            SteppingSource::new(1_000, 16),
            move |frame| match tx.send(frame) {
                Ok(()) => ControlFlow::Continue(()),
                Err(_) => ControlFlow::Break(()),
            },
        );

        let mut frames = Vec::new();
        for _ in 0..3 {
            frames.push(rx.recv().await.expect("frame"));
        }
        assert_eq!(
            frames.iter().map(|f| f.index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert_eq!(
            frames.iter().map(|f| f.now_ms).collect::<Vec<_>>(),
            vec![1_000, 1_016, 1_032]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_the_chain() {
        let (tx, mut rx) = mpsc::unbounded_channel::<Frame>();
        let mut handle = spawn_animation(
            Duration::from_millis(16),
            SteppingSource::new(0, 16),
            move |frame| {
                let _ = tx.send(frame);
                ControlFlow::Continue(())
            },
        );

        rx.recv().await.expect("first frame");
        handle.cancel();
        assert!(handle.is_cancelled());
        assert!(handle.is_finished());

        // Aborting drops the callback and with it the sender.
        let mut late = 0;
        while rx.recv().await.is_some() {
            late += 1;
        }
        assert_eq!(late, 0, "received {late} frames after cancel");
    }

    #[tokio::test(start_paused = true)]
    async fn break_ends_the_loop() {
        let (tx, mut rx) = mpsc::unbounded_channel::<Frame>();
        let _handle = spawn_animation(
            Duration::from_millis(16),
            SteppingSource::new(0, 16),
            move |frame| {
                let _ = tx.send(frame);
                if frame.index == 2 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            },
        );

        let mut count = 0;
        while rx.recv().await.is_some() {
            count += 1;
        }
        assert_eq!(count, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_cancels() {
        let (tx, mut rx) = mpsc::unbounded_channel::<Frame>();
        let handle = spawn_animation(
            Duration::from_millis(16),
            SteppingSource::new(0, 16),
            move |frame| {
                let _ = tx.send(frame);
                ControlFlow::Continue(())
            },
        );
        rx.recv().await.expect("first frame");
        drop(handle);
        tokio::time::sleep(Duration::from_millis(500)).await;
        let mut late = 0;
        while rx.recv().await.is_some() {
            late += 1;
        }
        assert_eq!(late, 0);
    }
}
