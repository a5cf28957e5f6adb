/// Metadata for one animation tick.
///
/// `now_ms` is the wall-clock reading taken when the frame was scheduled to
/// run; clocks derive playback time from it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Wall-clock milliseconds since the Unix epoch.
    pub now_ms: u64,
}

impl Frame {
    pub fn first(now_ms: u64) -> Self {
        Self { index: 0, now_ms }
    }

    pub fn next(self, now_ms: u64) -> Self {
        Self {
            index: self.index + 1,
            now_ms,
        }
    }
}
