//! Frame navigation over the timestamps of a sequence

use radarview_io::Sequence;

/// Current position in a sequence's list of scan timestamps
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    timestamps: Vec<u64>,
    index: usize,
}

impl Timeline {
    pub fn new(timestamps: Vec<u64>) -> Self {
        Self { timestamps, index: 0 }
    }

    pub fn from_sequence(sequence: &Sequence) -> Self {
        Self::new(sequence.timestamps().to_vec())
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Timestamp of the current frame
    pub fn current(&self) -> Option<u64> {
        self.timestamps.get(self.index).copied()
    }

    /// Move by `delta` frames, clamped to the sequence. Returns whether the frame changed.
    pub fn step(&mut self, delta: i64) -> bool {
        if self.timestamps.is_empty() {
            return false;
        }
        let last = (self.timestamps.len() - 1) as i64;
        let target = (self.index as i64 + delta).clamp(0, last) as usize;
        let changed = target != self.index;
        self.index = target;
        changed
    }

    /// Jump to a frame index, clamped to the sequence
    pub fn seek(&mut self, index: usize) -> bool {
        let target = index.min(self.timestamps.len().saturating_sub(1));
        let changed = target != self.index;
        self.index = target;
        changed
    }

    /// Seconds since the first frame
    pub fn elapsed_seconds(&self) -> f64 {
        match (self.current(), self.timestamps.first()) {
            (Some(current), Some(first)) => current.saturating_sub(*first) as f64 / 1e6,
            _ => 0.0,
        }
    }

    pub fn status_line(&self, window_size_ms: f64) -> String {
        format!(
            "Frame {}/{}     Current Timestamp: {}     Time Window Size: {:.1}ms     Time: {:.2}s",
            self.index,
            self.timestamps.len().saturating_sub(1),
            self.current().unwrap_or(0),
            window_size_ms,
            self.elapsed_seconds()
        )
    }
}
