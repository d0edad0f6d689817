//! In-flight sample buffer for the lap being recorded

use tracing::debug;

use crate::types::Sample;

/// Buffer of samples for the active lap.
///
/// `append` and `drain` both take `&mut self`, so a drain can never observe a
/// half-applied append. Growth is unbounded; a lap ends in finite time.
#[derive(Debug, Default)]
pub struct LapAccumulator {
    samples: Vec<Sample>,
}

impl LapAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sample in arrival order
    pub fn append(&mut self, sample: Sample) {
        if let Some(last) = self.last_frame() {
            if sample.frame() < last {
                debug!(
                    frame = sample.frame(),
                    last,
                    "Sample frame went backwards, keeping arrival order"
                );
            }
        }
        self.samples.push(sample);
    }

    /// Take the whole buffer, leaving it empty
    pub fn drain(&mut self) -> Vec<Sample> {
        std::mem::take(&mut self.samples)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn last_frame(&self) -> Option<u32> {
        self.samples.last().map(Sample::frame)
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }
}
