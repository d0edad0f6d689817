//! Completed lap records

use super::Sample;

/// The ordered samples of one lap, handed by value to a sink.
#[derive(Debug, Clone, PartialEq)]
pub struct LapRecord {
    lap: u32,
    samples: Vec<Sample>,
    lap_time_ms: Option<u32>,
}

impl LapRecord {
    /// Create a lap record
    pub fn new(lap: u32, samples: Vec<Sample>, lap_time_ms: Option<u32>) -> Self {
        Self { lap, samples, lap_time_ms }
    }

    /// Lap ordinal, starting at 1
    pub fn lap(&self) -> u32 {
        self.lap
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Completion time, known only when the feed reported it at the boundary
    pub fn lap_time_ms(&self) -> Option<u32> {
        self.lap_time_ms
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// True when frame identifiers never decrease
    pub fn is_ordered(&self) -> bool {
        self.samples.windows(2).all(|w| w[0].frame() <= w[1].frame())
    }

    /// Frame range covered by the record
    pub fn frame_span(&self) -> Option<(u32, u32)> {
        Some((self.samples.first()?.frame(), self.samples.last()?.frame()))
    }

    pub fn into_samples(self) -> Vec<Sample> {
        self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SamplePayload;

    fn progress(frame: u32) -> Sample {
        Sample::new(frame, SamplePayload::Progress { distance: frame as f32 })
    }

    #[test]
    fn ordering_and_span() {
        let record = LapRecord::new(1, vec![progress(1), progress(1), progress(4)], Some(90_000));
        assert!(record.is_ordered());
        assert_eq!(record.frame_span(), Some((1, 4)));
        assert_eq!(record.lap_time_ms(), Some(90_000));

        let unordered = LapRecord::new(2, vec![progress(5), progress(3)], None);
        assert!(!unordered.is_ordered());

        let empty = LapRecord::new(3, Vec::new(), None);
        assert!(empty.is_empty());
        assert_eq!(empty.frame_span(), None);
    }
}
