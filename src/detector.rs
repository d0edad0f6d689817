//! Lap boundary detection over the lap progress stream
//!
//! Only lap progress packets carry an authoritative lap number, so they are
//! the only input to the detector. Any change of the reported number is a
//! boundary; monotonic progression is not assumed.

use tracing::{debug, warn};

/// A detected lap boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LapBoundary {
    /// The lap that just ended and must be flushed
    pub completed_lap: u32,
    /// The lap now being recorded
    pub next_lap: u32,
    /// Completion time reported on the triggering packet
    pub lap_time_ms: Option<u32>,
    /// The reported lap number went backwards
    pub out_of_order: bool,
}

/// State machine deciding when a lap has completed
#[derive(Debug, Clone)]
pub struct LapBoundaryDetector {
    current_lap: u32,
    established: bool,
}

impl Default for LapBoundaryDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl LapBoundaryDetector {
    /// Starts at lap 1, not yet established by the feed
    pub fn new() -> Self {
        Self { current_lap: 1, established: false }
    }

    /// Lap currently being recorded
    pub fn current_lap(&self) -> u32 {
        self.current_lap
    }

    /// Whether a lap progress packet has been observed yet
    pub fn is_established(&self) -> bool {
        self.established
    }

    /// Feed one reported lap number.
    ///
    /// The first observation only establishes the lap number. Afterwards any
    /// difference from the current lap yields a boundary for the current lap.
    pub fn observe(&mut self, lap_number: u32, lap_time_ms: Option<u32>) -> Option<LapBoundary> {
        if !self.established {
            self.established = true;
            if lap_number != self.current_lap {
                debug!(lap = lap_number, "Initial lap established from feed");
            }
            self.current_lap = lap_number;
            return None;
        }

        if lap_number == self.current_lap {
            return None;
        }

        let boundary = LapBoundary {
            completed_lap: self.current_lap,
            next_lap: lap_number,
            lap_time_ms,
            out_of_order: lap_number < self.current_lap,
        };

        if boundary.out_of_order {
            warn!(
                completed = boundary.completed_lap,
                reported = lap_number,
                "Lap number went backwards, treating as a new lap"
            );
        } else {
            debug!(completed = boundary.completed_lap, next = lap_number, "Lap boundary detected");
        }

        self.current_lap = lap_number;
        Some(boundary)
    }
}
