//! Measurement-record bookkeeping for detector construction.

use crate::error::{CircuitError, CircuitResult};
use crate::instruction::Target;
use rustc_hash::FxHashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Tracks when each measurement descriptor entered the record.
///
/// A descriptor is whatever the caller uses to identify a measured object
/// across rounds (for syndrome extraction: basis, role and qubit index).
/// [`MeasurementRecord::rec`] converts "the i-th most recent measurement of
/// this descriptor" into the relative [`Target::Rec`] lookback that
/// `DETECTOR` and `OBSERVABLE_INCLUDE` instructions consume.
#[derive(Debug, Clone)]
pub struct MeasurementRecord<K> {
    time: usize,
    record: FxHashMap<K, Vec<usize>>,
}

impl<K: Eq + Hash + Clone + Debug> MeasurementRecord<K> {
    /// Create an empty record.
    pub fn new() -> Self {
        Self {
            time: 0,
            record: FxHashMap::default(),
        }
    }

    /// Record a batch of measurements, in target order.
    pub fn measure(&mut self, keys: impl IntoIterator<Item = K>) {
        let mut batch = 0;
        for (i, key) in keys.into_iter().enumerate() {
            self.record.entry(key).or_default().push(self.time + i);
            batch += 1;
        }
        self.time += batch;
    }

    /// Relative record target for a measurement of `key`.
    ///
    /// Negative `lookback` counts from the most recent measurement
    /// (`-1` is the latest, `-2` the one before), non-negative values index
    /// from the first.
    pub fn rec(&self, key: &K, lookback: isize) -> CircuitResult<Target> {
        let times = self
            .record
            .get(key)
            .ok_or_else(|| CircuitError::UnknownMeasurement(format!("{key:?}")))?;
        let len = times.len() as isize;
        let idx = if lookback < 0 { len + lookback } else { lookback };
        if idx < 0 || idx >= len {
            return Err(CircuitError::LookbackOutOfRange {
                have: times.len(),
                lookback,
            });
        }
        Ok(Target::Rec(times[idx as usize] as i64 - self.time as i64))
    }

    /// Total number of measurements recorded so far.
    pub fn time(&self) -> usize {
        self.time
    }
}

impl<K: Eq + Hash + Clone + Debug> Default for MeasurementRecord<K> {
    fn default() -> Self {
        Self::new()
    }
}
