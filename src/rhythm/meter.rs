//! Meters and beat durations
//!
//! `*M6/8` sets both the measure length and the beat. Compound meters
//! (count divisible by 3 and greater than 3, unit greater than 1) beat in
//! dotted units: the beat recip is `unit/3`, i.e. `12/unit` quarter notes.
//! `*beat:<recip>` overrides the beat explicitly.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::kern::recip_duration;
use crate::models::{rational, Rational};

/// Time signature
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Meter {
    pub count: i64,
    pub unit: i64,
}

impl Meter {
    pub fn new(count: i64, unit: i64) -> Option<Self> {
        if count <= 0 || unit <= 0 {
            return None;
        }
        Some(Self { count, unit })
    }

    /// Parse `*M<count>/<unit>`
    pub fn parse(interp: &str) -> Option<Self> {
        let body = interp.strip_prefix("*M")?;
        let (count, unit) = body.split_once('/')?;
        if !count.bytes().all(|b| b.is_ascii_digit()) || !unit.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Self::new(count.parse().ok()?, unit.parse().ok()?)
    }

    pub fn is_compound(&self) -> bool {
        self.count % 3 == 0 && self.count > 3 && self.unit > 1
    }

    /// Length of one full measure in quarter notes
    pub fn measure_duration(&self) -> Rational {
        Rational::new(4 * self.count, self.unit)
    }

    /// Length of one beat in quarter notes
    pub fn beat_duration(&self) -> Rational {
        if self.is_compound() {
            Rational::new(12, self.unit)
        } else {
            Rational::new(4, self.unit)
        }
    }
}

/// Parse `*beat:<recip>`
pub fn parse_beat_interpretation(interp: &str) -> Option<Rational> {
    let recip = interp.strip_prefix("*beat:")?;
    recip_duration(recip).filter(|d| *d > rational(0))
}

/// Active meter and beat for one primary track
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct TrackTiming {
    meter: Option<Meter>,
    beat_override: Option<Rational>,
}

/// Meter context per primary track
#[derive(Debug, Clone, Default)]
pub struct MeterTracker {
    timings: HashMap<usize, TrackTiming>,
}

impl MeterTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an interpretation token seen on `primary`
    pub fn observe(&mut self, primary: usize, interp: &str) {
        if let Some(meter) = Meter::parse(interp) {
            let timing = self.timings.entry(primary).or_default();
            timing.meter = Some(meter);
            // A new meter resets any explicit beat
            timing.beat_override = None;
        } else if let Some(beat) = parse_beat_interpretation(interp) {
            self.timings.entry(primary).or_default().beat_override = Some(beat);
        }
    }

    pub fn meter(&self, primary: usize) -> Option<Meter> {
        self.timings.get(&primary).and_then(|t| t.meter)
    }

    /// Beat duration in quarter notes, if anything defines one
    pub fn beat_duration(&self, primary: usize) -> Option<Rational> {
        let timing = self.timings.get(&primary)?;
        timing
            .beat_override
            .or_else(|| timing.meter.map(|m| m.beat_duration()))
    }

    pub fn measure_duration(&self, primary: usize) -> Option<Rational> {
        self.meter(primary).map(|m| m.measure_duration())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_meters() {
        let m = Meter::parse("*M4/4").unwrap();
        assert_eq!(m.measure_duration(), rational(4));
        assert_eq!(m.beat_duration(), rational(1));

        let m = Meter::parse("*M2/2").unwrap();
        assert_eq!(m.beat_duration(), rational(2));

        let m = Meter::parse("*M3/8").unwrap();
        assert!(!m.is_compound());
        assert_eq!(m.measure_duration(), Rational::new(3, 2));
    }

    #[test]
    fn test_compound_meters() {
        let m = Meter::parse("*M6/8").unwrap();
        assert!(m.is_compound());
        assert_eq!(m.beat_duration(), Rational::new(3, 2));
        assert_eq!(m.measure_duration(), rational(3));

        let m = Meter::parse("*M12/16").unwrap();
        assert_eq!(m.beat_duration(), Rational::new(3, 4));

        // unit of 1 is never compound
        assert!(!Meter::parse("*M6/1").unwrap().is_compound());
    }

    #[test]
    fn test_rejects_non_meters() {
        assert!(Meter::parse("*MM120").is_none());
        assert!(Meter::parse("*M4/0").is_none());
        assert!(Meter::parse("*met(c)").is_none());
    }

    #[test]
    fn test_beat_override() {
        let mut tracker = MeterTracker::new();
        tracker.observe(1, "*M6/8");
        assert_eq!(tracker.beat_duration(1), Some(Rational::new(3, 2)));
        tracker.observe(1, "*beat:8");
        assert_eq!(tracker.beat_duration(1), Some(Rational::new(1, 2)));
        assert_eq!(tracker.measure_duration(1), Some(rational(3)));
        assert_eq!(tracker.beat_duration(2), None);
    }
}
