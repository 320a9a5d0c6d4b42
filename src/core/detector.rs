//! Stateful anomaly classification over a stream of readings.
//!
//! Rules run in a fixed order on every reading and a later rule replaces the
//! result of an earlier one:
//!
//! 1. tachycardia (rate above 100 BPM)
//! 2. bradycardia (rate below 60 BPM)
//! 3. arrhythmia (RR interval moved more than 15% since the previous beat)
//!
//! The detector remembers only the previous beat, so readings must be fed in
//! generation order.

use crate::core::model::{
    Condition, ConditionKind, Reading, Severity, BRADYCARDIA_THRESHOLD,
    RR_VARIATION_ARRHYTHMIA_THRESHOLD, TACHYCARDIA_THRESHOLD,
};
use chrono::{DateTime, Utc};

/// Classifies one monitoring session's readings.
///
/// Owned by a single consumer loop; create one per session.
#[derive(Debug, Default)]
pub struct Detector {
    /// RR interval of the previous reading, 0.0 before the first one
    last_rr_interval: f64,
    /// Timestamp of the previous reading
    last_timestamp: Option<DateTime<Utc>>,
}

impl Detector {
    /// Create a detector with no previous beat.
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify the next reading of the stream.
    ///
    /// Always records `reading` as the previous beat before returning.
    pub fn classify(&mut self, reading: &Reading) -> Option<Condition> {
        let mut condition = None;

        if let Some(severity) = tachycardia_severity(reading.heart_rate) {
            condition = Some(Condition::new(ConditionKind::Tachycardia, severity, reading));
        }

        if let Some(severity) = bradycardia_severity(reading.heart_rate) {
            condition = Some(Condition::new(ConditionKind::Bradycardia, severity, reading));
        }

        if self.last_rr_interval > 0.0 && self.last_timestamp.is_some() {
            let variation =
                (reading.rr_interval - self.last_rr_interval).abs() / self.last_rr_interval;
            if let Some(severity) = arrhythmia_severity(variation) {
                condition = Some(Condition::new(ConditionKind::Arrhythmia, severity, reading));
            }
        }

        self.last_rr_interval = reading.rr_interval;
        self.last_timestamp = Some(reading.timestamp);

        condition
    }

    /// RR interval of the most recently classified reading.
    pub fn last_rr_interval(&self) -> f64 {
        self.last_rr_interval
    }

    /// Timestamp of the most recently classified reading.
    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.last_timestamp
    }
}

fn tachycardia_severity(heart_rate: i32) -> Option<Severity> {
    if heart_rate <= TACHYCARDIA_THRESHOLD {
        return None;
    }
    Some(if heart_rate > TACHYCARDIA_THRESHOLD + 40 {
        Severity::Severe
    } else if heart_rate > TACHYCARDIA_THRESHOLD + 20 {
        Severity::Moderate
    } else {
        Severity::Mild
    })
}

fn bradycardia_severity(heart_rate: i32) -> Option<Severity> {
    if heart_rate >= BRADYCARDIA_THRESHOLD {
        return None;
    }
    Some(if heart_rate < BRADYCARDIA_THRESHOLD - 20 {
        Severity::Severe
    } else if heart_rate < BRADYCARDIA_THRESHOLD - 10 {
        Severity::Moderate
    } else {
        Severity::Mild
    })
}

fn arrhythmia_severity(variation: f64) -> Option<Severity> {
    if variation <= RR_VARIATION_ARRHYTHMIA_THRESHOLD {
        return None;
    }
    Some(if variation > RR_VARIATION_ARRHYTHMIA_THRESHOLD * 2.0 {
        Severity::Severe
    } else if variation > RR_VARIATION_ARRHYTHMIA_THRESHOLD * 1.5 {
        Severity::Moderate
    } else {
        Severity::Mild
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;

    fn reading(heart_rate: i32, rr_interval: f64) -> Reading {
        Reading {
            timestamp: Utc::now(),
            heart_rate,
            rr_interval,
            qt_interval: 0.35,
            pr_interval: 0.15,
            qrs_interval: 0.08,
            signal_quality: 0.95,
        }
    }

    #[test]
    fn test_detect_tachycardia() {
        let mut detector = Detector::new();
        let condition = detector.classify(&reading(120, 0.5)).unwrap();

        assert_eq!(condition.kind, ConditionKind::Tachycardia);
        assert_eq!(condition.severity, Severity::Mild);
        assert_eq!(condition.heart_rate, 120);
        assert_eq!(condition.description, "Abnormally high heart rate detected");
    }

    #[test]
    fn test_detect_bradycardia() {
        let mut detector = Detector::new();
        let condition = detector.classify(&reading(45, 1.333)).unwrap();

        assert_eq!(condition.kind, ConditionKind::Bradycardia);
        assert_eq!(condition.severity, Severity::Moderate);
    }

    #[test]
    fn test_bradycardia_mild_band() {
        let mut detector = Detector::new();
        let condition = detector.classify(&reading(55, 60.0 / 55.0)).unwrap();

        assert_eq!(condition.kind, ConditionKind::Bradycardia);
        assert_eq!(condition.severity, Severity::Mild);
    }

    #[test]
    fn test_detect_arrhythmia() {
        let mut detector = Detector::new();

        let first = reading(70, 0.85);
        assert!(detector.classify(&first).is_none());

        let mut second = reading(70, 1.1);
        second.timestamp = first.timestamp + Duration::seconds(1);
        let condition = detector.classify(&second).unwrap();

        // 0.25 / 0.85 ≈ 0.294
        assert_eq!(condition.kind, ConditionKind::Arrhythmia);
        assert_eq!(condition.severity, Severity::Moderate);
        assert_eq!(condition.timestamp, second.timestamp);
    }

    #[test]
    fn test_normal_heartbeat() {
        let mut detector = Detector::new();
        assert!(detector.classify(&reading(70, 60.0 / 70.0)).is_none());
    }

    #[test]
    fn test_rate_boundaries_are_normal() {
        let mut detector = Detector::new();
        assert!(detector.classify(&reading(100, 0.6)).is_none());
        assert!(detector.classify(&reading(60, 0.6)).is_none());
    }

    #[test]
    fn test_arrhythmia_overrides_rate_condition() {
        let mut detector = Detector::new();
        detector.classify(&reading(70, 0.85));

        // Would be severe tachycardia on its own.
        let condition = detector.classify(&reading(150, 0.4)).unwrap();
        assert_eq!(condition.kind, ConditionKind::Arrhythmia);
        assert_eq!(condition.severity, Severity::Severe);
        assert_eq!(condition.heart_rate, 150);
    }

    #[test]
    fn test_rate_condition_survives_steady_rhythm() {
        let mut detector = Detector::new();
        detector.classify(&reading(130, 0.46));

        let condition = detector.classify(&reading(130, 0.47)).unwrap();
        assert_eq!(condition.kind, ConditionKind::Tachycardia);
        assert_eq!(condition.severity, Severity::Moderate);
    }

    #[test]
    fn test_arrhythmia_severity_bands() {
        let cases = [
            (1.20, Severity::Mild),
            (1.26, Severity::Moderate),
            (1.40, Severity::Severe),
            (0.60, Severity::Severe),
        ];
        for (rr, expected) in cases {
            let mut detector = Detector::new();
            detector.classify(&reading(75, 1.0));
            let condition = detector.classify(&reading(75, rr)).unwrap();
            assert_eq!(condition.kind, ConditionKind::Arrhythmia, "rr {rr}");
            assert_eq!(condition.severity, expected, "rr {rr}");
        }
    }

    #[test]
    fn test_state_tracks_previous_reading() {
        let mut detector = Detector::new();
        assert_eq!(detector.last_rr_interval(), 0.0);
        assert!(detector.last_timestamp().is_none());

        let normal = reading(70, 0.85);
        detector.classify(&normal);
        assert_eq!(detector.last_rr_interval(), 0.85);
        assert_eq!(detector.last_timestamp(), Some(normal.timestamp));

        let anomalous = reading(35, 1.7);
        assert!(detector.classify(&anomalous).is_some());
        assert_eq!(detector.last_rr_interval(), 1.7);
        assert_eq!(detector.last_timestamp(), Some(anomalous.timestamp));
    }

    fn tachycardia_band(rate: i32) -> Severity {
        match rate {
            101..=120 => Severity::Mild,
            121..=140 => Severity::Moderate,
            _ => Severity::Severe,
        }
    }

    fn bradycardia_band(rate: i32) -> Severity {
        match rate {
            50..=59 => Severity::Mild,
            40..=49 => Severity::Moderate,
            _ => Severity::Severe,
        }
    }

    proptest! {
        #[test]
        fn prop_fresh_tachycardia_bands(rate in 101i32..=250, rr in 0.2f64..2.0) {
            let condition = Detector::new().classify(&reading(rate, rr)).unwrap();
            prop_assert_eq!(condition.kind, ConditionKind::Tachycardia);
            prop_assert_eq!(condition.severity, tachycardia_band(rate));
        }

        #[test]
        fn prop_fresh_bradycardia_bands(rate in 20i32..60, rr in 0.2f64..3.0) {
            let condition = Detector::new().classify(&reading(rate, rr)).unwrap();
            prop_assert_eq!(condition.kind, ConditionKind::Bradycardia);
            prop_assert_eq!(condition.severity, bradycardia_band(rate));
        }

        #[test]
        fn prop_first_reading_never_arrhythmia(rate in 20i32..=250, rr in 0.01f64..5.0) {
            let condition = Detector::new().classify(&reading(rate, rr));
            prop_assert!(condition.map_or(true, |c| c.kind != ConditionKind::Arrhythmia));
        }

        #[test]
        fn prop_large_rr_jump_is_arrhythmia(
            first_rr in 0.3f64..2.0,
            factor in prop_oneof![0.2f64..0.84, 1.16f64..3.0],
            rate in 20i32..=250,
        ) {
            let mut detector = Detector::new();
            detector.classify(&reading(72, first_rr));
            let condition = detector.classify(&reading(rate, first_rr * factor)).unwrap();
            prop_assert_eq!(condition.kind, ConditionKind::Arrhythmia);
        }

        #[test]
        fn prop_steady_normal_rhythm_is_quiet(
            first_rr in 0.6f64..1.0,
            factor in 0.86f64..1.14,
            rate in 60i32..=100,
        ) {
            let mut detector = Detector::new();
            detector.classify(&reading(72, first_rr));
            prop_assert!(detector.classify(&reading(rate, first_rr * factor)).is_none());
        }

        #[test]
        fn prop_state_always_updated(
            rates in prop::collection::vec(20i32..=250, 1..20),
            rrs in prop::collection::vec(0.2f64..2.0, 20),
        ) {
            let mut detector = Detector::new();
            for (rate, rr) in rates.iter().zip(rrs.iter()) {
                let r = reading(*rate, *rr);
                detector.classify(&r);
                prop_assert_eq!(detector.last_rr_interval(), r.rr_interval);
                prop_assert_eq!(detector.last_timestamp(), Some(r.timestamp));
            }
        }
    }
}
