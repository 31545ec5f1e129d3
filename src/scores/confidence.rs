use crate::config::ConfidenceConfig;
use crate::math::stats::{round_to, safe_ratio};
use crate::schema::v1::TestType;
use crate::scores::{ConfidenceDetails, ConfidenceLevel, ConfidenceScore};

/// Sub-score used when a signal does not apply to the protocol.
pub const NOT_APPLICABLE: f64 = 50.0;

/// Signals already computed by the analysis pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceSignals {
    pub test_type: TestType,
    /// Detected frames over total frames, 0..1.
    pub detection_rate: f64,
    pub stream_duration: f64,
    pub walk_time_seconds: f64,
    pub walk_speed_mps: f64,
}

pub fn compute_confidence(signals: &ConfidenceSignals, cfg: &ConfidenceConfig) -> ConfidenceScore {
    let details = ConfidenceDetails {
        pose_detection_rate: (signals.detection_rate * 100.0).clamp(0.0, 100.0),
        walk_duration_score: walk_duration_score(
            signals.walk_time_seconds,
            signals.stream_duration,
            cfg.min_walk_fraction,
        ),
        walk_time_score: band_score(signals.walk_time_seconds, cfg.time_range(signals.test_type)),
        walk_speed_score: match signals.test_type {
            TestType::BergBalance => NOT_APPLICABLE,
            _ => band_score(signals.walk_speed_mps, cfg.speed_range),
        },
    };
    let raw = details.pose_detection_rate * cfg.detection_weight
        + details.walk_duration_score * cfg.duration_weight
        + details.walk_time_score * cfg.time_weight
        + details.walk_speed_score * cfg.speed_weight;
    let score = round_to(raw.clamp(0.0, 100.0), 1);
    ConfidenceScore {
        score,
        level: ConfidenceLevel::from_score(score),
        details,
    }
}

/// Timed walk as a share of the recording. Exceeding the recording is
/// impossible and scores zero.
pub fn walk_duration_score(walk_time: f64, stream_duration: f64, min_fraction: f64) -> f64 {
    if stream_duration <= 0.0 || walk_time <= 0.0 {
        return 0.0;
    }
    let r = walk_time / stream_duration;
    if r > 1.0 + 1e-9 {
        0.0
    } else if r >= min_fraction {
        100.0
    } else {
        safe_ratio(r, min_fraction, 0.0) * 100.0
    }
}

/// 100 inside `[low, high]`, falling linearly to 0 at `low / 2` and
/// `2 * high`.
pub fn band_score(value: f64, range: [f64; 2]) -> f64 {
    let [low, high] = range;
    if !value.is_finite() {
        return 0.0;
    }
    let score = if value < low {
        let floor = low / 2.0;
        safe_ratio(value - floor, low - floor, 0.0)
    } else if value > high {
        safe_ratio(2.0 * high - value, high, 0.0)
    } else {
        1.0
    };
    (score * 100.0).clamp(0.0, 100.0)
}
