use crate::config::PhaseConfig;
use crate::phases::PhaseSegmentation;
use crate::phases::tracker::PhaseTracker;
use crate::pose::LandmarkFrame;
use crate::pose::geometry::FrameFeatures;

/// Segments a whole TUG recording. Always returns five contiguous phases.
pub fn segment(frames: &[LandmarkFrame], cfg: &PhaseConfig, visibility_threshold: f64) -> PhaseSegmentation {
    let features: Vec<FrameFeatures> = frames
        .iter()
        .map(|f| FrameFeatures::from_frame(f, visibility_threshold))
        .collect();
    segment_features(&features, cfg)
}

/// Same as [`segment`] over precomputed features.
pub fn segment_features(features: &[FrameFeatures], cfg: &PhaseConfig) -> PhaseSegmentation {
    let mut tracker = PhaseTracker::new(cfg.clone());
    for f in features {
        tracker.push(*f);
    }
    tracker.finish()
}
