use crate::phases::TugPhase;
use crate::schema::v1::{GaitQcV1, TestType, Variable};

pub fn format_summary(report: &GaitQcV1) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} v{}\n", report.tool, report.version));
    out.push_str(&format!(
        "Test: {}, frames: {} ({} detected, {} dropped)\n",
        report.test_type, report.frames.total, report.frames.detected, report.frames.dropped
    ));
    match report.test_type {
        TestType::BergBalance => {
            out.push_str(&format!("Duration: {:.2} s\n", report.walk_time_seconds));
            if let Some(score) = report.score {
                out.push_str(&format!("Score: {}/56\n", score));
            }
        }
        _ => out.push_str(&format!(
            "Walk time: {:.2} s, speed: {:.2} m/s\n",
            report.walk_time_seconds, report.walk_speed_mps
        )),
    }

    if let Some(seg) = &report.phases {
        let parts: Vec<String> = TugPhase::ORDER
            .iter()
            .filter_map(|p| seg.phase(*p))
            .map(|s| format!("{} {:.2}s", s.phase.as_str(), s.duration))
            .collect();
        out.push_str(&format!("Phases: {}", parts.join(", ")));
        if seg.low_confidence {
            out.push_str(" (low confidence)");
        }
        out.push('\n');
    }

    for variable in [Variable::Cadence, Variable::StrideLength, Variable::DoubleSupport] {
        if let Some(v) = report.clinical_variables.get(&variable) {
            out.push_str(&format!("{}: {:.2} {}\n", variable, v.value, v.unit));
        }
    }

    out.push_str(&format!(
        "Confidence: {:.1} ({})\n",
        report.confidence.score,
        report.confidence.level.as_str()
    ));
    out
}
