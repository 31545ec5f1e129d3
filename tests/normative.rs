use std::collections::BTreeMap;

use kira_gaitqc::schema::v1::{ClinicalVariable, Sex, TestType, Variable};
use kira_gaitqc::scores::NormClass;
use kira_gaitqc::scores::normative::{NormMetric, compare_test, lookup, reference};

#[test]
fn walk_speed_within_range_is_normal() {
    let cmp = lookup(NormMetric::WalkSpeed, 1.3, 65, Sex::Male).unwrap();
    assert_eq!(cmp.comparison, NormClass::Normal);
    assert!((cmp.mean - 1.339).abs() < 1e-12);
    assert!((cmp.percent_of_normal - 1.3 / 1.339 * 100.0).abs() < 1e-9);
}

#[test]
fn slow_walk_is_classified_by_z_score() {
    let below = lookup(NormMetric::WalkSpeed, 1.0, 65, Sex::Male).unwrap();
    assert_eq!(below.comparison, NormClass::BelowAverage);
    let far_below = lookup(NormMetric::WalkSpeed, 0.6, 65, Sex::Male).unwrap();
    assert_eq!(far_below.comparison, NormClass::SignificantlyBelow);
    assert!(far_below.z_score < -2.0);
    let fast = lookup(NormMetric::WalkSpeed, 2.0, 65, Sex::Male).unwrap();
    assert_eq!(fast.comparison, NormClass::SignificantlyAbove);
}

#[test]
fn sex_selects_the_row() {
    let male = reference(NormMetric::Cadence, 70, Sex::Male).unwrap();
    let female = reference(NormMetric::Cadence, 70, Sex::Female).unwrap();
    assert_eq!(male.mean, 108.0);
    assert_eq!(female.mean, 113.0);
}

#[test]
fn oldest_bracket_has_no_upper_age() {
    for metric in [
        NormMetric::WalkSpeed,
        NormMetric::TugTime,
        NormMetric::Cadence,
        NormMetric::StrideLength,
        NormMetric::DoubleSupport,
    ] {
        for age in [99, 100, 104, 120] {
            assert!(reference(metric, age, Sex::Female).is_some(), "{} at {}", metric, age);
            assert!(reference(metric, age, Sex::Male).is_some(), "{} at {}", metric, age);
        }
    }
    let tug = lookup(NormMetric::TugTime, 11.0, 101, Sex::Male).unwrap();
    assert_eq!(tug.mean, 11.3);
}

#[test]
fn tug_norms_start_at_sixty() {
    assert!(lookup(NormMetric::TugTime, 8.0, 55, Sex::Female).is_none());
    let cmp = lookup(NormMetric::TugTime, 8.0, 62, Sex::Female).unwrap();
    assert_eq!(cmp.comparison, NormClass::Normal);
    assert!(lookup(NormMetric::WalkSpeed, 1.2, 12, Sex::Male).is_none());
}

#[test]
fn metric_names_parse() {
    assert_eq!("walk-speed".parse::<NormMetric>().unwrap(), NormMetric::WalkSpeed);
    assert_eq!("TUG_TIME".parse::<NormMetric>().unwrap(), NormMetric::TugTime);
    assert!("arm_swing".parse::<NormMetric>().is_err());
    assert_eq!(NormMetric::DoubleSupport.to_string(), "double_support");
}

#[test]
fn variables_map_to_protocol_norms() {
    assert_eq!(
        NormMetric::for_variable(TestType::TenMeterWalk, Variable::WalkSpeed),
        Some(NormMetric::WalkSpeed)
    );
    assert_eq!(NormMetric::for_variable(TestType::Tug, Variable::WalkSpeed), None);
    assert_eq!(
        NormMetric::for_variable(TestType::Tug, Variable::WalkTime),
        Some(NormMetric::TugTime)
    );
    assert_eq!(NormMetric::for_variable(TestType::BergBalance, Variable::Cadence), None);
}

#[test]
fn stride_length_in_leg_units_is_not_compared() {
    let mut vars = BTreeMap::new();
    vars.insert(Variable::Cadence, ClinicalVariable::new(110.0, "steps/min"));
    vars.insert(Variable::StrideLength, ClinicalVariable::new(1.2, "leg"));
    let out = compare_test(TestType::TenMeterWalk, 8.0, 1.25, &vars, 45, Sex::Female);
    let names: Vec<Variable> = out.iter().map(|(v, _)| *v).collect();
    assert_eq!(names, vec![Variable::WalkSpeed, Variable::Cadence]);

    vars.insert(Variable::StrideLength, ClinicalVariable::new(1.2, "m"));
    let out = compare_test(TestType::TenMeterWalk, 8.0, 1.25, &vars, 45, Sex::Female);
    assert!(out.iter().any(|(v, _)| *v == Variable::StrideLength));
}
