use clap::Parser;
use kira_gaitqc::cli::{Cli, Commands, SexArg, TestTypeArg};
use kira_gaitqc::schema::v1::{TestType, Variable};
use kira_gaitqc::scores::normative::NormMetric;

#[test]
fn analyze_args_parse() {
    let cli = Cli::parse_from([
        "kira-gaitqc",
        "analyze",
        "--input",
        "walk.jsonl",
        "--test-type",
        "10mwt",
        "--out",
        "out",
        "--height-cm",
        "172",
        "--sex",
        "female",
        "--json",
    ]);
    let Commands::Analyze(args) = cli.command else {
        panic!("expected analyze");
    };
    assert_eq!(args.test_type, TestTypeArg::TenMeterWalk);
    assert_eq!(TestType::from(args.test_type), TestType::TenMeterWalk);
    assert_eq!(args.height_cm, Some(172.0));
    assert_eq!(args.sex, Some(SexArg::Female));
    assert!(args.json);
    assert!(!args.tsv);
    assert!(!args.events);
}

#[test]
fn berg_score_is_bounded() {
    let base = [
        "kira-gaitqc",
        "analyze",
        "--input",
        "a.json",
        "--test-type",
        "bbs",
        "--out",
        "o",
        "--score",
    ];
    let ok = Cli::try_parse_from(base.iter().copied().chain(["56"]));
    assert!(ok.is_ok());
    let bad = Cli::try_parse_from(base.iter().copied().chain(["57"]));
    assert!(bad.is_err());
}

#[test]
fn report_goals_are_repeatable() {
    let cli = Cli::parse_from([
        "kira-gaitqc",
        "report",
        "--history",
        "h.json",
        "--test-type",
        "tug",
        "--goal",
        "walk_time=8.5",
        "--goal",
        "cadence=110",
        "--threads",
        "2",
    ]);
    let Commands::Report(args) = cli.command else {
        panic!("expected report");
    };
    assert_eq!(
        args.goals,
        vec![(Variable::WalkTime, 8.5), (Variable::Cadence, 110.0)]
    );
    assert_eq!(args.threads, 2);
}

#[test]
fn malformed_goals_are_rejected() {
    for goal in ["walk_time", "speed=1.2", "walk_speed=fast", "walk_speed=inf"] {
        let res = Cli::try_parse_from([
            "kira-gaitqc",
            "report",
            "--history",
            "h.json",
            "--test-type",
            "tug",
            "--goal",
            goal,
        ]);
        assert!(res.is_err(), "accepted {}", goal);
    }
}

#[test]
fn trend_and_norms_parse_names() {
    let cli = Cli::parse_from([
        "kira-gaitqc",
        "trend",
        "--history",
        "h.json",
        "--test-type",
        "10mwt",
        "--variable",
        "stride-length",
    ]);
    let Commands::Trend(args) = cli.command else {
        panic!("expected trend");
    };
    assert_eq!(args.variable, Variable::StrideLength);
    assert_eq!(args.goal, None);

    let cli = Cli::parse_from([
        "kira-gaitqc",
        "norms",
        "--variable",
        "tug_time",
        "--value",
        "9.5",
        "--age",
        "74",
        "--sex",
        "male",
    ]);
    let Commands::Norms(args) = cli.command else {
        panic!("expected norms");
    };
    assert_eq!(args.variable, NormMetric::TugTime);
    assert!(Cli::try_parse_from(["kira-gaitqc", "norms", "--variable", "arm_swing", "--value", "1", "--age", "70", "--sex", "male"]).is_err());
}
