// tests/report_tests.rs
//
// Pure aggregator tests; no database involved.

use ai_quiz_backend::report::{
    DanglingPolicy, Report, ReportError, ReportOutcome, ScoreRecord, build_report,
};
use chrono::{DateTime, TimeZone, Utc};

fn ts(offset_secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap() + chrono::Duration::seconds(offset_secs)
}

fn record(
    quiz_id: i64,
    subject: &str,
    chapter: &str,
    subchapter: &str,
    score: f64,
    offset_secs: i64,
) -> ScoreRecord {
    ScoreRecord {
        quiz_id,
        material_title: format!("Material {}", quiz_id),
        level: "Beginner".to_string(),
        subject_name: Some(subject.to_string()),
        chapter_name: Some(chapter.to_string()),
        subchapter_name: Some(subchapter.to_string()),
        score,
        completed_at: ts(offset_secs),
    }
}

fn dangling(quiz_id: i64, score: f64, offset_secs: i64) -> ScoreRecord {
    ScoreRecord {
        quiz_id,
        material_title: format!("Material {}", quiz_id),
        level: "Beginner".to_string(),
        subject_name: None,
        chapter_name: None,
        subchapter_name: None,
        score,
        completed_at: ts(offset_secs),
    }
}

fn ready(outcome: ReportOutcome) -> Report {
    match outcome {
        ReportOutcome::Ready(report) => report,
        ReportOutcome::NoData { .. } => panic!("expected a full report, got the no-data sentinel"),
    }
}

#[test]
fn empty_input_is_no_data_not_an_error() {
    let outcome = build_report("amira", &[], DanglingPolicy::Skip, ts(0)).unwrap();
    assert!(matches!(outcome, ReportOutcome::NoData { .. }));
}

#[test]
fn repeated_attempts_on_one_subchapter() {
    // Two attempts on Math / Addition / Basic: 80 then 100.
    let records = vec![
        record(1, "Math", "Addition", "Basic", 80.0, 0),
        record(2, "Math", "Addition", "Basic", 100.0, 60),
    ];

    let report = ready(build_report("amira", &records, DanglingPolicy::Skip, ts(0)).unwrap());

    assert_eq!(report.summary.total_quizzes, 2);
    assert!((report.summary.avg_score - 90.0).abs() < 1e-9);
    assert!((report.summary.highest_score - 100.0).abs() < 1e-9);

    let math = &report.subject_performance["Math"];
    assert_eq!(math.total_quizzes, 2);
    assert!((math.avg_score - 90.0).abs() < 1e-9);

    let addition = &math.chapters["Addition"];
    assert_eq!(addition.total_quizzes, 2);
    assert!((addition.avg_score - 90.0).abs() < 1e-9);

    let basic = &addition.subchapters["Basic"];
    assert_eq!(basic.total_quizzes, 2);
    assert!((basic.avg_score - 90.0).abs() < 1e-9);
    assert_eq!(basic.quizzes.len(), 2);
}

#[test]
fn counts_and_sums_are_additive_bottom_up() {
    let records = vec![
        record(1, "Math", "Addition", "Basic", 80.0, 0),
        record(2, "Math", "Addition", "Carrying", 60.0, 10),
        record(3, "Math", "Subtraction", "Basic", 40.0, 20),
        record(4, "Science", "Plants", "Leaves", 90.0, 30),
        record(5, "Math", "Addition", "Basic", 100.0, 40),
    ];

    let report = ready(build_report("amira", &records, DanglingPolicy::Skip, ts(0)).unwrap());

    for subject in report.subject_performance.values() {
        let chapter_sum: f64 = subject.chapters.values().map(|c| c.total_score).sum();
        let chapter_count: u32 = subject.chapters.values().map(|c| c.total_quizzes).sum();
        assert!((chapter_sum - subject.total_score).abs() < 1e-9);
        assert_eq!(chapter_count, subject.total_quizzes);

        for chapter in subject.chapters.values() {
            let sub_sum: f64 = chapter.subchapters.values().map(|s| s.total_score).sum();
            let sub_count: u32 = chapter.subchapters.values().map(|s| s.total_quizzes).sum();
            assert!((sub_sum - chapter.total_score).abs() < 1e-9);
            assert_eq!(sub_count, chapter.total_quizzes);

            for subchapter in chapter.subchapters.values() {
                assert_eq!(subchapter.quizzes.len(), subchapter.total_quizzes as usize);
            }
        }
    }

    // Tree totals also match the summary.
    let tree_count: u32 = report
        .subject_performance
        .values()
        .map(|s| s.total_quizzes)
        .sum();
    assert_eq!(tree_count as usize, report.summary.total_quizzes);
}

#[test]
fn recent_activity_is_capped_and_newest_first() {
    let records: Vec<ScoreRecord> = (0..7)
        .map(|i| record(i as i64 + 1, "Math", "Addition", "Basic", 50.0, i * 100))
        .collect();

    let report = ready(build_report("amira", &records, DanglingPolicy::Skip, ts(0)).unwrap());

    assert_eq!(report.recent_activity.len(), 5);
    // Newest attempt (largest offset) comes first.
    assert_eq!(report.recent_activity[0].quiz_id, 7);
    assert_eq!(report.recent_activity[4].quiz_id, 3);
}

#[test]
fn recent_activity_shorter_than_cap() {
    let records = vec![
        record(1, "Math", "Addition", "Basic", 50.0, 0),
        record(2, "Math", "Addition", "Basic", 60.0, 100),
    ];

    let report = ready(build_report("amira", &records, DanglingPolicy::Skip, ts(0)).unwrap());
    assert_eq!(report.recent_activity.len(), 2);
    assert_eq!(report.recent_activity[0].quiz_id, 2);
}

#[test]
fn equal_timestamps_keep_original_order() {
    // Three records share a completed_at; stable sort must keep 1, 2, 3.
    let records = vec![
        record(1, "Math", "Addition", "Basic", 50.0, 0),
        record(2, "Math", "Addition", "Basic", 60.0, 0),
        record(3, "Math", "Addition", "Basic", 70.0, 0),
    ];

    let report = ready(build_report("amira", &records, DanglingPolicy::Skip, ts(0)).unwrap());
    let order: Vec<i64> = report.recent_activity.iter().map(|a| a.quiz_id).collect();
    assert_eq!(order, vec![1, 2, 3]);
}

#[test]
fn aggregation_is_idempotent() {
    let records = vec![
        record(1, "Math", "Addition", "Basic", 80.0, 0),
        record(2, "Science", "Plants", "Leaves", 90.0, 50),
    ];

    let first = build_report("amira", &records, DanglingPolicy::Skip, ts(0)).unwrap();
    let second = build_report("amira", &records, DanglingPolicy::Skip, ts(0)).unwrap();

    let a = serde_json::to_string(&first).unwrap();
    let b = serde_json::to_string(&second).unwrap();
    assert_eq!(a, b);
}

#[test]
fn dangling_record_fails_under_fail_policy() {
    let records = vec![
        record(1, "Math", "Addition", "Basic", 80.0, 0),
        dangling(2, 90.0, 10),
    ];

    let err = build_report("amira", &records, DanglingPolicy::Fail, ts(0)).unwrap_err();
    assert_eq!(err, ReportError::DanglingReference { quiz_id: 2 });
}

#[test]
fn dangling_record_is_excluded_under_skip_policy() {
    let records = vec![
        record(1, "Math", "Addition", "Basic", 80.0, 0),
        dangling(2, 90.0, 10),
    ];

    let report = ready(build_report("amira", &records, DanglingPolicy::Skip, ts(0)).unwrap());

    // The skipped record appears nowhere: not in the summary, the tree,
    // or the activity feed.
    assert_eq!(report.summary.total_quizzes, 1);
    assert!((report.summary.avg_score - 80.0).abs() < 1e-9);
    assert_eq!(report.recent_activity.len(), 1);
    assert_eq!(report.recent_activity[0].quiz_id, 1);
}

#[test]
fn all_records_dangling_degrades_to_no_data() {
    let records = vec![dangling(1, 80.0, 0), dangling(2, 90.0, 10)];

    let outcome = build_report("amira", &records, DanglingPolicy::Skip, ts(0)).unwrap();
    assert!(matches!(outcome, ReportOutcome::NoData { .. }));
}

#[test]
fn report_serializes_expected_top_level_fields() {
    let records = vec![record(1, "Math", "Addition", "Basic", 80.0, 0)];
    let outcome = build_report("amira", &records, DanglingPolicy::Skip, ts(0)).unwrap();

    let value = serde_json::to_value(&outcome).unwrap();
    assert_eq!(value["username"], "amira");
    assert!(value["summary"].is_object());
    assert!(value["subject_performance"]["Math"].is_object());
    assert!(value["recent_activity"].is_array());
    assert!(value["generated_at"].is_string());
}
