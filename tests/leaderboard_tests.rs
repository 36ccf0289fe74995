// tests/leaderboard_tests.rs

use ai_quiz_backend::models::score::{
    LEADERBOARD_LIMIT, LeaderboardEntry, parse_time_taken, rank_leaderboard,
};
use chrono::{TimeZone, Utc};

fn entry(username: &str, score: f64, time_taken: &str) -> LeaderboardEntry {
    LeaderboardEntry {
        username: username.to_string(),
        quiz_id: 1,
        level: "Beginner".to_string(),
        score,
        time_taken: time_taken.to_string(),
        completed_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
    }
}

#[test]
fn parses_minute_second_times() {
    assert_eq!(parse_time_taken("5:30"), Some(330));
    assert_eq!(parse_time_taken("0:07"), Some(7));
    assert_eq!(parse_time_taken("10:00"), Some(600));
    assert_eq!(parse_time_taken("4:00"), Some(240));
}

#[test]
fn parses_hour_minute_second_times() {
    assert_eq!(parse_time_taken("1:02:03"), Some(3723));
}

#[test]
fn parses_bare_seconds() {
    assert_eq!(parse_time_taken("45"), Some(45));
}

#[test]
fn tolerates_surrounding_whitespace() {
    assert_eq!(parse_time_taken(" 5:30 "), Some(330));
}

#[test]
fn rejects_garbage_times() {
    assert_eq!(parse_time_taken(""), None);
    assert_eq!(parse_time_taken("fast"), None);
    assert_eq!(parse_time_taken("5:3x"), None);
    assert_eq!(parse_time_taken("1:2:3:4"), None);
    assert_eq!(parse_time_taken("-5:00"), None);
}

#[test]
fn orders_by_score_then_time() {
    // A and B tie at 90, but B was faster; C trails on score.
    let entries = vec![
        entry("A", 90.0, "5:30"),
        entry("B", 90.0, "4:10"),
        entry("C", 85.0, "3:00"),
    ];

    let ranked = rank_leaderboard(entries);
    let order: Vec<&str> = ranked.iter().map(|e| e.username.as_str()).collect();
    assert_eq!(order, vec!["B", "A", "C"]);
}

#[test]
fn time_ties_break_numerically_not_lexically() {
    // "10:00" sorts before "4:00" as a string; it must not here.
    let entries = vec![entry("slow", 90.0, "10:00"), entry("fast", 90.0, "4:00")];

    let ranked = rank_leaderboard(entries);
    assert_eq!(ranked[0].username, "fast");
    assert_eq!(ranked[1].username, "slow");
}

#[test]
fn unparseable_time_ranks_last_among_equal_scores() {
    let entries = vec![
        entry("broken", 90.0, "n/a"),
        entry("ok", 90.0, "9:59"),
    ];

    let ranked = rank_leaderboard(entries);
    assert_eq!(ranked[0].username, "ok");
    assert_eq!(ranked[1].username, "broken");
}

#[test]
fn truncates_to_the_top_ten() {
    let entries: Vec<LeaderboardEntry> = (0..15)
        .map(|i| entry(&format!("user{}", i), 100.0 - i as f64, "1:00"))
        .collect();

    let ranked = rank_leaderboard(entries);
    assert_eq!(ranked.len(), LEADERBOARD_LIMIT);
    assert_eq!(ranked[0].username, "user0");
    assert_eq!(ranked[9].username, "user9");
}

#[test]
fn full_ties_keep_submission_order() {
    let entries = vec![
        entry("first", 90.0, "5:00"),
        entry("second", 90.0, "5:00"),
    ];

    let ranked = rank_leaderboard(entries);
    assert_eq!(ranked[0].username, "first");
    assert_eq!(ranked[1].username, "second");
}
