// tests/completion_tests.rs
//
// Parsing of LLM completions into questions and recommendations.

use ai_quiz_backend::openai::{parse_questions, parse_recommendations};
use serde_json::json;

fn question(text: &str, correct: &str) -> serde_json::Value {
    json!({
        "question": text,
        "options": ["A", "B", "C", "D"],
        "correct_answer": correct,
        "explanation": "because"
    })
}

#[test]
fn accepts_wrapped_questions_object() {
    let raw = json!({
        "questions": [question("What is 2+2?", "B"), question("What is 3+3?", "C")]
    })
    .to_string();

    let questions = parse_questions(&raw);
    assert_eq!(questions.len(), 2);
    assert_eq!(questions[0].question, "What is 2+2?");
    assert_eq!(questions[0].correct_answer, "B");
    assert_eq!(questions[0].options.len(), 4);
}

#[test]
fn accepts_bare_question_array() {
    let raw = json!([question("What is 2+2?", "A")]).to_string();
    assert_eq!(parse_questions(&raw).len(), 1);
}

#[test]
fn missing_explanation_defaults_to_empty() {
    let raw = json!({
        "questions": [{
            "question": "What is 2+2?",
            "options": ["A", "B", "C", "D"],
            "correct_answer": "A"
        }]
    })
    .to_string();

    let questions = parse_questions(&raw);
    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0].explanation, "");
}

#[test]
fn rejects_whole_payload_on_wrong_option_count() {
    let raw = json!({
        "questions": [
            question("fine", "A"),
            {
                "question": "only three options",
                "options": ["A", "B", "C"],
                "correct_answer": "A",
                "explanation": ""
            }
        ]
    })
    .to_string();

    assert!(parse_questions(&raw).is_empty());
}

#[test]
fn rejects_whole_payload_when_answer_not_among_options() {
    let raw = json!({
        "questions": [question("fine", "A"), question("bad", "E")]
    })
    .to_string();

    assert!(parse_questions(&raw).is_empty());
}

#[test]
fn rejects_non_json_and_wrong_shapes() {
    assert!(parse_questions("not json at all").is_empty());
    assert!(parse_questions("{\"foo\": 1}").is_empty());
    assert!(parse_questions("{\"questions\": \"nope\"}").is_empty());
    assert!(parse_questions("42").is_empty());
}

#[test]
fn empty_array_yields_no_questions() {
    assert!(parse_questions("{\"questions\": []}").is_empty());
    assert!(parse_questions("[]").is_empty());
}

#[test]
fn accepts_wrapped_recommendations() {
    let raw = json!({
        "recommendations": ["Practice addition daily", "Review chapter 2"]
    })
    .to_string();

    let recs = parse_recommendations(&raw);
    assert_eq!(recs, vec!["Practice addition daily", "Review chapter 2"]);
}

#[test]
fn accepts_bare_recommendation_array() {
    let raw = json!(["Read more"]).to_string();
    assert_eq!(parse_recommendations(&raw), vec!["Read more"]);
}

#[test]
fn rejects_recommendations_with_non_string_items() {
    let raw = json!({ "recommendations": ["fine", 7] }).to_string();
    assert!(parse_recommendations(&raw).is_empty());
}

#[test]
fn rejects_blank_recommendation_strings() {
    let raw = json!({ "recommendations": ["fine", "   "] }).to_string();
    assert!(parse_recommendations(&raw).is_empty());
}
