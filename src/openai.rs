//! Chat-completions client for quiz and recommendation generation.
//!
//! We only call chat.completions and always request a strict JSON object.
//! Calls log model names, latencies and token usage, never contents or the
//! API key. Both generators honor the boundary contract: they return a
//! well-formed sequence or an empty one, and never let an error escape.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use crate::config::Config;
use crate::models::quiz::QuizQuestion;

/// Input cap handed to the collaborator. First N characters of the
/// extracted document text, counted in chars to stay on a UTF-8 boundary.
pub const MAX_PROMPT_CHARS: usize = 4000;

/// Default number of questions per generated quiz.
pub const DEFAULT_QUESTION_COUNT: usize = 5;

const QUIZ_SYSTEM_PROMPT: &str = "You are an expert educational content creator \
specializing in creating quizzes for primary school students.";

const RECOMMENDATION_SYSTEM_PROMPT: &str = "You are an expert educational advisor \
specializing in primary education.";

/// Performance summary handed to the recommendation generator.
#[derive(Debug, Serialize)]
pub struct PerformanceProfile {
    pub avg_score: f64,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
}

/// One past quiz with the student's per-question correctness.
#[derive(Debug, Serialize)]
pub struct QuizHistoryEntry {
    pub material: String,
    pub level: String,
    pub score: f64,
    pub questions: Vec<AnswerReview>,
}

#[derive(Debug, Serialize)]
pub struct AnswerReview {
    pub question: String,
    pub user_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
}

#[derive(Clone)]
pub struct LlmClient {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl LlmClient {
    /// Builds the client from configuration. A missing API key leaves the
    /// client constructed but inert: every generation reports failure as an
    /// empty result.
    pub fn new(config: &Config) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key: config.openai_api_key.clone(),
            base_url: config.openai_base_url.clone(),
            model: config.openai_model.clone(),
        }
    }

    /// Generates multiple-choice questions from extracted document text.
    ///
    /// Returns an empty vec on any failure: missing key, transport error,
    /// or a completion that does not parse into well-formed questions.
    #[instrument(level = "info", skip(self, text), fields(level = %level, text_len = text.len()))]
    pub async fn generate_quiz(
        &self,
        text: &str,
        level: &str,
        num_questions: usize,
    ) -> Vec<QuizQuestion> {
        let difficulty = match level {
            "Beginner" => "simple, focusing on basic recall and understanding",
            "Intermediate" => "moderately challenging, testing application and analysis",
            _ => "challenging, requiring synthesis and evaluation",
        };

        let excerpt: String = text.chars().take(MAX_PROMPT_CHARS).collect();
        let prompt = format!(
            "Create a quiz with {num_questions} multiple-choice questions based on the \
             following study material.\n\
             Make the questions {difficulty}, appropriate for primary school students.\n\n\
             Each question should have 4 options with only one correct answer.\n\
             Include a brief explanation for the correct answer.\n\n\
             Format the response as a JSON object with a \"questions\" array of objects \
             with the following structure:\n\
             {{\"question\": \"Question text here?\", \
             \"options\": [\"Option A\", \"Option B\", \"Option C\", \"Option D\"], \
             \"correct_answer\": \"Option that is correct\", \
             \"explanation\": \"Brief explanation of why this answer is correct\"}}\n\n\
             Study material:\n{excerpt}"
        );

        match self.chat_json(QUIZ_SYSTEM_PROMPT, &prompt, 0.7).await {
            Ok(content) => {
                let questions = parse_questions(&content);
                if questions.is_empty() {
                    warn!("completion did not contain well-formed questions");
                }
                questions
            }
            Err(e) => {
                error!(error = %e, "quiz generation call failed");
                Vec::new()
            }
        }
    }

    /// Generates 3-5 study recommendation strings from aggregated performance.
    /// Empty vec on failure, same contract as quiz generation.
    #[instrument(level = "info", skip(self, profile, history), fields(history_len = history.len()))]
    pub async fn generate_recommendations(
        &self,
        profile: &PerformanceProfile,
        history: &[QuizHistoryEntry],
    ) -> Vec<String> {
        let history_json = match serde_json::to_string_pretty(history) {
            Ok(v) => v,
            Err(e) => {
                error!(error = %e, "failed to serialize quiz history");
                return Vec::new();
            }
        };

        let prompt = format!(
            "Based on the student's performance data, generate personalized study \
             recommendations.\n\n\
             Student Performance Summary:\n\
             Average Score: {:.1}%\n\
             Strengths: {}\n\
             Weaknesses: {}\n\n\
             Recent Quiz Results:\n{}\n\n\
             Provide 3-5 specific, actionable recommendations to help this student improve.\n\
             Format your response as a JSON object with a \"recommendations\" array of strings.\n\
             Make recommendations appropriate for a primary school student.",
            profile.avg_score,
            join_or_na(&profile.strengths),
            join_or_na(&profile.weaknesses),
            history_json,
        );

        match self
            .chat_json(RECOMMENDATION_SYSTEM_PROMPT, &prompt, 0.7)
            .await
        {
            Ok(content) => {
                let recommendations = parse_recommendations(&content);
                if recommendations.is_empty() {
                    warn!("completion did not contain recommendations");
                }
                recommendations
            }
            Err(e) => {
                error!(error = %e, "recommendation call failed");
                Vec::new()
            }
        }
    }

    /// JSON-object chat completion; returns the raw message content.
    #[instrument(level = "info", skip(self, system, user), fields(model = %self.model))]
    async fn chat_json(
        &self,
        system: &str,
        user: &str,
        temperature: f32,
    ) -> Result<String, String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| "OPENAI_API_KEY is not configured".to_string())?;

        let url = format!("{}/chat/completions", self.base_url);
        let req = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessageReq {
                    role: "system".into(),
                    content: system.into(),
                },
                ChatMessageReq {
                    role: "user".into(),
                    content: user.into(),
                },
            ],
            temperature,
            response_format: Some(ResponseFormat {
                kind: "json_object".into(),
            }),
        };

        let start = std::time::Instant::now();
        let res = self
            .client
            .post(&url)
            .header(USER_AGENT, "ai-quiz-backend/0.1")
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, format!("Bearer {}", api_key))
            .json(&req)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            let msg = extract_api_error(&body).unwrap_or(body);
            return Err(format!("LLM HTTP {}: {}", status, msg));
        }

        let body: ChatCompletionResponse = res.json().await.map_err(|e| e.to_string())?;
        if let Some(usage) = &body.usage {
            info!(
                elapsed = ?start.elapsed(),
                prompt_tokens = ?usage.prompt_tokens,
                completion_tokens = ?usage.completion_tokens,
                "LLM usage"
            );
        }

        Ok(body
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default())
    }
}

/// Parses a completion into quiz questions.
///
/// Accepts either a bare JSON array or an object wrapping it under
/// `"questions"`. The whole payload is rejected (empty vec) when any
/// question is malformed: wrong option count, or a correct answer that is
/// not one of the options.
pub fn parse_questions(raw: &str) -> Vec<QuizQuestion> {
    let items = match unwrap_array(raw, "questions") {
        Some(items) => items,
        None => return Vec::new(),
    };

    let mut questions = Vec::with_capacity(items.len());
    for item in items {
        match serde_json::from_value::<QuizQuestion>(item) {
            Ok(q) if q.options.len() == 4 && q.options.contains(&q.correct_answer) => {
                questions.push(q)
            }
            _ => return Vec::new(),
        }
    }
    questions
}

/// Parses a completion into recommendation strings. Accepts a bare array
/// or an object wrapping it under `"recommendations"`.
pub fn parse_recommendations(raw: &str) -> Vec<String> {
    let items = match unwrap_array(raw, "recommendations") {
        Some(items) => items,
        None => return Vec::new(),
    };

    let mut recommendations = Vec::with_capacity(items.len());
    for item in items {
        match item {
            serde_json::Value::String(s) if !s.trim().is_empty() => recommendations.push(s),
            _ => return Vec::new(),
        }
    }
    recommendations
}

fn unwrap_array(raw: &str, key: &str) -> Option<Vec<serde_json::Value>> {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Array(items)) => Some(items),
        Ok(serde_json::Value::Object(mut map)) => match map.remove(key) {
            Some(serde_json::Value::Array(items)) => Some(items),
            _ => None,
        },
        _ => None,
    }
}

fn join_or_na(labels: &[String]) -> String {
    if labels.is_empty() {
        "N/A".to_string()
    } else {
        labels.join(", ")
    }
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessageReq>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ChatMessageReq {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResp,
}

#[derive(Deserialize)]
struct ChatMessageResp {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: Option<u32>,
    #[serde(default)]
    completion_tokens: Option<u32>,
}

/// Try to extract a clean error message from an API error body.
fn extract_api_error(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct EWrap {
        error: EObj,
    }
    #[derive(Deserialize)]
    struct EObj {
        message: String,
    }
    serde_json::from_str::<EWrap>(body)
        .ok()
        .map(|w| w.error.message)
}
