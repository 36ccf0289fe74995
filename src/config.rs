// src/config.rs

use std::env;

use dotenvy::dotenv;

use crate::report::DanglingPolicy;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,

    /// Root directory for uploaded study materials.
    pub media_root: String,

    /// LLM collaborator settings. A missing API key disables generation
    /// (the services then report failure as an empty result).
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,

    /// Average-score cutoff separating strengths from weaknesses in the
    /// recommendation flow. Policy constant, not a law.
    pub strength_threshold: f64,

    /// What to do when a score references a deleted curriculum node.
    pub dangling_policy: DanglingPolicy,

    /// Optional teacher account seeded at startup.
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(86400);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let media_root = env::var("MEDIA_ROOT").unwrap_or_else(|_| "media".to_string());

        let openai_api_key = env::var("OPENAI_API_KEY").ok();
        let openai_base_url = env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        let openai_model = env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o".to_string());

        let strength_threshold = env::var("STRENGTH_THRESHOLD")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(70.0);

        let dangling_policy = match env::var("REPORT_DANGLING_POLICY").as_deref() {
            Ok("fail") => DanglingPolicy::Fail,
            _ => DanglingPolicy::Skip,
        };

        let admin_username = env::var("ADMIN_USERNAME").ok();
        let admin_password = env::var("ADMIN_PASSWORD").ok();

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            media_root,
            openai_api_key,
            openai_base_url,
            openai_model,
            strength_threshold,
            dangling_policy,
            admin_username,
            admin_password,
        }
    }
}
