// tests/auth_tests.rs
//
// Password hashing and token issuing; no database involved.

use ai_quiz_backend::config::Config;
use ai_quiz_backend::report::DanglingPolicy;
use ai_quiz_backend::utils::hash::{hash_password, verify_password};
use ai_quiz_backend::utils::jwt::{Role, decode_token, issue_token};

fn test_config() -> Config {
    Config {
        database_url: "postgres://unused".to_string(),
        jwt_secret: "test_secret_for_token_tests".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        media_root: "media".to_string(),
        openai_api_key: None,
        openai_base_url: "https://api.openai.com/v1".to_string(),
        openai_model: "gpt-4o".to_string(),
        strength_threshold: 70.0,
        dangling_policy: DanglingPolicy::Skip,
        admin_username: None,
        admin_password: None,
    }
}

#[test]
fn hashed_password_verifies() {
    let hash = hash_password("password123").unwrap();
    assert_ne!(hash, "password123");
    assert!(verify_password("password123", &hash).unwrap());
}

#[test]
fn wrong_password_is_a_clean_false() {
    let hash = hash_password("password123").unwrap();
    assert!(!verify_password("letmein", &hash).unwrap());
}

#[test]
fn same_password_hashes_differently_per_salt() {
    let a = hash_password("password123").unwrap();
    let b = hash_password("password123").unwrap();
    assert_ne!(a, b);
}

#[test]
fn corrupt_stored_hash_is_an_error() {
    assert!(verify_password("password123", "not-a-phc-string").is_err());
}

#[test]
fn token_round_trip_carries_id_and_role() {
    let config = test_config();

    let token = issue_token(42, Role::Teacher, &config).unwrap();
    let claims = decode_token(&token, &config.jwt_secret).unwrap();

    assert_eq!(claims.user_id, 42);
    assert_eq!(claims.role, Role::Teacher);
    assert!(claims.role.is_teacher());
}

#[test]
fn token_rejected_under_wrong_secret() {
    let config = test_config();

    let token = issue_token(42, Role::Student, &config).unwrap();
    assert!(decode_token(&token, "some_other_secret").is_err());
}

#[test]
fn garbage_token_rejected() {
    assert!(decode_token("not.a.token", "test_secret_for_token_tests").is_err());
}

#[test]
fn role_mapping_defaults_to_student() {
    assert_eq!(Role::from_db("teacher"), Role::Teacher);
    assert_eq!(Role::from_db("student"), Role::Student);
    assert_eq!(Role::from_db("janitor"), Role::Student);
    assert!(!Role::from_db("student").is_teacher());
}
