// src/routes.rs

use axum::{
    Router, http::Method, middleware,
    routing::{delete, get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{auth, curriculum, material, quiz, recommendation, report, score},
    state::AppState,
    utils::jwt::{auth_middleware, teacher_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, curriculum, quiz, scores, teacher admin).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (pool, config, LLM client).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .merge(
            Router::new()
                .route("/user", get(auth::user_details))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    // Public curriculum reads.
    let curriculum_routes = Router::new()
        .route("/subjects", get(curriculum::list_subjects))
        .route("/subjects/{id}", get(curriculum::get_subject))
        .route("/chapters", get(curriculum::list_chapters))
        .route("/chapters/{id}", get(curriculum::get_chapter))
        .route("/subchapters", get(curriculum::list_subchapters))
        .route("/subchapters/{id}", get(curriculum::get_subchapter));

    // Public material reads and downloads.
    let material_routes = Router::new()
        .route("/materials", get(material::list_materials))
        .route("/materials/{id}", get(material::get_material))
        .route("/materials/{id}/download", get(material::download_material));

    let quiz_routes = Router::new()
        .route("/", get(quiz::list_quizzes))
        .route("/{id}", get(quiz::get_quiz))
        // Generation requires a logged-in user.
        .merge(
            Router::new()
                .route("/generate/{material_id}", post(quiz::generate_quiz))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    let score_routes = Router::new()
        .route("/", post(score::submit_score).get(score::list_scores))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let student_routes = Router::new()
        .route("/recommendations", get(recommendation::study_recommendations))
        .route("/student-report", get(report::student_report))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Curriculum and material writes, teacher only.
    // Double middleware protection: Auth first, then role check.
    let admin_routes = Router::new()
        .route("/subjects", post(curriculum::create_subject))
        .route(
            "/subjects/{id}",
            put(curriculum::update_subject).delete(curriculum::delete_subject),
        )
        .route("/chapters", post(curriculum::create_chapter))
        .route(
            "/chapters/{id}",
            put(curriculum::update_chapter).delete(curriculum::delete_chapter),
        )
        .route("/subchapters", post(curriculum::create_subchapter))
        .route(
            "/subchapters/{id}",
            put(curriculum::update_subchapter).delete(curriculum::delete_subchapter),
        )
        .route("/materials", post(material::upload_material))
        .route("/materials/{id}", delete(material::delete_material))
        .layer(middleware::from_fn(teacher_middleware))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .nest("/api/auth", auth_routes)
        .merge(Router::new().nest("/api", curriculum_routes))
        .merge(Router::new().nest("/api", material_routes))
        .nest("/api/quizzes", quiz_routes)
        .nest("/api/scores", score_routes)
        .merge(Router::new().nest("/api", student_routes))
        .route(
            "/api/leaderboard/material/{material_id}",
            get(score::material_leaderboard),
        )
        .nest("/api/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
