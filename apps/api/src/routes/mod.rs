pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::session::handlers;
use crate::state::AppState;

/// Largest accepted request body (CV uploads).
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/tools", get(handlers::handle_list_tools))
        // Sessions
        .route("/api/v1/sessions", post(handlers::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(handlers::handle_get_session).delete(handlers::handle_delete_session),
        )
        // Analysis pipeline
        .route(
            "/api/v1/sessions/:id/document",
            post(handlers::handle_upload_document),
        )
        .route(
            "/api/v1/sessions/:id/analysis",
            post(handlers::handle_rerun_analysis),
        )
        // Mock interview
        .route(
            "/api/v1/sessions/:id/interview/question",
            post(handlers::handle_interview_question),
        )
        .route(
            "/api/v1/sessions/:id/interview/answer",
            post(handlers::handle_interview_answer),
        )
        // Agent
        .route("/api/v1/sessions/:id/chat", post(handlers::handle_chat))
        .route(
            "/api/v1/sessions/:id/shortcuts",
            get(handlers::handle_shortcuts),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::llm_client::mock::{first_user_text, MockBackend};
    use crate::llm_client::ModelReply;

    const BOUNDARY: &str = "pakar-test-boundary";

    fn scripted_llm() -> MockBackend {
        MockBackend::new(|request| {
            let prompt = first_user_text(request);
            let text = if !request.tools.is_empty() {
                "Focus on SQL window functions next."
            } else if prompt.contains("resume data extractor") {
                r#"{"candidate_name": "Budi Santoso", "highest_education": "BSc Statistics",
                    "primary_skills": ["SQL", "Excel"], "summary": "Junior analyst."}"#
            } else if prompt.contains("career strategist") {
                r#"```json
                {"recommendations": [
                    {"job_title": "Data Analyst", "match_score": "85%", "rationale": "SQL."},
                    {"job_title": "BI Developer", "match_score": "70%", "rationale": "Excel."},
                    {"job_title": "Data Engineer", "match_score": "50%", "rationale": "Some."}],
                 "skill_gap_analysis": "Learn Python."}
                ```"#
            } else if prompt.contains("senior interviewer") {
                r#"{"score": 64, "strengths": "a", "improvements": "b", "model_answer": "c"}"#
            } else {
                "Explain the difference between a LEFT JOIN and an INNER JOIN."
            };
            Ok(ModelReply::Text(text.to_string()))
        })
    }

    fn app() -> Router {
        build_router(AppState::new(Config::for_tests(), Arc::new(scripted_llm())))
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_request(method: Method, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    fn upload_request(uri: &str, filename: &str, content: &str) -> Request<Body> {
        let body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n{content}\r\n--{BOUNDARY}--\r\n"
        );
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn create_session(app: &Router) -> String {
        let (status, body) = send(app, empty_request(Method::POST, "/api/v1/sessions")).await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let app = app();
        let (status, body) = send(&app, empty_request(Method::GET, "/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["sessions"], 0);
    }

    #[tokio::test]
    async fn test_tool_catalog() {
        let app = app();
        let (status, body) = send(&app, empty_request(Method::GET, "/api/v1/tools")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 3);
        assert_eq!(body[1]["name"], "cover_letter");
    }

    #[tokio::test]
    async fn test_unknown_session_is_404() {
        let app = app();
        let uri = format!("/api/v1/sessions/{}", uuid::Uuid::new_v4());
        let (status, body) = send(&app, empty_request(Method::GET, &uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_full_session_flow() {
        let app = app();
        let id = create_session(&app).await;
        let base = format!("/api/v1/sessions/{id}");

        // Interview before analysis is an ordering violation.
        let (status, _) = send(
            &app,
            json_request(
                Method::POST,
                &format!("{base}/interview/question"),
                json!({"job_title": "Data Analyst"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = send(
            &app,
            upload_request(&format!("{base}/document"), "cv.txt", "Budi Santoso\nSQL, Excel"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["resume"]["candidate_name"], "Budi Santoso");
        assert_eq!(body["analysis"]["recommendations"][0]["match_score"], "85%");
        assert_eq!(body["stages"]["career_analysis"]["state"], "succeeded");
        assert_eq!(body["badges"][0]["band"], "strong");
        assert_eq!(body["badges"][2]["percent"], 50);

        let (status, body) = send(
            &app,
            json_request(
                Method::POST,
                &format!("{base}/interview/question"),
                json!({"job_title": "Data Analyst"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["question"].as_str().unwrap().contains("LEFT JOIN"));

        let (status, _) = send(
            &app,
            json_request(
                Method::POST,
                &format!("{base}/interview/answer"),
                json!({"answer": "  "}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &app,
            json_request(
                Method::POST,
                &format!("{base}/interview/answer"),
                json!({"answer": "LEFT JOIN keeps unmatched rows."}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["score"], 64);
        assert_eq!(body["band"], "moderate");

        let (status, body) = send(
            &app,
            json_request(
                Method::POST,
                &format!("{base}/chat"),
                json!({"message": "What next?"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reply"], "Focus on SQL window functions next.");
        assert_eq!(body["tool_rounds"], 0);
        assert_eq!(body["termination"], "answered");

        let (status, body) = send(&app, empty_request(Method::GET, &format!("{base}/shortcuts"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["tool"], "study_plan");
        assert!(body[1]["utterance"].as_str().unwrap().contains("Data Analyst"));

        let (status, body) = send(&app, empty_request(Method::GET, &base)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["conversation"].as_array().unwrap().len(), 2);
        assert_eq!(body["feedback"]["score"], 64);
        assert_eq!(body["document_name"], "cv.txt");

        let (status, _) = send(&app, empty_request(Method::DELETE, &base)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, empty_request(Method::GET, &base)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unsupported_upload_is_422() {
        let app = app();
        let id = create_session(&app).await;
        let (status, body) = send(
            &app,
            upload_request(&format!("/api/v1/sessions/{id}/document"), "cv.docx", "hello"),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "UNPROCESSABLE_ENTITY");
    }

    #[tokio::test]
    async fn test_chat_without_cv_is_conflict() {
        let app = app();
        let id = create_session(&app).await;
        let (status, _) = send(
            &app,
            json_request(
                Method::POST,
                &format!("/api/v1/sessions/{id}/chat"),
                json!({"message": "hi"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }
}
