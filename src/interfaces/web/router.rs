use axum::{
    Router,
    body::Body,
    http::{HeaderValue, Method, Request, header},
    middleware,
    middleware::Next,
    routing::{delete, get, post},
};
use tower_http::cors::CorsLayer;

use super::AppState;
use super::handlers::{self, chat, notes, reports, scans};

fn build_cors(configured: &[String], api_port: u16) -> CorsLayer {
    let origins: Vec<HeaderValue> = configured
        .iter()
        .cloned()
        .chain([
            format!("http://127.0.0.1:{}", api_port),
            format!("http://localhost:{}", api_port),
        ])
        .filter_map(|o| o.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(tower_http::cors::Any)
}

pub fn build_api_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/api/run-tool", post(scans::run_tool))
        .route("/api/result/{scan_id}", get(scans::get_result))
        .route("/api/results/{scan_id}", get(scans::get_file_result))
        .route("/api/report/{scan_id}", get(scans::get_report))
        .route("/api/cancel/{scan_id}", post(scans::cancel_scan))
        .route("/api/store-result", post(reports::store_result))
        .route("/api/reports", get(reports::list_reports))
        .route("/api/reports/{report_id}", delete(reports::delete_report))
        .route("/api/note", get(notes::list_notes).post(notes::save_note))
        .route("/api/ai-chat", post(chat::ai_chat))
        .route("/api/logs", get(super::sse_logs_endpoint))
        .layer(middleware::from_fn(security_headers))
        .layer(build_cors(&state.cors_origins, state.api_port))
        .with_state(state)
}

async fn security_headers(req: Request<Body>, next: Next) -> axum::response::Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chat::ChatBroker;
    use crate::core::config::{ChatConfig, DirsearchConfig};
    use crate::core::persistence::{ReportStore, test_report_store};
    use crate::core::scan::ScanEngine;
    use crate::core::scan::resolver::ToolResolver;
    use axum::http::StatusCode;
    use std::collections::HashSet;
    use std::path::PathBuf;
    use std::time::Duration;
    use tower::util::ServiceExt;

    fn state_with(reports: Option<ReportStore>, file_output_dir: PathBuf) -> AppState {
        let engine = ScanEngine::with_settings(
            ToolResolver::new(DirsearchConfig::default()),
            Duration::from_millis(20),
            Duration::from_millis(200),
        );
        let (log_tx, _) = tokio::sync::broadcast::channel(16);
        AppState {
            engine,
            reports,
            chat: ChatBroker::new(ChatConfig::default()),
            file_output_dir,
            log_tx,
            cors_origins: vec!["http://localhost:5173".to_string()],
            api_host: "127.0.0.1".to_string(),
            api_port: 17890,
        }
    }

    fn empty_state() -> AppState {
        state_with(None, std::env::temp_dir().join("reconlab-no-outputs"))
    }

    async fn json_request(
        app: Router,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let body = match body {
            Some(json) => Body::from(serde_json::to_string(&json).unwrap()),
            None => Body::empty(),
        };

        let req = Request::builder()
            .method(method)
            .uri(path)
            .header("content-type", "application/json")
            .body(body)
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let body_bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let json: serde_json::Value =
            serde_json::from_slice(&body_bytes).unwrap_or(serde_json::json!({}));
        (status, json)
    }

    /// Submits a scan for an unknown tool, which takes the simulated path.
    async fn submit_simulated(app: &Router, tool: &str) -> String {
        let (status, json) = json_request(
            app.clone(),
            Method::POST,
            "/api/run-tool",
            Some(serde_json::json!({
                "tool": tool,
                "target": "example.com",
                "command": format!("{} example.com", tool)
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "running");
        json["scan_id"].as_str().unwrap().to_string()
    }

    async fn wait_terminal(state: &AppState, scan_id: &str) {
        state
            .engine
            .wait_until_finished(scan_id, Duration::from_millis(10))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn security_headers_present_on_responses() {
        let app = build_api_router(empty_state());
        let req = Request::builder()
            .method(Method::GET)
            .uri("/")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();

        assert_eq!(
            resp.headers().get("x-content-type-options").unwrap(),
            "nosniff"
        );
        assert_eq!(resp.headers().get("x-frame-options").unwrap(), "DENY");
        assert!(
            resp.headers()
                .get("content-security-policy")
                .unwrap()
                .to_str()
                .unwrap()
                .contains("default-src 'none'")
        );
    }

    #[tokio::test]
    async fn root_reports_liveness() {
        let app = build_api_router(empty_state());
        let (status, json) = json_request(app, Method::GET, "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "ReconLab API is running");
    }

    #[tokio::test]
    async fn configured_origin_passes_cors() {
        let app = build_api_router(empty_state());
        let req = Request::builder()
            .method(Method::GET)
            .uri("/")
            .header("origin", "http://localhost:5173")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(
            resp.headers().get("access-control-allow-origin").unwrap(),
            "http://localhost:5173"
        );
    }

    #[tokio::test]
    async fn simulated_scan_can_be_polled_to_completion() {
        let state = empty_state();
        let app = build_api_router(state.clone());
        let scan_id = submit_simulated(&app, "nikto").await;

        wait_terminal(&state, &scan_id).await;
        let (status, json) = json_request(
            app.clone(),
            Method::GET,
            &format!("/api/result/{}", scan_id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["scan_id"], scan_id.as_str());
        assert_eq!(json["status"], "completed");
        assert_eq!(json["mode"], "simulated");
        let output = json["output"].as_str().unwrap();
        assert!(output.starts_with("Starting nikto scan...\n"));
        assert!(output.contains("Unknown tool: nikto. Running generic simulation."));
        assert!(output.contains("Results saved for example.com"));

        let (status, json) =
            json_request(app, Method::GET, &format!("/api/report/{}", scan_id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(
            json["report"]
                .as_str()
                .unwrap()
                .ends_with("Results saved for example.com")
        );
    }

    #[tokio::test]
    async fn run_tool_rejects_blank_target() {
        let app = build_api_router(empty_state());
        let (status, json) = json_request(
            app,
            Method::POST,
            "/api/run-tool",
            Some(serde_json::json!({ "tool": "nmap", "target": "  " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["detail"], "Both tool and target are required");
    }

    #[tokio::test]
    async fn unknown_scan_is_not_found_everywhere() {
        let app = build_api_router(empty_state());
        for (method, path) in [
            (Method::GET, "/api/result/nope"),
            (Method::GET, "/api/results/nope"),
            (Method::GET, "/api/report/nope"),
            (Method::POST, "/api/cancel/nope"),
        ] {
            let (status, json) = json_request(app.clone(), method, path, None).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{}", path);
            assert_eq!(json["detail"], "Scan not found", "{}", path);
        }
    }

    #[tokio::test]
    async fn cancel_of_finished_scan_reports_not_terminated() {
        let state = empty_state();
        let app = build_api_router(state.clone());
        let scan_id = submit_simulated(&app, "nikto").await;
        wait_terminal(&state, &scan_id).await;

        let (status, json) = json_request(
            app,
            Method::POST,
            &format!("/api/cancel/{}", scan_id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["terminated"], false);
    }

    #[tokio::test]
    async fn file_results_are_read_without_touching_the_record() {
        let outputs = tempfile::tempdir().unwrap();
        let state = state_with(None, outputs.path().to_path_buf());
        let app = build_api_router(state.clone());
        let scan_id = submit_simulated(&app, "nikto").await;
        wait_terminal(&state, &scan_id).await;

        let path = format!("/api/results/{}", scan_id);
        let (status, json) = json_request(app.clone(), Method::GET, &path, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["detail"], "File not found");

        std::fs::write(
            outputs.path().join(format!("{}.txt", scan_id)),
            b"200  /admin\n",
        )
        .unwrap();
        let (status, json) = json_request(app.clone(), Method::GET, &path, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["output"], "200  /admin\n");

        let (_, json) = json_request(
            app,
            Method::GET,
            &format!("/api/result/{}", scan_id),
            None,
        )
        .await;
        assert!(!json["output"].as_str().unwrap().contains("/admin"));
    }

    #[tokio::test]
    async fn store_result_without_database_is_unavailable() {
        let state = empty_state();
        let app = build_api_router(state.clone());
        let scan_id = submit_simulated(&app, "nikto").await;

        let (status, json) = json_request(
            app.clone(),
            Method::POST,
            "/api/store-result",
            Some(serde_json::json!({ "scan_id": scan_id, "user_id": "u1" })),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["detail"], "Database not available");

        let (status, json) = json_request(app, Method::GET, "/api/reports", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["reports"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn stored_reports_roundtrip_per_owner() {
        let state = state_with(Some(test_report_store()), std::env::temp_dir());
        let app = build_api_router(state.clone());
        let scan_id = submit_simulated(&app, "wafw00f-lite").await;
        wait_terminal(&state, &scan_id).await;

        let (status, json) = json_request(
            app.clone(),
            Method::POST,
            "/api/store-result",
            Some(serde_json::json!({ "scan_id": scan_id, "user_id": "alice" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Scan result stored successfully");
        let stored_id = json["stored_id"].as_str().unwrap().to_string();

        let (_, json) = json_request(
            app.clone(),
            Method::GET,
            "/api/reports?user_id=alice",
            None,
        )
        .await;
        let list = json["reports"].as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["scan_id"], scan_id.as_str());
        assert_eq!(list[0]["status"], "completed");

        let (_, json) =
            json_request(app.clone(), Method::GET, "/api/reports?user_id=bob", None).await;
        assert_eq!(json["reports"], serde_json::json!([]));

        let (status, json) = json_request(
            app.clone(),
            Method::DELETE,
            &format!("/api/reports/{}?user_id=bob", stored_id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["detail"], "Report not found or access denied");

        let (status, json) = json_request(
            app,
            Method::DELETE,
            &format!("/api/reports/{}?user_id=alice", stored_id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Report deleted successfully");
    }

    #[tokio::test]
    async fn notes_are_saved_and_listed() {
        let state = state_with(Some(test_report_store()), std::env::temp_dir());
        let app = build_api_router(state);

        let (status, json) = json_request(
            app.clone(),
            Method::POST,
            "/api/note",
            Some(serde_json::json!({ "title": "scope", "content": "10.0.0.0/24 only" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Note saved successfully");
        let id = json["id"].as_str().unwrap().to_string();

        let (_, json) = json_request(app, Method::GET, "/api/note", None).await;
        let notes = json["notes"].as_array().unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0]["id"], id.as_str());
        assert_eq!(notes[0]["content"], "10.0.0.0/24 only");
    }

    #[tokio::test]
    async fn note_without_database_is_acknowledged() {
        let app = build_api_router(empty_state());
        let (status, json) = json_request(
            app,
            Method::POST,
            "/api/note",
            Some(serde_json::json!({ "content": "kept nowhere" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["id"].as_str().is_some());
    }

    #[tokio::test]
    async fn ai_chat_without_key_fails_with_detail() {
        let app = build_api_router(empty_state());
        let (status, json) = json_request(
            app,
            Method::POST,
            "/api/ai-chat",
            Some(serde_json::json!({ "message": "what ports are open?" })),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json["detail"],
            "AI chat failed: No API key configured for openrouter"
        );
    }

    #[tokio::test]
    async fn method_not_allowed_returns_405() {
        let app = build_api_router(empty_state());
        let req = Request::builder()
            .method(Method::PATCH)
            .uri("/api/run-tool")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn api_route_contract_has_all_expected_paths() {
        let paths = [
            "/",
            "/api/run-tool",
            "/api/result/abc",
            "/api/results/abc",
            "/api/report/abc",
            "/api/cancel/abc",
            "/api/store-result",
            "/api/reports",
            "/api/reports/abc",
            "/api/note",
            "/api/ai-chat",
            "/api/logs",
        ];

        let unique: HashSet<&str> = paths.iter().copied().collect();
        assert_eq!(unique.len(), 12, "Duplicate routes found in route contract");

        let app = build_api_router(empty_state());
        for path in paths {
            let req = Request::builder()
                .method(Method::PUT)
                .uri(path)
                .body(Body::empty())
                .expect("request should build");
            let resp = app
                .clone()
                .oneshot(req)
                .await
                .expect("router oneshot should succeed");
            assert_ne!(
                resp.status(),
                StatusCode::NOT_FOUND,
                "Route missing from router: {}",
                path
            );
        }
    }
}
