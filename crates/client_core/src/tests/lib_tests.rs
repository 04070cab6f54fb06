use super::*;

use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use chrono::NaiveDate;
use serde_json::Value;
use shared::{domain::ProfileInput, validation::validate};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Debug, Clone)]
struct CapturedRequest {
    secret: Option<String>,
    content_type: Option<String>,
    body: Value,
}

#[derive(Clone)]
struct ServerState {
    status: StatusCode,
    response: &'static str,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
}

async fn handle_add_profile(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, &'static str) {
    let header_text = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };
    state.captured.lock().await.push(CapturedRequest {
        secret: header_text(REGISTER_SECRET_HEADER),
        content_type: header_text(header::CONTENT_TYPE.as_str()),
        body,
    });
    (state.status, state.response)
}

async fn spawn_profile_server(
    status: StatusCode,
    response: &'static str,
) -> Result<(String, Arc<Mutex<Vec<CapturedRequest>>>)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let captured = Arc::new(Mutex::new(Vec::new()));
    let state = ServerState {
        status,
        response,
        captured: captured.clone(),
    };
    let app = Router::new()
        .route(ADD_PROFILE_PATH, post(handle_add_profile))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), captured))
}

fn reference_request() -> AddProfileRequest {
    let input = ProfileInput {
        name: "Jo Smith".into(),
        phone: "1234567890".into(),
        date_of_birth: NaiveDate::from_ymd_opt(2000, 1, 1),
        email: "jo@example.com".into(),
        gender: "male".into(),
        card_number: "CARD123".into(),
    };
    let profile = validate(&input).expect("reference input is valid");
    AddProfileRequest::from(&profile)
}

#[tokio::test]
async fn posts_profile_with_secret_header_and_utc_dob() {
    let (base_url, captured) = spawn_profile_server(
        StatusCode::OK,
        r#"{"isSuccess":true,"timeGenerated":"2024-05-01T10:00:00Z","result":{"id":42}}"#,
    )
    .await
    .expect("spawn server");
    let service = HttpProfileService::new(&base_url, "s3cret").expect("service");

    let result = service
        .create_profile(&reference_request())
        .await
        .expect("create profile");
    assert!(result.is_success);
    assert_eq!(result.result, Some(serde_json::json!({ "id": 42 })));

    let captured = captured.lock().await;
    assert_eq!(captured.len(), 1);
    let request = &captured[0];
    assert_eq!(request.secret.as_deref(), Some("s3cret"));
    assert!(request
        .content_type
        .as_deref()
        .is_some_and(|value| value.starts_with("application/json")));
    assert_eq!(
        request.body,
        serde_json::json!({
            "name": "Jo Smith",
            "phone": "1234567890",
            "email": "jo@example.com",
            "dob": "2000-01-01T00:00:00.000Z",
            "gender": "male",
            "cardNumber": "CARD123",
        })
    );
}

#[tokio::test]
async fn unset_secret_is_sent_as_empty_header() {
    let (base_url, captured) = spawn_profile_server(
        StatusCode::OK,
        r#"{"isSuccess":true,"timeGenerated":"2024-05-01T10:00:00Z"}"#,
    )
    .await
    .expect("spawn server");
    let service = HttpProfileService::new(&base_url, "").expect("service");

    service
        .create_profile(&reference_request())
        .await
        .expect("create profile");

    let captured = captured.lock().await;
    assert_eq!(captured[0].secret.as_deref(), Some(""));
}

#[tokio::test]
async fn error_status_with_result_body_is_a_normal_result() {
    let (base_url, _) = spawn_profile_server(
        StatusCode::BAD_REQUEST,
        r#"{"isSuccess":false,"timeGenerated":"2024-05-01T10:00:00Z","errorMessage":"Card already registered"}"#,
    )
    .await
    .expect("spawn server");
    let service = HttpProfileService::new(&base_url, "s3cret").expect("service");

    let result = service
        .create_profile(&reference_request())
        .await
        .expect("parsed result");
    assert!(!result.is_success);
    assert_eq!(result.failure_message(), "Card already registered");
}

#[tokio::test]
async fn error_status_with_foreign_body_is_a_decode_error() {
    let (base_url, _) = spawn_profile_server(
        StatusCode::INTERNAL_SERVER_ERROR,
        r#"{"title":"An error occurred","status":500}"#,
    )
    .await
    .expect("spawn server");
    let service = HttpProfileService::new(&base_url, "s3cret").expect("service");

    let err = service
        .create_profile(&reference_request())
        .await
        .expect_err("foreign body");
    assert!(matches!(err, ProfileServiceError::Decode { status: 500, .. }));
}

#[tokio::test]
async fn non_json_success_body_is_a_decode_error() {
    let (base_url, _) = spawn_profile_server(StatusCode::OK, "<html>ok</html>")
        .await
        .expect("spawn server");
    let service = HttpProfileService::new(&base_url, "s3cret").expect("service");

    let err = service
        .create_profile(&reference_request())
        .await
        .expect_err("html body");
    assert!(matches!(err, ProfileServiceError::Decode { status: 200, .. }));
}

#[tokio::test]
async fn unreachable_service_is_a_transport_error() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    let service = HttpProfileService::new(&format!("http://{addr}"), "").expect("service");

    let err = service
        .create_profile(&reference_request())
        .await
        .expect_err("nothing listening");
    assert!(matches!(err, ProfileServiceError::Transport(_)));
}

#[test]
fn endpoint_appends_add_path_to_base_url() {
    let service = HttpProfileService::new("https://api.example.com/v2/", "").expect("service");
    assert_eq!(
        service.endpoint().as_str(),
        "https://api.example.com/v2/PreApplicationUser/Add"
    );

    let bare = HttpProfileService::new("https://api.example.com", "").expect("service");
    assert_eq!(
        bare.endpoint().as_str(),
        "https://api.example.com/PreApplicationUser/Add"
    );
}

#[test]
fn rejects_base_url_without_scheme() {
    let err = HttpProfileService::new("", "")
        .err()
        .expect("empty base url");
    assert!(matches!(err, ProfileServiceError::InvalidBaseUrl { .. }));
}

#[test]
fn builds_from_settings() {
    let settings = ClientSettings {
        api_base_url: Some("https://api.example.com".into()),
        api_secret_key: "s3cret".into(),
    };
    let service = HttpProfileService::from_settings(&settings).expect("service");
    assert_eq!(
        service.endpoint().as_str(),
        "https://api.example.com/PreApplicationUser/Add"
    );
    assert!(HttpProfileService::from_settings(&ClientSettings::default()).is_err());
}
