// HttpStudentService against an in-process fake of the students API.

use std::collections::HashMap;
use std::time::Duration;

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use roster::api::http::TOTAL_COUNT_HEADER;
use roster::api::{ApiError, HttpStudentService, StudentService};
use roster::model::{Gender, Student, StudentDraft};
use serde_json::json;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

const TOTAL: u64 = 23;

fn student(id: u64) -> serde_json::Value {
    json!({
        "id": id,
        "first_name": format!("First{id}"),
        "last_name": format!("Last{id}"),
        "email": format!("student{id}@example.com"),
        "gender": "Male",
        "country": "Vietnam",
        "avatar": "",
        "btc_address": "bc1q",
    })
}

async fn list(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    let page: u64 = params.get("_page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let limit: u64 = params.get("_limit").and_then(|l| l.parse().ok()).unwrap_or(10);
    let first = (page - 1) * limit + 1;
    let items: Vec<_> = (first..first + limit).take_while(|id| *id <= TOTAL).map(student).collect();
    ([(TOTAL_COUNT_HEADER, TOTAL.to_string())], Json(items))
}

async fn show(Path(id): Path<u64>) -> impl IntoResponse {
    if id > TOTAL {
        return (StatusCode::NOT_FOUND, Json(json!({}))).into_response();
    }
    Json(student(id)).into_response()
}

async fn create(Json(body): Json<serde_json::Value>) -> impl IntoResponse {
    if body["email"] == "taken@example.com" {
        let error = json!({ "error": { "email": "Email already exists" } });
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(error)).into_response();
    }
    let mut created = body;
    created["id"] = json!(TOTAL + 1);
    (StatusCode::CREATED, Json(created)).into_response()
}

async fn replace(Path(id): Path<u64>, Json(mut body): Json<serde_json::Value>) -> impl IntoResponse {
    body["id"] = json!(id);
    Json(body)
}

async fn remove(Path(id): Path<u64>) -> impl IntoResponse {
    if id > TOTAL { StatusCode::NOT_FOUND } else { StatusCode::OK }
}

async fn slow_list() -> impl IntoResponse {
    tokio::time::sleep(Duration::from_secs(10)).await;
    Json(Vec::<serde_json::Value>::new())
}

async fn garbled() -> impl IntoResponse {
    "not json"
}

async fn serve() -> String {
    let app = Router::new()
        .route("/students", get(list).post(create))
        .route("/students/{id}", get(show).put(replace).delete(remove))
        .route("/slow/students", get(slow_list))
        .route("/garbled/students/{id}", get(garbled));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn test_list_sends_page_and_reads_total_header() {
    let service = HttpStudentService::new(serve().await).unwrap();

    let page = service.list(3, 10, CancellationToken::new()).await.unwrap();

    assert_eq!(page.items.iter().map(|s| s.id).collect::<Vec<_>>(), vec![21, 22, 23]);
    assert_eq!(page.total_count, Some(TOTAL));
    assert_eq!(page.items[0].gender, Gender::Male);
}

#[tokio::test]
async fn test_get_and_missing_record() {
    let service = HttpStudentService::new(serve().await).unwrap();

    let student = service.get(5).await.unwrap();
    assert_eq!(student.email, "student5@example.com");

    assert_eq!(service.get(99).await, Err(ApiError::Status(404)));
}

#[tokio::test]
async fn test_create_returns_stored_record() {
    let service = HttpStudentService::new(serve().await).unwrap();
    let draft = StudentDraft {
        first_name: "A".to_string(),
        email: "a@example.com".to_string(),
        ..StudentDraft::default()
    };

    let created = service.create(draft).await.unwrap();
    assert_eq!(created.id, TOTAL + 1);
    assert_eq!(created.first_name, "A");
    assert_eq!(created.gender, Gender::Other);
}

#[tokio::test]
async fn test_create_422_becomes_field_errors() {
    let service = HttpStudentService::new(serve().await).unwrap();
    let draft = StudentDraft {
        email: "taken@example.com".to_string(),
        ..StudentDraft::default()
    };

    let err = service.create(draft).await.unwrap_err();
    let errors = err.field_errors().expect("validation error");
    assert_eq!(errors.email.as_deref(), Some("Email already exists"));
    assert!(errors.first_name.is_none());
}

#[tokio::test]
async fn test_update_puts_full_record() {
    let service = HttpStudentService::new(serve().await).unwrap();
    let student = Student {
        id: 5,
        first_name: "Changed".to_string(),
        last_name: String::new(),
        email: "student5@example.com".to_string(),
        gender: Gender::Female,
        country: String::new(),
        avatar: String::new(),
        btc_address: String::new(),
    };

    let updated = service.update(5, student.clone()).await.unwrap();
    assert_eq!(updated, student);
}

#[tokio::test]
async fn test_delete() {
    let service = HttpStudentService::new(serve().await).unwrap();

    assert_eq!(service.delete(5).await, Ok(()));
    assert_eq!(service.delete(99).await, Err(ApiError::Status(404)));
}

#[tokio::test]
async fn test_list_aborts_when_cancelled() {
    let base = serve().await;
    let service = HttpStudentService::new(format!("{base}/slow")).unwrap();
    let cancel = CancellationToken::new();
    let request = service.list(1, 10, cancel.clone());

    let timer = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        timer.cancel();
    });

    let result = timeout(Duration::from_secs(2), request).await.expect("should abort promptly");
    assert_eq!(result, Err(ApiError::Cancelled));
}

#[tokio::test]
async fn test_invalid_body_is_a_decode_error() {
    let base = serve().await;
    let service = HttpStudentService::new(format!("{base}/garbled")).unwrap();

    assert!(matches!(service.get(1).await, Err(ApiError::Decode(_))));
}

#[tokio::test]
async fn test_unreachable_server_is_a_network_error() {
    // Bind and drop to get a port nobody listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let service = HttpStudentService::new(format!("http://{addr}")).unwrap();
    assert!(matches!(service.get(1).await, Err(ApiError::Network(_))));
}
