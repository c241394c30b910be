//! API integration tests

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use lending_server::{
    api,
    repository::{FileRepository, PersistenceAdapter},
    services::{clock::FixedClock, Services},
    AppConfig, AppState,
};

const CATALOG: &str = "\
ID,Título,Quantidade
1,Dom Casmurro,1
2,Iracema,3
3,Vidas Secas,2
";

const USERS: &str = "\
A,Ana Souza,ana@uni.br,123,2023001,Computing
P,Rui Lima,rui@uni.br,abc,History
B,Bia Reis,bia@uni.br,xyz,555-0101,0
";

struct TestApp {
    router: Router,
    repository: FileRepository,
    clock: Arc<FixedClock>,
    _dir: TempDir,
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
}

async fn spawn_app_with_loans(loans: &str) -> TestApp {
    let dir = TempDir::new().expect("Failed to create temp dir");
    std::fs::write(dir.path().join("catalog.csv"), CATALOG).unwrap();
    std::fs::write(dir.path().join("users.txt"), USERS).unwrap();
    if !loans.is_empty() {
        std::fs::write(dir.path().join("loans.json"), loans).unwrap();
    }
    spawn_app_in(dir).await
}

async fn spawn_app_in(dir: TempDir) -> TestApp {
    let repository = FileRepository::new(
        dir.path().join("catalog.csv"),
        dir.path().join("loans.json"),
        dir.path().join("users.txt"),
    );
    let clock = Arc::new(FixedClock::new(today()));
    let services = Services::load(Arc::new(repository.clone()), clock.clone())
        .await
        .expect("Failed to load services");

    let state = AppState {
        config: Arc::new(AppConfig::default()),
        services: Arc::new(services),
    };

    TestApp {
        router: api::create_router(state),
        repository,
        clock,
        _dir: dir,
    }
}

async fn spawn_app() -> TestApp {
    spawn_app_with_loans("").await
}

impl TestApp {
    async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder()
            .method(method)
            .uri(format!("/api/v1{}", uri));
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("Failed to parse response")
        };
        (status, body)
    }

    async fn borrow(&self, email: &str, work_id: i32) -> (StatusCode, Value) {
        self.send(
            "POST",
            "/loans",
            Some(json!({ "email": email, "work_id": work_id })),
        )
        .await
    }
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;

    let (status, body) = app.send("GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = app.send("GET", "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["works"], 3);
    assert_eq!(body["users"], 3);
    assert_eq!(body["sweep_interval_secs"], 3600);
}

#[tokio::test]
async fn test_list_and_search_catalog() {
    let app = spawn_app().await;

    let (status, body) = app.send("GET", "/works", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);
    assert_eq!(body[0]["author"], "Unknown author");

    let (status, body) = app.send("GET", "/works/search?title=vidas%20secas", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 3);

    let (status, _) = app.send("GET", "/works/search?title=Unknown", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.send("GET", "/works/42", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_loan_and_return_round_trip_persists() {
    let app = spawn_app().await;

    let (status, body) = app.borrow("rui@uni.br", 2).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["loan"]["due_date"], "2024-06-24");
    assert_eq!(body["loan"]["returned"], false);

    let catalog = app.repository.load_catalog().await.unwrap();
    assert_eq!(catalog[1].available_copies, 2);
    assert_eq!(app.repository.load_loans().await.unwrap().len(), 1);

    let (status, body) = app
        .send(
            "POST",
            "/loans/return",
            Some(json!({ "email": "rui@uni.br", "work_id": 2, "processed_by": "bia@uni.br" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "returned");

    let catalog = app.repository.load_catalog().await.unwrap();
    assert_eq!(catalog[1].available_copies, 3);
    let loans = app.repository.load_loans().await.unwrap();
    assert_eq!(loans.len(), 1);
    assert!(loans[0].returned);

    let users = app.repository.load_users().await.unwrap();
    let bia = users.iter().find(|u| u.email == "bia@uni.br").unwrap();
    assert_eq!(
        bia.profile,
        lending_server::models::RoleProfile::Librarian {
            phone: "555-0101".to_string(),
            total_returns_processed: 1
        }
    );
}

#[tokio::test]
async fn test_student_limit_is_enforced() {
    let app = spawn_app().await;

    assert_eq!(app.borrow("ana@uni.br", 1).await.0, StatusCode::CREATED);
    assert_eq!(app.borrow("ana@uni.br", 2).await.0, StatusCode::CREATED);

    let (status, body) = app.borrow("ana@uni.br", 3).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "limit reached");

    let (_, work) = app.send("GET", "/works/3", None).await;
    assert_eq!(work["available_copies"], 2);
}

#[tokio::test]
async fn test_last_copy_and_librarian_denials() {
    let app = spawn_app().await;

    assert_eq!(app.borrow("ana@uni.br", 1).await.0, StatusCode::CREATED);
    let (status, body) = app.borrow("rui@uni.br", 1).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "no copies available");

    let (status, body) = app.borrow("bia@uni.br", 2).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "librarians do not borrow");
    assert_eq!(body["error"], "NotBorrowable");
}

#[tokio::test]
async fn test_return_of_unborrowed_work_is_not_found() {
    let app = spawn_app().await;

    let (status, _) = app
        .send(
            "POST",
            "/loans/return",
            Some(json!({ "email": "ana@uni.br", "work_id": 3 })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, work) = app.send("GET", "/works/3", None).await;
    assert_eq!(work["available_copies"], 2);
    assert!(app.repository.load_loans().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_overdue_sweep_blocks_until_manual_unblock() {
    let app = spawn_app_with_loans(
        r#"[{"email":"rui@uni.br","workId":2,"checkoutDate":"2024-05-07","dueDate":"2024-05-21","returned":false}]"#,
    )
    .await;

    let (status, body) = app.send("GET", "/loans/overdue", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["email"], "rui@uni.br");
    assert_eq!(body[0]["days_overdue"], 20);

    let (status, body) = app.send("POST", "/loans/sweep", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["blocked"], json!(["rui@uni.br"]));

    let (_, body) = app.send("POST", "/loans/sweep", None).await;
    assert_eq!(body["blocked"], json!([]));

    let (status, body) = app.borrow("rui@uni.br", 3).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "user blocked due to overdue items");

    // Returning the late item keeps the block in place
    let (status, _) = app
        .send(
            "POST",
            "/loans/return",
            Some(json!({ "email": "rui@uni.br", "work_id": 2 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.borrow("rui@uni.br", 3).await.0, StatusCode::UNPROCESSABLE_ENTITY);

    let users = app.repository.load_users().await.unwrap();
    assert!(users.iter().find(|u| u.email == "rui@uni.br").unwrap().blocked);

    let (status, body) = app
        .send("PUT", "/users/rui@uni.br/blocked", Some(json!({ "blocked": false })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["blocked"], false);
    assert_eq!(app.borrow("rui@uni.br", 3).await.0, StatusCode::CREATED);
}

#[tokio::test]
async fn test_loans_become_overdue_as_time_passes() {
    let app = spawn_app().await;
    assert_eq!(app.borrow("ana@uni.br", 2).await.0, StatusCode::CREATED);

    let (_, body) = app.send("GET", "/loans/active", None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    app.clock.advance_days(15);
    let (_, body) = app.send("GET", "/loans/overdue", None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["days_overdue"], 1);
}

#[tokio::test]
async fn test_register_and_login() {
    let app = spawn_app().await;

    let (status, body) = app
        .send(
            "POST",
            "/users",
            Some(json!({
                "name": "Caio Dias",
                "email": "caio@uni.br",
                "password": "hunter2",
                "profile": { "role": "faculty", "department": "Physics" }
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["role"], "faculty");
    assert_eq!(body["borrow_limit"], 10);
    assert!(body.get("password").is_none());

    let (status, _) = app
        .send(
            "POST",
            "/users",
            Some(json!({
                "name": "Caio Dias",
                "email": "caio@uni.br",
                "password": "other",
                "profile": { "role": "faculty", "department": "Physics" }
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .send(
            "POST",
            "/auth/login",
            Some(json!({ "email": "caio@uni.br", "password": "hunter2" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "caio@uni.br");

    // Legacy plaintext account
    let (status, _) = app
        .send(
            "POST",
            "/auth/login",
            Some(json!({ "email": "ana@uni.br", "password": "123" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send(
            "POST",
            "/auth/login",
            Some(json!({ "email": "caio@uni.br", "password": "wrong" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let users = app.repository.load_users().await.unwrap();
    assert_eq!(users.len(), 4);
}

#[tokio::test]
async fn test_user_lookup_and_history() {
    let app = spawn_app().await;
    assert_eq!(app.borrow("ana@uni.br", 3).await.0, StatusCode::CREATED);

    let (status, body) = app.send("GET", "/users/ana@uni.br", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["profile"]["matricula"], "2023001");

    let (status, body) = app.send("GET", "/users/ana@uni.br/loans", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["work_id"], 3);

    let (status, _) = app.send("GET", "/users/nobody@uni.br/loans", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_loans_all_reach_disk() {
    let dir = TempDir::new().unwrap();
    let mut catalog = String::from("id,title,author,availableCopies\n");
    let mut users = String::new();
    for i in 1..=12 {
        catalog.push_str(&format!("{i},\"Work, part {i}\",Author {i},1\n"));
        users.push_str(&format!("P,Prof {i},prof{i}@uni.br,pw,Physics\n"));
    }
    std::fs::write(dir.path().join("catalog.csv"), catalog).unwrap();
    std::fs::write(dir.path().join("users.txt"), users).unwrap();
    let app = Arc::new(spawn_app_in(dir).await);

    let handles: Vec<_> = (1..=12)
        .map(|i| {
            let app = app.clone();
            tokio::spawn(async move { app.borrow(&format!("prof{i}@uni.br"), i).await.0 })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.await.unwrap(), StatusCode::CREATED);
    }

    let (_, active) = app.send("GET", "/loans/active", None).await;
    let loans_on_disk = app.repository.load_loans().await.unwrap();
    assert_eq!(loans_on_disk.len(), 12);
    assert_eq!(serde_json::to_value(&loans_on_disk).unwrap(), active);

    let (_, works) = app.send("GET", "/works", None).await;
    let catalog_on_disk = app.repository.load_catalog().await.unwrap();
    assert!(catalog_on_disk.iter().all(|w| w.available_copies == 0));
    assert_eq!(serde_json::to_value(&catalog_on_disk).unwrap(), works);

    // Only the three snapshots, no stray temp files
    assert_eq!(std::fs::read_dir(app._dir.path()).unwrap().count(), 3);
}

#[tokio::test]
async fn test_corrupt_snapshot_fails_startup() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("catalog.csv"), "id,title,copies\n1,Broken\n").unwrap();
    let repository = FileRepository::new(
        dir.path().join("catalog.csv"),
        dir.path().join("loans.json"),
        dir.path().join("users.txt"),
    );

    let result = Services::load(Arc::new(repository), Arc::new(FixedClock::new(today()))).await;
    assert!(matches!(
        result,
        Err(lending_server::AppError::CorruptState { record: 2, .. })
    ));
}
