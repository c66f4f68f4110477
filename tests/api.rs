use actix_web::{
    http::StatusCode,
    test::{self, TestRequest},
    web::Data,
    App,
};
use serde_json::{json, Value};

use records_str::{configure, db, routes::ACCOUNT_HEADER, schema, AppState};

async fn state() -> AppState {
    let pool = db::memory_pool().await.unwrap();
    schema::ensure_schema(&pool).await.unwrap();
    AppState::new(pool)
}

macro_rules! app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(Data::new($state.clone()))
                .configure(configure),
        )
        .await
    };
}

#[actix_web::test]
async fn register_login_create_list_delete() {
    let state = state().await;
    let app = app!(state);

    let resp = test::call_service(
        &app,
        TestRequest::post()
            .uri("/register")
            .set_json(json!({"name": "Alice", "login": "alice", "password": "pw123"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let login: Value = test::call_and_read_body_json(
        &app,
        TestRequest::post()
            .uri("/login")
            .set_json(json!({"login": "alice", "password": "pw123"}))
            .to_request(),
    )
    .await;
    let account_id = login["accountId"].as_i64().unwrap();
    assert_eq!(login["name"], "Alice");
    assert!(login["message"].is_string());
    let header = (ACCOUNT_HEADER, account_id.to_string());

    let resp = test::call_service(
        &app,
        TestRequest::post()
            .uri("/api/customers")
            .insert_header(header.clone())
            .set_json(json!({"nome": "Bob"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let rows: Vec<Value> = test::call_and_read_body_json(
        &app,
        TestRequest::get()
            .uri("/api/customers")
            .insert_header(header.clone())
            .to_request(),
    )
    .await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["nome"], "Bob");
    assert_eq!(rows[0]["status"], "Active");
    assert_eq!(rows[0]["usuario_id"], account_id);
    assert!(rows[0].get("senha").is_none());
    let id = rows[0]["id"].as_i64().unwrap();

    let deleted: Value = test::call_and_read_body_json(
        &app,
        TestRequest::delete()
            .uri(&format!("/api/customers/{id}"))
            .insert_header(header.clone())
            .to_request(),
    )
    .await;
    assert_eq!(deleted["affected"], 1);

    let rows: Vec<Value> = test::call_and_read_body_json(
        &app,
        TestRequest::get()
            .uri("/api/customers")
            .insert_header(header)
            .to_request(),
    )
    .await;
    assert!(rows.is_empty());
}

#[actix_web::test]
async fn portuguese_aliases_are_accepted() {
    let state = state().await;
    let app = app!(state);

    let resp = test::call_service(
        &app,
        TestRequest::post()
            .uri("/cadastrar")
            .set_json(json!({"nome": "Ana", "usuario": "ana", "senha": "segredo"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = test::call_service(
        &app,
        TestRequest::post()
            .uri("/login")
            .set_json(json!({"usuario": "ana", "senha": "segredo"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn bad_credentials_get_one_answer() {
    let state = state().await;
    db::register(&state, "n", "x", "right").await.unwrap();
    let app = app!(state);

    let wrong = test::call_service(
        &app,
        TestRequest::post()
            .uri("/login")
            .set_json(json!({"login": "x", "password": "wrong"}))
            .to_request(),
    )
    .await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    let wrong: Value = test::read_body_json(wrong).await;

    let unknown = test::call_service(
        &app,
        TestRequest::post()
            .uri("/login")
            .set_json(json!({"login": "ghost", "password": "right"}))
            .to_request(),
    )
    .await;
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    let unknown: Value = test::read_body_json(unknown).await;

    assert_eq!(wrong, unknown);
}

#[actix_web::test]
async fn duplicate_registration_is_client_error() {
    let state = state().await;
    let app = app!(state);
    let body = json!({"name": "n", "login": "dup", "password": "p"});

    let first = test::call_service(
        &app,
        TestRequest::post().uri("/register").set_json(&body).to_request(),
    )
    .await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = test::call_service(
        &app,
        TestRequest::post().uri("/register").set_json(&body).to_request(),
    )
    .await;
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn tenants_are_isolated_over_http() {
    let state = state().await;
    let a = db::register(&state, "A", "a", "pa").await.unwrap();
    let b = db::register(&state, "B", "b", "pb").await.unwrap();
    let app = app!(state);

    let created: Value = test::call_and_read_body_json(
        &app,
        TestRequest::post()
            .uri("/api/products")
            .insert_header((ACCOUNT_HEADER, a.to_string()))
            .set_json(json!({"nome": "Cabo", "preco_venda": "9.90"}))
            .to_request(),
    )
    .await;
    let id = created["id"].as_i64().unwrap();

    let rows: Vec<Value> = test::call_and_read_body_json(
        &app,
        TestRequest::get()
            .uri("/api/products")
            .insert_header((ACCOUNT_HEADER, b.to_string()))
            .to_request(),
    )
    .await;
    assert!(rows.is_empty());

    let updated: Value = test::call_and_read_body_json(
        &app,
        TestRequest::put()
            .uri(&format!("/api/products/{id}"))
            .insert_header((ACCOUNT_HEADER, b.to_string()))
            .set_json(json!({"nome": "Stolen"}))
            .to_request(),
    )
    .await;
    assert_eq!(updated["affected"], 0);

    let resp = test::call_service(
        &app,
        TestRequest::delete()
            .uri(&format!("/api/products/{id}"))
            .insert_header((ACCOUNT_HEADER, b.to_string()))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let deleted: Value = test::read_body_json(resp).await;
    assert_eq!(deleted["affected"], 0);

    let rows: Vec<Value> = test::call_and_read_body_json(
        &app,
        TestRequest::get()
            .uri("/api/produtos")
            .insert_header((ACCOUNT_HEADER, a.to_string()))
            .to_request(),
    )
    .await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["nome"], "Cabo");
    assert_eq!(rows[0]["preco_venda"], 9.9);
    assert_eq!(rows[0]["estoque"], 0);
}

#[actix_web::test]
async fn missing_header_scopes_to_nothing() {
    let state = state().await;
    let a = db::register(&state, "A", "a", "pa").await.unwrap();
    let app = app!(state);

    test::call_service(
        &app,
        TestRequest::post()
            .uri("/api/suppliers")
            .insert_header((ACCOUNT_HEADER, a.to_string()))
            .set_json(json!({"nome": "ACME"}))
            .to_request(),
    )
    .await;

    let rows: Vec<Value> =
        test::call_and_read_body_json(&app, TestRequest::get().uri("/api/suppliers").to_request())
            .await;
    assert!(rows.is_empty());

    let resp = test::call_service(
        &app,
        TestRequest::post()
            .uri("/api/suppliers")
            .set_json(json!({"nome": "Orphan"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn unknown_kind_and_bad_fields() {
    let state = state().await;
    let a = db::register(&state, "A", "a", "pa").await.unwrap();
    let app = app!(state);

    let resp = test::call_service(
        &app,
        TestRequest::get()
            .uri("/api/invoices")
            .insert_header((ACCOUNT_HEADER, a.to_string()))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = test::call_service(
        &app,
        TestRequest::post()
            .uri("/api/employees")
            .insert_header((ACCOUNT_HEADER, a.to_string()))
            .set_json(json!({"nome": "Eva", "salario": "a lot"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["message"].as_str().unwrap().contains("salario"));
}

#[actix_web::test]
async fn body_cannot_reassign_owner() {
    let state = state().await;
    let a = db::register(&state, "A", "a", "pa").await.unwrap();
    let b = db::register(&state, "B", "b", "pb").await.unwrap();
    let app = app!(state);

    test::call_service(
        &app,
        TestRequest::post()
            .uri("/api/service-orders")
            .insert_header((ACCOUNT_HEADER, a.to_string()))
            .set_json(json!({"cliente": "Bob", "usuario_id": b, "id": 999}))
            .to_request(),
    )
    .await;

    let rows: Vec<Value> = test::call_and_read_body_json(
        &app,
        TestRequest::get()
            .uri("/api/service-orders")
            .insert_header((ACCOUNT_HEADER, a.to_string()))
            .to_request(),
    )
    .await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["usuario_id"], a);
    assert_ne!(rows[0]["id"], 999);
}

#[actix_web::test]
async fn malformed_json_is_bad_request() {
    let state = state().await;
    let app = app!(state);

    let resp = test::call_service(
        &app,
        TestRequest::post()
            .uri("/login")
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["message"].is_string());
}

#[actix_web::test]
async fn health_reports_ok() {
    let state = state().await;
    let app = app!(state);
    let body: Value =
        test::call_and_read_body_json(&app, TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(body["status"], "ok");
}

#[actix_web::test]
async fn non_numeric_id_is_json_not_found() {
    let state = state().await;
    let a = db::register(&state, "A", "a", "pa").await.unwrap();
    let app = app!(state);

    let resp = test::call_service(
        &app,
        TestRequest::delete()
            .uri("/api/customers/abc")
            .insert_header((ACCOUNT_HEADER, a.to_string()))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["message"].is_string());

    let resp = test::call_service(
        &app,
        TestRequest::put()
            .uri("/api/customers/abc")
            .insert_header((ACCOUNT_HEADER, a.to_string()))
            .set_json(json!({"nome": "Bob"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["message"].is_string());
}
