use actix_utils::future::{ready, Ready};
use actix_web::{
    delete, dev::Payload, get, post, put, routes,
    web::{self, Data},
    FromRequest, HttpRequest, HttpResponse, Responder,
};
use serde_json::{json, Map, Value};

use crate::{
    db,
    errors::AppError,
    kinds::{RecordFields, RecordKind},
    records,
    structs::{Login, LoginResponse, Register},
    AppState,
};

pub const ACCOUNT_HEADER: &str = "account-id";

/// Account the caller claims to act for, read from the `account-id` header.
///
/// The header is not signed; anyone can assert any id. A missing or
/// non-numeric header yields `None`, which scopes every query to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerAccount(pub Option<i64>);

impl FromRequest for CallerAccount {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let id = req
            .headers()
            .get(ACCOUNT_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<i64>().ok());
        ready(Ok(CallerAccount(id)))
    }
}

#[routes]
#[post("/register")]
#[post("/cadastrar")]
pub async fn register_handler(
    web::Json(form): web::Json<Register>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    db::register(&state, &form.name, &form.login, &form.password).await?;
    Ok(HttpResponse::Created().json(json!({ "message": "Account created" })))
}

#[post("/login")]
pub async fn login_handler(
    web::Json(form): web::Json<Login>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    let account = db::login(&state, &form.login, &form.password).await?;
    Ok(HttpResponse::Ok().json(LoginResponse {
        account_id: account.id,
        name: account.name,
        message: "Login successful".to_owned(),
    }))
}

#[get("/health")]
pub async fn health_handler(state: Data<AppState>) -> Result<impl Responder, AppError> {
    db::ping(&state).await?;
    Ok(HttpResponse::Ok().json(json!({ "status": "ok" })))
}

#[get("/api/{kind}")]
pub async fn list_handler(
    path: web::Path<String>,
    caller: CallerAccount,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    let kind: RecordKind = path.parse()?;
    let rows = records::list_records(&state, kind, caller.0).await?;
    Ok(HttpResponse::Ok().json(rows))
}

#[post("/api/{kind}")]
pub async fn create_handler(
    path: web::Path<String>,
    caller: CallerAccount,
    web::Json(body): web::Json<Map<String, Value>>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    let kind: RecordKind = path.parse()?;
    let Some(account_id) = caller.0 else {
        return Err(AppError::Validation(format!(
            "Header '{ACCOUNT_HEADER}' is required"
        )));
    };
    let fields = RecordFields::from_json(kind, &body)?;
    let id = records::create_record(&state, kind, account_id, &fields).await?;
    Ok(HttpResponse::Created().json(json!({
        "message": format!("{} saved", capitalize(kind.label())),
        "id": id,
    })))
}

#[put("/api/{kind}/{id}")]
pub async fn update_handler(
    path: web::Path<(String, i64)>,
    caller: CallerAccount,
    web::Json(body): web::Json<Map<String, Value>>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    let (slug, id) = path.into_inner();
    let kind: RecordKind = slug.parse()?;
    let fields = RecordFields::from_json(kind, &body)?;
    let affected = records::update_record(&state, kind, caller.0, id, &fields).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": format!("{} updated", capitalize(kind.label())),
        "affected": affected,
    })))
}

#[delete("/api/{kind}/{id}")]
pub async fn delete_handler(
    path: web::Path<(String, i64)>,
    caller: CallerAccount,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    let (slug, id) = path.into_inner();
    let kind: RecordKind = slug.parse()?;
    let affected = records::delete_record(&state, kind, caller.0, id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": format!("{} deleted", capitalize(kind.label())),
        "affected": affected,
    })))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
