use std::{str::FromStr, time::Duration};

use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    SqlitePool,
};

use crate::{config::Config, errors::AppError, structs::Account, utils, AppState};

pub async fn connect(config: &Config) -> Result<SqlitePool, sqlx::Error> {
    let opts = SqliteConnectOptions::from_str(&config.database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .read_only(false)
        .busy_timeout(Duration::from_secs(5));

    SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(opts)
        .await
}

/// Single-connection in-memory pool. Every SQLite connection to `:memory:` is
/// its own database, so the pool must never open a second one or recycle the first.
pub async fn memory_pool() -> Result<SqlitePool, sqlx::Error> {
    let opts = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(opts)
        .await
}

pub async fn ping(state: &AppState) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(&state.db_pool).await?;
    Ok(())
}

pub async fn get_account_by_login(
    state: &AppState,
    login: &str,
) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>("SELECT id, nome, senha FROM usuarios WHERE usuario = ?")
        .bind(login)
        .fetch_optional(&state.db_pool)
        .await
}

async fn hash_off_executor(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || utils::hash_password(&password))
        .await
        .map_err(|e| AppError::PasswordError(e.to_string()))?
}

async fn verify_off_executor(password: String, stored: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || utils::verify_password(&password, &stored))
        .await
        .map_err(|e| AppError::PasswordError(e.to_string()))?
}

/// Creates an account and returns its id.
pub async fn register(
    state: &AppState,
    name: &str,
    login: &str,
    password: &str,
) -> Result<i64, AppError> {
    let login = login.trim();
    if login.is_empty() || password.is_empty() {
        return Err(AppError::Validation(
            "Login and password are required".to_owned(),
        ));
    }

    if get_account_by_login(state, login).await?.is_some() {
        log::warn!("Registration refused for existing login");
        return Err(AppError::DuplicateLogin);
    }

    let pwd_hash = hash_off_executor(password.to_owned()).await?;

    let inserted = sqlx::query_scalar::<_, i64>(
        "INSERT INTO usuarios (nome, usuario, senha) VALUES (?, ?, ?) RETURNING id",
    )
    .bind(name.trim())
    .bind(login)
    .bind(&pwd_hash)
    .fetch_one(&state.db_pool)
    .await;

    match inserted {
        Ok(id) => {
            log::info!("Account {} registered", id);
            Ok(id)
        }
        // lost a race with a concurrent registration of the same login
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            log::warn!("Registration refused for existing login");
            Err(AppError::DuplicateLogin)
        }
        Err(e) => Err(AppError::SqlxError(e)),
    }
}

/// Verifies credentials and returns the account. No session is created.
pub async fn login(state: &AppState, login: &str, password: &str) -> Result<Account, AppError> {
    let Some(account) = get_account_by_login(state, login.trim()).await? else {
        log::warn!("Login attempt for unknown login");
        return Err(AppError::UnknownLogin);
    };

    if !verify_off_executor(password.to_owned(), account.pwd_hash.clone()).await? {
        log::warn!("Wrong password for account {}", account.id);
        return Err(AppError::InvalidCredential);
    }

    log::info!("Account {} logged in", account.id);
    Ok(account)
}
