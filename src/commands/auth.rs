//! Registration, login and the current user.

use crate::args::{LoginArgs, RegisterArgs};
use crate::auth::{hash_password, issue_token, verify_password};
use crate::commands::Out;
use crate::db::is_unique_violation;
use crate::error::{ErrorType, IntoResult};
use crate::model::{normalize_email, User};
use crate::{Config, Error, Result};
use anyhow::Context;
use serde::Serialize;
use tracing::{debug, info};

/// A signed-in user and their bearer token.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// Creates a user and signs them in. The email is trimmed and lower-cased.
///
/// # Errors
/// - `Request` if the email or password is missing or blank
/// - `Conflict` if the email is already registered
pub async fn register(config: Config, args: RegisterArgs) -> Result<Out<Session>> {
    let email = args.email.as_deref().map(normalize_email).unwrap_or_default();
    let password = args.password.unwrap_or_default();
    if email.is_empty() || password.is_empty() {
        return Err(Error::msg(ErrorType::Request, "Email and password required"));
    }

    let db = config.db();
    if db
        .user_by_email(&email)
        .await
        .pub_result(ErrorType::Database)?
        .is_some()
    {
        return Err(Error::msg(ErrorType::Conflict, "Email in use"));
    }

    let hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .context("The password hashing task failed")
        .and_then(|r| r)
        .pub_result(ErrorType::Internal)?;
    let name = args.name.unwrap_or_default().trim().to_string();
    let user = User::new(&email, name, hash);
    if let Err(e) = db.insert_user(&user).await {
        // a concurrent registration can win the race past the lookup above
        if is_unique_violation(&e) {
            return Err(Error::msg(ErrorType::Conflict, "Email in use"));
        }
        return Err(Error::new(ErrorType::Database, e));
    }
    info!("Registered user {email}");

    let token = sign(&config, &user)?;
    Ok(Out::new(
        format!("Registered {email}"),
        Session { token, user },
    ))
}

/// Checks the credentials and issues a new token.
///
/// # Errors
/// - `Unauthorized` "Invalid credentials" for an unknown email or a wrong password
pub async fn login(config: Config, args: LoginArgs) -> Result<Out<Session>> {
    let invalid = || Error::msg(ErrorType::Unauthorized, "Invalid credentials");
    let email = args.email.as_deref().map(normalize_email).unwrap_or_default();
    let password = args.password.unwrap_or_default();
    if email.is_empty() || password.is_empty() {
        return Err(invalid());
    }

    let user = config
        .db()
        .user_by_email(&email)
        .await
        .pub_result(ErrorType::Database)?
        .ok_or_else(invalid)?;

    let hash = user.password_hash.clone();
    let ok = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .context("The password verification task failed")
        .pub_result(ErrorType::Internal)?;
    if !ok {
        debug!("Wrong password for {email}");
        return Err(invalid());
    }

    let token = sign(&config, &user)?;
    Ok(Out::new(
        format!("Signed in as {email}"),
        Session { token, user },
    ))
}

/// Looks up the user a token was issued to.
pub async fn me(config: Config, user_id: &str) -> Result<Out<User>> {
    let user = config
        .db()
        .user_by_id(user_id)
        .await
        .pub_result(ErrorType::Database)?
        .ok_or_else(|| Error::msg(ErrorType::NotFound, "User not found"))?;
    Ok(Out::new(format!("Signed in as {}", user.email), user))
}

fn sign(config: &Config, user: &User) -> Result<String> {
    issue_token(
        &user.id,
        &user.email,
        config.token_secret(),
        config.token_ttl_days(),
    )
    .pub_result(ErrorType::Internal)
}
