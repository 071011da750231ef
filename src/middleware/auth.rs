use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub username: String,
    pub is_admin: bool,
}

/// An authenticated organizer with administrative rights.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

async fn resolve_bearer_token(pool: &SqlitePool, token: &str) -> Option<AuthUser> {
    let token_hash = hash_token(token);
    let row = sqlx::query_as::<_, (i64, String, String, bool)>(
        "SELECT ut.user_id, ut.expires_at, u.username, u.is_admin FROM user_tokens ut JOIN users u ON ut.user_id = u.id WHERE ut.token_hash = ?",
    )
    .bind(&token_hash)
    .fetch_optional(pool)
    .await
    .ok()??;

    let now = crate::db::now_timestamp();
    if row.1 < now {
        return None;
    }

    Some(AuthUser {
        user_id: row.0,
        username: row.2,
        is_admin: row.3,
    })
}

/// Rejection type for when auth fails.
pub struct AuthRejection;

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let body = json!({
            "error": {
                "code": "unauthorized",
                "message": "invalid or missing authentication"
            }
        });
        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AuthRejection;

    fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let pool = state.db.clone();
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        async move {
            let auth_user = match auth_header {
                Some(header) if header.starts_with("Bearer ") => {
                    resolve_bearer_token(&pool, &header[7..]).await
                }
                _ => None,
            };

            auth_user.ok_or(AuthRejection)
        }
    }
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        if !user.is_admin {
            return Err(
                AppError::Forbidden("administrator access required".to_string()).into_response(),
            );
        }
        Ok(AdminUser(user))
    }
}

/// Helper to create a token hash for token creation.
pub fn create_token_hash(token: &str) -> String {
    hash_token(token)
}

/// Generate a random token string.
pub fn generate_token() -> String {
    use rand::Rng;
    let bytes: [u8; 32] = rand::thread_rng().gen();
    data_encoding::BASE64URL_NOPAD.encode(&bytes)
}
