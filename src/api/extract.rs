use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::application::AuthError;
use crate::domain::User;

use super::error::ApiError;
use super::handlers::AppState;

/// ベアラートークンで認証済みのユーザー
///
/// 保護対象のハンドラーが引数に取ることで認証を強制する。
/// Authorizationヘッダーの欠落・形式不正・検証失敗はすべて401になる。
pub struct AuthenticatedUser(pub User);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Auth(AuthError::InvalidToken))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Auth(AuthError::InvalidToken))?;

        let user = state.auth.authenticate(token).await?;
        Ok(Self(user))
    }
}
