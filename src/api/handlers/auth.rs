use std::sync::Arc;

use axum::Json;
use axum::extract::State;

use crate::api::error::ApiError;
use crate::api::types::{CreateAccountRequest, Envelope, LoginRequest, TokenResponse, UserResponse};
use crate::application::NewAccount;

use super::{AppState, require_non_empty};

/// POST /login - 資格情報を検証してアクセストークンを発行する
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<Envelope<TokenResponse>>, ApiError> {
    let (access_token, user) = state.auth.login(&req.username, &req.password).await?;

    let response = TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
        user_id: user.id.value(),
        username: user.username,
    };

    Ok(Json(Envelope::ok(response)))
}

/// POST /create - アカウントを作成する
///
/// パスワードポリシー（8文字以上・数字・英字）は認証サービス側で強制される。
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateAccountRequest>,
) -> Result<Json<Envelope<UserResponse>>, ApiError> {
    require_non_empty("username", &req.username)?;

    let user = state
        .auth
        .create_user(NewAccount {
            username: req.username,
            fullname: req.fullname,
            email: req.email,
            password: req.password,
        })
        .await?;

    Ok(Json(Envelope::ok(UserResponse::from(user))))
}
