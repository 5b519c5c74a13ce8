use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use crate::application::{AuthError, BookingError};
use crate::ingest::IngestError;

use super::types::Envelope;

/// API層のエラー型
///
/// アプリケーション層のエラーをラップし、HTTPステータスへのマッピングを
/// 一箇所に集約する。
#[derive(Debug)]
pub enum ApiError {
    Booking(BookingError),
    Auth(AuthError),
    Ingest(IngestError),
    /// リクエストボディのフィールド不正（空文字列など）
    Validation(String),
    Internal(String),
}

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        ApiError::Booking(err)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Auth(err)
    }
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        ApiError::Ingest(err)
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            // 404 Not Found - 対象リソースが存在しない
            ApiError::Booking(
                err @ (BookingError::MemberNotFound
                | BookingError::ItemNotFound
                | BookingError::BookingNotFound),
            ) => (StatusCode::NOT_FOUND, err.to_string()),

            // 406 Not Acceptable - 上限超過・残数切れ
            ApiError::Booking(
                err @ (BookingError::MemberLimitExceeded { .. } | BookingError::ItemDepleted),
            ) => (StatusCode::NOT_ACCEPTABLE, err.to_string()),

            // 412 Precondition Failed - 期限切れ
            ApiError::Booking(err @ BookingError::ItemExpired) => {
                (StatusCode::PRECONDITION_FAILED, err.to_string())
            }

            ApiError::Auth(err @ AuthError::UserNotFound) => {
                (StatusCode::NOT_FOUND, err.to_string())
            }

            // 401 Unauthorized - 資格情報またはトークンの不備
            ApiError::Auth(err @ (AuthError::InvalidCredentials | AuthError::InvalidToken)) => {
                (StatusCode::UNAUTHORIZED, err.to_string())
            }

            // 422 Unprocessable Entity - リクエスト内容のバリデーション失敗
            ApiError::Auth(err @ AuthError::WeakPassword(_)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
            }
            ApiError::Validation(message) => (StatusCode::UNPROCESSABLE_ENTITY, message),

            // 400 Bad Request - ファイル全体の拒否（行処理前）
            ApiError::Ingest(err @ IngestError::InvalidFile(_)) => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }

            // 500 Internal Server Error
            // 内部ツール前提のため、下位エラーの文言をそのまま返す
            ApiError::Booking(err @ BookingError::Database(_)) => {
                tracing::error!("booking store error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            ApiError::Auth(err) => {
                tracing::error!("auth error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            ApiError::Internal(message) => {
                tracing::error!("internal error: {}", message);
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        };

        let body = Json(Envelope::<Value>::with(status.as_u16(), message, None));
        (status, body).into_response()
    }
}
