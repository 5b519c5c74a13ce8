use std::sync::Arc;

use axum::Json;
use axum::extract::Multipart;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use crate::application::{AuthService, BookingService, InventoryService, MemberService};
use crate::ingest::{FailedRow, IngestError};

use super::error::ApiError;
use super::types::Envelope;

pub mod auth;
pub mod bookings;
pub mod inventory;
pub mod members;

/// ハンドラー間で共有されるアプリケーション状態
///
/// サービスはプロセス起動時に一度だけ構築され、ここから全リクエストに
/// 共有される。
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub bookings: Arc<BookingService>,
    pub members: Arc<MemberService>,
    pub inventory: Arc<InventoryService>,
}

/// リクエストボディの必須文字列フィールドを検査する
fn require_non_empty(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

/// マルチパートボディから`file`フィールドを取り出す
///
/// ファイル名は拡張子検査に使うため必須とする。
async fn read_csv_upload(mut multipart: Multipart) -> Result<(String, Vec<u8>), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| IngestError::InvalidFile(format!("invalid multipart body: {err}")))?
    {
        if field.name() == Some("file") {
            let filename = field
                .file_name()
                .map(str::to_string)
                .ok_or_else(|| IngestError::InvalidFile("uploaded file has no filename".into()))?;
            let data = field
                .bytes()
                .await
                .map_err(|err| IngestError::InvalidFile(format!("failed to read upload: {err}")))?;
            return Ok((filename, data.to_vec()));
        }
    }

    Err(ApiError::Ingest(IngestError::InvalidFile(
        "multipart field 'file' is required".into(),
    )))
}

/// 取り込み結果をHTTPレスポンスにする
///
/// 失敗行がなければ200、あれば206（部分成功）で失敗行の一覧を添える。
fn upload_response(failures: Vec<FailedRow>, success_message: &str) -> Result<Response, ApiError> {
    if failures.is_empty() {
        let body = Envelope::ok(Value::String(success_message.to_string()));
        return Ok(Json(body).into_response());
    }

    let data = serde_json::to_value(&failures).map_err(|err| ApiError::Internal(err.to_string()))?;
    let body = Envelope::with(
        StatusCode::PARTIAL_CONTENT.as_u16(),
        "partial data insertion successful, failed information is attached",
        Some(data),
    );
    Ok((StatusCode::PARTIAL_CONTENT, Json(body)).into_response())
}
