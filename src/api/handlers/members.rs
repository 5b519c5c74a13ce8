use std::sync::Arc;

use axum::extract::{Multipart, Query, State};
use axum::response::Response;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::extract::AuthenticatedUser;
use crate::api::types::{Envelope, MemberResponse, UploadParams};

use super::{AppState, read_csv_upload, upload_response};

/// GET /all-members - 全会員の一覧
pub async fn list_all_members(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
) -> Result<Json<Envelope<Vec<MemberResponse>>>, ApiError> {
    let members = state.members.list_all().await?;

    let response: Vec<MemberResponse> = members.into_iter().map(MemberResponse::from).collect();
    Ok(Json(Envelope::ok(response)))
}

/// POST /upload-members?bulk_update=bool - 会員CSVの一括取り込み
///
/// 完全成功なら200、一部失敗なら206で失敗行の一覧を返す。
pub async fn upload_members(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
    Query(params): Query<UploadParams>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let (filename, data) = read_csv_upload(multipart).await?;

    let failures = state
        .members
        .add_members(&filename, &data, params.bulk_update)
        .await?;

    upload_response(failures, "added all members successfully")
}
