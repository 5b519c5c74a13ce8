use std::sync::Arc;

use axum::extract::{Multipart, Query, State};
use axum::response::Response;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{Envelope, InventoryResponse, UploadParams};

use super::{AppState, read_csv_upload, upload_response};

// 在庫系エンドポイントは元の配線どおり認証を要求しない。
// 方針判断としてDESIGN.mdに記録している。

/// GET /view-all - 全在庫の一覧
pub async fn list_all_inventories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Envelope<Vec<InventoryResponse>>>, ApiError> {
    let items = state.inventory.list_all().await?;

    let response: Vec<InventoryResponse> =
        items.into_iter().map(InventoryResponse::from).collect();
    Ok(Json(Envelope::ok(response)))
}

/// POST /upload-inventories?bulk_update=bool - 在庫CSVの一括取り込み
///
/// 完全成功なら200、一部失敗なら206で失敗行の一覧を返す。
pub async fn upload_inventories(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UploadParams>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let (filename, data) = read_csv_upload(multipart).await?;

    let failures = state
        .inventory
        .add_inventories(&filename, &data, params.bulk_update)
        .await?;

    upload_response(failures, "added all inventories successfully")
}
