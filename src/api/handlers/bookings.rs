use std::sync::Arc;

use axum::Json;
use axum::extract::State;

use crate::api::error::ApiError;
use crate::api::extract::AuthenticatedUser;
use crate::api::types::{BookItemRequest, BookingResponse, CancelBookingRequest, Envelope};

use super::{AppState, require_non_empty};

/// POST /book - アイテムを予約する
///
/// 強制されるビジネスルール：
/// - 会員が存在すること
/// - 会員の予約数が上限未満であること
/// - アイテムが存在し、期限内で、残数があること
pub async fn book_item(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
    Json(req): Json<BookItemRequest>,
) -> Result<Json<Envelope<BookingResponse>>, ApiError> {
    require_non_empty("member_name", &req.member_name)?;
    require_non_empty("member_surname", &req.member_surname)?;
    require_non_empty("item_name", &req.item_name)?;

    let booking = state
        .bookings
        .book_item(&req.member_name, &req.member_surname, &req.item_name)
        .await?;

    Ok(Json(Envelope::ok(BookingResponse::from(booking))))
}

/// POST /cancel - 予約をキャンセルする
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
    Json(req): Json<CancelBookingRequest>,
) -> Result<Json<Envelope<String>>, ApiError> {
    require_non_empty("member_name", &req.member_name)?;
    require_non_empty("member_surname", &req.member_surname)?;
    require_non_empty("booking_reference", &req.booking_reference)?;

    state
        .bookings
        .cancel_booking(&req.member_name, &req.member_surname, &req.booking_reference)
        .await?;

    Ok(Json(Envelope::ok("Successfully cancelled booking".to_string())))
}

/// GET /all - 全予約の一覧
pub async fn list_all_bookings(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
) -> Result<Json<Envelope<Vec<BookingResponse>>>, ApiError> {
    let bookings = state.bookings.list_all_bookings().await?;

    let response: Vec<BookingResponse> = bookings.into_iter().map(BookingResponse::from).collect();
    Ok(Json(Envelope::ok(response)))
}
