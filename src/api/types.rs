use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Booking, InventoryItem, Member, User};

/// 全エンドポイント共通のレスポンス封筒
///
/// HTTPステータスと同じ値をstatusフィールドにも載せる。
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub status: u16,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub data: Option<T>,
}

impl<T: Serialize> Envelope<T> {
    /// 200の成功封筒
    pub fn ok(data: T) -> Self {
        Self {
            status: 200,
            message: "successful".to_string(),
            timestamp: Utc::now(),
            data: Some(data),
        }
    }

    pub fn with(status: u16, message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            status,
            message: message.into(),
            timestamp: Utc::now(),
            data,
        }
    }
}

// ============================================================================
// Request bodies
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub username: String,
    pub fullname: Option<String>,
    pub email: Option<String>,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct BookItemRequest {
    pub member_name: String,
    pub member_surname: String,
    pub item_name: String,
}

#[derive(Debug, Deserialize)]
pub struct CancelBookingRequest {
    pub member_name: String,
    pub member_surname: String,
    pub booking_reference: String,
}

/// アップロード系エンドポイントのクエリパラメータ
#[derive(Debug, Deserialize)]
pub struct UploadParams {
    /// trueなら全件一括挿入（1件でも失敗すれば全体ロールバック）
    pub bulk_update: bool,
}

// ============================================================================
// Response bodies
// ============================================================================

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub user_id: Uuid,
    pub username: String,
}

/// 作成済みユーザー。パスワードハッシュは意図的に含めない
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub fullname: Option<String>,
    pub email: Option<String>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.value(),
            username: user.username,
            fullname: user.fullname,
            email: user.email,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub booking_reference: String,
    pub member_id: Uuid,
    pub inventory_id: Uuid,
    pub booked_at: DateTime<Utc>,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        Self {
            booking_reference: booking.reference.to_string(),
            member_id: booking.member_id.value(),
            inventory_id: booking.inventory_id.value(),
            booked_at: booking.booked_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MemberResponse {
    pub id: Uuid,
    pub name: String,
    pub surname: String,
    pub booking_count: i32,
    pub date_joined: DateTime<Utc>,
}

impl From<Member> for MemberResponse {
    fn from(member: Member) -> Self {
        Self {
            id: member.id.value(),
            name: member.name,
            surname: member.surname,
            booking_count: member.booking_count,
            date_joined: member.date_joined,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InventoryResponse {
    pub title: String,
    pub description: String,
    pub remaining_count: i32,
    pub expiration_date: DateTime<Utc>,
}

impl From<InventoryItem> for InventoryResponse {
    fn from(item: InventoryItem) -> Self {
        Self {
            title: item.title,
            description: item.description,
            remaining_count: item.remaining_count,
            expiration_date: item.expiration_date,
        }
    }
}
