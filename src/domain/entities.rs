use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::value_objects::{BookingId, BookingReference, ItemId, MemberId, UserId};

/// 会員エンティティ
///
/// (name, surname) の組が自然キーとして一意。
/// booking_countは予約トランザクションだけが増減させる。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    pub surname: String,
    pub booking_count: i32,
    pub date_joined: DateTime<Utc>,
}

impl Member {
    pub fn new(name: String, surname: String, booking_count: i32, date_joined: DateTime<Utc>) -> Self {
        Self {
            id: MemberId::new(),
            name,
            surname,
            booking_count,
            date_joined,
        }
    }
}

/// 在庫アイテムエンティティ
///
/// titleが自然キーとして一意。remaining_countは0未満にならない。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: ItemId,
    pub title: String,
    pub description: String,
    pub remaining_count: i32,
    pub expiration_date: DateTime<Utc>,
}

impl InventoryItem {
    pub fn new(
        title: String,
        description: String,
        remaining_count: i32,
        expiration_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ItemId::new(),
            title,
            description,
            remaining_count,
            expiration_date,
        }
    }
}

/// 予約エンティティ
///
/// 会員と在庫アイテムをひとつずつ参照する。作成時に一意な予約参照を採番し、
/// キャンセル時は物理削除される（ステータス遷移は持たない）。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub reference: BookingReference,
    pub member_id: MemberId,
    pub inventory_id: ItemId,
    pub booked_at: DateTime<Utc>,
}

impl Booking {
    /// 新しい予約を作る。予約参照はここで採番される。
    pub fn new(member_id: MemberId, inventory_id: ItemId, booked_at: DateTime<Utc>) -> Self {
        Self {
            id: BookingId::new(),
            reference: BookingReference::new(),
            member_id,
            inventory_id,
            booked_at,
        }
    }
}

/// 認証ユーザー
///
/// password_hashはソルト付きハッシュのみ。平文は保持しない。
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub fullname: Option<String>,
    pub email: Option<String>,
    pub password_hash: String,
}

impl User {
    pub fn new(
        username: String,
        fullname: Option<String>,
        email: Option<String>,
        password_hash: String,
    ) -> Self {
        Self {
            id: UserId::new(),
            username,
            fullname,
            email,
            password_hash,
        }
    }
}
