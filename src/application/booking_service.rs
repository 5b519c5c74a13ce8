use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{Booking, BookingReference, InventoryItem, Member};
use crate::repositories::{BookingRepository, InventoryRepository, MemberRepository};

use super::errors::BookingError;

/// 予約トランザクションエンジン
///
/// 予約とキャンセルをそれぞれ単一のトランザクションとして実行する。
/// 自然キー検索が会員行・在庫行に排他ロックを取るため、同じ会員や同じ
/// アイテムに対する並行予約は直列化される。ロック順は常に会員→在庫。
pub struct BookingService {
    pool: PgPool,
    members: Arc<MemberRepository>,
    inventory: Arc<InventoryRepository>,
    bookings: Arc<BookingRepository>,
    max_bookings: u32,
}

impl BookingService {
    pub fn new(
        pool: PgPool,
        members: Arc<MemberRepository>,
        inventory: Arc<InventoryRepository>,
        bookings: Arc<BookingRepository>,
        max_bookings: u32,
    ) -> Self {
        Self {
            pool,
            members,
            inventory,
            bookings,
            max_bookings,
        }
    }

    /// アイテムを予約する
    ///
    /// バリデーション順序：
    /// 1. 会員が存在すること
    /// 2. 会員の予約数が上限未満であること
    /// 3. アイテムが存在すること
    /// 4. アイテムの有効期限が切れていないこと
    /// 5. アイテムの残数があること
    ///
    /// 検証に通れば、予約行の作成・残数の減算・会員予約数の加算を
    /// ひとつの原子的な作業単位として実行する。途中で失敗した場合は
    /// すべてロールバックされ、部分的な状態変化は観測されない。
    pub async fn book_item(
        &self,
        member_name: &str,
        member_surname: &str,
        item_title: &str,
    ) -> Result<Booking, BookingError> {
        let mut tx = self.pool.begin().await?;

        // 1-2. 会員を行ロック付きで取得し、存在と予約上限を確認
        let member = self
            .members
            .find_by_name(&mut tx, member_name, member_surname)
            .await?;
        let member = check_member(member, self.max_bookings)?;

        // 3-5. 在庫を行ロック付きで取得し、存在・期限・残数を確認
        let item = self.inventory.find_by_title(&mut tx, item_title).await?;
        let item = check_item(item, Utc::now())?;

        tracing::info!(
            "booking item {} for member {}",
            item.id.value(),
            member.id.value()
        );

        // 6. 予約行の作成とカウンタ更新を同一トランザクションで実行
        let booking = Booking::new(member.id, item.id, Utc::now());
        self.bookings.insert(&mut tx, &booking).await?;
        self.inventory
            .adjust_remaining_count(&mut tx, item.id, -1)
            .await?;
        self.members
            .adjust_booking_count(&mut tx, member.id, 1)
            .await?;

        tx.commit().await?;
        tracing::info!("booking successful: {}", booking.reference);

        Ok(booking)
    }

    /// 予約をキャンセルする
    ///
    /// バリデーション順序：
    /// 1. 会員が存在すること
    /// 2. 指定参照の予約が存在すること
    ///
    /// 在庫アイテムはベストエフォートで解決する。在庫行が独立に削除されて
    /// いても、予約は孤児データとしてキャンセル可能とする（その場合は
    /// 残数の復元だけをスキップする）。
    pub async fn cancel_booking(
        &self,
        member_name: &str,
        member_surname: &str,
        reference: &str,
    ) -> Result<(), BookingError> {
        let mut tx = self.pool.begin().await?;

        // 1. 会員を行ロック付きで取得
        let member = self
            .members
            .find_by_name(&mut tx, member_name, member_surname)
            .await?
            .ok_or(BookingError::MemberNotFound)?;

        // 2. 参照から予約を解決。形式不正は存在しない参照と同じ扱い
        let reference =
            BookingReference::parse(reference).ok_or(BookingError::BookingNotFound)?;
        let booking = self
            .bookings
            .find_by_reference(&mut tx, reference)
            .await?
            .ok_or(BookingError::BookingNotFound)?;

        // 3. 在庫の解決はベストエフォート
        let item = self
            .inventory
            .find_by_id(&mut tx, booking.inventory_id)
            .await?;

        tracing::info!(
            "cancelling booking {} for member {}",
            booking.reference,
            member.id.value()
        );

        // 4. 予約行の削除とカウンタの復元を同一トランザクションで実行
        if !self.bookings.delete(&mut tx, booking.id).await? {
            return Err(BookingError::BookingNotFound);
        }
        if let Some(item) = &item {
            self.inventory
                .adjust_remaining_count(&mut tx, item.id, 1)
                .await?;
        }
        self.members
            .adjust_booking_count(&mut tx, member.id, -1)
            .await?;

        tx.commit().await?;
        tracing::info!("cancellation successful: {}", reference);

        Ok(())
    }

    /// 全予約の一覧。読み取りのみでロックは不要
    pub async fn list_all_bookings(&self) -> Result<Vec<Booking>, BookingError> {
        Ok(self.bookings.list_all().await?)
    }
}

/// 会員側のバリデーション
///
/// 存在確認が状態確認より先。最初に違反した検査のエラーだけを返す。
fn check_member(member: Option<Member>, max_bookings: u32) -> Result<Member, BookingError> {
    let member = member.ok_or(BookingError::MemberNotFound)?;
    if member.booking_count >= max_bookings as i32 {
        return Err(BookingError::MemberLimitExceeded {
            limit: max_bookings,
        });
    }
    Ok(member)
}

/// アイテム側のバリデーション
///
/// 存在 → 期限 → 残数の順。期限切れは残数より先に検査される。
fn check_item(
    item: Option<InventoryItem>,
    now: DateTime<Utc>,
) -> Result<InventoryItem, BookingError> {
    let item = item.ok_or(BookingError::ItemNotFound)?;
    if item.expiration_date <= now {
        return Err(BookingError::ItemExpired);
    }
    if item.remaining_count == 0 {
        return Err(BookingError::ItemDepleted);
    }
    Ok(item)
}
