use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};

use crate::domain::InventoryItem;
use crate::ingest::{self, CleanRow, FailedRow, INVENTORY_SCHEMA, IngestError, truncate_error};
use crate::repositories::InventoryRepository;

/// 在庫CSVの日付形式（日/月/年）
const ITEM_DATE_FORMAT: &str = "%d/%m/%Y";

/// 在庫の一括取り込みと一覧
pub struct InventoryService {
    inventory: Arc<InventoryRepository>,
}

impl InventoryService {
    pub fn new(inventory: Arc<InventoryRepository>) -> Self {
        Self { inventory }
    }

    /// アップロードされたCSVから在庫を登録する
    ///
    /// 失敗の扱いは会員取り込みと同じ：失敗行の一覧を返し、空なら完全成功。
    pub async fn add_inventories(
        &self,
        filename: &str,
        data: &[u8],
        bulk_update: bool,
    ) -> Result<Vec<FailedRow>, IngestError> {
        let (rows, mut failures) = ingest::clean_csv(filename, data, &INVENTORY_SCHEMA)?;
        let (items, coercion_failures) = parse_inventory_rows(rows);
        failures.extend(coercion_failures);

        if bulk_update {
            if let Err(err) = self.inventory.insert_bulk(&items).await {
                tracing::error!("failed to bulk insert inventory rows: {}", err);
                failures.push(FailedRow::aggregate(format!(
                    "failed to bulk insert {} inventory rows; entire batch rolled back: {}",
                    items.len(),
                    truncate_error(&err.to_string())
                )));
            }
        } else {
            failures.extend(self.inventory.insert_each(&items).await);
        }

        Ok(failures)
    }

    pub async fn list_all(&self) -> Result<Vec<InventoryItem>, sqlx::Error> {
        self.inventory.list_all().await
    }
}

fn parse_inventory_rows(rows: Vec<CleanRow>) -> (Vec<InventoryItem>, Vec<FailedRow>) {
    let mut items = Vec::new();
    let mut failures = Vec::new();

    for row in rows {
        match parse_inventory_row(&row) {
            Ok(item) => items.push(item),
            Err(reason) => {
                tracing::error!("invalid inventory row {:?}: {}", row.get("title"), reason);
                failures.push(FailedRow::new(row, reason));
            }
        }
    }

    (items, failures)
}

fn parse_inventory_row(row: &CleanRow) -> Result<InventoryItem, String> {
    let remaining_count: i32 = row["remaining_count"].parse().map_err(|_| {
        format!(
            "invalid value for remaining_count: {:?}",
            row["remaining_count"]
        )
    })?;

    // 期限日は日付のみ。その日の始まり（UTC深夜0時）として解釈する
    let expiration_date = NaiveDate::parse_from_str(&row["expiration_date"], ITEM_DATE_FORMAT)
        .map_err(|_| {
            format!(
                "invalid date format for expiration_date: {:?} (expected DD/MM/YYYY)",
                row["expiration_date"]
            )
        })?
        .and_time(NaiveTime::MIN)
        .and_utc();

    Ok(InventoryItem::new(
        row["title"].clone(),
        row["description"].clone(),
        remaining_count,
        expiration_date,
    ))
}
