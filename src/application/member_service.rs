use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::domain::Member;
use crate::ingest::{self, CleanRow, FailedRow, IngestError, MEMBER_SCHEMA, truncate_error};
use crate::repositories::MemberRepository;

/// 会員CSVの日付形式（ISO風、秒まで）
const MEMBER_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// 会員の一括取り込みと一覧
pub struct MemberService {
    members: Arc<MemberRepository>,
}

impl MemberService {
    pub fn new(members: Arc<MemberRepository>) -> Self {
        Self { members }
    }

    /// アップロードされたCSVから会員を登録する
    ///
    /// 構造クリーニング（ingest）→ 型変換 → 挿入の順。bulk_updateがtrueなら
    /// 全件一括（1件でも失敗すれば全体ロールバック）、falseなら1行ずつの
    /// ベストエフォート挿入。戻り値はすべての失敗行の一覧で、空なら完全成功。
    pub async fn add_members(
        &self,
        filename: &str,
        data: &[u8],
        bulk_update: bool,
    ) -> Result<Vec<FailedRow>, IngestError> {
        let (rows, mut failures) = ingest::clean_csv(filename, data, &MEMBER_SCHEMA)?;
        let (members, coercion_failures) = parse_member_rows(rows);
        failures.extend(coercion_failures);

        if bulk_update {
            if let Err(err) = self.members.insert_bulk(&members).await {
                tracing::error!("failed to bulk insert member rows: {}", err);
                failures.push(FailedRow::aggregate(format!(
                    "failed to bulk insert {} member rows; entire batch rolled back: {}",
                    members.len(),
                    truncate_error(&err.to_string())
                )));
            }
        } else {
            failures.extend(self.members.insert_each(&members).await);
        }

        Ok(failures)
    }

    pub async fn list_all(&self) -> Result<Vec<Member>, sqlx::Error> {
        self.members.list_all().await
    }
}

/// クリーニング済み行を会員エンティティへ変換する
///
/// 変換に失敗した行は挿入対象から外し、失敗行として報告する。
fn parse_member_rows(rows: Vec<CleanRow>) -> (Vec<Member>, Vec<FailedRow>) {
    let mut members = Vec::new();
    let mut failures = Vec::new();

    for row in rows {
        match parse_member_row(&row) {
            Ok(member) => members.push(member),
            Err(reason) => {
                tracing::error!("invalid member row {:?}: {}", row.get("name"), reason);
                failures.push(FailedRow::new(row, reason));
            }
        }
    }

    (members, failures)
}

fn parse_member_row(row: &CleanRow) -> Result<Member, String> {
    let booking_count: i32 = row["booking_count"]
        .parse()
        .map_err(|_| format!("invalid value for booking_count: {:?}", row["booking_count"]))?;

    let date_joined = NaiveDateTime::parse_from_str(&row["date_joined"], MEMBER_DATE_FORMAT)
        .map_err(|_| {
            format!(
                "invalid date format for date_joined: {:?} (expected YYYY-MM-DDTHH:MM:SS)",
                row["date_joined"]
            )
        })?
        .and_utc();

    Ok(Member::new(
        row["name"].clone(),
        row["surname"].clone(),
        booking_count,
        date_joined,
    ))
}
