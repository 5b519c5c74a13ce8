//! CSV一括取り込みの構造バリデーションとクリーニング。
//!
//! ヘッダー検査・空行/空列の除去・必須列への射影・自然キーでの重複排除までを
//! 担当する。型変換（整数・日付）は各サービス側で行う。

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use thiserror::Error;

/// クリーニング済みの1行。必須列がすべて揃っていることが保証される。
pub type CleanRow = BTreeMap<String, String>;

/// 挿入エラー文言を失敗行に載せるときの最大長
pub const ERROR_SNIPPET_LEN: usize = 120;

/// 取り込み全体を打ち切る致命的エラー
///
/// 行単位の失敗はエラーにせず`FailedRow`として蓄積する。
#[derive(Debug, Error)]
pub enum IngestError {
    /// 拡張子不正・パース不能・必須ヘッダー欠落
    #[error("{0}")]
    InvalidFile(String),
}

/// 失敗した行の報告レコード
///
/// 元の行内容（判明している分）と失敗理由を持つ。オペレーターが修正して
/// 再投入できるだけの文脈を残すことが目的。
#[derive(Debug, Clone, Serialize)]
pub struct FailedRow {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub row: BTreeMap<String, String>,
    pub reason: String,
}

impl FailedRow {
    pub fn new(row: BTreeMap<String, String>, reason: impl Into<String>) -> Self {
        Self {
            row,
            reason: reason.into(),
        }
    }

    /// 行内容を持たない集約レベルの失敗（一括挿入のロールバックなど）
    pub fn aggregate(reason: impl Into<String>) -> Self {
        Self {
            row: BTreeMap::new(),
            reason: reason.into(),
        }
    }
}

/// エラー文言を報告用に切り詰める
pub fn truncate_error(err: &str) -> String {
    if err.len() <= ERROR_SNIPPET_LEN {
        return err.to_string();
    }
    let mut end = ERROR_SNIPPET_LEN;
    while !err.is_char_boundary(end) {
        end -= 1;
    }
    err[..end].to_string()
}

/// 取り込み対象スキーマ（必須ヘッダーと自然キー）
pub struct CsvSchema {
    pub required_headers: &'static [&'static str],
    pub natural_key: &'static [&'static str],
}

/// 会員CSVスキーマ
pub const MEMBER_SCHEMA: CsvSchema = CsvSchema {
    required_headers: &["name", "surname", "booking_count", "date_joined"],
    natural_key: &["name", "surname"],
};

/// 在庫CSVスキーマ
pub const INVENTORY_SCHEMA: CsvSchema = CsvSchema {
    required_headers: &["title", "description", "remaining_count", "expiration_date"],
    natural_key: &["title"],
};

/// CSVを構造的に検証し、クリーニング済み行と失敗行に分ける
///
/// 処理順：
/// 1. 拡張子・パース可否の検査（失敗はファイル全体の拒否）
/// 2. 空セルを欠損として扱い、全欠損の列・行を除去
/// 3. 必須ヘッダーの存在検査（欠落はファイル全体の拒否）
/// 4. 必須列への射影
/// 5. 自然キーで重複排除（先勝ち。重複行は失敗行として報告）
/// 6. 必須フィールドが欠けた行を失敗行として報告
pub fn clean_csv(
    filename: &str,
    data: &[u8],
    schema: &CsvSchema,
) -> Result<(Vec<CleanRow>, Vec<FailedRow>), IngestError> {
    if !filename.ends_with(".csv") {
        return Err(IngestError::InvalidFile(
            "only CSV files are allowed".to_string(),
        ));
    }

    let mut reader = csv::ReaderBuilder::new().from_reader(data);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|_| IngestError::InvalidFile("invalid CSV format".to_string()))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    // 空セルはNoneに正規化して読み込む
    let mut rows: Vec<Vec<Option<String>>> = Vec::new();
    for record in reader.records() {
        let record =
            record.map_err(|_| IngestError::InvalidFile("invalid CSV format".to_string()))?;
        rows.push(
            record
                .iter()
                .map(|cell| {
                    if cell.is_empty() {
                        None
                    } else {
                        Some(cell.to_string())
                    }
                })
                .collect(),
        );
    }

    // 全行で欠損している列を落とす
    let kept_columns: Vec<usize> = (0..headers.len())
        .filter(|&col| rows.iter().any(|row| row.get(col).is_some_and(Option::is_some)))
        .collect();

    // 全列が欠損している行を落とす
    rows.retain(|row| kept_columns.iter().any(|&col| row[col].is_some()));

    // 必須列の位置を解決する。列名が重複している場合は最初の列を採用する。
    let mut required_columns = Vec::with_capacity(schema.required_headers.len());
    let mut missing_headers = Vec::new();
    for &required in schema.required_headers {
        match kept_columns.iter().copied().find(|&col| headers[col] == required) {
            Some(col) => required_columns.push(col),
            None => missing_headers.push(required),
        }
    }
    if !missing_headers.is_empty() {
        return Err(IngestError::InvalidFile(format!(
            "required column(s) missing: {}",
            missing_headers.join(", ")
        )));
    }

    let projected: Vec<BTreeMap<&str, Option<String>>> = rows
        .into_iter()
        .map(|row| {
            schema
                .required_headers
                .iter()
                .zip(&required_columns)
                .map(|(&header, &col)| (header, row[col].clone()))
                .collect()
        })
        .collect();

    let mut clean = Vec::new();
    let mut failures = Vec::new();
    let mut seen_keys: HashSet<Vec<Option<String>>> = HashSet::new();

    for row in projected {
        let key: Vec<Option<String>> = schema
            .natural_key
            .iter()
            .map(|field| row[*field].clone())
            .collect();
        if !seen_keys.insert(key) {
            failures.push(FailedRow::new(
                present_fields(&row),
                format!("duplicate of an earlier row on ({})", schema.natural_key.join(", ")),
            ));
            continue;
        }

        let missing: Vec<&str> = row
            .iter()
            .filter(|(_, value)| value.is_none())
            .map(|(field, _)| *field)
            .collect();
        if !missing.is_empty() {
            failures.push(FailedRow::new(
                present_fields(&row),
                format!("missing required field(s): {}", missing.join(", ")),
            ));
            continue;
        }

        clean.push(
            row.into_iter()
                .filter_map(|(field, value)| value.map(|v| (field.to_string(), v)))
                .collect(),
        );
    }

    Ok((clean, failures))
}

fn present_fields(row: &BTreeMap<&str, Option<String>>) -> BTreeMap<String, String> {
    row.iter()
        .filter_map(|(field, value)| value.as_ref().map(|v| (field.to_string(), v.clone())))
        .collect()
}
