use thiserror::Error;

/// 予約・キャンセル操作のエラー
///
/// バリデーションの失敗種別ごとに1バリアント。呼び出し側（API層）が
/// すべての種別を明示的にHTTPステータスへ対応付ける。
#[derive(Debug, Error)]
pub enum BookingError {
    /// 指定された名前の会員が存在しない
    #[error("member provided not present in database")]
    MemberNotFound,

    /// 会員が予約上限に達している
    #[error("reached maximum booking limit of {limit}")]
    MemberLimitExceeded { limit: u32 },

    /// 指定されたタイトルの在庫が存在しない
    #[error("item provided not present in database")]
    ItemNotFound,

    /// 在庫の有効期限が切れている
    #[error("item expired")]
    ItemExpired,

    /// 在庫の残数が尽きている
    #[error("item depleted")]
    ItemDepleted,

    /// 指定された参照の予約が存在しない
    #[error("booking reference provided not present in database")]
    BookingNotFound,

    /// ストアのエラー。トランザクションはロールバック済み
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// 認証・アカウント操作のエラー
#[derive(Debug, Error)]
pub enum AuthError {
    /// ユーザーが存在しない
    #[error("invalid user")]
    UserNotFound,

    /// パスワードが一致しない
    #[error("invalid credentials")]
    InvalidCredentials,

    /// トークンが不正・期限切れ・対応ユーザーなし
    #[error("could not validate credentials")]
    InvalidToken,

    /// パスワードポリシー違反
    #[error("{0}")]
    WeakPassword(&'static str),

    /// パスワードハッシュの生成に失敗
    #[error("password hashing failed")]
    Hashing,

    /// トークンの発行に失敗
    #[error("token issuance failed")]
    TokenIssuance(#[source] jsonwebtoken::errors::Error),

    /// ストアのエラー
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}
