/// 実行時設定
///
/// すべて環境変数から読む。未設定の値には開発用の既定値を使う。
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// トークン署名鍵（HS256）
    pub secret_key: String,
    pub access_token_expire_minutes: i64,
    /// 会員1人あたりの同時予約上限
    pub max_bookings: u32,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost/booking".into()),
            secret_key: std::env::var("SECRET_KEY").unwrap_or_else(|_| "dev-secret-key".into()),
            access_token_expire_minutes: std::env::var("ACCESS_TOKEN_EXPIRE_MINUTES")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(30),
            max_bookings: std::env::var("MAX_BOOKINGS")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(2),
            port: std::env::var("PORT")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(3000),
        }
    }
}
