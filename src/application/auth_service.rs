use std::sync::Arc;

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::domain::User;
use crate::repositories::UserRepository;

use super::errors::AuthError;

/// トークン署名アルゴリズム（HS256固定）
///
/// jsonwebtokenの既定ヘッダーがHS256のため、ここでは定数として明示するのみ。
pub const TOKEN_ALGORITHM: &str = "HS256";

/// アクセストークンのクレーム
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub username: String,
    pub exp: i64,
}

/// アカウント作成リクエスト
pub struct NewAccount {
    pub username: String,
    pub fullname: Option<String>,
    pub email: Option<String>,
    pub password: String,
}

/// 認証サービス
///
/// アカウント作成・ログイン・ベアラートークンの検証を担当する。
/// パスワードはArgon2idのソルト付きハッシュとしてのみ保存する。
pub struct AuthService {
    users: Arc<UserRepository>,
    secret: String,
    token_expiry_minutes: i64,
}

impl AuthService {
    pub fn new(users: Arc<UserRepository>, secret: String, token_expiry_minutes: i64) -> Self {
        Self {
            users,
            secret,
            token_expiry_minutes,
        }
    }

    /// アカウントを作成する
    ///
    /// パスワードポリシー（8文字以上・数字1つ以上・英字1つ以上）を強制する。
    pub async fn create_user(&self, account: NewAccount) -> Result<User, AuthError> {
        check_password_policy(&account.password)?;
        let password_hash = hash_password(&account.password)?;

        let user = User::new(
            account.username,
            account.fullname,
            account.email,
            password_hash,
        );
        self.users.insert(&user).await?;

        Ok(user)
    }

    /// 認証してアクセストークンを発行する
    pub async fn login(&self, username: &str, password: &str) -> Result<(String, User), AuthError> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !verify_password(password, &user.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        let token = issue_token(&self.secret, &user.username, self.token_expiry_minutes)?;
        Ok((token, user))
    }

    /// ベアラートークンを検証し、対応するユーザーを返す
    ///
    /// 署名不正・期限切れ・対応ユーザーなしはすべてInvalidTokenに落とす。
    pub async fn authenticate(&self, token: &str) -> Result<User, AuthError> {
        let claims = decode_claims(&self.secret, token)?;
        self.users
            .find_by_username(&claims.username)
            .await?
            .ok_or(AuthError::InvalidToken)
    }
}

fn check_password_policy(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < 8 {
        return Err(AuthError::WeakPassword(
            "password must be at least 8 characters long",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AuthError::WeakPassword(
            "password must contain at least one digit",
        ));
    }
    if !password.chars().any(char::is_alphabetic) {
        return Err(AuthError::WeakPassword(
            "password must contain at least one letter",
        ));
    }
    Ok(())
}

fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| AuthError::Hashing)?
        .to_string())
}

fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

fn issue_token(secret: &str, username: &str, expiry_minutes: i64) -> Result<String, AuthError> {
    let claims = Claims {
        username: username.to_string(),
        exp: (Utc::now() + Duration::minutes(expiry_minutes)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(AuthError::TokenIssuance)
}

fn decode_claims(secret: &str, token: &str) -> Result<Claims, AuthError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AuthError::InvalidToken)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_policy_rejects_short() {
        let result = check_password_policy("a1b2c3");
        assert!(matches!(result, Err(AuthError::WeakPassword(_))));
    }

    #[test]
    fn test_password_policy_rejects_no_digit() {
        let result = check_password_policy("abcdefgh");
        assert!(matches!(result, Err(AuthError::WeakPassword(_))));
    }

    #[test]
    fn test_password_policy_rejects_no_letter() {
        let result = check_password_policy("12345678");
        assert!(matches!(result, Err(AuthError::WeakPassword(_))));
    }

    #[test]
    fn test_password_policy_accepts_mixed() {
        assert!(check_password_policy("secret123").is_ok());
    }

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let hash = hash_password("secret123").unwrap();
        assert_ne!(hash, "secret123");
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("secret123", &hash));
        assert!(!verify_password("secret124", &hash));
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        assert!(!verify_password("secret123", "not-a-hash"));
    }

    #[test]
    fn test_token_roundtrip() {
        let token = issue_token("test-secret", "alice", 30).unwrap();
        let claims = decode_claims("test-secret", &token).unwrap();
        assert_eq!(claims.username, "alice");
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn test_token_rejects_wrong_secret() {
        let token = issue_token("test-secret", "alice", 30).unwrap();
        let result = decode_claims("other-secret", &token);
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_token_rejects_expired() {
        // 検証側のleeway（既定60秒）を十分に超えて期限切れにする
        let token = issue_token("test-secret", "alice", -60).unwrap();
        let result = decode_claims("test-secret", &token);
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }
}
