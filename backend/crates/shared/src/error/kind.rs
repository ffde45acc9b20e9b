//! Error Kind - Classification of errors
//!
//! Defines the [`ErrorKind`] enum that maps to HTTP status codes and to
//! the fallback numeric service code.

use serde::Serialize;

/// エラー種別の列挙体
///
/// HTTP ステータスコードと、サービス固有の数値コード（フォールバック値）を
/// 対応付けます。個別のエラーはより具体的なコードで上書きできます。
///
/// ## Examples
/// ```rust
/// use kernel::error::kind::ErrorKind;
///
/// let kind = ErrorKind::NotFound;
/// assert_eq!(kind.status_code(), 404);
/// assert_eq!(kind.default_code(), 404000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ErrorKind {
    /// 400 - 入力不正
    BadRequest,
    /// 401 - 認証失敗
    Unauthorized,
    /// 403 - スコープ不足
    Forbidden,
    /// 404 - リソースが見つからない
    NotFound,
    /// 500 - サーバー内部エラー
    InternalServerError,
    /// 503 - 依存サービス（キャッシュ等）が利用不可
    ServiceUnavailable,
}

impl ErrorKind {
    /// HTTP ステータスコードを取得
    #[inline]
    pub const fn status_code(&self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::Unauthorized => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::InternalServerError => 500,
            ErrorKind::ServiceUnavailable => 503,
        }
    }

    /// 種別ごとの既定サービスコード
    ///
    /// `BadRequest` は 40000 系のサブコードの基点になるため 5 桁です。
    #[inline]
    pub const fn default_code(&self) -> u32 {
        match self {
            ErrorKind::BadRequest => 40000,
            ErrorKind::Unauthorized => 401000,
            ErrorKind::Forbidden => 403000,
            ErrorKind::NotFound => 404000,
            ErrorKind::InternalServerError => 50000,
            ErrorKind::ServiceUnavailable => 50300,
        }
    }

    /// HTTP の標準的な理由フレーズ
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "Bad Request",
            ErrorKind::Unauthorized => "Unauthorized",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::NotFound => "Not Found",
            ErrorKind::InternalServerError => "Internal Server Error",
            ErrorKind::ServiceUnavailable => "Service Unavailable",
        }
    }

    /// 5xx 系かどうか（ログに残すべきエラー）
    #[inline]
    pub const fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ErrorKind::BadRequest.status_code(), 400);
        assert_eq!(ErrorKind::Unauthorized.status_code(), 401);
        assert_eq!(ErrorKind::Forbidden.status_code(), 403);
        assert_eq!(ErrorKind::NotFound.status_code(), 404);
        assert_eq!(ErrorKind::InternalServerError.status_code(), 500);
        assert_eq!(ErrorKind::ServiceUnavailable.status_code(), 503);
    }

    #[test]
    fn test_default_codes() {
        assert_eq!(ErrorKind::BadRequest.default_code(), 40000);
        assert_eq!(ErrorKind::Unauthorized.default_code(), 401000);
        assert_eq!(ErrorKind::NotFound.default_code(), 404000);
    }

    #[test]
    fn test_is_server_error() {
        assert!(!ErrorKind::BadRequest.is_server_error());
        assert!(!ErrorKind::NotFound.is_server_error());
        assert!(ErrorKind::InternalServerError.is_server_error());
        assert!(ErrorKind::ServiceUnavailable.is_server_error());
    }
}
