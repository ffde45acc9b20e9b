//! Application Error - Unified error type for the application
//!
//! Defines [`AppError`], [`AppResult<T>`] and the [`RequestInfo`] block
//! echoed back in every error envelope.

use std::borrow::Cow;
use std::error::Error;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::kind::ErrorKind;

/// アプリケーション統一エラー型
///
/// サービス全体で共通のエラー表現です。数値コードと二言語メッセージ
/// （主メッセージ＋英語訳）を持ち、HTTP レスポンスに変換されます。
///
/// ## Fields
/// * `kind` - エラーの分類（HTTP ステータスコードにマッピング）
/// * `code` - 安定したサービスコード（例: 40012, 401000）
/// * `message` - 主メッセージ（インドネシア語）
/// * `translation` - 英語訳
/// * `cause` - 開発者向けの原因（レスポンスの `transaction_info.cause`）
/// * `request` - リクエスト識別情報（任意）
/// * `source` - 元のエラー（ログ用）
///
/// ## Examples
/// ```rust
/// use kernel::error::{app_error::AppError, kind::ErrorKind};
///
/// let err = AppError::new(ErrorKind::NotFound, "Data tidak ditemukan!")
///     .with_translation("Data not found!");
/// assert_eq!(err.code(), 404000);
/// ```
pub struct AppError {
    kind: ErrorKind,
    code: u32,
    message: Cow<'static, str>,
    translation: Option<Cow<'static, str>>,
    cause: Option<String>,
    request: Option<RequestInfo>,
    source: Option<Box<dyn Error + Send + Sync + 'static>>,
}

/// `Result<T, AppError>` の省略形
pub type AppResult<T> = Result<T, AppError>;

/// レスポンスに埋め込むリクエスト情報
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RequestInfo {
    pub request_uri: String,
    pub request_method: String,
    pub request_id: String,
}

/// レスポンス共通の `transaction_info` ブロック
///
/// 成功・失敗どちらのレスポンスにも含まれます。`error_code` と `cause` は
/// 失敗時のみ設定されます。
#[derive(Debug, Clone, Serialize)]
pub struct TransactionInfo {
    #[serde(flatten)]
    pub request: RequestInfo,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

impl TransactionInfo {
    pub fn new(request: RequestInfo) -> Self {
        Self {
            request,
            timestamp: Utc::now(),
            error_code: None,
            cause: None,
        }
    }
}

impl AppError {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// 新しいエラーを作成（コードは種別の既定値）
    #[inline]
    pub fn new(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            code: kind.default_code(),
            message: message.into(),
            translation: None,
            cause: None,
            request: None,
            source: None,
        }
    }

    /// 400 Bad Request エラー
    #[inline]
    pub fn bad_request(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    /// 401 Unauthorized エラー
    #[inline]
    pub fn unauthorized(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    /// 404 Not Found エラー
    #[inline]
    pub fn not_found(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// 500 Internal Server Error
    #[inline]
    pub fn internal(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::InternalServerError, message)
    }

    // ========================================================================
    // Builder methods
    // ========================================================================

    /// サービスコードを上書き
    #[inline]
    pub fn with_code(mut self, code: u32) -> Self {
        self.code = code;
        self
    }

    /// 英語訳を設定
    #[inline]
    pub fn with_translation(mut self, translation: impl Into<Cow<'static, str>>) -> Self {
        self.translation = Some(translation.into());
        self
    }

    /// 原因（開発者向け）を設定
    #[inline]
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// リクエスト情報を設定
    #[inline]
    pub fn with_request(mut self, request: RequestInfo) -> Self {
        self.request = Some(request);
        self
    }

    /// 元のエラーを設定（デバッグ用）
    #[inline]
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[inline]
    pub fn code(&self) -> u32 {
        self.code
    }

    #[inline]
    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[inline]
    pub fn translation(&self) -> Option<&str> {
        self.translation.as_deref()
    }

    #[inline]
    pub fn cause(&self) -> Option<&str> {
        self.cause.as_deref()
    }

    #[inline]
    pub fn request(&self) -> Option<&RequestInfo> {
        self.request.as_ref()
    }

    #[inline]
    pub fn is_server_error(&self) -> bool {
        self.kind.is_server_error()
    }

    /// このエラーの `transaction_info` を組み立てる
    pub fn transaction_info(&self) -> TransactionInfo {
        TransactionInfo {
            error_code: Some(self.code),
            cause: self.cause.clone(),
            ..TransactionInfo::new(self.request.clone().unwrap_or_default())
        }
    }
}

impl fmt::Debug for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut builder = f.debug_struct("AppError");
        builder.field("kind", &self.kind);
        builder.field("code", &self.code);
        builder.field("message", &self.message);
        if let Some(translation) = &self.translation {
            builder.field("translation", translation);
        }
        if let Some(cause) = &self.cause {
            builder.field("cause", cause);
        }
        if let Some(source) = &self.source {
            builder.field("source", source);
        }
        builder.finish()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(translation) = &self.translation {
            write!(f, " ({})", translation)?;
        }
        Ok(())
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn Error + 'static))
    }
}
