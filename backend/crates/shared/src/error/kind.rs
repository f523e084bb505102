//! Error Kind
//!
//! HTTP status classes the broker actually answers with.

use std::fmt;

/// エラー種別
///
/// ブローカーが返す HTTP ステータスのみを持ちます。
/// 405 や 202 のようなプロトコル上の応答はエラーではないため、ここには含みません。
///
/// ```rust
/// use kernel::error::kind::ErrorKind;
///
/// assert_eq!(ErrorKind::BadGateway.status_code(), 502);
/// assert_eq!(ErrorKind::BadGateway.to_string(), "Bad Gateway");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// 400: セッション ID 欠落、不正なメッセージ
    BadRequest,
    /// 404: 未知のルート、カタログに無い商品
    NotFound,
    /// 422: 必須パラメータの欠落
    UnprocessableEntity,
    /// 500: カタログと配送テーブルの不整合など
    InternalServerError,
    /// 502: ファシリテーター / データポータルの失敗
    BadGateway,
    /// 503: 受取ウォレット未設定
    ServiceUnavailable,
}

impl ErrorKind {
    pub const fn status_code(&self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::UnprocessableEntity => 422,
            ErrorKind::InternalServerError => 500,
            ErrorKind::BadGateway => 502,
            ErrorKind::ServiceUnavailable => 503,
        }
    }

    /// RFC 7807 の `title` に使う表記
    pub const fn title(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "Bad Request",
            ErrorKind::NotFound => "Not Found",
            ErrorKind::UnprocessableEntity => "Unprocessable Entity",
            ErrorKind::InternalServerError => "Internal Server Error",
            ErrorKind::BadGateway => "Bad Gateway",
            ErrorKind::ServiceUnavailable => "Service Unavailable",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}
