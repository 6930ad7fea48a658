// 安全な識別子
//
// データベース名は DDL でバインドパラメータにできないため、
// CREATE/DROP/COMMENT に埋め込む前に必ずこの型を経由させる。

use thiserror::Error;

/// PostgreSQL の識別子長の上限（NAMEDATALEN - 1）
pub const MAX_IDENTIFIER_BYTES: usize = 63;

/// 識別子が拒否された理由
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("name is empty")]
    Empty,

    #[error("name contains a double quote")]
    EmbeddedQuote,

    #[error("name contains a NUL byte")]
    NulByte,

    #[error("name is {len} bytes long, the server limit is {MAX_IDENTIFIER_BYTES}")]
    TooLong { len: usize },
}

/// クォートしてSQLに埋め込んでも安全な識別子
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SafeIdentifier(String);

impl SafeIdentifier {
    /// 名前を検証して識別子を作成
    pub fn new(name: impl Into<String>) -> Result<Self, IdentifierError> {
        let name = name.into();

        if name.is_empty() {
            return Err(IdentifierError::Empty);
        }
        if name.contains('"') {
            return Err(IdentifierError::EmbeddedQuote);
        }
        if name.contains('\0') {
            return Err(IdentifierError::NulByte);
        }
        if name.len() > MAX_IDENTIFIER_BYTES {
            return Err(IdentifierError::TooLong { len: name.len() });
        }

        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// ダブルクォートで囲んだ形式
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }
}

impl std::fmt::Display for SafeIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SafeIdentifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
