// エラー型定義
//
// thiserrorを使用して、アダプター層の DatabaseError と、
// diff/clean の各段階に対応する DriftError を定義します。

use std::path::PathBuf;
use thiserror::Error;

/// データベースエラー
///
/// サーバーとの通信時に発生するエラーを表現します。
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Connection error
    #[error("Database connection error: {message} (cause: {cause})")]
    Connection {
        /// エラーメッセージ
        message: String,
        /// エラー原因
        cause: String,
    },

    /// Query execution error
    #[error("Query execution error: {message}")]
    Query {
        /// エラーメッセージ
        message: String,
        /// 失敗したSQL
        sql: Option<String>,
    },
}

impl DatabaseError {
    /// 接続エラーかどうか
    pub fn is_connection(&self) -> bool {
        matches!(self, DatabaseError::Connection { .. })
    }

    /// クエリエラーかどうか
    pub fn is_query(&self) -> bool {
        matches!(self, DatabaseError::Query { .. })
    }
}

/// ドリフト検出エラー
///
/// diff / clean の実行中に発生するエラーを段階ごとに表現します。
/// どの段階で失敗しても、取得済みの一時データベースは解放されます。
#[derive(Debug, Error)]
pub enum DriftError {
    /// サーバーに接続できない、または認証に失敗した
    #[error("Could not connect to the database server: {cause}")]
    Connection { cause: String },

    /// CREATE DATABASE またはマーカーの付与に失敗した
    #[error("Failed to create database '{name}': {cause}")]
    Provisioning { name: String, cause: String },

    /// スキーマまたはマイグレーションの適用に失敗した
    #[error("Failed to apply {}: {cause}", .path.display())]
    Apply { path: PathBuf, cause: String },

    /// 差分エンジンが失敗した
    #[error("Schema diff failed: {cause}")]
    Diff { cause: String },

    /// 安全にクォートできない名前のデータベース
    #[error("Refusing to drop database '{name}': {reason}. Please fix that manually.")]
    UnsafeName { name: String, reason: String },

    /// 解放（セッション切断またはDROP）に失敗した
    #[error("Failed to release database '{name}': {cause}")]
    Teardown { name: String, cause: String },

    /// カタログの照会に失敗した
    #[error("Catalog query failed: {cause}")]
    Query { cause: String },

    /// ファイルシステムの読み込みに失敗した
    #[error("Failed to read {}: {cause}", .path.display())]
    Io { path: PathBuf, cause: String },
}

impl DriftError {
    /// 接続エラーかどうか
    pub fn is_connection(&self) -> bool {
        matches!(self, DriftError::Connection { .. })
    }

    /// 作成エラーかどうか
    pub fn is_provisioning(&self) -> bool {
        matches!(self, DriftError::Provisioning { .. })
    }

    /// 適用エラーかどうか
    pub fn is_apply(&self) -> bool {
        matches!(self, DriftError::Apply { .. })
    }

    /// 差分エラーかどうか
    pub fn is_diff(&self) -> bool {
        matches!(self, DriftError::Diff { .. })
    }

    /// 危険な名前エラーかどうか
    pub fn is_unsafe_name(&self) -> bool {
        matches!(self, DriftError::UnsafeName { .. })
    }

    /// 解放エラーかどうか
    pub fn is_teardown(&self) -> bool {
        matches!(self, DriftError::Teardown { .. })
    }

    /// 失敗したファイル（適用エラーの場合）
    pub fn failed_path(&self) -> Option<&std::path::Path> {
        match self {
            DriftError::Apply { path, .. } | DriftError::Io { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// 本処理の結果と解放の結果を合成する
///
/// 先に発生したエラーが常に優先される。解放エラーは単独で起きたときだけ返し、
/// 先行エラーがある場合はログに出して捨てる。
pub fn settle<T>(
    outcome: Result<T, DriftError>,
    release: Result<(), DriftError>,
) -> Result<T, DriftError> {
    match (outcome, release) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(teardown)) => Err(teardown),
        (Err(error), Ok(())) => Err(error),
        (Err(error), Err(teardown)) => {
            tracing::error!(error = %teardown, "Cleanup failed after an earlier error");
            Err(error)
        }
    }
}
