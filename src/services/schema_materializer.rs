// スキーママテリアライザー
//
// 宣言スキーマのSQLファイル、またはマイグレーションディレクトリ内のSQLファイルを
// ファイル名の辞書順にセッションへ適用します。

use crate::adapters::database_server::DatabaseSession;
use crate::core::error::DriftError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// マイグレーションファイルの拡張子
pub const SQL_EXTENSION: &str = ".sql";

/// ファイルの適用結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// 実行した
    Executed,
    /// 空白だけだったので実行しなかった
    SkippedBlank,
}

/// スキーママテリアライザー
#[derive(Debug, Clone, Default)]
pub struct SchemaMaterializer;

impl SchemaMaterializer {
    pub fn new() -> Self {
        Self
    }

    /// SQLファイルを1つのスクリプトとして適用
    ///
    /// 空白だけのファイルはセッションに渡さない。
    pub async fn apply_file<E>(
        &self,
        session: &mut E,
        path: &Path,
    ) -> Result<ApplyOutcome, DriftError>
    where
        E: DatabaseSession + ?Sized,
    {
        let sql = fs::read_to_string(path).map_err(|e| DriftError::Apply {
            path: path.to_path_buf(),
            cause: e.to_string(),
        })?;

        if sql.trim().is_empty() {
            debug!(file = %path.display(), "Skipping blank file");
            return Ok(ApplyOutcome::SkippedBlank);
        }

        session
            .execute_script(&sql)
            .await
            .map_err(|e| DriftError::Apply {
                path: path.to_path_buf(),
                cause: e.to_string(),
            })?;

        Ok(ApplyOutcome::Executed)
    }

    /// ディレクトリ内のSQLファイルを辞書順に適用
    ///
    /// 最初に失敗したファイルで中断し、残りのファイルは適用しない。
    /// 実行したファイル数を返す。
    pub async fn apply_directory<E>(&self, session: &mut E, dir: &Path) -> Result<usize, DriftError>
    where
        E: DatabaseSession + ?Sized,
    {
        let mut executed = 0;

        for path in self.list_sql_files(dir)? {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            info!("- {}", file_name);

            if self.apply_file(session, &path).await? == ApplyOutcome::Executed {
                executed += 1;
            }
        }

        Ok(executed)
    }

    /// ディレクトリ内のSQLファイルをファイル名の辞書順で列挙
    ///
    /// 数値としての順序ではない（"10-x.sql" は "2-y.sql" より前）。
    pub fn list_sql_files(&self, dir: &Path) -> Result<Vec<PathBuf>, DriftError> {
        let io_error = |e: std::io::Error| DriftError::Io {
            path: dir.to_path_buf(),
            cause: e.to_string(),
        };

        let mut files = Vec::new();
        for entry in fs::read_dir(dir).map_err(io_error)? {
            let entry = entry.map_err(io_error)?;
            let path = entry.path();

            let is_sql = entry
                .file_name()
                .to_string_lossy()
                .ends_with(SQL_EXTENSION);
            if is_sql && path.is_file() {
                files.push(path);
            }
        }

        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }
}
