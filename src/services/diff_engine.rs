// 差分エンジン
//
// 2つのセッションからカタログを読み取り、source を target の状態にするDDL文の列を返す。
// パイプラインはこのトレイトだけに依存するため、任意の実装に差し替えられます。

use crate::adapters::catalog_introspector::PostgresCatalogIntrospector;
use crate::core::schema_diff::DiffOptions;
use crate::services::catalog_diff::CatalogDiffer;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use sqlx::PgConnection;
use tracing::debug;

/// 差分エンジンのトレイト
#[async_trait]
pub trait DiffEngine<S: Send>: Send + Sync {
    /// source の状態を target の状態にするDDL文を順序付きで返す
    async fn diff(
        &self,
        source: &mut S,
        target: &mut S,
        options: DiffOptions,
    ) -> Result<Vec<String>>;
}

/// pg_catalog を比較する組み込みの差分エンジン
///
/// スキーマ、シーケンス、テーブル、カラム、制約、インデックスを扱う。
/// ビュー、関数、型、権限などは比較しない。
#[derive(Debug, Clone, Default)]
pub struct CatalogDiffEngine {
    introspector: PostgresCatalogIntrospector,
    differ: CatalogDiffer,
}

impl CatalogDiffEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DiffEngine<PgConnection> for CatalogDiffEngine {
    async fn diff(
        &self,
        source: &mut PgConnection,
        target: &mut PgConnection,
        options: DiffOptions,
    ) -> Result<Vec<String>> {
        let source_catalog = self.introspector.snapshot(source).await?;
        let target_catalog = self.introspector.snapshot(target).await?;
        debug!(
            source_tables = source_catalog.tables.len(),
            target_tables = target_catalog.tables.len(),
            "Catalogs loaded"
        );

        let statements = self.differ.diff(&source_catalog, &target_catalog);

        if !options.allow_unsafe {
            let destructive: Vec<&str> = statements
                .iter()
                .filter(|s| s.destructive)
                .map(|s| s.sql.as_str())
                .collect();
            if !destructive.is_empty() {
                return Err(anyhow!(
                    "Destructive statements are not allowed:\n{}",
                    destructive.join("\n")
                ));
            }
        }

        Ok(statements.into_iter().map(|s| s.sql).collect())
    }
}
