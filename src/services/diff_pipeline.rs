// 差分パイプライン
//
// 宣言スキーマとマイグレーション履歴をそれぞれ一時データベースに展開し、
// 差分エンジンで「マイグレーション適用後の状態を宣言スキーマにするDDL」を求めます。
// どの段階で失敗しても、取得済みの一時データベースは取得と逆順に解放され、
// 管理用接続は最後に閉じられます。

use crate::adapters::database_server::{DatabaseSession, ServerControl};
use crate::core::error::{settle, DriftError};
use crate::core::naming::{MIGRATIONS_SUFFIX, SCHEMA_SUFFIX};
use crate::core::schema_diff::{DiffOptions, DiffResult};
use crate::services::admin_connection::{AdminConnection, EphemeralDatabase};
use crate::services::diff_engine::DiffEngine;
use crate::services::schema_materializer::SchemaMaterializer;
use std::path::PathBuf;
use tracing::{info, warn};

/// 差分の入力
#[derive(Debug, Clone)]
pub struct DiffInputs {
    /// 宣言スキーマのSQLファイル
    pub schema_file: PathBuf,
    /// マイグレーションディレクトリ
    pub migrations_dir: PathBuf,
}

/// 差分パイプライン
pub struct DiffPipeline<D> {
    engine: D,
    materializer: SchemaMaterializer,
}

impl<D> DiffPipeline<D> {
    pub fn new(engine: D) -> Self {
        Self {
            engine,
            materializer: SchemaMaterializer::new(),
        }
    }

    /// 差分を計算
    ///
    /// 管理用接続の所有権を受け取り、結果にかかわらず閉じて返る。
    pub async fn run<S>(
        &self,
        mut admin: AdminConnection<S>,
        inputs: &DiffInputs,
    ) -> Result<DiffResult, DriftError>
    where
        S: ServerControl,
        D: DiffEngine<S::Session>,
    {
        let mut acquired = Vec::new();
        let outcome = self
            .materialize_and_diff(&mut admin, inputs, &mut acquired)
            .await;

        let released = admin.release_all(acquired).await;
        let outcome = settle(outcome, released);

        let closed = admin.close().await;
        settle(outcome, closed)
    }

    /// 一時データベースを取得するたびに `acquired` に積む
    async fn materialize_and_diff<S>(
        &self,
        admin: &mut AdminConnection<S>,
        inputs: &DiffInputs,
        acquired: &mut Vec<EphemeralDatabase>,
    ) -> Result<DiffResult, DriftError>
    where
        S: ServerControl,
        D: DiffEngine<S::Session>,
    {
        info!("Creating databases...");
        acquired.push(admin.create_ephemeral(SCHEMA_SUFFIX).await?);
        let mut schema_session = admin.open_session(&acquired[0]).await?;

        info!("Creating target schema...");
        self.materializer
            .apply_file(&mut schema_session, &inputs.schema_file)
            .await?;

        acquired.push(admin.create_ephemeral(MIGRATIONS_SUFFIX).await?);
        let mut migrations_session = admin.open_session(&acquired[1]).await?;

        info!("Creating migrated schema...");
        self.materializer
            .apply_directory(&mut migrations_session, &inputs.migrations_dir)
            .await?;

        info!("Diffing...");
        let options = DiffOptions::unsafe_allowed();
        let statements = self
            .engine
            .diff(&mut migrations_session, &mut schema_session, options)
            .await
            .map_err(|e| DriftError::Diff {
                cause: format!("{:#}", e),
            })?;

        // 解放時にはどのみち切断されるので、閉じる失敗は警告にとどめる
        for session in [migrations_session, schema_session] {
            if let Err(e) = session.close().await {
                warn!(error = %e, "Failed to close session");
            }
        }

        Ok(DiffResult::new(statements, options))
    }
}
