// diffコマンドハンドラー
//
// 宣言スキーマとマイグレーション履歴の差分をDDLスクリプトとして返します。

use crate::cli::command_context::CommandContext;
use crate::core::schema_diff::DiffResult;
use crate::services::diff_engine::CatalogDiffEngine;
use crate::services::diff_pipeline::DiffPipeline;
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::debug;

/// diffコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct DiffCommand {
    /// プロジェクトのルートパス
    pub project_path: PathBuf,
    /// カスタム設定ファイルパス
    pub config_path: Option<PathBuf>,
}

/// diffコマンドハンドラー
#[derive(Debug, Default)]
pub struct DiffCommandHandler {}

impl DiffCommandHandler {
    /// 新しいDiffCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// diffコマンドを実行
    ///
    /// 成功時はDDLスクリプト（差分がなければ空文字列）を返す
    pub async fn execute(&self, command: &DiffCommand) -> Result<String> {
        let result = self.compute(command).await?;
        Ok(result.to_script())
    }

    /// 差分を計算（checkコマンドと共用）
    pub(crate) async fn compute(&self, command: &DiffCommand) -> Result<DiffResult> {
        let context = CommandContext::load_with_config(
            command.project_path.clone(),
            command.config_path.clone(),
        )?;

        // 接続前に入力ファイルを確認する
        let inputs = context.diff_inputs()?;
        debug!(
            schema = ?inputs.schema_file,
            migrations = ?inputs.migrations_dir,
            "Resolved diff inputs"
        );

        let admin = context.connect_admin().await?;
        let pipeline = DiffPipeline::new(CatalogDiffEngine::new());

        pipeline
            .run(admin, &inputs)
            .await
            .with_context(|| "Failed to compute schema diff")
    }
}
