// cleanコマンドハンドラー
//
// 中断された実行が残した一時データベースを削除します。

use crate::cli::command_context::CommandContext;
use crate::services::sweep_cleaner::SweepCleaner;
use anyhow::{Context, Result};
use std::path::PathBuf;

/// cleanコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct CleanCommand {
    /// プロジェクトのルートパス
    pub project_path: PathBuf,
    /// カスタム設定ファイルパス
    pub config_path: Option<PathBuf>,
}

/// cleanコマンドハンドラー
#[derive(Debug, Default)]
pub struct CleanCommandHandler {}

impl CleanCommandHandler {
    /// 新しいCleanCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// cleanコマンドを実行
    ///
    /// 標準出力には何も出さない。削除したデータベースは --verbose で表示される。
    pub async fn execute(&self, command: &CleanCommand) -> Result<String> {
        let context = CommandContext::load_with_config(
            command.project_path.clone(),
            command.config_path.clone(),
        )?;

        let admin = context.connect_admin().await?;
        SweepCleaner::new()
            .run(admin)
            .await
            .with_context(|| "Failed to clean up orphaned databases")?;

        Ok(String::new())
    }
}
