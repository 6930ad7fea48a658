// checkコマンドハンドラー
//
// diffと同じ比較を行い、差分があれば失敗として扱います。

use crate::cli::commands::diff::{DiffCommand, DiffCommandHandler};
use anyhow::{anyhow, Result};
use std::path::PathBuf;

/// checkコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct CheckCommand {
    /// プロジェクトのルートパス
    pub project_path: PathBuf,
    /// カスタム設定ファイルパス
    pub config_path: Option<PathBuf>,
}

/// checkコマンドの結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutput {
    /// 未適用のDDL（差分がなければ空文字列）
    pub script: String,
}

impl CheckOutput {
    /// 差分があるかどうか
    pub fn has_drift(&self) -> bool {
        !self.script.is_empty()
    }

    /// 差分があればエラーにする
    pub fn into_result(self) -> Result<()> {
        if self.has_drift() {
            Err(anyhow!("Schema drift detected"))
        } else {
            Ok(())
        }
    }
}

/// checkコマンドハンドラー
#[derive(Debug, Default)]
pub struct CheckCommandHandler {}

impl CheckCommandHandler {
    /// 新しいCheckCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// checkコマンドを実行
    ///
    /// 差分の有無の判定は呼び出し側で `CheckOutput::into_result` を使う。
    /// スクリプトの出力を先に済ませられるようにするため。
    pub async fn execute(&self, command: &CheckCommand) -> Result<CheckOutput> {
        let diff = DiffCommand {
            project_path: command.project_path.clone(),
            config_path: command.config_path.clone(),
        };
        let result = DiffCommandHandler::new().compute(&diff).await?;

        Ok(CheckOutput {
            script: result.to_script(),
        })
    }
}
