// コマンド共通コンテキスト
//
// 設定ファイル読み込みやパス解決の重複をCLI層で集約する。

use crate::adapters::postgres_server::PostgresServer;
use crate::core::config::Config;
use crate::services::admin_connection::AdminConnection;
use crate::services::config_loader::ConfigLoader;
use crate::services::diff_pipeline::DiffInputs;
use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;

/// CLIコマンド共通の実行コンテキスト
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub project_path: PathBuf,
    pub config_path: PathBuf,
    pub config: Config,
}

impl CommandContext {
    /// プロジェクトルートから設定を読み込んでコンテキストを作成
    pub fn load(project_path: PathBuf) -> Result<Self> {
        Self::load_with_config(project_path, None)
    }

    /// カスタム設定ファイルパスを指定してコンテキストを作成
    pub fn load_with_config(
        project_path: PathBuf,
        custom_config_path: Option<PathBuf>,
    ) -> Result<Self> {
        let config_path = custom_config_path
            .unwrap_or_else(|| project_path.join(Config::DEFAULT_CONFIG_PATH));

        if !config_path.exists() {
            return Err(anyhow!(
                "Config file not found: {:?}. Create it or pass --config <FILE>.",
                config_path
            ));
        }

        let config =
            ConfigLoader::from_file(&config_path).with_context(|| "Failed to load config")?;

        Ok(Self {
            project_path,
            config_path,
            config,
        })
    }

    /// 宣言スキーマファイルの絶対パス
    pub fn schema_file(&self) -> PathBuf {
        self.project_path.join(&self.config.schema.filename)
    }

    /// マイグレーションディレクトリの絶対パス
    pub fn migrations_dir(&self) -> PathBuf {
        self.project_path.join(&self.config.migrations.directory)
    }

    /// 差分の入力を解決
    ///
    /// サーバーに接続する前にファイルの存在を確認する。
    pub fn diff_inputs(&self) -> Result<DiffInputs> {
        let schema_file = self.schema_file();
        if !schema_file.is_file() {
            return Err(anyhow!("Schema file not found: {:?}", schema_file));
        }

        let migrations_dir = self.migrations_dir();
        if !migrations_dir.is_dir() {
            return Err(anyhow!(
                "Migrations directory not found: {:?}",
                migrations_dir
            ));
        }

        Ok(DiffInputs {
            schema_file,
            migrations_dir,
        })
    }

    /// 管理用接続を開く
    pub async fn connect_admin(&self) -> Result<AdminConnection<PostgresServer>> {
        AdminConnection::connect(&self.config.database)
            .await
            .with_context(|| "Failed to open admin connection")
    }
}
