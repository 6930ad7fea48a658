// 設定ファイル管理
//
// プロジェクトの設定ファイル（YAML形式）の構造と検証を定義します。
// ファイルI/Oは services::config_loader に集約しています。

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;

/// プロジェクト設定
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// 宣言スキーマ
    #[serde(default)]
    pub schema: SchemaConfig,

    /// マイグレーション
    #[serde(default)]
    pub migrations: MigrationsConfig,

    /// データベース接続設定
    pub database: DatabaseConfig,
}

impl Config {
    /// デフォルトの設定ファイルパス
    pub const DEFAULT_CONFIG_PATH: &'static str = crate::core::naming::CONFIG_FILE;

    /// 設定の妥当性を検証
    pub fn validate(&self) -> Result<()> {
        if self.schema.filename.as_os_str().is_empty() {
            return Err(anyhow!("schema.filename must not be empty"));
        }
        if self.migrations.directory.as_os_str().is_empty() {
            return Err(anyhow!("migrations.directory must not be empty"));
        }

        self.database
            .validate()
            .with_context(|| "Invalid database configuration")
    }
}

/// std::str::FromStrトレイトの実装
impl FromStr for Config {
    type Err = anyhow::Error;

    fn from_str(yaml: &str) -> Result<Self, Self::Err> {
        serde_saphyr::from_str(yaml).with_context(|| "Failed to parse config file")
    }
}

/// 宣言スキーマの設定
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaConfig {
    /// スキーマ定義のSQLファイル
    #[serde(default = "default_schema_filename")]
    pub filename: PathBuf,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            filename: default_schema_filename(),
        }
    }
}

fn default_schema_filename() -> PathBuf {
    PathBuf::from("schema.sql")
}

/// マイグレーションの設定
#[derive(Debug, Clone, Deserialize)]
pub struct MigrationsConfig {
    /// マイグレーションSQLを置くディレクトリ
    #[serde(default = "default_migrations_directory")]
    pub directory: PathBuf,
}

impl Default for MigrationsConfig {
    fn default() -> Self {
        Self {
            directory: default_migrations_directory(),
        }
    }
}

fn default_migrations_directory() -> PathBuf {
    PathBuf::from("migrations")
}

/// データベース接続設定
///
/// `url` と個別フィールド（host/port/user/password）はどちらか一方だけを使う。
/// 個別フィールドの未指定分は libpq の環境変数（PGHOST など）から補われる。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseConfig {
    /// 接続URL
    pub url: Option<String>,

    /// ホスト名
    pub host: Option<String>,

    /// ポート番号
    pub port: Option<u16>,

    /// ユーザー名
    pub user: Option<String>,

    /// パスワード
    pub password: Option<String>,

    /// 一時データベース名のプレフィックス
    pub dbname: String,

    /// 管理用接続で使う既存データベース
    #[serde(default = "default_maintenance_database")]
    pub maintenance_database: String,
}

fn default_maintenance_database() -> String {
    "postgres".to_string()
}

/// 接続先の指定方法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionSource<'a> {
    /// 接続URL
    Url(&'a str),
    /// 個別フィールド
    Fields {
        host: Option<&'a str>,
        port: Option<u16>,
        user: Option<&'a str>,
        password: Option<&'a str>,
    },
}

impl DatabaseConfig {
    /// Validate database configuration
    pub fn validate(&self) -> Result<()> {
        if self.dbname.trim().is_empty() {
            return Err(anyhow!("Database name prefix (dbname) is not specified"));
        }

        if self.maintenance_database.trim().is_empty() {
            return Err(anyhow!("maintenance_database must not be empty"));
        }

        if self.url.is_some() && self.has_discrete_fields() {
            return Err(anyhow!(
                "Specify either url or host/port/user/password, not both"
            ));
        }

        Ok(())
    }

    /// 個別フィールドがひとつでも指定されているか
    pub fn has_discrete_fields(&self) -> bool {
        self.host.is_some() || self.port.is_some() || self.user.is_some() || self.password.is_some()
    }

    /// 有効な接続先の指定方法
    pub fn connection_source(&self) -> ConnectionSource<'_> {
        match self.url.as_deref() {
            Some(url) => ConnectionSource::Url(url),
            None => ConnectionSource::Fields {
                host: self.host.as_deref(),
                port: self.port,
                user: self.user.as_deref(),
                password: self.password.as_deref(),
            },
        }
    }
}
