// 接続オプションビルダー
//
// DatabaseConfig と接続先データベース名から PgConnectOptions を生成する。

use crate::core::config::{ConnectionSource, DatabaseConfig};
use crate::core::error::DatabaseError;
use sqlx::postgres::PgConnectOptions;
use std::str::FromStr;

/// 接続オプションを生成
///
/// URLが指定されていればそれを、なければ個別フィールドを使う。
/// どちらの場合もデータベース名は `database` で上書きする。
pub fn build_connect_options(
    config: &DatabaseConfig,
    database: &str,
) -> Result<PgConnectOptions, DatabaseError> {
    let options = match config.connection_source() {
        ConnectionSource::Url(url) => {
            PgConnectOptions::from_str(url).map_err(|e| DatabaseError::Connection {
                message: "Invalid database url".to_string(),
                cause: e.to_string(),
            })?
        }
        ConnectionSource::Fields {
            host,
            port,
            user,
            password,
        } => {
            // 未指定の項目は PGHOST などの環境変数から補われる
            let mut options = PgConnectOptions::new();
            if let Some(host) = host {
                options = options.host(host);
            }
            if let Some(port) = port {
                options = options.port(port);
            }
            if let Some(user) = user {
                options = options.username(user);
            }
            if let Some(password) = password {
                options = options.password(password);
            }
            options
        }
    };

    Ok(options.database(database))
}
