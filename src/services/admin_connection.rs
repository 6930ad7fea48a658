// 管理用接続サービス
//
// 一時データベースの作成（マーカー付与を含む）と解放、孤児の検索と削除を担当します。
// サーバー操作は ServerControl に委譲し、失敗を DriftError の各段階に対応付けます。

use crate::adapters::database_server::ServerControl;
use crate::adapters::postgres_server::PostgresServer;
use crate::core::config::DatabaseConfig;
use crate::core::error::{settle, DriftError};
use crate::core::identifier::SafeIdentifier;
use crate::core::naming::{ephemeral_database_name, MARKER_COMMENT};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

/// 一時データベースのハンドル
///
/// `AdminConnection::release` に渡されるまで解放されない。
/// 解放されないまま破棄された場合（パニックや Future のキャンセル）は警告を出し、
/// データベースはマーカー付きで残るので `clean` で回収できる。
#[derive(Debug)]
pub struct EphemeralDatabase {
    name: SafeIdentifier,
    marker: &'static str,
    created_at: DateTime<Utc>,
    released: bool,
}

impl EphemeralDatabase {
    fn new(name: SafeIdentifier, created_at: DateTime<Utc>) -> Self {
        Self {
            name,
            marker: MARKER_COMMENT,
            created_at,
            released: false,
        }
    }

    /// データベース名
    pub fn name(&self) -> &SafeIdentifier {
        &self.name
    }

    /// 作成時に付与したマーカー
    pub fn marker(&self) -> &'static str {
        self.marker
    }

    /// 作成日時
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Drop for EphemeralDatabase {
    fn drop(&mut self) {
        if !self.released {
            warn!(
                database = %self.name,
                "Ephemeral database was not released; run `pgdrift clean` to remove it"
            );
        }
    }
}

/// マーカーで見つかった孤児データベース
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrphanRecord {
    pub name: String,
}

/// 管理用接続
pub struct AdminConnection<S: ServerControl> {
    server: S,
    prefix: String,
}

impl AdminConnection<PostgresServer> {
    /// PostgreSQLサーバーに接続
    ///
    /// 接続に失敗した場合は何も作成していない。
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DriftError> {
        let server = PostgresServer::connect(config)
            .await
            .map_err(|e| DriftError::Connection {
                cause: e.to_string(),
            })?;
        Ok(Self::new(server, config.dbname.clone()))
    }
}

impl<S: ServerControl> AdminConnection<S> {
    /// サーバー操作と名前のプレフィックスから作成
    pub fn new(server: S, prefix: impl Into<String>) -> Self {
        Self {
            server,
            prefix: prefix.into(),
        }
    }

    /// 一時データベースを作成してマーカーを付与
    ///
    /// 返したハンドルは必ず `release` に渡すこと。マーカー付与に失敗した場合は
    /// その場で削除してからエラーを返す。
    pub async fn create_ephemeral(
        &mut self,
        suffix: &str,
    ) -> Result<EphemeralDatabase, DriftError> {
        let created_at = Utc::now();
        let raw_name = ephemeral_database_name(&self.prefix, created_at.timestamp(), suffix);
        let name = SafeIdentifier::new(raw_name.clone()).map_err(|e| DriftError::Provisioning {
            name: raw_name.clone(),
            cause: e.to_string(),
        })?;

        self.server
            .create_database(&name)
            .await
            .map_err(|e| DriftError::Provisioning {
                name: raw_name.clone(),
                cause: e.to_string(),
            })?;

        let database = EphemeralDatabase::new(name, created_at);

        if let Err(e) = self
            .server
            .comment_on_database(database.name(), database.marker())
            .await
        {
            // マーカーのないデータベースは clean で見つけられないので残さない
            let error = DriftError::Provisioning {
                name: raw_name,
                cause: format!("failed to set marker comment: {}", e),
            };
            let released = self.release(database).await;
            return settle(Err(error), released);
        }

        info!(database = %database.name(), "Created database");
        Ok(database)
    }

    /// 一時データベースへの作業用セッションを開く
    pub async fn open_session(
        &mut self,
        database: &EphemeralDatabase,
    ) -> Result<S::Session, DriftError> {
        self.server
            .open_session(database.name())
            .await
            .map_err(|e| DriftError::Connection {
                cause: e.to_string(),
            })
    }

    /// 一時データベースを解放（接続中のセッションを切断してから削除）
    pub async fn release(&mut self, mut database: EphemeralDatabase) -> Result<(), DriftError> {
        database.released = true;
        let name = database.name().clone();

        let terminated = self
            .server
            .terminate_backends(&name)
            .await
            .map_err(|e| DriftError::Teardown {
                name: name.to_string(),
                cause: e.to_string(),
            })?;
        debug!(database = %name, terminated, "Sessions terminated");

        self.server
            .drop_database(&name)
            .await
            .map_err(|e| DriftError::Teardown {
                name: name.to_string(),
                cause: e.to_string(),
            })?;

        let lifetime = Utc::now() - database.created_at();
        info!(
            database = %name,
            lifetime_ms = lifetime.num_milliseconds(),
            "Dropped database"
        );
        Ok(())
    }

    /// 取得した順と逆順にすべて解放
    ///
    /// 途中で失敗しても残りの解放は続け、最初の失敗を返す。
    pub async fn release_all(
        &mut self,
        mut databases: Vec<EphemeralDatabase>,
    ) -> Result<(), DriftError> {
        let mut result = Ok(());
        while let Some(database) = databases.pop() {
            let released = self.release(database).await;
            result = settle(result, released);
        }
        result
    }

    /// マーカーが完全一致するデータベースの一覧
    pub async fn list_orphans(&mut self) -> Result<Vec<OrphanRecord>, DriftError> {
        let names = self
            .server
            .databases_with_comment(MARKER_COMMENT)
            .await
            .map_err(|e| DriftError::Query {
                cause: e.to_string(),
            })?;

        Ok(names.into_iter().map(|name| OrphanRecord { name }).collect())
    }

    /// 名前を検証してから削除
    ///
    /// 安全にクォートできない名前は削除せずにエラーを返す。
    pub async fn drop_by_name(&mut self, name: &str) -> Result<(), DriftError> {
        let ident = SafeIdentifier::new(name).map_err(|e| DriftError::UnsafeName {
            name: name.to_string(),
            reason: e.to_string(),
        })?;

        self.server
            .drop_database(&ident)
            .await
            .map_err(|e| DriftError::Teardown {
                name: name.to_string(),
                cause: e.to_string(),
            })
    }

    /// 管理用接続を閉じる
    pub async fn close(self) -> Result<(), DriftError> {
        self.server.close().await.map_err(|e| DriftError::Connection {
            cause: e.to_string(),
        })
    }
}
