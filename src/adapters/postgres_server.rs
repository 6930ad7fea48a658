// PostgreSQLサーバーアダプター
//
// SQLxを使用して ServerControl / DatabaseSession を実装します。
// 管理用接続は既存の保守用データベースに張った単一の PgConnection で、
// トランザクションは一切開かないため各文は autocommit で確定します。

use crate::adapters::connect_options::build_connect_options;
use crate::adapters::database_server::{DatabaseSession, ServerControl};
use crate::adapters::sql_quote::quote_literal;
use crate::core::config::DatabaseConfig;
use crate::core::error::DatabaseError;
use crate::core::identifier::SafeIdentifier;
use async_trait::async_trait;
use sqlx::{ConnectOptions, Executor, PgConnection};
use std::time::Duration;
use tracing::debug;

/// セッション終了待ちのポーリング間隔
const TERMINATE_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// セッション終了待ちの最大ポーリング回数
const TERMINATE_MAX_POLLS: u32 = 100;

/// 他のセッション（自分以外）の切断
const TERMINATE_BACKENDS_SQL: &str = r#"
    SELECT pg_terminate_backend(pid)
    FROM pg_stat_activity
    WHERE datname = $1 AND pid <> pg_backend_pid()
"#;

/// 残っているセッション数
const COUNT_BACKENDS_SQL: &str = r#"
    SELECT count(*)
    FROM pg_stat_activity
    WHERE datname = $1 AND pid <> pg_backend_pid()
"#;

/// コメントが完全一致するデータベース
const DATABASES_WITH_COMMENT_SQL: &str = r#"
    SELECT db.datname::text
    FROM pg_database db
    JOIN pg_shdescription dsc
        ON dsc.objoid = db.oid AND dsc.classoid = 'pg_database'::regclass
    WHERE dsc.description = $1
    ORDER BY db.datname
"#;

/// PostgreSQLサーバーへの管理用接続
pub struct PostgresServer {
    conn: PgConnection,
    config: DatabaseConfig,
}

impl PostgresServer {
    /// 保守用データベースに接続
    ///
    /// サーバーに到達できない、または認証に失敗した場合は何も作成せずに失敗する。
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let options = build_connect_options(config, &config.maintenance_database)?;

        let conn = options
            .connect()
            .await
            .map_err(|e| DatabaseError::Connection {
                message: format!(
                    "Failed to connect to maintenance database '{}'",
                    config.maintenance_database
                ),
                cause: e.to_string(),
            })?;

        debug!(database = %config.maintenance_database, "Admin connection established");

        Ok(Self {
            conn,
            config: config.clone(),
        })
    }

    async fn execute_admin(&mut self, sql: &str) -> Result<(), DatabaseError> {
        self.conn
            .execute(sqlx::raw_sql(sql))
            .await
            .map(|_| ())
            .map_err(|e| DatabaseError::Query {
                message: e.to_string(),
                sql: Some(sql.to_string()),
            })
    }

    async fn count_backends(&mut self, name: &SafeIdentifier) -> Result<i64, DatabaseError> {
        sqlx::query_scalar::<_, i64>(COUNT_BACKENDS_SQL)
            .bind(name.as_str())
            .fetch_one(&mut self.conn)
            .await
            .map_err(|e| DatabaseError::Query {
                message: e.to_string(),
                sql: Some(COUNT_BACKENDS_SQL.to_string()),
            })
    }
}

#[async_trait]
impl DatabaseSession for PgConnection {
    async fn execute_script(&mut self, sql: &str) -> Result<(), DatabaseError> {
        // 複数文を含むため simple query プロトコルで送る
        Executor::execute(&mut *self, sqlx::raw_sql(sql))
            .await
            .map(|_| ())
            .map_err(|e| DatabaseError::Query {
                message: e.to_string(),
                sql: None,
            })
    }

    async fn close(self) -> Result<(), DatabaseError> {
        sqlx::Connection::close(self)
            .await
            .map_err(|e| DatabaseError::Connection {
                message: "Failed to close session".to_string(),
                cause: e.to_string(),
            })
    }
}

#[async_trait]
impl ServerControl for PostgresServer {
    type Session = PgConnection;

    async fn create_database(&mut self, name: &SafeIdentifier) -> Result<(), DatabaseError> {
        let sql = format!("CREATE DATABASE {}", name.quoted());
        self.execute_admin(&sql).await
    }

    async fn comment_on_database(
        &mut self,
        name: &SafeIdentifier,
        comment: &str,
    ) -> Result<(), DatabaseError> {
        let sql = format!(
            "COMMENT ON DATABASE {} IS {}",
            name.quoted(),
            quote_literal(comment)
        );
        self.execute_admin(&sql).await
    }

    async fn open_session(&mut self, name: &SafeIdentifier) -> Result<PgConnection, DatabaseError> {
        let options = build_connect_options(&self.config, name.as_str())?;
        options
            .connect()
            .await
            .map_err(|e| DatabaseError::Connection {
                message: format!("Failed to connect to database '{}'", name),
                cause: e.to_string(),
            })
    }

    async fn terminate_backends(&mut self, name: &SafeIdentifier) -> Result<u64, DatabaseError> {
        let results = sqlx::query_scalar::<_, bool>(TERMINATE_BACKENDS_SQL)
            .bind(name.as_str())
            .fetch_all(&mut self.conn)
            .await
            .map_err(|e| DatabaseError::Query {
                message: e.to_string(),
                sql: Some(TERMINATE_BACKENDS_SQL.to_string()),
            })?;
        let terminated = results.iter().filter(|signalled| **signalled).count() as u64;

        // pg_terminate_backend はシグナルを送るだけなので、実際に消えるまで待つ
        for _ in 0..TERMINATE_MAX_POLLS {
            if self.count_backends(name).await? == 0 {
                break;
            }
            tokio::time::sleep(TERMINATE_POLL_INTERVAL).await;
        }

        debug!(database = %name, terminated, "Terminated backends");
        Ok(terminated)
    }

    async fn drop_database(&mut self, name: &SafeIdentifier) -> Result<(), DatabaseError> {
        let sql = format!("DROP DATABASE {}", name.quoted());
        self.execute_admin(&sql).await
    }

    async fn databases_with_comment(
        &mut self,
        comment: &str,
    ) -> Result<Vec<String>, DatabaseError> {
        sqlx::query_scalar::<_, String>(DATABASES_WITH_COMMENT_SQL)
            .bind(comment)
            .fetch_all(&mut self.conn)
            .await
            .map_err(|e| DatabaseError::Query {
                message: e.to_string(),
                sql: Some(DATABASES_WITH_COMMENT_SQL.to_string()),
            })
    }

    async fn close(self) -> Result<(), DatabaseError> {
        sqlx::Connection::close(self.conn)
            .await
            .map_err(|e| DatabaseError::Connection {
                message: "Failed to close admin connection".to_string(),
                cause: e.to_string(),
            })
    }
}
