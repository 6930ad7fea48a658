/// PostgreSQL統合テスト
///
/// testcontainersを使用して実際のサーバーに対するエンドツーエンドテストを実施します。
///
/// テスト内容:
/// - マイグレーションが宣言スキーマを再現する場合は空のスクリプト
/// - 不足しているカラムがある場合は ADD COLUMN だけを出力
/// - 既存カラムへのIDENTITY付与は ADD GENERATED だけを出力
/// - 実行後に一時データベースが残らないこと
/// - clean がマーカー完全一致のデータベースだけを削除すること
///
/// 注意: このテストはDockerが必要です。

#[cfg(test)]
mod postgres_integration_tests {
    use pgdrift::core::config::DatabaseConfig;
    use pgdrift::core::naming::MARKER_COMMENT;
    use pgdrift::services::admin_connection::AdminConnection;
    use pgdrift::services::diff_engine::CatalogDiffEngine;
    use pgdrift::services::diff_pipeline::{DiffInputs, DiffPipeline};
    use pgdrift::services::sweep_cleaner::SweepCleaner;
    use sqlx::{Connection, PgConnection, Row};
    use std::fs;
    use tempfile::TempDir;
    use testcontainers::{runners::AsyncRunner, ContainerAsync, ImageExt};
    use testcontainers_modules::postgres::Postgres;

    const USERS_WITH_NAME: &str = "CREATE TABLE users (id integer PRIMARY KEY, name text);";
    const USERS_WITHOUT_NAME: &str = "CREATE TABLE users (id integer PRIMARY KEY);";

    /// PostgreSQLコンテナを起動して接続設定を返す
    async fn setup_postgres_container(
    ) -> Result<(ContainerAsync<Postgres>, DatabaseConfig), Box<dyn std::error::Error>> {
        let container = Postgres::default().with_tag("16-alpine").start().await?;

        let host = container.get_host().await?;
        let port = container.get_host_port_ipv4(5432).await?;

        let config = DatabaseConfig {
            url: Some(format!("postgres://postgres:postgres@{}:{}", host, port)),
            dbname: "pgdrift_test".to_string(),
            maintenance_database: "postgres".to_string(),
            ..Default::default()
        };

        Ok((container, config))
    }

    async fn maintenance_connection(config: &DatabaseConfig) -> PgConnection {
        let url = format!("{}/postgres", config.url.as_deref().unwrap());
        PgConnection::connect(&url).await.unwrap()
    }

    /// マーカー付きデータベースの数
    async fn marked_database_count(conn: &mut PgConnection) -> i64 {
        sqlx::query(
            "SELECT count(*) FROM pg_database d \
             JOIN pg_shdescription s ON s.objoid = d.oid \
             AND s.classoid = 'pg_database'::regclass \
             WHERE s.description = $1",
        )
        .bind(MARKER_COMMENT)
        .fetch_one(conn)
        .await
        .unwrap()
        .get::<i64, _>(0)
    }

    fn setup_project(schema: &str, migrations: &[(&str, &str)]) -> (TempDir, DiffInputs) {
        let temp_dir = TempDir::new().unwrap();
        let schema_file = temp_dir.path().join("schema.sql");
        fs::write(&schema_file, schema).unwrap();

        let migrations_dir = temp_dir.path().join("migrations");
        fs::create_dir(&migrations_dir).unwrap();
        for (name, sql) in migrations {
            fs::write(migrations_dir.join(name), sql).unwrap();
        }

        (
            temp_dir,
            DiffInputs {
                schema_file,
                migrations_dir,
            },
        )
    }

    #[tokio::test]
    #[ignore] // Docker必須のため、通常のテスト実行ではスキップ
    async fn test_identical_schema_produces_empty_script() {
        let (_container, config) = setup_postgres_container().await.unwrap();
        let (_dir, inputs) = setup_project(USERS_WITH_NAME, &[("001-users.sql", USERS_WITH_NAME)]);

        let admin = AdminConnection::connect(&config).await.unwrap();
        let result = DiffPipeline::new(CatalogDiffEngine::new())
            .run(admin, &inputs)
            .await
            .unwrap();

        assert_eq!(result.to_script(), "");

        let mut conn = maintenance_connection(&config).await;
        assert_eq!(marked_database_count(&mut conn).await, 0);
    }

    #[tokio::test]
    #[ignore] // Docker必須のため、通常のテスト実行ではスキップ
    async fn test_missing_column_produces_single_add_column() {
        let (_container, config) = setup_postgres_container().await.unwrap();
        let (_dir, inputs) = setup_project(
            USERS_WITH_NAME,
            &[("001-users.sql", USERS_WITHOUT_NAME)],
        );

        let admin = AdminConnection::connect(&config).await.unwrap();
        let result = DiffPipeline::new(CatalogDiffEngine::new())
            .run(admin, &inputs)
            .await
            .unwrap();

        assert_eq!(
            result.statements(),
            &["ALTER TABLE \"public\".\"users\" ADD COLUMN \"name\" text;".to_string()]
        );

        let mut conn = maintenance_connection(&config).await;
        assert_eq!(marked_database_count(&mut conn).await, 0);
    }

    #[tokio::test]
    #[ignore] // Docker必須のため、通常のテスト実行ではスキップ
    async fn test_identity_added_to_existing_column() {
        let (_container, config) = setup_postgres_container().await.unwrap();
        let (_dir, inputs) = setup_project(
            "CREATE TABLE users (id integer GENERATED ALWAYS AS IDENTITY PRIMARY KEY);",
            &[("001-users.sql", "CREATE TABLE users (id integer NOT NULL PRIMARY KEY);")],
        );

        let admin = AdminConnection::connect(&config).await.unwrap();
        let result = DiffPipeline::new(CatalogDiffEngine::new())
            .run(admin, &inputs)
            .await
            .unwrap();

        // IDENTITYが所有するシーケンスは CREATE SEQUENCE として出力されない
        assert_eq!(
            result.statements(),
            &[
                "ALTER TABLE \"public\".\"users\" ALTER COLUMN \"id\" ADD GENERATED ALWAYS AS IDENTITY;"
                    .to_string()
            ]
        );
    }

    #[tokio::test]
    #[ignore] // Docker必須のため、通常のテスト実行ではスキップ
    async fn test_broken_migration_leaves_nothing_behind() {
        let (_container, config) = setup_postgres_container().await.unwrap();
        let (_dir, inputs) = setup_project(
            USERS_WITH_NAME,
            &[
                ("001-users.sql", USERS_WITHOUT_NAME),
                ("002-broken.sql", "ALTER TABLE users ADD COLUMNN name text;"),
            ],
        );

        let admin = AdminConnection::connect(&config).await.unwrap();
        let err = DiffPipeline::new(CatalogDiffEngine::new())
            .run(admin, &inputs)
            .await
            .unwrap_err();

        assert!(err.is_apply());
        assert!(err.to_string().contains("002-broken.sql"));

        let mut conn = maintenance_connection(&config).await;
        assert_eq!(marked_database_count(&mut conn).await, 0);
    }

    #[tokio::test]
    #[ignore] // Docker必須のため、通常のテスト実行ではスキップ
    async fn test_clean_drops_only_exact_marker() {
        let (_container, config) = setup_postgres_container().await.unwrap();
        let mut conn = maintenance_connection(&config).await;

        // CREATE DATABASE はトランザクション内で実行できないので1文ずつ送る
        let marker = MARKER_COMMENT.replace('\'', "''");
        let statements = [
            "CREATE DATABASE orphan_1_schema".to_string(),
            format!("COMMENT ON DATABASE orphan_1_schema IS '{}'", marker),
            "CREATE DATABASE lookalike".to_string(),
            format!("COMMENT ON DATABASE lookalike IS '{}.'", marker),
        ];
        for sql in &statements {
            sqlx::raw_sql(sql).execute(&mut conn).await.unwrap();
        }

        let admin = AdminConnection::connect(&config).await.unwrap();
        let dropped = SweepCleaner::new().run(admin).await.unwrap();
        assert_eq!(dropped, vec!["orphan_1_schema".to_string()]);

        let remaining: Vec<String> = sqlx::query_scalar(
            "SELECT datname FROM pg_database WHERE datname IN ('orphan_1_schema', 'lookalike')",
        )
        .fetch_all(&mut conn)
        .await
        .unwrap();
        assert_eq!(remaining, vec!["lookalike".to_string()]);
    }
}
