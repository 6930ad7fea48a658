// カタログイントロスペクター
//
// 一時データベースの pg_catalog からスキーマ構造を読み取り、
// CatalogSnapshot に詰め替えます。システムスキーマは対象外です。

use crate::core::catalog::{
    CatalogSnapshot, Column, Constraint, ConstraintKind, Identity, Index, Table, TableName,
};
use anyhow::{Context, Result};
use sqlx::PgConnection;

/// ユーザースキーマだけに絞り込む条件（n は pg_namespace）
///
/// `pg_` で始まるスキーマ名はユーザーが作れないため、これで pg_catalog や
/// pg_toast も除外される。
const USER_SCHEMA_FILTER: &str =
    "n.nspname <> 'information_schema' AND n.nspname NOT LIKE 'pg\\_%'";

/// PostgreSQL用イントロスペクター
#[derive(Debug, Clone, Default)]
pub struct PostgresCatalogIntrospector;

impl PostgresCatalogIntrospector {
    /// データベース全体のスナップショットを取得
    pub async fn snapshot(&self, conn: &mut PgConnection) -> Result<CatalogSnapshot> {
        let mut snapshot = CatalogSnapshot::new();

        for schema in self.get_schemas(conn).await? {
            snapshot.schemas.insert(schema);
        }

        for (schema, sequence, data_type) in self.get_sequences(conn).await? {
            snapshot.sequences.insert((schema, sequence), data_type);
        }

        for table in self.get_tables(conn).await? {
            snapshot.tables.insert(table, Table::default());
        }

        for (table, column) in self.get_columns(conn).await? {
            snapshot.tables.entry(table).or_default().columns.push(column);
        }

        for (table, constraint) in self.get_constraints(conn).await? {
            snapshot
                .tables
                .entry(table)
                .or_default()
                .constraints
                .insert(constraint.name.clone(), constraint);
        }

        for index in self.get_indexes(conn).await? {
            snapshot
                .indexes
                .insert((index.table.schema.clone(), index.name.clone()), index);
        }

        Ok(snapshot)
    }

    async fn get_schemas(&self, conn: &mut PgConnection) -> Result<Vec<String>> {
        let sql = format!(
            "SELECT n.nspname::text FROM pg_namespace n WHERE {} ORDER BY 1",
            USER_SCHEMA_FILTER
        );

        sqlx::query_scalar::<_, String>(&sql)
            .fetch_all(&mut *conn)
            .await
            .with_context(|| "Failed to read schemas")
    }

    async fn get_sequences(
        &self,
        conn: &mut PgConnection,
    ) -> Result<Vec<(String, String, String)>> {
        // IDENTITY 列が内部で持つシーケンス（deptype 'i'）は列側で扱う
        let sql = format!(
            r#"
            SELECT n.nspname::text, c.relname::text, format_type(s.seqtypid, NULL)
            FROM pg_sequence s
            JOIN pg_class c ON c.oid = s.seqrelid
            JOIN pg_namespace n ON n.oid = c.relnamespace
            WHERE {}
                AND NOT EXISTS (
                    SELECT 1 FROM pg_depend dep
                    WHERE dep.classid = 'pg_class'::regclass
                        AND dep.objid = s.seqrelid
                        AND dep.deptype = 'i'
                )
            ORDER BY 1, 2
            "#,
            USER_SCHEMA_FILTER
        );

        sqlx::query_as::<_, (String, String, String)>(&sql)
            .fetch_all(&mut *conn)
            .await
            .with_context(|| "Failed to read sequences")
    }

    async fn get_tables(&self, conn: &mut PgConnection) -> Result<Vec<TableName>> {
        let sql = format!(
            r#"
            SELECT n.nspname::text, c.relname::text
            FROM pg_class c
            JOIN pg_namespace n ON n.oid = c.relnamespace
            WHERE c.relkind IN ('r', 'p') AND {}
            ORDER BY 1, 2
            "#,
            USER_SCHEMA_FILTER
        );

        let rows = sqlx::query_as::<_, (String, String)>(&sql)
            .fetch_all(&mut *conn)
            .await
            .with_context(|| "Failed to read tables")?;

        Ok(rows
            .into_iter()
            .map(|(schema, name)| TableName::new(schema, name))
            .collect())
    }

    async fn get_columns(&self, conn: &mut PgConnection) -> Result<Vec<(TableName, Column)>> {
        let sql = format!(
            r#"
            SELECT
                n.nspname::text,
                c.relname::text,
                a.attname::text,
                format_type(a.atttypid, a.atttypmod),
                a.attnotnull,
                pg_get_expr(d.adbin, d.adrelid),
                a.attidentity::text
            FROM pg_attribute a
            JOIN pg_class c ON c.oid = a.attrelid
            JOIN pg_namespace n ON n.oid = c.relnamespace
            LEFT JOIN pg_attrdef d ON d.adrelid = a.attrelid AND d.adnum = a.attnum
            WHERE c.relkind IN ('r', 'p')
                AND a.attnum > 0
                AND NOT a.attisdropped
                AND {}
            ORDER BY n.nspname, c.relname, a.attnum
            "#,
            USER_SCHEMA_FILTER
        );

        type ColumnRow = (String, String, String, String, bool, Option<String>, String);
        let rows = sqlx::query_as::<_, ColumnRow>(&sql)
            .fetch_all(&mut *conn)
            .await
            .with_context(|| "Failed to read columns")?;

        Ok(rows
            .into_iter()
            .map(|(schema, table, name, data_type, not_null, default, identity)| {
                (
                    TableName::new(schema, table),
                    Column {
                        name,
                        data_type,
                        not_null,
                        default,
                        identity: Identity::from_attidentity(&identity),
                    },
                )
            })
            .collect())
    }

    async fn get_constraints(
        &self,
        conn: &mut PgConnection,
    ) -> Result<Vec<(TableName, Constraint)>> {
        // NOT NULL は attnotnull で比較するので contype 'n' は読まない
        let sql = format!(
            r#"
            SELECT
                n.nspname::text,
                c.relname::text,
                con.conname::text,
                con.contype::text,
                pg_get_constraintdef(con.oid)
            FROM pg_constraint con
            JOIN pg_class c ON c.oid = con.conrelid
            JOIN pg_namespace n ON n.oid = c.relnamespace
            WHERE con.conrelid <> 0
                AND con.contype <> 'n'
                AND {}
            ORDER BY 1, 2, 3
            "#,
            USER_SCHEMA_FILTER
        );

        let rows = sqlx::query_as::<_, (String, String, String, String, String)>(&sql)
            .fetch_all(&mut *conn)
            .await
            .with_context(|| "Failed to read constraints")?;

        Ok(rows
            .into_iter()
            .map(|(schema, table, name, contype, definition)| {
                (
                    TableName::new(schema, table),
                    Constraint {
                        name,
                        kind: ConstraintKind::from_contype(&contype),
                        definition,
                    },
                )
            })
            .collect())
    }

    async fn get_indexes(&self, conn: &mut PgConnection) -> Result<Vec<Index>> {
        // 主キー・ユニーク・排他制約が所有するインデックスは制約側で扱う
        let sql = format!(
            r#"
            SELECT
                n.nspname::text,
                t.relname::text,
                i.relname::text,
                pg_get_indexdef(i.oid)
            FROM pg_index ix
            JOIN pg_class i ON i.oid = ix.indexrelid
            JOIN pg_class t ON t.oid = ix.indrelid
            JOIN pg_namespace n ON n.oid = t.relnamespace
            WHERE {}
                AND NOT EXISTS (
                    SELECT 1 FROM pg_constraint con
                    WHERE con.conindid = ix.indexrelid AND con.contype IN ('p', 'u', 'x')
                )
            ORDER BY 1, 3
            "#,
            USER_SCHEMA_FILTER
        );

        let rows = sqlx::query_as::<_, (String, String, String, String)>(&sql)
            .fetch_all(&mut *conn)
            .await
            .with_context(|| "Failed to read indexes")?;

        Ok(rows
            .into_iter()
            .map(|(schema, table, name, definition)| Index {
                table: TableName::new(schema, table),
                name,
                definition,
            })
            .collect())
    }
}
