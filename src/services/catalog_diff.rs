// カタログ差分検出サービス
//
// 2つの CatalogSnapshot を比較し、source を target の状態にするDDL文を生成します。
// 文の順序は依存関係を壊さないように固定しています:
//   CREATE SCHEMA → CREATE SEQUENCE → DROP CONSTRAINT → DROP INDEX → CREATE TABLE
//   → カラム変更 → ADD CONSTRAINT → CREATE INDEX → DROP TABLE → DROP SEQUENCE → DROP SCHEMA

use crate::adapters::sql_quote::{quote_identifier, quote_table};
use crate::core::catalog::{
    CatalogSnapshot, Column, Constraint, ConstraintKind, Table, TableName,
};

/// 生成されたDDL文
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DdlStatement {
    pub sql: String,
    /// データを失う可能性がある文か
    pub destructive: bool,
}

impl DdlStatement {
    fn safe(sql: String) -> Self {
        Self {
            sql,
            destructive: false,
        }
    }

    fn destructive(sql: String) -> Self {
        Self {
            sql,
            destructive: true,
        }
    }
}

/// カタログ差分検出サービス
#[derive(Debug, Clone, Default)]
pub struct CatalogDiffer;

impl CatalogDiffer {
    pub fn new() -> Self {
        Self
    }

    /// source を target にするDDL文を生成
    pub fn diff(&self, source: &CatalogSnapshot, target: &CatalogSnapshot) -> Vec<DdlStatement> {
        let mut statements = Vec::new();

        // スキーマ作成
        for schema in target.schemas.difference(&source.schemas) {
            statements.push(DdlStatement::safe(format!(
                "CREATE SCHEMA {};",
                quote_identifier(schema)
            )));
        }

        // シーケンス作成
        for ((schema, name), data_type) in &target.sequences {
            if !source.sequences.contains_key(&(schema.clone(), name.clone())) {
                statements.push(DdlStatement::safe(format!(
                    "CREATE SEQUENCE {}.{} AS {};",
                    quote_identifier(schema),
                    quote_identifier(name),
                    data_type
                )));
            }
        }

        // 制約の削除（外部キーを先に）
        let mut dropped_constraints = Vec::new();
        for (table_name, source_table) in &source.tables {
            let target_table = target.tables.get(table_name);
            for constraint in source_table.constraints.values() {
                let kept = target_table
                    .and_then(|t| t.constraints.get(&constraint.name))
                    .is_some_and(|c| c == constraint);
                let table_dropped = target_table.is_none();
                // 削除されるテーブルの制約は DROP TABLE に任せるが、外部キーは先に外す
                if !kept && (!table_dropped || constraint.kind == ConstraintKind::ForeignKey) {
                    dropped_constraints.push((table_name, constraint));
                }
            }
        }
        dropped_constraints.sort_by_key(|(_, c)| c.kind != ConstraintKind::ForeignKey);
        for (table_name, constraint) in dropped_constraints {
            statements.push(DdlStatement::safe(format!(
                "ALTER TABLE {} DROP CONSTRAINT {};",
                quote_table(table_name),
                quote_identifier(&constraint.name)
            )));
        }

        // インデックスの削除
        for (key, index) in &source.indexes {
            if !target.tables.contains_key(&index.table) {
                continue;
            }
            if target.indexes.get(key) != Some(index) {
                statements.push(DdlStatement::safe(format!(
                    "DROP INDEX {}.{};",
                    quote_identifier(&key.0),
                    quote_identifier(&key.1)
                )));
            }
        }

        // テーブル作成
        for (table_name, table) in &target.tables {
            if !source.tables.contains_key(table_name) {
                statements.push(DdlStatement::safe(create_table_sql(table_name, table)));
            }
        }

        // カラムの変更
        for (table_name, target_table) in &target.tables {
            if let Some(source_table) = source.tables.get(table_name) {
                statements.extend(self.diff_columns(table_name, source_table, target_table));
            }
        }

        // 制約の追加（外部キーを最後に）
        let mut added_constraints = Vec::new();
        for (table_name, target_table) in &target.tables {
            let source_table = source.tables.get(table_name);
            for constraint in target_table.constraints.values() {
                let exists = source_table
                    .and_then(|t| t.constraints.get(&constraint.name))
                    .is_some_and(|c| c == constraint);
                if !exists {
                    added_constraints.push((table_name, constraint));
                }
            }
        }
        added_constraints.sort_by_key(|(_, c)| c.kind == ConstraintKind::ForeignKey);
        for (table_name, constraint) in added_constraints {
            statements.push(DdlStatement::safe(add_constraint_sql(table_name, constraint)));
        }

        // インデックス作成
        for (key, index) in &target.indexes {
            if source.indexes.get(key) != Some(index) {
                statements.push(DdlStatement::safe(format!("{};", index.definition)));
            }
        }

        // テーブル削除
        for table_name in source.tables.keys() {
            if !target.tables.contains_key(table_name) {
                statements.push(DdlStatement::destructive(format!(
                    "DROP TABLE {};",
                    quote_table(table_name)
                )));
            }
        }

        // シーケンス削除（テーブルが所有していた場合は既に消えている）
        for (schema, name) in source.sequences.keys() {
            if !target.sequences.contains_key(&(schema.clone(), name.clone())) {
                statements.push(DdlStatement::destructive(format!(
                    "DROP SEQUENCE IF EXISTS {}.{};",
                    quote_identifier(schema),
                    quote_identifier(name)
                )));
            }
        }

        // スキーマ削除
        for schema in source.schemas.difference(&target.schemas) {
            statements.push(DdlStatement::destructive(format!(
                "DROP SCHEMA {};",
                quote_identifier(schema)
            )));
        }

        statements
    }

    /// 共通テーブルのカラム差分
    fn diff_columns(
        &self,
        table_name: &TableName,
        source: &Table,
        target: &Table,
    ) -> Vec<DdlStatement> {
        let table = quote_table(table_name);
        let mut statements = Vec::new();

        for column in &target.columns {
            let Some(existing) = source.column(&column.name) else {
                statements.push(DdlStatement::safe(format!(
                    "ALTER TABLE {} ADD COLUMN {};",
                    table,
                    column_definition(column)
                )));
                continue;
            };

            let name = quote_identifier(&column.name);

            // IDENTITY を外すのは型やNOT NULLの変更より先
            if existing.identity.is_some() && column.identity.is_none() {
                statements.push(DdlStatement::safe(format!(
                    "ALTER TABLE {} ALTER COLUMN {} DROP IDENTITY IF EXISTS;",
                    table, name
                )));
            }

            if existing.data_type != column.data_type {
                statements.push(DdlStatement::destructive(format!(
                    "ALTER TABLE {} ALTER COLUMN {} TYPE {} USING {}::{};",
                    table, name, column.data_type, name, column.data_type
                )));
            }

            if existing.default != column.default {
                let sql = match &column.default {
                    Some(default) => format!(
                        "ALTER TABLE {} ALTER COLUMN {} SET DEFAULT {};",
                        table, name, default
                    ),
                    None => format!("ALTER TABLE {} ALTER COLUMN {} DROP DEFAULT;", table, name),
                };
                statements.push(DdlStatement::safe(sql));
            }

            if existing.not_null != column.not_null {
                let action = if column.not_null {
                    "SET NOT NULL"
                } else {
                    "DROP NOT NULL"
                };
                statements.push(DdlStatement::safe(format!(
                    "ALTER TABLE {} ALTER COLUMN {} {};",
                    table, name, action
                )));
            }

            // IDENTITY の付与には NOT NULL が必要なので最後に行う
            match (existing.identity, column.identity) {
                (None, Some(identity)) => statements.push(DdlStatement::safe(format!(
                    "ALTER TABLE {} ALTER COLUMN {} ADD GENERATED {} AS IDENTITY;",
                    table,
                    name,
                    identity.keyword()
                ))),
                (Some(from), Some(to)) if from != to => {
                    statements.push(DdlStatement::safe(format!(
                        "ALTER TABLE {} ALTER COLUMN {} SET GENERATED {};",
                        table,
                        name,
                        to.keyword()
                    )))
                }
                _ => {}
            }
        }

        for column in &source.columns {
            if target.column(&column.name).is_none() {
                statements.push(DdlStatement::destructive(format!(
                    "ALTER TABLE {} DROP COLUMN {};",
                    table,
                    quote_identifier(&column.name)
                )));
            }
        }

        statements
    }
}

/// カラム定義
fn column_definition(column: &Column) -> String {
    let mut parts = vec![quote_identifier(&column.name), column.data_type.clone()];

    if let Some(identity) = column.identity {
        parts.push(format!("GENERATED {} AS IDENTITY", identity.keyword()));
    }

    if let Some(default) = &column.default {
        parts.push(format!("DEFAULT {}", default));
    }

    if column.not_null {
        parts.push("NOT NULL".to_string());
    }

    parts.join(" ")
}

/// CREATE TABLE（制約は ADD CONSTRAINT で別に追加する）
fn create_table_sql(table_name: &TableName, table: &Table) -> String {
    if table.columns.is_empty() {
        return format!("CREATE TABLE {} ();", quote_table(table_name));
    }

    let columns = table
        .columns
        .iter()
        .map(|c| format!("    {}", column_definition(c)))
        .collect::<Vec<_>>()
        .join(",\n");

    format!("CREATE TABLE {} (\n{}\n);", quote_table(table_name), columns)
}

fn add_constraint_sql(table_name: &TableName, constraint: &Constraint) -> String {
    format!(
        "ALTER TABLE {} ADD CONSTRAINT {} {};",
        quote_table(table_name),
        quote_identifier(&constraint.name),
        constraint.definition
    )
}
