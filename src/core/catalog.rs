// カタログモデル
//
// 一時データベースから読み取ったスキーマ構造（マテリアライズ済みの状態）を表現します。
// 組み込みの差分エンジンはこのモデル同士を比較します。

use std::collections::{BTreeMap, BTreeSet};

/// スキーマ修飾されたテーブル名
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TableName {
    pub schema: String,
    pub name: String,
}

impl TableName {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for TableName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

/// カラム
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// カラム名
    pub name: String,
    /// format_type() で整形された型
    pub data_type: String,
    /// NOT NULL 制約
    pub not_null: bool,
    /// デフォルト式
    pub default: Option<String>,
    /// IDENTITY 列の種類
    pub identity: Option<Identity>,
}

/// IDENTITY 列の生成方式（pg_attribute.attidentity）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    Always,
    ByDefault,
}

impl Identity {
    /// attidentity の1文字から変換（空文字は IDENTITY ではない）
    pub fn from_attidentity(attidentity: &str) -> Option<Self> {
        match attidentity {
            "a" => Some(Identity::Always),
            "d" => Some(Identity::ByDefault),
            _ => None,
        }
    }

    /// GENERATED の後に続くキーワード
    pub fn keyword(&self) -> &'static str {
        match self {
            Identity::Always => "ALWAYS",
            Identity::ByDefault => "BY DEFAULT",
        }
    }
}

/// 制約の種類（pg_constraint.contype）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConstraintKind {
    PrimaryKey,
    Unique,
    Check,
    Exclusion,
    ForeignKey,
    Other,
}

impl ConstraintKind {
    /// contype の1文字から変換
    pub fn from_contype(contype: &str) -> Self {
        match contype {
            "p" => ConstraintKind::PrimaryKey,
            "u" => ConstraintKind::Unique,
            "c" => ConstraintKind::Check,
            "x" => ConstraintKind::Exclusion,
            "f" => ConstraintKind::ForeignKey,
            _ => ConstraintKind::Other,
        }
    }
}

/// テーブル制約
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    pub name: String,
    pub kind: ConstraintKind,
    /// pg_get_constraintdef() の結果
    pub definition: String,
}

/// テーブル
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    /// 定義順のカラム
    pub columns: Vec<Column>,
    /// 制約名をキーにした制約
    pub constraints: BTreeMap<String, Constraint>,
}

impl Table {
    /// 名前でカラムを探す
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// 制約に属さないインデックス
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    pub table: TableName,
    pub name: String,
    /// pg_get_indexdef() の結果
    pub definition: String,
}

/// データベース1つ分のカタログ
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CatalogSnapshot {
    pub schemas: BTreeSet<String>,
    /// (スキーマ名, シーケンス名) をキーにしたシーケンスの型
    pub sequences: BTreeMap<(String, String), String>,
    pub tables: BTreeMap<TableName, Table>,
    /// (スキーマ名, インデックス名) をキーにしたインデックス
    pub indexes: BTreeMap<(String, String), Index>,
}

impl CatalogSnapshot {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_from_attidentity() {
        assert_eq!(Identity::from_attidentity("a"), Some(Identity::Always));
        assert_eq!(Identity::from_attidentity("d"), Some(Identity::ByDefault));
        assert_eq!(Identity::from_attidentity(""), None);
        assert_eq!(Identity::ByDefault.keyword(), "BY DEFAULT");
    }
}
