// SQLクォートユーティリティ
//
// 生成するDDLに埋め込む識別子と文字列リテラルのクォート関数を提供します。

use crate::core::catalog::TableName;

/// PostgreSQL用識別子クォート（ダブルクォート）
///
/// 識別子内のダブルクォートは二重にエスケープします。
///
/// # Examples
/// ```
/// use pgdrift::adapters::sql_quote::quote_identifier;
/// assert_eq!(quote_identifier("users"), r#""users""#);
/// assert_eq!(quote_identifier(r#"table"name"#), r#""table""name""#);
/// ```
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// スキーマ修飾付きのテーブル名
pub fn quote_table(table: &TableName) -> String {
    format!(
        "{}.{}",
        quote_identifier(&table.schema),
        quote_identifier(&table.name)
    )
}

/// 文字列リテラルクォート（シングルクォート）
///
/// # Examples
/// ```
/// use pgdrift::adapters::sql_quote::quote_literal;
/// assert_eq!(quote_literal("it's"), "'it''s'");
/// ```
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier_simple() {
        assert_eq!(quote_identifier("users"), r#""users""#);
        assert_eq!(quote_identifier("select"), r#""select""#);
    }

    #[test]
    fn test_quote_identifier_with_embedded_quote() {
        // 単一の " は "" にエスケープされ、外側のクォートと合わせて """" になる
        assert_eq!(quote_identifier("\""), "\"\"\"\"");
        assert_eq!(quote_identifier(r#"a"b"c"#), r#""a""b""c""#);
    }

    #[test]
    fn test_quote_table() {
        let table = TableName::new("public", "Users");
        assert_eq!(quote_table(&table), r#""public"."Users""#);
    }

    #[test]
    fn test_quote_literal() {
        assert_eq!(quote_literal(""), "''");
        assert_eq!(quote_literal("plain"), "'plain'");
        assert_eq!(quote_literal("a'b''c"), "'a''b''''c'");
    }
}
