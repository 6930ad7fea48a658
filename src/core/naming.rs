// 命名ポリシー
//
// アプリケーション名、設定ファイル名、一時データベースのマーカーと
// 命名規則の単一ソースを提供します。

/// 現行アプリケーション名
pub const APP_NAME: &str = "pgdrift";

/// 既定の設定ファイル名
pub const CONFIG_FILE: &str = "pgdrift.yaml";

/// 一時データベースに付与するコメント
///
/// 作成時（COMMENT ON DATABASE）と clean 時（pg_shdescription の照合）の
/// 両方がこの定数だけを参照する。文字列を変えると既存の孤児が見つからなくなる。
pub const MARKER_COMMENT: &str = "CREATED BY PGDRIFT - If this database is left behind pgdrift probably crashed and was not able to clean up after itself. Either try running `pgdrift clean` or remove this database manually.";

/// 宣言スキーマ側の一時データベースのサフィックス
pub const SCHEMA_SUFFIX: &str = "schema";

/// マイグレーション側の一時データベースのサフィックス
pub const MIGRATIONS_SUFFIX: &str = "migrations";

/// 一時データベース名を生成
///
/// 形式: `{prefix}_{epoch秒}_{suffix}`
pub fn ephemeral_database_name(prefix: &str, epoch_secs: i64, suffix: &str) -> String {
    format!("{}_{}_{}", prefix, epoch_secs, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ephemeral_database_name() {
        assert_eq!(
            ephemeral_database_name("my_app", 1_700_000_000, SCHEMA_SUFFIX),
            "my_app_1700000000_schema"
        );
        assert_eq!(
            ephemeral_database_name("my_app", 1_700_000_000, MIGRATIONS_SUFFIX),
            "my_app_1700000000_migrations"
        );
    }

    #[test]
    fn test_marker_is_plain_text() {
        // COMMENT ON DATABASE のリテラルに埋め込むため改行を含めない
        assert!(!MARKER_COMMENT.contains('\n'));
        assert!(MARKER_COMMENT.starts_with("CREATED BY PGDRIFT"));
    }
}
