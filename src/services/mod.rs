// Services Layer
// 一時データベースの管理、スキーマの展開、差分と掃除のオーケストレーション

pub mod admin_connection;
pub mod catalog_diff;
pub mod config_loader;
pub mod diff_engine;
pub mod diff_pipeline;
pub mod schema_materializer;
pub mod sweep_cleaner;
