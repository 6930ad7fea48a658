// pgdriftライブラリのエントリーポイント
//
// モジュール構造:
// - cli: CLIレイヤー（ユーザー入力の受付とコマンドルーティング）
// - core: コアドメイン（命名、識別子、設定、エラー、カタログ型）
// - adapters: PostgreSQLサーバーへのアクセスを抽象化
// - services: 一時データベースの管理と差分・掃除のオーケストレーション

pub mod cli;
pub mod core;
pub mod adapters;
pub mod services;
