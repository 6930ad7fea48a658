// Adapters
// PostgreSQLサーバーへのアクセスを抽象化

pub mod catalog_introspector;
pub mod connect_options;
pub mod database_server;
pub mod postgres_server;
pub mod sql_quote;
