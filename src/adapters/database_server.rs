// データベースサーバー制御インターフェース
//
// 管理用接続で行う操作（作成・コメント・切断・削除・孤児の検索）と、
// 一時データベースへの作業用セッションを抽象化します。
// テスト時にはサーバーなしのモック実装に差し替えられます。

use crate::core::error::DatabaseError;
use crate::core::identifier::SafeIdentifier;
use async_trait::async_trait;

/// 一時データベースへの作業用セッション
#[async_trait]
pub trait DatabaseSession: Send {
    /// 複数の文を含み得るスクリプトをそのまま実行
    async fn execute_script(&mut self, sql: &str) -> Result<(), DatabaseError>;

    /// セッションを閉じる
    async fn close(self) -> Result<(), DatabaseError>
    where
        Self: Sized;
}

/// 管理用接続（autocommit）で行うサーバー操作
///
/// CREATE/DROP DATABASE はトランザクション内で実行できないため、
/// 実装はすべての文を即座に単独で確定させること。
#[async_trait]
pub trait ServerControl: Send {
    /// 作業用セッションの型
    type Session: DatabaseSession;

    /// CREATE DATABASE
    async fn create_database(&mut self, name: &SafeIdentifier) -> Result<(), DatabaseError>;

    /// COMMENT ON DATABASE
    async fn comment_on_database(
        &mut self,
        name: &SafeIdentifier,
        comment: &str,
    ) -> Result<(), DatabaseError>;

    /// 指定したデータベースへの新しいセッションを開く
    async fn open_session(&mut self, name: &SafeIdentifier) -> Result<Self::Session, DatabaseError>;

    /// 指定したデータベースに接続している他のセッションをすべて切断
    ///
    /// 切断したセッション数を返す。
    async fn terminate_backends(&mut self, name: &SafeIdentifier) -> Result<u64, DatabaseError>;

    /// DROP DATABASE
    async fn drop_database(&mut self, name: &SafeIdentifier) -> Result<(), DatabaseError>;

    /// コメントが完全一致するデータベース名の一覧
    async fn databases_with_comment(&mut self, comment: &str) -> Result<Vec<String>, DatabaseError>;

    /// 管理用接続を閉じる
    async fn close(self) -> Result<(), DatabaseError>
    where
        Self: Sized;
}
