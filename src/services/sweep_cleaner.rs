// 孤児データベースの掃除
//
// マーカーが完全一致するデータベースを順に削除します。
// 1件でも失敗したらそこで止め、残りは手を付けずにエラーを返します。

use crate::adapters::database_server::ServerControl;
use crate::core::error::{settle, DriftError};
use crate::services::admin_connection::AdminConnection;
use tracing::info;

/// 孤児データベースの掃除
#[derive(Debug, Clone, Default)]
pub struct SweepCleaner;

impl SweepCleaner {
    pub fn new() -> Self {
        Self
    }

    /// 孤児を削除し、削除した名前を返す
    ///
    /// 管理用接続の所有権を受け取り、結果にかかわらず閉じて返る。
    pub async fn run<S: ServerControl>(
        &self,
        mut admin: AdminConnection<S>,
    ) -> Result<Vec<String>, DriftError> {
        let outcome = self.sweep(&mut admin).await;
        let closed = admin.close().await;
        settle(outcome, closed)
    }

    async fn sweep<S: ServerControl>(
        &self,
        admin: &mut AdminConnection<S>,
    ) -> Result<Vec<String>, DriftError> {
        let orphans = admin.list_orphans().await?;
        let mut dropped = Vec::with_capacity(orphans.len());

        for orphan in orphans {
            info!("Dropping {} ...", orphan.name);
            admin.drop_by_name(&orphan.name).await?;
            dropped.push(orphan.name);
        }

        info!(count = dropped.len(), "Clean finished");
        Ok(dropped)
    }
}
