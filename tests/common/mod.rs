//! サーバーなしで動くテスト用のフェイク実装
//!
//! FakeServer はサーバー上のデータベースとコメントをメモリ上に持ち、
//! 呼び出された操作をイベントログに記録します。
#![allow(dead_code)]

use anyhow::anyhow;
use async_trait::async_trait;
use pgdrift::adapters::database_server::{DatabaseSession, ServerControl};
use pgdrift::core::error::DatabaseError;
use pgdrift::core::identifier::SafeIdentifier;
use pgdrift::core::schema_diff::DiffOptions;
use pgdrift::services::admin_connection::AdminConnection;
use pgdrift::services::diff_engine::DiffEngine;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

/// フェイクサーバーの共有状態
#[derive(Debug, Default)]
pub struct FakeState {
    /// データベース名 -> コメント
    pub databases: BTreeMap<String, Option<String>>,
    /// 呼び出された操作
    pub events: Vec<String>,
    /// 実行されたスクリプト（データベース名, SQL）
    pub scripts: Vec<(String, String)>,
    /// 名前がこの接尾辞で終わるデータベースの作成に失敗する
    pub fail_create_suffix: Option<String>,
    /// コメントの付与に失敗する
    pub fail_comment: bool,
    /// 名前がこの接尾辞で終わるデータベースの削除に失敗する
    pub fail_drop_suffix: Option<String>,
    /// このトークンを含むスクリプトの実行に失敗する
    pub fail_script_token: Option<String>,
    /// 管理用接続が閉じられたか
    pub closed: bool,
}

/// ServerControl のフェイク
#[derive(Debug, Clone, Default)]
pub struct FakeServer {
    pub state: Arc<Mutex<FakeState>>,
}

impl FakeServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 既存のデータベースを追加
    pub fn with_database(self, name: &str, comment: Option<&str>) -> Self {
        self.state
            .lock()
            .unwrap()
            .databases
            .insert(name.to_string(), comment.map(str::to_string));
        self
    }

    pub fn fail_create(self, suffix: &str) -> Self {
        self.state.lock().unwrap().fail_create_suffix = Some(suffix.to_string());
        self
    }

    pub fn fail_comment(self) -> Self {
        self.state.lock().unwrap().fail_comment = true;
        self
    }

    pub fn fail_drop(self, suffix: &str) -> Self {
        self.state.lock().unwrap().fail_drop_suffix = Some(suffix.to_string());
        self
    }

    pub fn fail_scripts_containing(self, token: &str) -> Self {
        self.state.lock().unwrap().fail_script_token = Some(token.to_string());
        self
    }

    /// テスト対象に渡す管理用接続（状態はこのフェイクと共有される）
    pub fn admin(&self, prefix: &str) -> AdminConnection<FakeServer> {
        AdminConnection::new(self.clone(), prefix)
    }

    pub fn database_names(&self) -> BTreeSet<String> {
        self.state.lock().unwrap().databases.keys().cloned().collect()
    }

    pub fn events(&self) -> Vec<String> {
        self.state.lock().unwrap().events.clone()
    }

    pub fn scripts(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().scripts.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }

    /// 指定した種類のイベントの対象データベース名
    pub fn events_of(&self, kind: &str) -> Vec<String> {
        let prefix = format!("{} ", kind);
        self.events()
            .iter()
            .filter_map(|e| e.strip_prefix(&prefix).map(str::to_string))
            .collect()
    }
}

fn query_error(message: &str) -> DatabaseError {
    DatabaseError::Query {
        message: message.to_string(),
        sql: None,
    }
}

#[async_trait]
impl ServerControl for FakeServer {
    type Session = FakeSession;

    async fn create_database(&mut self, name: &SafeIdentifier) -> Result<(), DatabaseError> {
        let mut state = self.state.lock().unwrap();
        if let Some(suffix) = &state.fail_create_suffix {
            if name.as_str().ends_with(suffix.as_str()) {
                return Err(query_error("permission denied to create database"));
            }
        }
        if state.databases.contains_key(name.as_str()) {
            return Err(query_error("database already exists"));
        }
        state.databases.insert(name.to_string(), None);
        state.events.push(format!("create {}", name));
        Ok(())
    }

    async fn comment_on_database(
        &mut self,
        name: &SafeIdentifier,
        comment: &str,
    ) -> Result<(), DatabaseError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_comment {
            return Err(query_error("must be owner of database"));
        }
        state
            .databases
            .insert(name.to_string(), Some(comment.to_string()));
        state.events.push(format!("comment {}", name));
        Ok(())
    }

    async fn open_session(&mut self, name: &SafeIdentifier) -> Result<FakeSession, DatabaseError> {
        let mut state = self.state.lock().unwrap();
        if !state.databases.contains_key(name.as_str()) {
            return Err(DatabaseError::Connection {
                message: format!("database \"{}\" does not exist", name),
                cause: "fake".to_string(),
            });
        }
        state.events.push(format!("open {}", name));
        Ok(FakeSession {
            database: name.to_string(),
            state: Arc::clone(&self.state),
        })
    }

    async fn terminate_backends(&mut self, name: &SafeIdentifier) -> Result<u64, DatabaseError> {
        let mut state = self.state.lock().unwrap();
        state.events.push(format!("terminate {}", name));
        Ok(0)
    }

    async fn drop_database(&mut self, name: &SafeIdentifier) -> Result<(), DatabaseError> {
        let mut state = self.state.lock().unwrap();
        if let Some(suffix) = &state.fail_drop_suffix {
            if name.as_str().ends_with(suffix.as_str()) {
                return Err(query_error("database is being accessed by other users"));
            }
        }
        state.databases.remove(name.as_str());
        state.events.push(format!("drop {}", name));
        Ok(())
    }

    async fn databases_with_comment(
        &mut self,
        comment: &str,
    ) -> Result<Vec<String>, DatabaseError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .databases
            .iter()
            .filter(|(_, c)| c.as_deref() == Some(comment))
            .map(|(name, _)| name.clone())
            .collect())
    }

    async fn close(self) -> Result<(), DatabaseError> {
        let mut state = self.state.lock().unwrap();
        state.closed = true;
        state.events.push("close admin".to_string());
        Ok(())
    }
}

/// DatabaseSession のフェイク
#[derive(Debug)]
pub struct FakeSession {
    pub database: String,
    state: Arc<Mutex<FakeState>>,
}

#[async_trait]
impl DatabaseSession for FakeSession {
    async fn execute_script(&mut self, sql: &str) -> Result<(), DatabaseError> {
        let mut state = self.state.lock().unwrap();
        if let Some(token) = &state.fail_script_token {
            if sql.contains(token.as_str()) {
                return Err(DatabaseError::Query {
                    message: format!("syntax error at or near \"{}\"", token),
                    sql: Some(sql.to_string()),
                });
            }
        }
        state.scripts.push((self.database.clone(), sql.to_string()));
        Ok(())
    }

    async fn close(self) -> Result<(), DatabaseError> {
        let mut state = self.state.lock().unwrap();
        state.events.push(format!("close {}", self.database));
        Ok(())
    }
}

/// DiffEngine のフェイク
///
/// 呼び出し時の (source, target) のデータベース名を記録し、決められた結果を返す。
#[derive(Debug, Clone)]
pub struct FakeDiffEngine {
    result: Result<Vec<String>, String>,
    pub calls: Arc<Mutex<Vec<(String, String, DiffOptions)>>>,
}

impl FakeDiffEngine {
    pub fn returning(statements: &[&str]) -> Self {
        Self {
            result: Ok(statements.iter().map(|s| s.to_string()).collect()),
            calls: Arc::default(),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            result: Err(message.to_string()),
            calls: Arc::default(),
        }
    }

    pub fn calls(&self) -> Vec<(String, String, DiffOptions)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DiffEngine<FakeSession> for FakeDiffEngine {
    async fn diff(
        &self,
        source: &mut FakeSession,
        target: &mut FakeSession,
        options: DiffOptions,
    ) -> anyhow::Result<Vec<String>> {
        self.calls
            .lock()
            .unwrap()
            .push((source.database.clone(), target.database.clone(), options));
        self.result.clone().map_err(|message| anyhow!(message))
    }
}
