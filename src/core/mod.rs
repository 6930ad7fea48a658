// Core Domain
// 設定、エラー、命名規則、識別子の検証、カタログと差分の純粋なモデル

pub mod catalog;
pub mod config;
pub mod error;
pub mod identifier;
pub mod naming;
pub mod schema_diff;
