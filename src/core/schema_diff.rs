// スキーマ差分の結果
//
// 差分エンジンが返したDDL文の列と、その出力形式を扱います。

/// 差分エンジンへのオプション
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiffOptions {
    /// DROP などの破壊的な文を許可するか
    pub allow_unsafe: bool,
}

impl DiffOptions {
    /// 破壊的な文を許可する設定
    ///
    /// 比較対象はどちらも使い捨てのデータベースなので diff では常にこれを使う。
    pub fn unsafe_allowed() -> Self {
        Self { allow_unsafe: true }
    }
}

/// 差分の結果
///
/// マイグレーション適用後の状態を宣言スキーマへ近づけるためのDDL文の列。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffResult {
    statements: Vec<String>,
    options: DiffOptions,
}

impl DiffResult {
    /// 新しい差分結果を作成
    pub fn new(statements: Vec<String>, options: DiffOptions) -> Self {
        Self {
            statements,
            options,
        }
    }

    /// DDL文の列
    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    /// 差分がないかどうか
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// 破壊的な文が許可された状態で計算されたか
    pub fn allows_unsafe(&self) -> bool {
        self.options.allow_unsafe
    }

    /// 出力用のスクリプト
    ///
    /// 差分エンジンが返した文をそのまま空行で区切って連結する。
    /// 最後の文の後ろに改行は付けない。
    pub fn to_script(&self) -> String {
        self.statements.join("\n\n")
    }
}
