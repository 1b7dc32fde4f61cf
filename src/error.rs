use thiserror::Error;

use crate::scenario::ScenarioError;

/// シミュレーション実行時のエラー
///
/// シナリオ読み込みの失敗はループ開始前に、出力の失敗は発生した時点で
/// 実行全体を中断します。再試行は行いません。
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Scenario(#[from] ScenarioError),

    #[error("ログ出力エラー: {0}")]
    Output(#[from] std::io::Error),

    #[error("JSONエンコードエラー: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("ワーカープールの作成に失敗しました: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("ロギング初期化エラー: {0}")]
    Logging(String),

    #[error("実行設定エラー: {0}")]
    Config(String),
}
