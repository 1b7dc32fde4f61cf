//! 地球楕円体上を移動するオブジェクト群（指揮官・斥候・伝令・攻撃役）の
//! 決定論的バッチシミュレーション。
//!
//! 1秒刻みで全オブジェクトの位置を計算し、位置のタイムラインと
//! 探知・爆破のイベントをNDJSONで出力します。

pub mod error;
pub mod logging;
pub mod models;
pub mod output;
pub mod parallel;
pub mod scenario;
pub mod simulation;
pub mod spatial;
