// 基本的なデータ型と定数
pub mod common;

// WGS84 測地座標⇔ECEF変換
pub mod geodesy;

// オブジェクトの基本インターフェース（trait）定義
pub mod traits;

// 経路と時刻からの位置計算
pub mod route;
pub mod entity;

// 役割ごとの処理
pub mod scout;
pub mod attacker;

// 便利な re-export
pub use attacker::{DetonationEngine, DetonationEvent};
pub use common::*;
pub use entity::Entity;
pub use geodesy::{distance_ecef, ecef_to_geodetic, geodetic_to_ecef};
pub use route::{Route, RoutePoint};
pub use scout::{DetectionAction, DetectionEngine, DetectionEvent, DetectionInfo};
pub use traits::*;
