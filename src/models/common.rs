use serde::{Deserialize, Serialize};
use std::fmt;

/// ECEF座標（地球中心・地球固定の直交座標系）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Ecef {
    pub x: f64, // m
    pub y: f64, // m
    pub z: f64, // m
}

impl Ecef {
    /// 座標系の原点
    pub const ORIGIN: Ecef = Ecef { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// 2点間の3次元ユークリッド距離
    pub fn distance_to(&self, other: &Ecef) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// 各軸ごとに `self` から `other` へ割合 `fraction` で線形補間
    pub fn lerp(&self, other: &Ecef, fraction: f64) -> Ecef {
        Ecef {
            x: self.x + (other.x - self.x) * fraction,
            y: self.y + (other.y - self.y) * fraction,
            z: self.z + (other.z - self.z) * fraction,
        }
    }
}

/// 測地座標（WGS84の緯度・経度・楕円体高）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geodetic {
    pub lat_deg: f64,
    pub lon_deg: f64,
    pub alt_m: f64,
}

/// オブジェクトの役割
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// 司令官（移動しない）
    Commander,
    /// 斥候（敵を探知する）
    Scout,
    /// 伝令
    Messenger,
    /// 攻撃役（経路終端で爆破する）
    Attacker,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Commander, Role::Scout, Role::Messenger, Role::Attacker];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Commander => "commander",
            Role::Scout => "scout",
            Role::Messenger => "messenger",
            Role::Attacker => "attacker",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// シミュレーション定数
pub mod constants {
    /// 1日分の最終時刻（秒）。0秒からこの値までを含めて1秒刻みで処理する
    pub const DEFAULT_END_SEC: i64 = 24 * 60 * 60;
    /// 位置更新のデフォルトチャンクサイズ
    pub const DEFAULT_CHUNK_SIZE: usize = 256;
}
