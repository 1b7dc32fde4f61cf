use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{common::Role, entity::Entity, geodesy::ecef_to_geodetic};

/// 爆破イベント
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetonationEvent {
    pub time_sec: i64,
    pub attacker_id: String,
    pub lat_deg: f64,
    pub lon_deg: f64,
    pub alt_m: f64,
    /// 爆破範囲（m）。設定値をそのまま出力する
    pub bom_range_m: i64,
}

/// 攻撃役の爆破処理
///
/// 攻撃役が経路の最終点に到達した最初のティックで1回だけ爆破イベントを出します。
#[derive(Debug, Clone, Copy)]
pub struct DetonationEngine {
    pub bom_range_m: i64,
}

impl DetonationEngine {
    pub fn new(bom_range_m: i64) -> Self {
        Self { bom_range_m }
    }

    /// 全攻撃役の爆破判定を実行
    pub fn run(&self, time_sec: i64, entities: &mut [Entity]) -> Vec<DetonationEvent> {
        let mut events = Vec::new();

        for attacker in entities.iter_mut() {
            if attacker.role != Role::Attacker || attacker.detonated {
                continue;
            }

            if (time_sec as f64) < attacker.arrival_time_sec() {
                continue;
            }

            let geo = ecef_to_geodetic(attacker.position);
            debug!(time_sec, attacker_id = %attacker.id, "爆破");
            events.push(DetonationEvent {
                time_sec,
                attacker_id: attacker.id.clone(),
                lat_deg: geo.lat_deg,
                lon_deg: geo.lon_deg,
                alt_m: geo.alt_m,
                bom_range_m: self.bom_range_m,
            });
            attacker.detonated = true;
        }

        events
    }
}
