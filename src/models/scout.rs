use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{
    common::{Ecef, Role},
    entity::Entity,
    geodesy::{distance_ecef, ecef_to_geodetic},
};
use crate::spatial::SpatialIndex;

/// 探知した相手の位置と距離のスナップショット
///
/// 失探イベントでは、最後に見えていたときのこの値をそのまま報告します。
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionInfo {
    pub lat_deg: f64,
    pub lon_deg: f64,
    pub alt_m: f64,
    /// 斥候からの距離（m、整数に丸め）
    pub distance_m: i64,
}

impl DetectionInfo {
    /// 相手のECEF位置と距離から作成
    pub fn sighting(position: Ecef, distance_m: f64) -> Self {
        let geo = ecef_to_geodetic(position);
        Self {
            lat_deg: geo.lat_deg,
            lon_deg: geo.lon_deg,
            alt_m: geo.alt_m,
            distance_m: distance_m.round() as i64,
        }
    }
}

/// 探知イベントの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionAction {
    /// 新たに探知範囲へ入った
    Found,
    /// 探知範囲から外れた
    Lost,
}

/// 探知イベント
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionEvent {
    pub detection_action: DetectionAction,
    pub time_sec: i64,
    pub scout_id: String,
    pub detect_id: String,
    pub lat_deg: f64,
    pub lon_deg: f64,
    pub alt_m: f64,
    pub distance_m: i64,
}

impl DetectionEvent {
    pub fn new(
        detection_action: DetectionAction,
        time_sec: i64,
        scout_id: &str,
        detect_id: &str,
        info: &DetectionInfo,
    ) -> Self {
        Self {
            detection_action,
            time_sec,
            scout_id: scout_id.to_string(),
            detect_id: detect_id.to_string(),
            lat_deg: info.lat_deg,
            lon_deg: info.lon_deg,
            alt_m: info.alt_m,
            distance_m: info.distance_m,
        }
    }
}

/// 斥候の探知処理
///
/// 空間ハッシュで候補を絞り込み、距離で最終判定したうえで、
/// 前ティックの探知状態との差分から発見／失探イベントを作ります。
#[derive(Debug, Clone, Copy)]
pub struct DetectionEngine {
    /// 探知距離（m）。0以下なら探知処理を行わない
    pub detect_range_m: f64,
}

impl DetectionEngine {
    pub fn new(detect_range_m: f64) -> Self {
        Self { detect_range_m }
    }

    pub fn is_enabled(&self) -> bool {
        self.detect_range_m > 0.0
    }

    /// 全斥候の探知処理を実行
    ///
    /// `index` は `entities` の現在位置から同じ順序で構築されている必要があります。
    /// イベントは斥候の並び順に、各斥候内では発見→失探の順、相手ID昇順で返します。
    ///
    /// # 引数
    ///
    /// * `time_sec` - 現在のシミュレーション時刻（秒）
    /// * `entities` - 全オブジェクト（斥候の探知状態を書き換えます）
    /// * `index` - 今ティックの空間ハッシュ
    pub fn run(
        &self,
        time_sec: i64,
        entities: &mut [Entity],
        index: &SpatialIndex,
    ) -> Vec<DetectionEvent> {
        let mut events = Vec::new();
        if !self.is_enabled() {
            return events;
        }

        for scout_index in 0..entities.len() {
            if entities[scout_index].role != Role::Scout {
                continue;
            }

            let current = self.scan_contacts(scout_index, entities, index);
            let scout = &mut entities[scout_index];
            let previous = std::mem::replace(&mut scout.detected, current);
            events.extend(diff_contacts(time_sec, &scout.id, &previous, &scout.detected));
        }

        events
    }

    /// 1つの斥候について、今ティックに探知範囲内にいる相手チームのオブジェクトを列挙
    pub fn scan_contacts(
        &self,
        scout_index: usize,
        entities: &[Entity],
        index: &SpatialIndex,
    ) -> HashMap<String, DetectionInfo> {
        let scout = &entities[scout_index];
        let mut contacts = HashMap::new();

        for other_index in index.neighbors(scout.position) {
            if other_index == scout_index {
                continue;
            }

            let other = &entities[other_index];
            if other.team_id == scout.team_id {
                continue;
            }

            // 境界ちょうどは探知範囲に含める
            let distance = distance_ecef(scout.position, other.position);
            if distance > self.detect_range_m {
                continue;
            }

            contacts.insert(other.id.clone(), DetectionInfo::sighting(other.position, distance));
        }

        contacts
    }
}

/// 前回と今回の探知状態の差分からイベントを作成
///
/// 失探イベントには前回の（最後に見えていたときの）情報を使います。
pub fn diff_contacts(
    time_sec: i64,
    scout_id: &str,
    previous: &HashMap<String, DetectionInfo>,
    current: &HashMap<String, DetectionInfo>,
) -> Vec<DetectionEvent> {
    let mut found: Vec<(&String, &DetectionInfo)> = current
        .iter()
        .filter(|(id, _)| !previous.contains_key(*id))
        .collect();
    found.sort_by(|a, b| a.0.cmp(b.0));

    let mut lost: Vec<(&String, &DetectionInfo)> = previous
        .iter()
        .filter(|(id, _)| !current.contains_key(*id))
        .collect();
    lost.sort_by(|a, b| a.0.cmp(b.0));

    let mut events = Vec::with_capacity(found.len() + lost.len());
    for (id, info) in found {
        debug!(time_sec, scout_id, detect_id = %id, distance_m = info.distance_m, "発見");
        events.push(DetectionEvent::new(DetectionAction::Found, time_sec, scout_id, id, info));
    }
    for (id, info) in lost {
        debug!(time_sec, scout_id, detect_id = %id, "失探");
        events.push(DetectionEvent::new(DetectionAction::Lost, time_sec, scout_id, id, info));
    }

    events
}
