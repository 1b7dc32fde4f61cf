//! # Output モジュール
//!
//! タイムラインログとイベントログのレコード定義と、その書き出し先を提供します。
//!
//! どちらのログも1行1レコードのNDJSONです。シミュレーションエンジンは
//! [`IRecorder`] を通してレコードを渡すだけで、書き出し先（ファイル、メモリ）は知りません。
//!
//! - タイムライン: `{time_sec, positions: [{object_id, team_id, role, lat_deg, lon_deg, alt_m}, ...]}`
//! - 探知イベント: `{event_type: "detection", detection_action, time_sec, scout_id, detect_id, ...}`
//! - 爆破イベント: `{event_type: "detonation", time_sec, attacker_id, ..., bom_range_m}`

use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::error::SimError;
use crate::models::{
    attacker::DetonationEvent,
    common::Role,
    entity::Entity,
    geodesy::ecef_to_geodetic,
    scout::DetectionEvent,
    traits::{IAgent, IMovable},
};

/// タイムラインの1オブジェクト分の位置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelinePosition {
    pub object_id: String,
    pub team_id: String,
    pub role: Role,
    pub lat_deg: f64,
    pub lon_deg: f64,
    pub alt_m: f64,
}

/// 1ティック分のタイムライン
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineRecord {
    pub time_sec: i64,
    pub positions: Vec<TimelinePosition>,
}

impl TimelineRecord {
    /// 全オブジェクトの現在位置を緯度経度高度に変換してまとめる
    pub fn snapshot(time_sec: i64, entities: &[Entity]) -> Self {
        let positions = entities
            .iter()
            .map(|entity| {
                let geo = ecef_to_geodetic(entity.get_position());
                TimelinePosition {
                    object_id: entity.get_id().to_string(),
                    team_id: entity.get_team_id().to_string(),
                    role: entity.get_role(),
                    lat_deg: geo.lat_deg,
                    lon_deg: geo.lon_deg,
                    alt_m: geo.alt_m,
                }
            })
            .collect();

        Self { time_sec, positions }
    }
}

/// イベントログの1行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "lowercase")]
pub enum EventRecord {
    Detection(DetectionEvent),
    Detonation(DetonationEvent),
}

impl EventRecord {
    pub fn time_sec(&self) -> i64 {
        match self {
            EventRecord::Detection(e) => e.time_sec,
            EventRecord::Detonation(e) => e.time_sec,
        }
    }
}

/// シミュレーション結果の書き出し先
pub trait IRecorder {
    /// 探知イベントの記録
    fn record_detection(&mut self, event: &DetectionEvent) -> Result<(), SimError>;

    /// 爆破イベントの記録
    fn record_detonation(&mut self, event: &DetonationEvent) -> Result<(), SimError>;

    /// 1ティック分のタイムラインの記録
    fn record_timeline(&mut self, record: &TimelineRecord) -> Result<(), SimError>;

    /// バッファの書き出し（実行終了時に1回呼ばれる）
    fn finish(&mut self) -> Result<(), SimError> {
        Ok(())
    }
}

/// 1レコードを1行のJSONとして書き出す
pub fn write_ndjson<W: Write, T: Serialize>(writer: &mut W, value: &T) -> Result<(), SimError> {
    serde_json::to_writer(&mut *writer, value)?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// NDJSONでタイムラインとイベントを書き出すレコーダー
///
/// ファイルへ書く場合は `BufWriter` で包んだものを渡してください。
#[derive(Debug)]
pub struct NdjsonRecorder<W: Write> {
    timeline: W,
    events: W,
}

impl<W: Write> NdjsonRecorder<W> {
    pub fn new(timeline: W, events: W) -> Self {
        Self { timeline, events }
    }

    /// 書き出し先を取り出す（タイムライン, イベント）
    pub fn into_inner(self) -> (W, W) {
        (self.timeline, self.events)
    }
}

impl<W: Write> IRecorder for NdjsonRecorder<W> {
    fn record_detection(&mut self, event: &DetectionEvent) -> Result<(), SimError> {
        write_ndjson(&mut self.events, &EventRecord::Detection(event.clone()))
    }

    fn record_detonation(&mut self, event: &DetonationEvent) -> Result<(), SimError> {
        write_ndjson(&mut self.events, &EventRecord::Detonation(event.clone()))
    }

    fn record_timeline(&mut self, record: &TimelineRecord) -> Result<(), SimError> {
        write_ndjson(&mut self.timeline, record)
    }

    fn finish(&mut self) -> Result<(), SimError> {
        self.events.flush()?;
        self.timeline.flush()?;
        Ok(())
    }
}

/// メモリ上にレコードを保持するレコーダー
#[derive(Debug, Default)]
pub struct MemoryRecorder {
    pub timeline: Vec<TimelineRecord>,
    pub events: Vec<EventRecord>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn detections(&self) -> impl Iterator<Item = &DetectionEvent> {
        self.events.iter().filter_map(|e| match e {
            EventRecord::Detection(d) => Some(d),
            EventRecord::Detonation(_) => None,
        })
    }

    pub fn detonations(&self) -> impl Iterator<Item = &DetonationEvent> {
        self.events.iter().filter_map(|e| match e {
            EventRecord::Detonation(d) => Some(d),
            EventRecord::Detection(_) => None,
        })
    }
}

impl IRecorder for MemoryRecorder {
    fn record_detection(&mut self, event: &DetectionEvent) -> Result<(), SimError> {
        self.events.push(EventRecord::Detection(event.clone()));
        Ok(())
    }

    fn record_detonation(&mut self, event: &DetonationEvent) -> Result<(), SimError> {
        self.events.push(EventRecord::Detonation(event.clone()));
        Ok(())
    }

    fn record_timeline(&mut self, record: &TimelineRecord) -> Result<(), SimError> {
        self.timeline.push(record.clone());
        Ok(())
    }
}
