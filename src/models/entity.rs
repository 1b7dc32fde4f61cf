use std::collections::HashMap;

use crate::models::{
    common::{Ecef, Role},
    route::Route,
    scout::DetectionInfo,
    traits::{IAgent, IMovable},
};

/// シミュレーションオブジェクト
///
/// 司令官・斥候・伝令・攻撃役のすべてを1つの構造体で表します。
/// 経路と開始時刻はロード後に変化せず、毎ティック書き換わるのは
/// 現在位置・探知状態（斥候のみ）・爆破済みフラグ（攻撃役のみ）だけです。
#[derive(Debug, Clone)]
pub struct Entity {
    /// オブジェクトの一意識別子
    pub id: String,
    /// 所属チームのID
    pub team_id: String,
    /// 役割
    pub role: Role,
    /// 移動開始時刻（秒）
    pub start_time_sec: f64,
    /// ECEF経路と区間ごとの累積到達時刻
    pub route: Route,
    /// 現在位置
    pub position: Ecef,
    /// 前ティックに探知していた相手（斥候のみ）
    pub detected: HashMap<String, DetectionInfo>,
    /// 爆破済みかどうか（攻撃役のみ）
    pub detonated: bool,
}

impl Entity {
    /// 新しいオブジェクトを作成します
    ///
    /// 初期位置は経路の先頭点（経路が空なら原点）です。
    pub fn new(
        id: impl Into<String>,
        team_id: impl Into<String>,
        role: Role,
        start_time_sec: f64,
        route: Route,
    ) -> Self {
        let position = route.first_position().unwrap_or(Ecef::ORIGIN);
        Self {
            id: id.into(),
            team_id: team_id.into(),
            role,
            start_time_sec,
            route,
            position,
            detected: HashMap::new(),
            detonated: false,
        }
    }

    /// 経路の最終点に到達する時刻（秒）
    ///
    /// 速度0の区間を含む経路では無限大になります。
    pub fn arrival_time_sec(&self) -> f64 {
        self.start_time_sec + self.route.total_duration_sec
    }
}

impl IAgent for Entity {
    fn get_id(&self) -> &str {
        &self.id
    }

    fn get_team_id(&self) -> &str {
        &self.team_id
    }

    fn get_role(&self) -> Role {
        self.role
    }
}

impl IMovable for Entity {
    fn position_at_time(&self, time_sec: f64) -> Ecef {
        let route = &self.route;

        // 司令官は移動しないので、最初の経路点に固定
        if self.role == Role::Commander {
            return route.first_position().unwrap_or(Ecef::ORIGIN);
        }

        let (Some(first), Some(last)) = (route.first_position(), route.last_position()) else {
            return Ecef::ORIGIN;
        };

        // 移動開始前は最初の経路点で待機
        if time_sec < self.start_time_sec {
            return first;
        }

        if route.segment_end_offsets.is_empty() {
            return last;
        }

        let elapsed = time_sec - self.start_time_sec;
        if elapsed >= route.total_duration_sec {
            return last;
        }

        // elapsed <= offsets[i] となる最初の区間
        let offsets = &route.segment_end_offsets;
        let segment_index = offsets.partition_point(|&end| end < elapsed);
        if segment_index >= offsets.len() {
            return last;
        }

        let segment_end = offsets[segment_index];
        let segment_start = if segment_index == 0 {
            0.0
        } else {
            offsets[segment_index - 1]
        };
        let segment_duration = segment_end - segment_start;
        let from = route.points[segment_index].ecef;
        let to = route.points[segment_index + 1].ecef;
        if segment_duration <= 0.0 {
            return to;
        }

        let fraction = (elapsed - segment_start) / segment_duration;
        from.lerp(&to, fraction)
    }

    fn get_position(&self) -> Ecef {
        self.position
    }

    fn set_position(&mut self, position: Ecef) {
        self.position = position;
    }
}
