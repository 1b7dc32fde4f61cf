use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::common::Role;

/// 性能諸元
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PerformanceConfig {
    pub scout: ScoutPerformance,
    /// 伝令の通信諸元（サマリ表示のみで使用）
    #[serde(default)]
    pub messenger: Option<MessengerPerformance>,
    pub attacker: AttackerPerformance,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScoutPerformance {
    #[serde(default)]
    pub comm_range_m: Option<f64>,
    pub detect_range_m: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MessengerPerformance {
    pub comm_range_m: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AttackerPerformance {
    pub bom_range_m: i64,
}

/// チーム設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TeamConfig {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub objects: Vec<ObjectConfig>,
}

/// オブジェクト設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObjectConfig {
    pub id: String,
    pub role: Role,
    #[serde(rename = "start_sec", alias = "start_time_sec")]
    pub start_time_sec: f64,
    pub route: Vec<WaypointConfig>,
    /// 通信先の伝令ID（サマリ表示のみで使用）
    #[serde(default)]
    pub network: Vec<String>,
}

/// 経路点設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WaypointConfig {
    pub lat_deg: f64,
    pub lon_deg: f64,
    pub alt_m: f64,
    #[serde(rename = "speeds_kph", alias = "speed_kph")]
    pub speed_kph: f64,
}

/// 完全なシナリオ設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScenarioConfig {
    pub performance: PerformanceConfig,
    pub teams: Vec<TeamConfig>,
}

impl ScenarioConfig {
    /// ファイルからシナリオ設定を読み込み
    ///
    /// 拡張子が `.yaml` / `.yml` の場合はYAML、それ以外はJSONとして解析します。
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.to_path_buf()));
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| ScenarioError::Io(path.to_path_buf(), e))?;

        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

        let config: ScenarioConfig = if is_yaml {
            serde_yaml::from_str(&contents)
                .map_err(|e| ScenarioError::Yaml(path.to_path_buf(), e))?
        } else {
            serde_json::from_str(&contents)
                .map_err(|e| ScenarioError::Json(path.to_path_buf(), e))?
        };

        config.validate()?;

        Ok(config)
    }

    /// JSON文字列から読み込み（検証込み）
    pub fn from_json_str(contents: &str) -> Result<Self, ScenarioError> {
        let config: ScenarioConfig = serde_json::from_str(contents)
            .map_err(|e| ScenarioError::Json(PathBuf::from("<inline>"), e))?;
        config.validate()?;
        Ok(config)
    }

    /// 設定の検証
    ///
    /// シミュレーションループ内の計算はここで検証済みのデータを前提とします。
    pub fn validate(&self) -> Result<(), ScenarioError> {
        let perf = &self.performance;
        if !perf.scout.detect_range_m.is_finite() {
            return Err(ScenarioError::Validation(
                "detect_range_m must be finite".to_string(),
            ));
        }
        if perf.attacker.bom_range_m < 0 {
            return Err(ScenarioError::Validation(
                "bom_range_m must not be negative".to_string(),
            ));
        }

        if self.teams.is_empty() {
            return Err(ScenarioError::Validation("no teams defined".to_string()));
        }

        let mut seen_ids = HashSet::new();
        for team in &self.teams {
            for object in &team.objects {
                if !seen_ids.insert(object.id.as_str()) {
                    return Err(ScenarioError::Validation(format!(
                        "duplicate object id {}",
                        object.id
                    )));
                }
                validate_object(&team.id, object)?;
            }
        }

        Ok(())
    }

    /// 全オブジェクト数
    pub fn object_count(&self) -> usize {
        self.teams.iter().map(|t| t.objects.len()).sum()
    }

    /// 役割ごとのオブジェクト数
    pub fn count_by_role(&self, role: Role) -> usize {
        self.teams
            .iter()
            .flat_map(|t| &t.objects)
            .filter(|o| o.role == role)
            .count()
    }

    /// シナリオの概要を表示
    pub fn print_summary(&self) {
        println!("=== シナリオ情報 ===");
        println!("チーム数: {}", self.teams.len());
        println!("総オブジェクト数: {}", self.object_count());
        println!();

        println!("=== 性能諸元 ===");
        println!("斥候 探知距離: {:.0}m", self.performance.scout.detect_range_m);
        if let Some(comm) = self.performance.scout.comm_range_m {
            println!("斥候 通信距離: {:.0}m", comm);
        }
        if let Some(messenger) = &self.performance.messenger {
            println!("伝令 通信距離: {:.0}m", messenger.comm_range_m);
        }
        println!("攻撃役 爆破範囲: {}m", self.performance.attacker.bom_range_m);
        println!();

        for team in &self.teams {
            let name = team.name.as_deref().unwrap_or("-");
            println!("=== チーム {} ({}) ===", team.id, name);
            for role in Role::ALL {
                let count = team.objects.iter().filter(|o| o.role == role).count();
                println!("  {}: {}", role, count);
            }
            let waypoints: usize = team.objects.iter().map(|o| o.route.len()).sum();
            println!("  経路点数: {}", waypoints);
        }
    }
}

fn validate_object(team_id: &str, object: &ObjectConfig) -> Result<(), ScenarioError> {
    let fail = |msg: &str| {
        Err(ScenarioError::Validation(format!(
            "object {} (team {}): {}",
            object.id, team_id, msg
        )))
    };

    // 負の開始時刻は「0秒時点で既に移動中」として扱う
    if !object.start_time_sec.is_finite() {
        return fail("start_sec must be a finite number");
    }
    if object.route.is_empty() {
        return fail("route must contain at least one waypoint");
    }

    for (i, wp) in object.route.iter().enumerate() {
        if !(-90.0..=90.0).contains(&wp.lat_deg) {
            return fail(&format!("waypoint {} lat_deg out of range: {}", i, wp.lat_deg));
        }
        if !(-180.0..=180.0).contains(&wp.lon_deg) {
            return fail(&format!("waypoint {} lon_deg out of range: {}", i, wp.lon_deg));
        }
        if !wp.alt_m.is_finite() {
            return fail(&format!("waypoint {} alt_m must be finite", i));
        }
        if !wp.speed_kph.is_finite() || wp.speed_kph < 0.0 {
            return fail(&format!("waypoint {} speeds_kph must be non-negative", i));
        }
    }

    Ok(())
}

/// シナリオ読み込みエラー
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("シナリオファイルが見つかりません: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("ファイル読み込みエラー {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("JSON解析エラー {}: {}", .0.display(), .1)]
    Json(PathBuf, #[source] serde_json::Error),

    #[error("YAML解析エラー {}: {}", .0.display(), .1)]
    Yaml(PathBuf, #[source] serde_yaml::Error),

    #[error("設定検証エラー: {0}")]
    Validation(String),
}
