//! # Simulation モジュール
//!
//! 1秒刻みのバッチシミュレーションのメインループを提供します。
//!
//! 実時間の待機は行わず、0秒から終了時刻（既定は86400秒）までを含めて
//! できるだけ速く処理します。シミュレーション時刻はグローバルな状態として持たず、
//! 各処理に引数として明示的に渡します。
//!
//! ## 1ティックの処理順序
//!
//! 1. **位置更新**: 全オブジェクトの位置を経路と時刻から計算（ワーカープールで並列）
//! 2. **空間ハッシュ構築**: 更新後の位置からセル分割を作り直す
//! 3. **探知処理**: 斥候ごとに相手チームを探知し、前ティックとの差分をイベント化
//! 4. **爆破処理**: 経路を走り終えた攻撃役の爆破イベントを1回だけ出す
//! 5. **タイムライン出力**: 全オブジェクトの位置を緯度経度高度で記録
//!
//! 並列化するのは 1 だけで、2〜5 は単一スレッドで実行します。
//!
//! ## 使用例
//!
//! ```no_run
//! use fieldsim::output::NdjsonRecorder;
//! use fieldsim::scenario::ScenarioConfig;
//! use fieldsim::simulation::{RunOptions, SimulationEngine};
//! use std::fs::File;
//! use std::io::BufWriter;
//!
//! # fn main() -> Result<(), fieldsim::error::SimError> {
//! let scenario = ScenarioConfig::from_file("scenario.json")?;
//! let mut engine = SimulationEngine::new(&scenario, RunOptions::default())?;
//!
//! let mut recorder = NdjsonRecorder::new(
//!     BufWriter::new(File::create("timeline.ndjson")?),
//!     BufWriter::new(File::create("events.ndjson")?),
//! );
//! let stats = engine.run(&mut recorder)?;
//! println!("{} ticks", stats.ticks);
//! # Ok(())
//! # }
//! ```

use std::time::{Duration, Instant};

use tracing::{debug, info, trace};

use crate::error::SimError;
use crate::models::{
    attacker::DetonationEngine,
    common::{
        Role,
        constants::{DEFAULT_CHUNK_SIZE, DEFAULT_END_SEC},
    },
    entity::Entity,
    route::Route,
    scout::{DetectionAction, DetectionEngine},
};
use crate::output::{IRecorder, TimelineRecord};
use crate::parallel::PositionUpdater;
use crate::scenario::ScenarioConfig;
use crate::spatial::SpatialIndex;

/// 進行状況ログの間隔（シミュレーション秒）
const PROGRESS_INTERVAL_SEC: i64 = 3600;

/// 実行設定
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// 位置更新のワーカー数
    pub worker_count: usize,
    /// 位置更新のチャンクサイズ
    pub chunk_size: usize,
    /// 最終時刻（秒、この時刻も処理する）
    pub end_sec: i64,
    /// 詳細出力レベル
    pub verbose_level: u8,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            worker_count: std::thread::available_parallelism().map_or(1, |n| n.get()),
            chunk_size: DEFAULT_CHUNK_SIZE,
            end_sec: DEFAULT_END_SEC,
            verbose_level: 0,
        }
    }
}

/// 1ティック分の集計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickStats {
    pub found_events: usize,
    pub lost_events: usize,
    pub detonations: usize,
}

/// 実行全体の集計
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    pub ticks: u64,
    pub found_events: u64,
    pub lost_events: u64,
    pub detonations: u64,
    pub elapsed: Duration,
}

impl RunStats {
    fn add(&mut self, tick: TickStats) {
        self.ticks += 1;
        self.found_events += tick.found_events as u64;
        self.lost_events += tick.lost_events as u64;
        self.detonations += tick.detonations as u64;
    }
}

pub struct SimulationEngine {
    pub entities: Vec<Entity>,
    pub end_sec: i64,
    pub step_count: u64,

    detection: DetectionEngine,
    detonation: DetonationEngine,
    updater: PositionUpdater,
    verbose_level: u8,
}

impl SimulationEngine {
    /// シナリオからオブジェクトを生成してエンジンを作成
    pub fn new(scenario: &ScenarioConfig, options: RunOptions) -> Result<Self, SimError> {
        let entities = spawn_entities(scenario);

        info!(
            objects = entities.len(),
            commanders = scenario.count_by_role(Role::Commander),
            scouts = scenario.count_by_role(Role::Scout),
            messengers = scenario.count_by_role(Role::Messenger),
            attackers = scenario.count_by_role(Role::Attacker),
            "オブジェクトを生成しました"
        );

        Self::with_entities(
            entities,
            scenario.performance.scout.detect_range_m,
            scenario.performance.attacker.bom_range_m,
            options,
        )
    }

    /// 生成済みのオブジェクトからエンジンを作成
    pub fn with_entities(
        entities: Vec<Entity>,
        detect_range_m: f64,
        bom_range_m: i64,
        options: RunOptions,
    ) -> Result<Self, SimError> {
        let updater = PositionUpdater::new(options.worker_count, options.chunk_size)?;

        info!(
            workers = updater.worker_count(),
            chunk_size = updater.chunk_size(),
            detect_range_m,
            bom_range_m,
            end_sec = options.end_sec,
            "シミュレーションエンジンを初期化"
        );

        Ok(Self {
            entities,
            end_sec: options.end_sec,
            step_count: 0,
            detection: DetectionEngine::new(detect_range_m),
            detonation: DetonationEngine::new(bom_range_m),
            updater,
            verbose_level: options.verbose_level,
        })
    }

    /// 0秒から終了時刻までを実行
    ///
    /// 出力に失敗した時点で中断し、そのエラーを返します。
    pub fn run<R: IRecorder>(&mut self, recorder: &mut R) -> Result<RunStats, SimError> {
        info!("=== シミュレーション実行開始 ===");

        let started = Instant::now();
        let mut stats = RunStats::default();

        for time_sec in 0..=self.end_sec {
            let tick = self.step(time_sec, recorder)?;
            stats.add(tick);

            if self.verbose_level > 2 {
                trace!(time_sec, ?tick, "ティック完了");
            }

            if self.verbose_level > 0 && time_sec % PROGRESS_INTERVAL_SEC == 0 {
                let progress = if self.end_sec > 0 {
                    time_sec as f64 / self.end_sec as f64 * 100.0
                } else {
                    100.0
                };
                info!("進行状況: {:.1}% ({}/{}秒)", progress, time_sec, self.end_sec);
            }
        }

        recorder.finish()?;
        stats.elapsed = started.elapsed();

        info!("=== シミュレーション完了 ===");
        info!(
            ticks = stats.ticks,
            found = stats.found_events,
            lost = stats.lost_events,
            detonations = stats.detonations,
            "処理時間: {:?}",
            stats.elapsed
        );

        Ok(stats)
    }

    /// 1ティック分の処理
    pub fn step<R: IRecorder>(
        &mut self,
        time_sec: i64,
        recorder: &mut R,
    ) -> Result<TickStats, SimError> {
        let mut tick = TickStats::default();

        // 全チャンクの完了を待ってから次へ進む
        self.updater.update(&mut self.entities, time_sec as f64);

        let index = SpatialIndex::build(
            self.entities.iter().map(|e| e.position),
            self.detection.detect_range_m,
        );

        for event in self.detection.run(time_sec, &mut self.entities, &index) {
            match event.detection_action {
                DetectionAction::Found => tick.found_events += 1,
                DetectionAction::Lost => tick.lost_events += 1,
            }
            recorder.record_detection(&event)?;
        }

        for event in self.detonation.run(time_sec, &mut self.entities) {
            tick.detonations += 1;
            recorder.record_detonation(&event)?;
        }

        recorder.record_timeline(&TimelineRecord::snapshot(time_sec, &self.entities))?;

        self.step_count += 1;
        Ok(tick)
    }

    pub fn detect_range_m(&self) -> f64 {
        self.detection.detect_range_m
    }

    pub fn bom_range_m(&self) -> i64 {
        self.detonation.bom_range_m
    }
}

/// シナリオの全チーム・全オブジェクトを、チーム順・定義順に生成
pub fn spawn_entities(scenario: &ScenarioConfig) -> Vec<Entity> {
    let mut entities = Vec::with_capacity(scenario.object_count());

    for team in &scenario.teams {
        for object in &team.objects {
            let route = Route::from_waypoints(&object.route);
            debug!(
                id = %object.id,
                team = %team.id,
                role = %object.role,
                waypoints = route.points.len(),
                total_duration_sec = route.total_duration_sec,
                "オブジェクト生成"
            );
            entities.push(Entity::new(
                object.id.clone(),
                team.id.clone(),
                object.role,
                object.start_time_sec,
                route,
            ));
        }
    }

    entities
}
