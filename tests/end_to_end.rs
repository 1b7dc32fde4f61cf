use fieldsim::models::DetectionAction;
use fieldsim::output::{MemoryRecorder, NdjsonRecorder};
use fieldsim::scenario::ScenarioConfig;
use fieldsim::simulation::{RunOptions, SimulationEngine};
use serde_json::Value;

/// 指揮官1、斥候1（垂直に1000m・360km/h、10秒）、敵攻撃役1（垂直に49.9m・36km/h、約5秒）
const THREE_OBJECT_SCENARIO: &str = r#"{
    "performance": {
        "scout": { "detect_range_m": 10000 },
        "attacker": { "bom_range_m": 1000 }
    },
    "teams": [
        { "id": "A", "objects": [
            { "id": "A_CMD", "role": "commander", "start_sec": 0,
              "route": [ { "lat_deg": 35.0, "lon_deg": 139.0, "alt_m": 0.0, "speeds_kph": 0 } ] },
            { "id": "A_S00", "role": "scout", "start_sec": 0,
              "route": [ { "lat_deg": 35.0, "lon_deg": 139.0, "alt_m": 0.0, "speeds_kph": 360 },
                         { "lat_deg": 35.0, "lon_deg": 139.0, "alt_m": 1000.0, "speeds_kph": 0 } ] }
        ] },
        { "id": "B", "objects": [
            { "id": "B_A00", "role": "attacker", "start_sec": 0,
              "route": [ { "lat_deg": 35.01, "lon_deg": 139.0, "alt_m": 0.0, "speeds_kph": 36 },
                         { "lat_deg": 35.01, "lon_deg": 139.0, "alt_m": 49.9, "speeds_kph": 0 } ] }
        ] }
    ]
}"#;

/// 静止した斥候から10m/sで遠ざかる敵伝令
const RECEDING_SCENARIO: &str = r#"{
    "performance": {
        "scout": { "detect_range_m": 1000 },
        "attacker": { "bom_range_m": 200 }
    },
    "teams": [
        { "id": "A", "objects": [
            { "id": "A_S00", "role": "scout", "start_sec": 0,
              "route": [ { "lat_deg": 0.0, "lon_deg": 100.0, "alt_m": 0.0, "speeds_kph": 0 } ] }
        ] },
        { "id": "B", "objects": [
            { "id": "B_M00", "role": "messenger", "start_sec": 0,
              "route": [ { "lat_deg": 0.0, "lon_deg": 100.0, "alt_m": 500.0, "speeds_kph": 36 },
                         { "lat_deg": 0.0, "lon_deg": 100.0, "alt_m": 2500.0, "speeds_kph": 0 } ] }
        ] }
    ]
}"#;

fn options(end_sec: i64) -> RunOptions {
    RunOptions {
        worker_count: 2,
        chunk_size: 2,
        end_sec,
        verbose_level: 0,
    }
}

fn lines(bytes: &[u8]) -> Vec<Value> {
    std::str::from_utf8(bytes)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn full_day_run_writes_every_tick() {
    let scenario = ScenarioConfig::from_json_str(THREE_OBJECT_SCENARIO).unwrap();
    let options = RunOptions {
        worker_count: 2,
        chunk_size: 2,
        ..RunOptions::default()
    };
    let mut engine = SimulationEngine::new(&scenario, options).unwrap();

    let scout = &engine.entities[1];
    assert_eq!(scout.id, "A_S00");
    assert!((scout.route.total_duration_sec - 10.0).abs() < 1e-6);

    let mut recorder = NdjsonRecorder::new(Vec::new(), Vec::new());

    let stats = engine.run(&mut recorder).unwrap();
    assert_eq!(stats.ticks, 86401);

    let (timeline, events) = recorder.into_inner();
    let timeline = lines(&timeline);
    assert_eq!(timeline.len(), 86401);
    assert_eq!(timeline[0]["time_sec"], 0);
    assert_eq!(timeline[86400]["time_sec"], 86400);
    assert_eq!(timeline[0]["positions"].as_array().unwrap().len(), 3);
    assert_eq!(timeline[0]["positions"][1]["object_id"], "A_S00");
    assert_eq!(timeline[0]["positions"][1]["role"], "scout");

    let events = lines(&events);
    assert_eq!(events.len(), 2);

    assert_eq!(events[0]["event_type"], "detection");
    assert_eq!(events[0]["detection_action"], "found");
    assert_eq!(events[0]["time_sec"], 0);
    assert_eq!(events[0]["scout_id"], "A_S00");
    assert_eq!(events[0]["detect_id"], "B_A00");

    assert_eq!(events[1]["event_type"], "detonation");
    assert_eq!(events[1]["time_sec"], 5);
    assert_eq!(events[1]["attacker_id"], "B_A00");
    assert_eq!(events[1]["bom_range_m"], 1000);
}

#[test]
fn leaving_target_is_lost_with_last_sighting() {
    let scenario = ScenarioConfig::from_json_str(RECEDING_SCENARIO).unwrap();
    let mut engine = SimulationEngine::new(&scenario, options(600)).unwrap();
    let mut recorder = MemoryRecorder::new();
    engine.run(&mut recorder).unwrap();

    let events: Vec<_> = recorder.detections().collect();
    assert_eq!(events.len(), 2);

    let found = events[0];
    assert_eq!(found.detection_action, DetectionAction::Found);
    assert_eq!(found.time_sec, 0);
    assert_eq!(found.distance_m, 500);

    // 500mから10m/sで離れ、50秒目に境界の1000mへ達する
    let lost = events[1];
    assert_eq!(lost.detection_action, DetectionAction::Lost);
    assert_eq!(lost.detect_id, "B_M00");
    assert!(lost.time_sec >= 50 && lost.time_sec <= 51);
    assert!(lost.distance_m <= 1000);

    let last_seen = &recorder.timeline[(lost.time_sec - 1) as usize].positions[1];
    assert_eq!(last_seen.object_id, "B_M00");
    assert_eq!(lost.lat_deg, last_seen.lat_deg);
    assert_eq!(lost.lon_deg, last_seen.lon_deg);
    assert_eq!(lost.alt_m, last_seen.alt_m);

    let now = &recorder.timeline[lost.time_sec as usize].positions[1];
    assert!(now.alt_m > last_seen.alt_m);
}

#[test]
fn no_detonation_without_attackers() {
    let scenario = ScenarioConfig::from_json_str(RECEDING_SCENARIO).unwrap();
    let mut engine = SimulationEngine::new(&scenario, options(300)).unwrap();
    let mut recorder = MemoryRecorder::new();
    let stats = engine.run(&mut recorder).unwrap();
    assert_eq!(recorder.detonations().count(), 0);
    assert_eq!(stats.detonations, 0);
    assert_eq!(stats.found_events, 1);
    assert_eq!(stats.lost_events, 1);
}

#[test]
fn end_sec_zero_runs_one_tick() {
    let scenario = ScenarioConfig::from_json_str(THREE_OBJECT_SCENARIO).unwrap();
    let mut engine = SimulationEngine::new(&scenario, options(0)).unwrap();
    let mut recorder = MemoryRecorder::new();
    let stats = engine.run(&mut recorder).unwrap();
    assert_eq!(stats.ticks, 1);
    assert_eq!(recorder.timeline.len(), 1);
}
