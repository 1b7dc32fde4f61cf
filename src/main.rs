use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::str::FromStr;

use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use tracing::{info, warn};

use fieldsim::error::SimError;
use fieldsim::logging::{LogConfig, LogOutput, init_logging, level_for_verbosity, parse_log_level};
use fieldsim::output::NdjsonRecorder;
use fieldsim::scenario::ScenarioConfig;
use fieldsim::simulation::{RunOptions, SimulationEngine};

fn main() {
    let matches = build_cli().get_matches();

    if let Err(e) = run(&matches) {
        eprintln!("エラー: {}", e);
        std::process::exit(1);
    }
}

fn build_cli() -> Command {
    Command::new("fieldsim")
        .version(env!("CARGO_PKG_VERSION"))
        .about("部隊行動シミュレーション (Field Simulation)")
        .long_about(
            "指揮官・斥候・伝令・攻撃役の移動を1秒刻みで計算し、\n\
             位置のタイムラインと探知・爆破イベントをNDJSONで出力します。",
        )
        .arg(
            Arg::new("scenario")
                .short('s')
                .long("scenario")
                .value_name("FILE")
                .required(true)
                .help("シナリオファイル(.json / .yaml)のパスを指定"),
        )
        .arg(
            Arg::new("timeline-log")
                .long("timeline-log")
                .value_name("FILE")
                .required_unless_present("info")
                .help("タイムラインログ(NDJSON)の出力先"),
        )
        .arg(
            Arg::new("event-log")
                .long("event-log")
                .value_name("FILE")
                .required_unless_present("info")
                .help("イベントログ(NDJSON)の出力先"),
        )
        .arg(
            Arg::new("info")
                .short('i')
                .long("info")
                .action(ArgAction::SetTrue)
                .help("シナリオの情報のみ表示して終了"),
        )
        .arg(
            Arg::new("workers")
                .short('w')
                .long("workers")
                .value_name("N")
                .value_parser(value_parser!(usize))
                .help("位置更新のワーカー数 (既定: 環境変数 PARALLELISM, なければCPU数)"),
        )
        .arg(
            Arg::new("chunk-size")
                .long("chunk-size")
                .value_name("N")
                .value_parser(value_parser!(usize))
                .help("位置更新のチャンクサイズ (既定: 環境変数 CHUNK_SIZE, なければ256)"),
        )
        .arg(
            Arg::new("end-sec")
                .long("end-sec")
                .value_name("N")
                .value_parser(value_parser!(i64).range(0..))
                .help("最終時刻[秒] (既定: 86400)"),
        )
        .arg(
            Arg::new("log-output")
                .long("log-output")
                .value_name("OUTPUT")
                .default_value("console")
                .help("実行ログの出力先 (console, file, both)"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("実行ログのレベル (trace, debug, info, warn, error)"),
        )
        .arg(
            Arg::new("log-dir")
                .long("log-dir")
                .value_name("DIR")
                .default_value("logs")
                .help("実行ログファイルのディレクトリ"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .help("詳細出力レベル (-v: 進行状況, -vv: イベント, -vvv: ティック)"),
        )
}

fn run(matches: &ArgMatches) -> Result<(), SimError> {
    let verbose_level = matches.get_count("verbose");

    let scenario_path = matches
        .get_one::<String>("scenario")
        .ok_or_else(|| SimError::Config("--scenario が指定されていません".to_string()))?;

    // --info は標準出力にサマリを出すだけなのでログは初期化しない
    if matches.get_flag("info") {
        let scenario = ScenarioConfig::from_file(scenario_path)?;
        scenario.print_summary();
        return Ok(());
    }

    let _guard = init_logging(log_config(matches, verbose_level)?)?;

    let scenario = ScenarioConfig::from_file(scenario_path)?;
    info!(path = %scenario_path, teams = scenario.teams.len(), "シナリオファイル読み込み完了");

    let options = run_options(matches, verbose_level, |name| std::env::var(name).ok());
    let mut engine = SimulationEngine::new(&scenario, options)?;

    let timeline_path = required_path(matches, "timeline-log")?;
    let event_path = required_path(matches, "event-log")?;
    let mut recorder =
        NdjsonRecorder::new(create_output(timeline_path)?, create_output(event_path)?);

    let stats = engine.run(&mut recorder)?;
    info!(
        timeline = %timeline_path,
        events = %event_path,
        ticks = stats.ticks,
        "出力完了"
    );

    Ok(())
}

fn log_config(matches: &ArgMatches, verbose_level: u8) -> Result<LogConfig, SimError> {
    let output = matches
        .get_one::<String>("log-output")
        .map(|s| LogOutput::from_str(s))
        .transpose()
        .map_err(SimError::Config)?
        .unwrap_or(LogOutput::Console);

    let level = match matches.get_one::<String>("log-level") {
        Some(level) => parse_log_level(level),
        None => level_for_verbosity(verbose_level),
    };

    let mut config = LogConfig {
        level,
        output,
        ..LogConfig::default()
    };
    if let Some(dir) = matches.get_one::<String>("log-dir") {
        config.log_dir = dir.clone();
    }
    Ok(config)
}

/// 実行設定の組み立て
///
/// 優先順位はコマンドライン、環境変数、既定値の順です。
/// コマンドラインの値はそのまま使い（0はエンジン作成時にエラー）、
/// 環境変数は正の整数として読めない場合は無視します。
fn run_options<F>(matches: &ArgMatches, verbose_level: u8, env: F) -> RunOptions
where
    F: Fn(&str) -> Option<String>,
{
    let mut options = RunOptions {
        verbose_level,
        ..RunOptions::default()
    };

    let workers = matches
        .get_one::<usize>("workers")
        .copied()
        .or_else(|| positive_env(&env, "PARALLELISM"));
    if let Some(workers) = workers {
        options.worker_count = workers;
    }

    let chunk_size = matches
        .get_one::<usize>("chunk-size")
        .copied()
        .or_else(|| positive_env(&env, "CHUNK_SIZE"));
    if let Some(chunk_size) = chunk_size {
        options.chunk_size = chunk_size;
    }

    if let Some(&end_sec) = matches.get_one::<i64>("end-sec") {
        options.end_sec = end_sec;
    }
    options
}

fn positive_env<F>(env: &F, name: &str) -> Option<usize>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = env(name)?;
    match raw.trim().parse::<usize>() {
        Ok(value) if value > 0 => Some(value),
        _ => {
            warn!("環境変数 {}={:?} は正の整数ではないため無視します", name, raw);
            None
        }
    }
}

fn required_path<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a String, SimError> {
    matches
        .get_one::<String>(name)
        .ok_or_else(|| SimError::Config(format!("--{} が指定されていません", name)))
}

fn create_output(path: &str) -> Result<BufWriter<File>, SimError> {
    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(BufWriter::new(File::create(path)?))
}
