mod analysis;
mod export;
mod logging;
mod models;
mod scenario;
mod simulation;
mod sweep;

use std::str::FromStr;

use clap::{Arg, Command};
use tracing::info;

use analysis::EngagementAnalysis;
use logging::{LogConfig, LogOutput};
use scenario::{ScenarioConfig, SweepConfig};
use simulation::SimulationEngine;

fn main() {
    // コマンドライン引数の解析
    let matches = Command::new("pursuitsim")
        .version("0.1.0")
        .about("純追尾ミサイル迎撃シミュレーション (Pursuit Simulation)")
        .long_about("旋回上昇する目標と純追尾誘導ミサイルの運動記録を生成し、迎撃を判定します。\n\
                     固定時間刻みの決定論的シミュレーションです。")
        .arg(
            Arg::new("scenario")
                .short('s')
                .long("scenario")
                .value_name("FILE")
                .help("シナリオファイル(.yaml)のパスを指定")
                .long_help("実行するシナリオファイル(.yaml)のパスを指定します。\n\
                           指定しない場合、既定シナリオで実行されます。")
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("CSV")
                .help("運動記録をCSVに出力")
        )
        .arg(
            Arg::new("info")
                .short('i')
                .long("info")
                .action(clap::ArgAction::SetTrue)
                .help("シナリオの情報のみ表示して終了")
                .conflicts_with("sweep")
        )
        .arg(
            Arg::new("sweep")
                .long("sweep")
                .action(clap::ArgAction::SetTrue)
                .help("シナリオのsweep設定でパラメータスイープを実行")
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(clap::ArgAction::Count)
                .help("詳細出力レベル (-v: 基本, -vv: 詳細, -vvv: デバッグ)")
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("ログレベル (trace, debug, info, warn, error)")
        )
        .arg(
            Arg::new("log-output")
                .long("log-output")
                .value_name("OUTPUT")
                .default_value("console")
                .help("ログ出力先 (console, file, both)")
        )
        .get_matches();

    let verbose_level = matches.get_count("verbose");

    let level = match matches.get_one::<String>("log-level") {
        Some(level) => logging::parse_log_level(level),
        None => logging::level_from_verbosity(verbose_level),
    };
    let output = match matches.get_one::<String>("log-output") {
        Some(output) => match LogOutput::from_str(output) {
            Ok(output) => output,
            Err(e) => {
                eprintln!("エラー: {}", e);
                std::process::exit(1);
            }
        },
        None => LogOutput::Console,
    };

    // ガードはmain終了まで保持する
    let _guard = match logging::init_logging(LogConfig { level, output, ..LogConfig::default() }) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("ログ初期化エラー: {}", e);
            std::process::exit(1);
        }
    };

    println!("純追尾ミサイル迎撃シミュレーション - pursuitsim v0.1.0");
    println!();

    let options = RunOptions {
        info_only: matches.get_flag("info"),
        sweep: matches.get_flag("sweep"),
        output: matches.get_one::<String>("output").cloned(),
        verbose_level,
    };

    let result = match matches.get_one::<String>("scenario") {
        Some(scenario_path) => ScenarioConfig::from_file(scenario_path)
            .map_err(|e| -> Box<dyn std::error::Error> { Box::new(e) })
            .and_then(|scenario| {
                if verbose_level > 0 {
                    println!("シナリオファイル読み込み完了: {}", scenario_path);
                }
                run_scenario(scenario, &options)
            }),
        None => run_scenario(ScenarioConfig::default(), &options),
    };

    if let Err(e) = result {
        eprintln!("エラー: {}", e);
        std::process::exit(1);
    }
}

struct RunOptions {
    info_only: bool,
    sweep: bool,
    output: Option<String>,
    verbose_level: u8,
}

/// シナリオを実行
fn run_scenario(scenario: ScenarioConfig, options: &RunOptions) -> Result<(), Box<dyn std::error::Error>> {
    scenario.print_summary();
    println!();

    if options.info_only {
        return Ok(());
    }

    if options.sweep {
        let sweep = scenario.sweep.clone().unwrap_or_else(|| SweepConfig {
            kill_distances_m: vec![scenario.missile.kill_distance_m, scenario.analysis.hit_distance_m],
            launch_times_s: Vec::new(),
        });
        let results = sweep::run_sweep(&scenario, &sweep)?;
        sweep::print_results(&results);
        return Ok(());
    }

    let mut engine = SimulationEngine::new(&scenario, options.verbose_level)?;
    let run = engine.run();

    if let Some(analysis) = EngagementAnalysis::evaluate(&run, scenario.analysis.hit_distance_m) {
        analysis.print_summary();
    }

    if let Some(path) = &options.output {
        export::export_csv(path, &run)?;
        println!();
        println!("CSVを出力しました: {} ({}行)", path, run.records.len());
    }

    if options.verbose_level > 0 {
        info!("シナリオ実行が正常に完了しました。");
    }

    Ok(())
}
