//! パラメータスイープ
//!
//! キル距離と発射時刻の組み合わせごとに独立したシミュレーションを構成し、
//! tokioのマルチスレッドランタイム上で並列に実行します。各実行はそれぞれ専用の
//! 軌道モデルとミサイルを持ち、実行間で可変状態を共有しません。

use tracing::{info, warn};

use crate::models::InterceptState;
use crate::scenario::{ScenarioConfig, ScenarioError, SweepConfig};
use crate::simulation::SimulationEngine;

/// スイープ1ケースの結果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepResult {
    pub kill_distance: f64,
    pub launch_time: f64,
    pub intercept: InterceptState,
}

/// スイープ実行エラー
#[derive(Debug)]
pub enum SweepError {
    Scenario(ScenarioError),
    Runtime(std::io::Error),
    Join(tokio::task::JoinError),
}

impl std::fmt::Display for SweepError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SweepError::Scenario(err) => write!(f, "スイープ設定エラー: {}", err),
            SweepError::Runtime(err) => write!(f, "ランタイム生成エラー: {}", err),
            SweepError::Join(err) => write!(f, "スイープ実行エラー: {}", err),
        }
    }
}

impl std::error::Error for SweepError {}

impl From<ScenarioError> for SweepError {
    fn from(err: ScenarioError) -> Self {
        SweepError::Scenario(err)
    }
}

/// スイープ対象のシナリオを展開
///
/// 空の軸はベースシナリオの値を使用します。
pub fn expand_cases(base: &ScenarioConfig, sweep: &SweepConfig) -> Vec<ScenarioConfig> {
    let kill_distances = if sweep.kill_distances_m.is_empty() {
        vec![base.missile.kill_distance_m]
    } else {
        sweep.kill_distances_m.clone()
    };
    let launch_times = if sweep.launch_times_s.is_empty() {
        vec![base.missile.launch_time_s]
    } else {
        sweep.launch_times_s.clone()
    };

    let mut cases = Vec::with_capacity(kill_distances.len() * launch_times.len());
    for &kill_distance in &kill_distances {
        for &launch_time in &launch_times {
            let mut case = base.clone();
            case.missile.kill_distance_m = kill_distance;
            case.missile.launch_time_s = launch_time;
            case.sweep = None;
            cases.push(case);
        }
    }
    cases
}

/// スイープを並列実行
///
/// 結果は展開順（キル距離 → 発射時刻）で返します。
pub fn run_sweep(base: &ScenarioConfig, sweep: &SweepConfig) -> Result<Vec<SweepResult>, SweepError> {
    let cases = expand_cases(base, sweep);
    for case in &cases {
        case.validate()?;
    }

    info!(cases = cases.len(), "=== パラメータスイープ開始 ===");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .build()
        .map_err(SweepError::Runtime)?;

    let results = runtime.block_on(async move {
        let handles: Vec<_> = cases
            .into_iter()
            .map(|case| tokio::task::spawn_blocking(move || run_case(&case)))
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            results.push(handle.await.map_err(SweepError::Join)??);
        }
        Ok::<_, SweepError>(results)
    })?;

    for result in &results {
        if !result.intercept.is_intercepted() {
            warn!(
                kill_distance = result.kill_distance,
                launch_time = result.launch_time,
                "SWEEP_NO_INTERCEPT: 迎撃に至らなかったケースがあります"
            );
        }
    }

    Ok(results)
}

fn run_case(case: &ScenarioConfig) -> Result<SweepResult, SweepError> {
    let mut engine = SimulationEngine::new(case, 0)?;
    let run = engine.run();
    Ok(SweepResult {
        kill_distance: case.missile.kill_distance_m,
        launch_time: case.missile.launch_time_s,
        intercept: run.intercept,
    })
}

/// スイープ結果の一覧を表示
pub fn print_results(results: &[SweepResult]) {
    println!("=== パラメータスイープ結果 ===");
    println!("{:>10} {:>10} {:>10} {:>10}", "キル距離", "発射時刻", "迎撃", "迎撃時刻");
    for r in results {
        match r.intercept {
            InterceptState::Intercepted { index, time } => {
                println!("{:>10.1} {:>10.1} {:>10} {:>10.2}", r.kill_distance, r.launch_time, index, time);
            }
            _ => {
                println!("{:>10.1} {:>10.1} {:>10} {:>10}", r.kill_distance, r.launch_time, "-", "-");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_cases_cartesian_product() {
        let base = ScenarioConfig::default();
        let sweep = SweepConfig {
            kill_distances_m: vec![35.0, 50.0],
            launch_times_s: vec![0.0, 2.0, 4.0],
        };

        let cases = expand_cases(&base, &sweep);
        assert_eq!(cases.len(), 6);
        assert_eq!(cases[0].missile.kill_distance_m, 35.0);
        assert_eq!(cases[2].missile.launch_time_s, 4.0);
        assert_eq!(cases[3].missile.kill_distance_m, 50.0);
        assert!(cases.iter().all(|c| c.sweep.is_none()));
    }

    #[test]
    fn test_empty_axis_uses_base_value() {
        let base = ScenarioConfig::default();
        let cases = expand_cases(&base, &SweepConfig::default());
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].missile.kill_distance_m, 50.0);
    }

    #[test]
    fn test_parallel_sweep_matches_sequential_runs() {
        let mut base = ScenarioConfig::default();
        base.sim.t_max_s = 100.0;
        let sweep = SweepConfig {
            kill_distances_m: vec![35.0, 50.0],
            launch_times_s: vec![0.0, 3.0],
        };

        let results = run_sweep(&base, &sweep).unwrap();
        assert_eq!(results.len(), 4);

        for (case, result) in expand_cases(&base, &sweep).iter().zip(&results) {
            let sequential = SimulationEngine::new(case, 0).unwrap().run();
            assert_eq!(result.intercept, sequential.intercept);
            assert_eq!(result.kill_distance, case.missile.kill_distance_m);
            assert_eq!(result.launch_time, case.missile.launch_time_s);
        }
    }

    #[test]
    fn test_invalid_case_is_rejected() {
        let base = ScenarioConfig::default();
        let sweep = SweepConfig { kill_distances_m: vec![0.0], launch_times_s: vec![] };
        assert!(matches!(run_sweep(&base, &sweep), Err(SweepError::Scenario(_))));
    }
}
