//! # Simulation モジュール
//!
//! 追尾シミュレーションの中核となるシミュレーションエンジンを提供します。
//!
//! 固定時間刻みでサンプル時刻を走査し、各時刻でターゲット軌道モデルから目標位置を求め、
//! その位置を純追尾誘導ミサイルに与えて1ティック進めます。両者は現在の目標位置のみで
//! 結合しており、誘導則は将来の目標位置を知りません。
//!
//! ## 処理順序
//!
//! 1. **ターゲット処理**: フェーズ判定とアンカー確定、位置計算
//! 2. **ミサイル処理**: 発射判定、迎撃判定、誘導と位置更新
//! 3. **後処理**: ターゲット速度の後退差分、先頭サンプル速度の補完
//!
//! ## 使用例
//!
//! ```rust
//! let config = ScenarioConfig::default();
//! let mut engine = SimulationEngine::new(&config, 1)?;
//! let run = engine.run();
//! println!("{:?}", run.intercept);
//! ```

use crate::models::*;
use crate::scenario::{ScenarioConfig, ScenarioError};
use tracing::{info, trace};

/// 1サンプル分の運動記録
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicRecord {
    /// サンプル時刻（秒）
    pub t: f64,
    pub missile_position: Position3D,
    pub missile_velocity: Velocity3D,
    pub target_position: Position3D,
    pub target_velocity: Velocity3D,
}

impl KinematicRecord {
    /// ミサイルとターゲットの距離
    pub fn separation(&self) -> f64 {
        self.missile_position.distance_3d(&self.target_position)
    }
}

/// 1回のシミュレーション結果
///
/// 時刻順に並んだ運動記録と最終的な迎撃状態を保持します。
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationRun {
    pub records: Vec<KinematicRecord>,
    pub intercept: InterceptState,
}

impl SimulationRun {
    pub fn intercept_index(&self) -> Option<usize> {
        match self.intercept {
            InterceptState::Intercepted { index, .. } => Some(index),
            _ => None,
        }
    }

    pub fn intercept_time(&self) -> Option<f64> {
        match self.intercept {
            InterceptState::Intercepted { time, .. } => Some(time),
            _ => None,
        }
    }

    pub fn final_record(&self) -> Option<&KinematicRecord> {
        self.records.last()
    }
}

pub struct SimulationEngine {
    pub clock: SimulationClock,
    pub target: TargetTrajectoryModel,
    pub missile: Missile,
    pub verbose_level: u8,
}

impl SimulationEngine {
    /// シナリオからエンジンを生成
    ///
    /// フェーズアンカーとミサイル状態はエンジンごとに新しく生成され、実行間で共有されません。
    pub fn new(scenario: &ScenarioConfig, verbose_level: u8) -> Result<Self, ScenarioError> {
        scenario.validate()?;
        let clock = scenario.clock()?;

        let target = TargetTrajectoryModel::new("TGT001".to_string(), scenario.target_profile());
        let missile = Missile::new("MSL001".to_string(), scenario.missile_parameters(), clock.dt);

        Ok(Self {
            clock,
            target,
            missile,
            verbose_level,
        })
    }

    pub fn run(&mut self) -> SimulationRun {
        let n = self.clock.sample_count();
        info!(
            target_id = %self.target.get_id(),
            missile_id = %self.missile.get_id(),
            samples = n,
            dt = self.clock.dt,
            "=== シミュレーション実行開始 ==="
        );

        let mut records = Vec::with_capacity(n);
        for index in 0..n {
            let record = self.step(index);

            if self.verbose_level > 2 {
                trace!(
                    time = record.t,
                    step = index,
                    separation = record.separation(),
                    "SIMULATION_STEP"
                );
            }

            if index % 100 == 0 && self.verbose_level > 0 {
                let progress = (record.t / self.clock.t_max) * 100.0;
                info!(
                    target_active = self.target.is_active(),
                    missile_active = self.missile.is_active(),
                    "進行状況: {:.1}% ({:.1}/{:.1}秒)",
                    progress,
                    record.t,
                    self.clock.t_max
                );
            }

            records.push(record);
        }

        fill_target_velocities(&mut records, self.clock.dt);
        bootstrap_first_velocity(&mut records);

        let run = SimulationRun {
            records,
            intercept: self.missile.intercept_state(),
        };

        info!("=== シミュレーション完了 ===");
        match run.intercept {
            InterceptState::Intercepted { index, time } => {
                info!(intercept_index = index, intercept_time = time, "迎撃成功");
            }
            state => {
                let final_separation = run.final_record().map(KinematicRecord::separation);
                info!(
                    state = ?state,
                    final_separation = ?final_separation,
                    "シミュレーション終了まで迎撃なし"
                );
            }
        }

        run
    }

    fn step(&mut self, index: usize) -> KinematicRecord {
        let t = self.clock.time_at(index);
        let target_position = self.target.position_at(t);

        // 先頭サンプルは初期位置のまま（前回位置が存在しない）
        let (missile_position, missile_velocity) = if index == 0 {
            (self.missile.position, Vector3::zero())
        } else {
            let out = self.missile.advance(t, target_position);
            (out.position, out.velocity)
        };

        KinematicRecord {
            t,
            missile_position,
            missile_velocity,
            target_position,
            target_velocity: Vector3::zero(),
        }
    }
}

/// ターゲット速度を連続位置の後退差分で求める
fn fill_target_velocities(records: &mut [KinematicRecord], dt: f64) {
    for i in 1..records.len() {
        records[i].target_velocity = (records[i].target_position - records[i - 1].target_position) / dt;
    }
}

/// 先頭サンプルの速度を2番目のサンプルの値で補完する
///
/// ミサイルとターゲットの両方に同じ規則を適用します。サンプルが1つしかない場合は何もしません。
fn bootstrap_first_velocity(records: &mut [KinematicRecord]) {
    if records.len() < 2 {
        return;
    }
    records[0].missile_velocity = records[1].missile_velocity;
    records[0].target_velocity = records[1].target_velocity;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_default() -> SimulationRun {
        let config = ScenarioConfig::default();
        SimulationEngine::new(&config, 0).unwrap().run()
    }

    #[test]
    fn test_default_scenario_intercepts() {
        let config = ScenarioConfig::default();
        let run = run_default();

        assert_eq!(run.records.len(), 2110);
        let time = run.intercept_time().expect("迎撃されるべき");
        assert!(time > 0.0 && time < config.sim.t_max_s);
        // 旋回後の第2直進中に迎撃される
        assert!(time > 50.0 && time < 80.0, "intercept at {}", time);

        // (0, 0, 12000) と (13000, 12000, 0) の距離
        let start_separation = run.records[0].separation();
        assert!((start_separation - 21377.558).abs() < 1e-2);
    }

    #[test]
    fn test_run_is_deterministic() {
        let first = run_default();
        let second = run_default();
        assert_eq!(first, second);
        assert_eq!(
            first.intercept_time().map(f64::to_bits),
            second.intercept_time().map(f64::to_bits)
        );
    }

    #[test]
    fn test_records_are_time_ordered() {
        let run = run_default();
        assert_eq!(run.records[0].t, 0.0);
        assert!(run.records.windows(2).all(|w| w[1].t > w[0].t));
    }

    #[test]
    fn test_first_velocity_bootstrap() {
        let run = run_default();
        assert_eq!(run.records[0].missile_velocity, run.records[1].missile_velocity);
        assert_eq!(run.records[0].target_velocity, run.records[1].target_velocity);
        assert!((run.records[0].target_velocity.x - 750.0).abs() < 1e-6);
    }

    #[test]
    fn test_pursuit_and_intercept_invariants() {
        let run = run_default();
        let index = run.intercept_index().unwrap();
        let kill = ScenarioConfig::default().missile.kill_distance_m;

        for i in 1..index {
            let r = &run.records[i];
            let prev = run.records[i - 1].missile_position;
            let los = r.target_position - prev;

            // 更新前の距離はキル距離以上
            assert!(los.magnitude() >= kill);
            assert!((r.missile_velocity.magnitude() - 800.0).abs() < 1e-9);
            assert!((r.missile_velocity.normalize_or_zero().dot(&los.normalize_or_zero()) - 1.0).abs() < 1e-9);
        }

        let pre_update = run.records[index].target_position - run.records[index - 1].missile_position;
        assert!(pre_update.magnitude() < kill);

        let frozen = run.records[index].missile_position;
        assert_eq!(frozen, run.records[index - 1].missile_position);
        for r in &run.records[index..] {
            assert_eq!(r.missile_position, frozen);
            assert_eq!(r.missile_velocity, Vector3::zero());
        }
    }

    #[test]
    fn test_launch_delay_holds_missile() {
        let mut config = ScenarioConfig::default();
        config.missile.launch_time_s = 5.0;
        let run = SimulationEngine::new(&config, 0).unwrap().run();

        let start = config.missile.start.to_vector();
        for r in run.records.iter().filter(|r| r.t < 5.0) {
            assert_eq!(r.missile_position, start);
            assert_eq!(r.missile_velocity, Vector3::zero());
        }
        assert!((run.records[51].missile_velocity.magnitude() - 800.0).abs() < 1e-9);
    }

    #[test]
    fn test_never_intercepted_run_completes_tracking() {
        let mut config = ScenarioConfig::default();
        config.sim.t_max_s = 10.0;
        let run = SimulationEngine::new(&config, 0).unwrap().run();

        assert_eq!(run.intercept, InterceptState::Tracking);
        assert_eq!(run.records.len(), 100);
        assert!(run.final_record().is_some());
    }

    #[test]
    fn test_hold_phase_target_velocity_is_zero() {
        let run = run_default();
        let late = &run.records[1000];
        assert_eq!(late.target_velocity, Vector3::zero());
    }

    #[test]
    fn test_invalid_scenario_fails_fast() {
        let mut config = ScenarioConfig::default();
        config.sim.dt_s = -0.1;
        assert!(SimulationEngine::new(&config, 0).is_err());
    }
}
