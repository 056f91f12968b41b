use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::models::{
    common::{SimulationClock, Vector3, math_utils},
    missile::MissileParameters,
    target::TargetProfile,
};

/// シナリオメタデータ
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScenarioMeta {
    pub version: String,
    pub name: String,
    pub description: String,
}

/// シミュレーション設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationConfig {
    pub dt_s: f64,
    pub t_max_s: f64,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct Position3D {
    pub x_m: f64,
    pub y_m: f64,
    pub z_m: f64,
}

impl Position3D {
    pub fn to_vector(&self) -> Vector3 {
        Vector3::new(self.x_m, self.y_m, self.z_m)
    }
}

/// ターゲット飛行プロファイル設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TargetConfig {
    pub start: Position3D,
    pub speed_mps: f64,
    pub straight1_s: f64,
    pub curve_s: f64,
    pub straight2_s: f64,
    pub turn_angle_deg: f64,
    pub yz_angle_deg: f64,
    pub climb_rate: f64,
}

/// ミサイル設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MissileConfig {
    pub start: Position3D,
    pub speed_mps: f64,
    pub launch_time_s: f64,
    pub kill_distance_m: f64,
}

/// 事後解析設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalysisConfig {
    /// 命中判定距離（m）。生成時のキル距離とは独立に設定します。
    pub hit_distance_m: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self { hit_distance_m: 35.0 }
    }
}

/// パラメータスイープ設定
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SweepConfig {
    #[serde(default)]
    pub kill_distances_m: Vec<f64>,
    #[serde(default)]
    pub launch_times_s: Vec<f64>,
}

/// 完全なシナリオ設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScenarioConfig {
    pub meta: ScenarioMeta,
    pub sim: SimulationConfig,
    pub target: TargetConfig,
    pub missile: MissileConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub sweep: Option<SweepConfig>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            meta: ScenarioMeta {
                version: "1.0".to_string(),
                name: "default_pursuit".to_string(),
                description: "旋回上昇する目標に対する純追尾ミサイル".to_string(),
            },
            sim: SimulationConfig {
                dt_s: 0.1,
                t_max_s: 211.0,
            },
            target: TargetConfig {
                start: Position3D { x_m: 0.0, y_m: 0.0, z_m: 12000.0 },
                speed_mps: 750.0,
                straight1_s: 25.0,
                curve_s: 25.0,
                straight2_s: 25.0,
                turn_angle_deg: -240.0,
                yz_angle_deg: -15.0,
                climb_rate: -0.001,
            },
            missile: MissileConfig {
                start: Position3D { x_m: 13000.0, y_m: 12000.0, z_m: 0.0 },
                speed_mps: 800.0,
                launch_time_s: 0.0,
                kill_distance_m: 50.0,
            },
            analysis: AnalysisConfig::default(),
            sweep: None,
        }
    }
}

impl ScenarioConfig {
    /// YAMLファイルからシナリオ設定を読み込み
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();

        // ファイル存在チェック
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.to_path_buf()));
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| ScenarioError::IoError(path.to_path_buf(), e))?;

        let config: ScenarioConfig = serde_yaml::from_str(&contents)
            .map_err(|e| ScenarioError::ParseError(path.to_path_buf(), e))?;

        config.validate()?;

        Ok(config)
    }

    /// 設定の検証
    ///
    /// NaNが実行中に伝播しないよう、不正な設定は実行前に拒否します。
    pub fn validate(&self) -> Result<(), ScenarioError> {
        SimulationClock::new(self.sim.dt_s, self.sim.t_max_s)?;

        let target = &self.target;
        for (name, value) in [
            ("straight1_s", target.straight1_s),
            ("curve_s", target.curve_s),
            ("straight2_s", target.straight2_s),
            ("target.speed_mps", target.speed_mps),
            ("missile.speed_mps", self.missile.speed_mps),
            ("kill_distance_m", self.missile.kill_distance_m),
            ("hit_distance_m", self.analysis.hit_distance_m),
        ] {
            require_positive(name, value)?;
        }

        // 旋回角ゼロは半径無限大、非有限値は半径ゼロまたは不定
        if !target.turn_angle_deg.is_finite() || target.turn_angle_deg == 0.0 {
            return Err(ScenarioError::ValidationError(format!(
                "turn_angle_deg must be finite and non-zero, got {}",
                target.turn_angle_deg
            )));
        }
        let radius = self.target_profile().turn_radius();
        if !radius.is_finite() || radius == 0.0 {
            return Err(ScenarioError::ValidationError(format!("turn radius is degenerate: {}", radius)));
        }

        if !target.yz_angle_deg.is_finite() || !target.climb_rate.is_finite() {
            return Err(ScenarioError::ValidationError("yz_angle_deg and climb_rate must be finite".to_string()));
        }

        if !target.start.to_vector().is_finite() || !self.missile.start.to_vector().is_finite() {
            return Err(ScenarioError::ValidationError("start positions must be finite".to_string()));
        }

        if !self.missile.launch_time_s.is_finite() || self.missile.launch_time_s < 0.0 {
            return Err(ScenarioError::ValidationError(format!(
                "launch_time_s must be non-negative, got {}",
                self.missile.launch_time_s
            )));
        }

        if let Some(sweep) = &self.sweep {
            for &kill in &sweep.kill_distances_m {
                require_positive("sweep.kill_distances_m", kill)?;
            }
            for &launch in &sweep.launch_times_s {
                if !launch.is_finite() || launch < 0.0 {
                    return Err(ScenarioError::ValidationError(format!(
                        "sweep.launch_times_s must be non-negative, got {}",
                        launch
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn clock(&self) -> Result<SimulationClock, ScenarioError> {
        SimulationClock::new(self.sim.dt_s, self.sim.t_max_s)
    }

    /// ターゲット軌道パラメータ（角度はラジアンに変換）
    pub fn target_profile(&self) -> TargetProfile {
        let t = &self.target;
        TargetProfile {
            start: t.start.to_vector(),
            speed: t.speed_mps,
            straight1_time: t.straight1_s,
            curve_time: t.curve_s,
            straight2_time: t.straight2_s,
            turn_angle: math_utils::deg_to_rad(t.turn_angle_deg),
            yz_angle: math_utils::deg_to_rad(t.yz_angle_deg),
            climb_rate: t.climb_rate,
        }
    }

    pub fn missile_parameters(&self) -> MissileParameters {
        MissileParameters {
            start: self.missile.start.to_vector(),
            speed: self.missile.speed_mps,
            launch_time: self.missile.launch_time_s,
            kill_distance: self.missile.kill_distance_m,
        }
    }

    /// シナリオの概要を表示
    pub fn print_summary(&self) {
        println!("=== シナリオ情報 ===");
        println!("名前: {}", self.meta.name);
        println!("説明: {}", self.meta.description);
        println!("バージョン: {}", self.meta.version);
        println!();

        println!("=== シミュレーション設定 ===");
        println!("時間刻み: {:.3}秒", self.sim.dt_s);
        println!("最大時間: {:.1}秒", self.sim.t_max_s);
        if let Ok(clock) = self.clock() {
            println!("サンプル数: {}", clock.sample_count());
        }
        println!();

        let t = &self.target;
        println!("=== ターゲット ===");
        println!("初期位置: ({:.0}, {:.0}, {:.0})", t.start.x_m, t.start.y_m, t.start.z_m);
        println!("速度: {:.1} m/s", t.speed_mps);
        println!("フェーズ: 直進 {:.1}秒 / 旋回 {:.1}秒 / 直進 {:.1}秒", t.straight1_s, t.curve_s, t.straight2_s);
        println!("旋回角: {:.1}度 (旋回面傾き {:.1}度, 旋回半径 {:.1}m)",
                 t.turn_angle_deg, t.yz_angle_deg, self.target_profile().turn_radius());
        println!();

        let m = &self.missile;
        println!("=== ミサイル ===");
        println!("初期位置: ({:.0}, {:.0}, {:.0})", m.start.x_m, m.start.y_m, m.start.z_m);
        println!("速度: {:.1} m/s", m.speed_mps);
        println!("発射時刻: {:.1}秒", m.launch_time_s);
        println!("キル距離: {:.1}m (解析用命中距離 {:.1}m)", m.kill_distance_m, self.analysis.hit_distance_m);
        println!("初期相対距離: {:.1}m", t.start.to_vector().distance_3d(&m.start.to_vector()));
    }
}

fn require_positive(name: &str, value: f64) -> Result<(), ScenarioError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ScenarioError::ValidationError(format!("{} must be positive, got {}", name, value)));
    }
    Ok(())
}

/// シナリオ読み込みエラー
#[derive(Debug)]
pub enum ScenarioError {
    FileNotFound(std::path::PathBuf),
    IoError(std::path::PathBuf, std::io::Error),
    ParseError(std::path::PathBuf, serde_yaml::Error),
    ValidationError(String),
}

impl std::fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScenarioError::FileNotFound(path) => {
                write!(f, "シナリオファイルが見つかりません: {}", path.display())
            }
            ScenarioError::IoError(path, err) => {
                write!(f, "ファイル読み込みエラー {}: {}", path.display(), err)
            }
            ScenarioError::ParseError(path, err) => {
                write!(f, "YAML解析エラー {}: {}", path.display(), err)
            }
            ScenarioError::ValidationError(msg) => {
                write!(f, "設定検証エラー: {}", msg)
            }
        }
    }
}

impl std::error::Error for ScenarioError {}
