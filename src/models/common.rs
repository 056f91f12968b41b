use std::ops::{Add, Div, Mul, Sub};

use crate::scenario::ScenarioError;

/// 正規化時にゼロベクトルとみなす長さの閾値
pub const EPSILON: f64 = 1e-9;

/// 慣性座標系の3次元ベクトル
///
/// 位置（m）と速度（m/s）の両方に使用します。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// 位置ベクトル（m）
pub type Position3D = Vector3;
/// 速度ベクトル（m/s）
pub type Velocity3D = Vector3;

impl Vector3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// ベクトルの長さ
    pub fn magnitude(&self) -> f64 {
        (self.x.powi(2) + self.y.powi(2) + self.z.powi(2)).sqrt()
    }

    /// XY平面での長さ
    pub fn magnitude_xy(&self) -> f64 {
        (self.x.powi(2) + self.y.powi(2)).sqrt()
    }

    /// 3次元距離を計算
    pub fn distance_3d(&self, other: &Vector3) -> f64 {
        (*self - *other).magnitude()
    }

    pub fn dot(&self, other: &Vector3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// 単位ベクトルを返す
    ///
    /// 長さが`EPSILON`未満の場合は方向が定義できないため、ゼロベクトルを返します。
    pub fn normalize_or_zero(&self) -> Self {
        let mag = self.magnitude();
        if mag < EPSILON {
            Self::zero()
        } else {
            *self / mag
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vector3 {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Sub for Vector3 {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl Mul<f64> for Vector3 {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self::Output {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

impl Div<f64> for Vector3 {
    type Output = Self;

    fn div(self, scalar: f64) -> Self::Output {
        Self::new(self.x / scalar, self.y / scalar, self.z / scalar)
    }
}

/// 固定時間刻みのシミュレーション時計
///
/// `n = ceil(t_max / dt)` 個のサンプル時刻 `t_i = i·dt` (i = 0..n-1) を生成します。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationClock {
    /// 時間刻み（秒）
    pub dt: f64,
    /// 総シミュレーション時間（秒）
    pub t_max: f64,
}

impl SimulationClock {
    pub fn new(dt: f64, t_max: f64) -> Result<Self, ScenarioError> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(ScenarioError::ValidationError(format!("dt_s must be positive, got {}", dt)));
        }
        if !t_max.is_finite() || t_max <= 0.0 {
            return Err(ScenarioError::ValidationError(format!("t_max_s must be positive, got {}", t_max)));
        }
        Ok(Self { dt, t_max })
    }

    /// サンプル数
    pub fn sample_count(&self) -> usize {
        (self.t_max / self.dt).ceil() as usize
    }

    /// i番目のサンプル時刻
    pub fn time_at(&self, index: usize) -> f64 {
        index as f64 * self.dt
    }
}

/// 数学ユーティリティ関数
pub mod math_utils {
    /// 度をラジアンに変換
    pub fn deg_to_rad(degrees: f64) -> f64 {
        degrees * std::f64::consts::PI / 180.0
    }

    /// ラジアンを度に変換
    pub fn rad_to_deg(radians: f64) -> f64 {
        radians * 180.0 / std::f64::consts::PI
    }
}
