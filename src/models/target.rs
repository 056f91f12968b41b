use std::f64::consts::{FRAC_PI_2, PI};

use tracing::debug;

use crate::models::{
    common::{Position3D, Vector3},
    traits::{IAgent, ITrajectory},
};

/// ターゲットの飛行プロファイル
///
/// 直進 → 旋回上昇（下降）→ 直進 → 停止 の4フェーズを定義するパラメータです。
/// 角度はすべてラジアンで保持します。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetProfile {
    /// 初期位置
    pub start: Position3D,
    /// 飛行速度（m/s）
    pub speed: f64,
    /// 第1直進フェーズの継続時間 S1（秒）
    pub straight1_time: f64,
    /// 旋回フェーズの継続時間 C（秒）
    pub curve_time: f64,
    /// 第2直進フェーズの継続時間 S2（秒）
    pub straight2_time: f64,
    /// 旋回フェーズでの総旋回角（rad）
    pub turn_angle: f64,
    /// 旋回面の水平面からの傾き（rad）
    pub yz_angle: f64,
    /// 上昇量の係数
    pub climb_rate: f64,
}

impl TargetProfile {
    /// 旋回半径 `speed·C / turn_angle`
    ///
    /// 符号付きで返します。旋回角が負の場合は半径も負となり、円弧が反転します。
    pub fn turn_radius(&self) -> f64 {
        self.speed * self.curve_time / self.turn_angle
    }

    /// 旋回終了時の進行方向（単位ベクトル）
    pub fn final_heading(&self) -> Vector3 {
        Vector3::new(
            self.turn_angle.cos(),
            self.turn_angle.sin() * self.yz_angle.cos(),
            self.turn_angle.sin() * self.yz_angle.sin(),
        )
    }

    /// 旋回フェーズ終了時刻 S1 + C
    pub fn curve_end(&self) -> f64 {
        self.straight1_time + self.curve_time
    }

    /// 第2直進フェーズ終了時刻 S1 + C + S2
    pub fn straight2_end(&self) -> f64 {
        self.curve_end() + self.straight2_time
    }

    /// 旋回フェーズ内時刻`tc`における円弧上の角度
    ///
    /// `tc`が0→Cで -π/2 → -π/2 + turn_angle を線形に掃引します。
    pub fn arc_angle(&self, tc: f64) -> f64 {
        -FRAC_PI_2 + tc * self.turn_angle / self.curve_time
    }

    /// 旋回フェーズ内時刻`tc`における上昇（下降）量
    ///
    /// `speed² · (1 - cos(π·tc/C)) · climb_rate` です。tc=0 で0、tc=C で最大値
    /// `2·speed²·climb_rate` となり、両端で傾きが0になります。終端の上昇量は
    /// 第2直進フェーズのアンカーに引き継がれます。
    pub fn climb_offset(&self, tc: f64) -> f64 {
        self.speed.powi(2) * (1.0 - (PI * tc / self.curve_time).cos()) * self.climb_rate
    }
}

/// 飛行フェーズ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightPhase {
    /// 第1直進（0 ≤ t ≤ S1）
    Straight,
    /// 旋回上昇（S1 < t ≤ S1+C）
    Curve,
    /// 第2直進（S1+C < t ≤ S1+C+S2）
    SecondStraight,
    /// 停止（t > S1+C+S2）
    Hold,
}

impl FlightPhase {
    /// 時刻`t`が属するフェーズを判定
    ///
    /// 各フェーズは右閉区間を持ち、境界時刻は前のフェーズに属します。
    pub fn at(t: f64, profile: &TargetProfile) -> Self {
        if t <= profile.straight1_time {
            FlightPhase::Straight
        } else if t <= profile.curve_end() {
            FlightPhase::Curve
        } else if t <= profile.straight2_end() {
            FlightPhase::SecondStraight
        } else {
            FlightPhase::Hold
        }
    }
}

/// フェーズ遷移時に一度だけ確定するアンカー情報
///
/// 各フェーズの幾何は、前フェーズで実際に到達した位置を基準に解かれます。
/// フラグは false → true に一度だけ遷移し、リセットされません。
#[derive(Debug, Clone, Default)]
pub struct TargetPhaseState {
    pub curve_initialized: bool,
    pub straight2_initialized: bool,
    pub curve_start: Position3D,
    pub straight2_start: Position3D,
    pub center: Position3D,
    /// 直前に出力した位置
    pub last_position: Position3D,
}

/// ターゲット軌道モデル
///
/// 経過時刻から回避目標の位置を求めます。フェーズアンカーを内部に保持するため、
/// 1回のシミュレーションごとに新しく生成してください。
#[derive(Debug, Clone)]
pub struct TargetTrajectoryModel {
    pub id: String,
    pub profile: TargetProfile,
    pub state: TargetPhaseState,
    pub phase: FlightPhase,
}

impl TargetTrajectoryModel {
    pub fn new(id: String, profile: TargetProfile) -> Self {
        Self {
            id,
            profile,
            state: TargetPhaseState {
                last_position: profile.start,
                ..TargetPhaseState::default()
            },
            phase: FlightPhase::Straight,
        }
    }

    /// 旋回フェーズ初回進入時にアンカーと旋回中心を確定
    fn enter_curve(&mut self) {
        let radius = self.profile.turn_radius();
        let yz = self.profile.yz_angle;
        let start = self.state.last_position;

        self.state.curve_start = start;
        self.state.center = Vector3::new(
            start.x,
            start.y + radius * yz.cos(),
            start.z + radius * yz.sin(),
        );
        self.state.curve_initialized = true;

        debug!(
            target_id = %self.id,
            curve_start_x = start.x,
            curve_start_y = start.y,
            curve_start_z = start.z,
            center_x = self.state.center.x,
            center_y = self.state.center.y,
            center_z = self.state.center.z,
            radius = radius,
            "TARGET_PHASE_TRANSITION: 旋回フェーズに移行しました"
        );
    }

    /// 第2直進フェーズ初回進入時にアンカーを確定
    fn enter_second_straight(&mut self) {
        self.state.straight2_start = self.state.last_position;
        self.state.straight2_initialized = true;

        debug!(
            target_id = %self.id,
            straight2_start_x = self.state.straight2_start.x,
            straight2_start_y = self.state.straight2_start.y,
            straight2_start_z = self.state.straight2_start.z,
            "TARGET_PHASE_TRANSITION: 第2直進フェーズに移行しました"
        );
    }

    fn straight_position(&self, t: f64) -> Position3D {
        self.profile.start + Vector3::new(self.profile.speed * t, 0.0, 0.0)
    }

    fn curve_position(&self, tc: f64) -> Position3D {
        let radius = self.profile.turn_radius();
        let yz = self.profile.yz_angle;
        let arc = self.profile.arc_angle(tc);
        let center = self.state.center;

        let on_arc = Vector3::new(
            center.x + radius * arc.cos(),
            center.y + radius * arc.sin() * yz.cos(),
            center.z + radius * arc.sin() * yz.sin(),
        );

        // 旋回面に垂直な方向へ上昇量を重ねる
        let climb = self.profile.climb_offset(tc);
        let normal = Vector3::new(0.0, (yz + FRAC_PI_2).cos(), (yz + FRAC_PI_2).sin());
        on_arc + normal * climb
    }

    fn second_straight_position(&self, ts: f64) -> Position3D {
        self.state.straight2_start + self.profile.final_heading() * (self.profile.speed * ts)
    }

    fn hold_position(&self) -> Position3D {
        self.second_straight_position(self.profile.straight2_time)
    }
}

impl IAgent for TargetTrajectoryModel {
    fn get_id(&self) -> String {
        self.id.clone()
    }

    fn is_active(&self) -> bool {
        self.phase != FlightPhase::Hold
    }
}

impl ITrajectory for TargetTrajectoryModel {
    fn position_at(&mut self, t: f64) -> Position3D {
        let phase = FlightPhase::at(t, &self.profile);

        let position = match phase {
            FlightPhase::Straight => self.straight_position(t),
            FlightPhase::Curve => {
                if !self.state.curve_initialized {
                    self.enter_curve();
                }
                self.curve_position(t - self.profile.straight1_time)
            }
            FlightPhase::SecondStraight => {
                if !self.state.straight2_initialized {
                    self.enter_second_straight();
                }
                self.second_straight_position(t - self.profile.curve_end())
            }
            FlightPhase::Hold => {
                // 第2直進を一度も通らずに停止へ入った場合は直前位置を基準にする
                if !self.state.straight2_initialized {
                    self.enter_second_straight();
                }
                self.hold_position()
            }
        };

        if phase != self.phase && phase == FlightPhase::Hold {
            debug!(
                target_id = %self.id,
                hold_x = position.x,
                hold_y = position.y,
                hold_z = position.z,
                time = t,
                "TARGET_PHASE_TRANSITION: 停止フェーズに移行しました"
            );
        }

        self.phase = phase;
        self.state.last_position = position;
        position
    }
}
