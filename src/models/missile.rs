use tracing::{debug, info};

use crate::models::{
    common::{EPSILON, Position3D, Velocity3D, Vector3, math_utils},
    traits::{IAgent, IGuidance},
};

/// 迎撃状態
///
/// NotLaunched → Tracking → Intercepted の順にのみ遷移し、Intercepted から戻ることはありません。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InterceptState {
    /// 発射時刻前
    NotLaunched,
    /// 追尾中
    Tracking,
    /// 迎撃済み（初めてキル距離を下回ったサンプル番号と時刻）
    Intercepted { index: usize, time: f64 },
}

impl InterceptState {
    pub fn is_intercepted(&self) -> bool {
        matches!(self, InterceptState::Intercepted { .. })
    }
}

/// 1ティック分の誘導結果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuidanceOutput {
    pub position: Position3D,
    pub velocity: Velocity3D,
    pub state: InterceptState,
}

/// ミサイルの性能・発射パラメータ
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MissileParameters {
    /// 発射位置
    pub start: Position3D,
    /// 飛翔速度（m/s、一定）
    pub speed: f64,
    /// 発射時刻（秒）
    pub launch_time: f64,
    /// キル距離（m）
    pub kill_distance: f64,
}

/// 3次元姿勢
///
/// 速度ベクトルの向きをオイラー角（度）で表現します。ロールは扱いません。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attitude3D {
    /// ピッチ角（度）
    pub pitch: f64,
    /// ヨー角（度）
    pub yaw: f64,
}

impl Attitude3D {
    /// 速度ベクトルから姿勢を計算
    ///
    /// 速度が1e-6未満の場合は向きが定義できないため、ゼロ姿勢を返します。
    pub fn from_velocity(velocity: &Velocity3D) -> Self {
        if velocity.magnitude() < 1e-6 {
            return Self { pitch: 0.0, yaw: 0.0 };
        }

        let pitch = math_utils::rad_to_deg(velocity.z.atan2(velocity.magnitude_xy()));
        let yaw = math_utils::rad_to_deg(velocity.y.atan2(velocity.x));
        Self { pitch, yaw }
    }
}

/// 速度ベクトルと視線ベクトルのなす角（度）
///
/// どちらかのベクトルが縮退している場合は0を返します。
pub fn heading_error_deg(velocity: &Velocity3D, missile: &Position3D, target: &Position3D) -> f64 {
    let los = *target - *missile;
    if velocity.magnitude() < 1e-6 || los.magnitude() < 1e-6 {
        return 0.0;
    }

    let cos = velocity.normalize_or_zero().dot(&los.normalize_or_zero());
    math_utils::rad_to_deg(cos.clamp(-1.0, 1.0).acos())
}

/// 純追尾誘導ミサイル
///
/// 毎ティック、前回位置からターゲットの現在位置へ向かう視線方向に一定速度で飛翔し、
/// 前進オイラー法で位置を更新します。キル距離の判定は位置更新前に行います。
#[derive(Debug, Clone)]
pub struct Missile {
    pub id: String,
    pub params: MissileParameters,
    pub position: Position3D,
    pub velocity: Velocity3D,
    pub state: InterceptState,
    /// 時間刻み（秒）
    pub dt: f64,
    /// `position`が対応するサンプル番号
    pub tick: usize,
    /// 累積飛行距離（m）
    pub total_distance: f64,
}

impl Missile {
    pub fn new(id: String, params: MissileParameters, dt: f64) -> Self {
        Self {
            id,
            params,
            position: params.start,
            velocity: Vector3::zero(),
            state: InterceptState::NotLaunched,
            dt,
            tick: 0,
            total_distance: 0.0,
        }
    }

    fn hold(&mut self) -> GuidanceOutput {
        self.velocity = Vector3::zero();
        self.output()
    }

    fn output(&self) -> GuidanceOutput {
        GuidanceOutput {
            position: self.position,
            velocity: self.velocity,
            state: self.state,
        }
    }

    fn launch(&mut self, t: f64, target_position: Position3D) {
        self.state = InterceptState::Tracking;

        info!(
            missile_id = %self.id,
            launch_time = t,
            launch_position_x = self.position.x,
            launch_position_y = self.position.y,
            launch_position_z = self.position.z,
            speed = self.params.speed,
            kill_distance = self.params.kill_distance,
            initial_range = self.position.distance_3d(&target_position),
            "MISSILE_LAUNCHED: ミサイルが発射されました"
        );
    }

    fn intercept(&mut self, t: f64, target_position: Position3D, range: f64) {
        self.state = InterceptState::Intercepted { index: self.tick, time: t };

        info!(
            missile_id = %self.id,
            intercept_index = self.tick,
            intercept_time = t,
            missile_position_x = self.position.x,
            missile_position_y = self.position.y,
            missile_position_z = self.position.z,
            target_position_x = target_position.x,
            target_position_y = target_position.y,
            target_position_z = target_position.z,
            intercept_distance = range,
            total_distance = self.total_distance,
            "MISSILE_INTERCEPT: ミサイルがターゲットを迎撃しました"
        );
    }
}

impl IAgent for Missile {
    fn get_id(&self) -> String {
        self.id.clone()
    }

    fn is_active(&self) -> bool {
        self.state == InterceptState::Tracking
    }
}

impl IGuidance for Missile {
    fn advance(&mut self, t: f64, target_position: Position3D) -> GuidanceOutput {
        self.tick += 1;

        if self.state == InterceptState::NotLaunched && t >= self.params.launch_time {
            self.launch(t, target_position);
        }

        if self.state != InterceptState::Tracking {
            return self.hold();
        }

        // 視線ベクトル（更新前の位置から現在のターゲット位置へ）
        let los = target_position - self.position;
        let range = los.magnitude();

        // 視線長ゼロは方向が定義できないため迎撃済みとして扱う
        if range < self.params.kill_distance || range < EPSILON {
            self.intercept(t, target_position, range);
            return self.hold();
        }

        self.velocity = (los / range) * self.params.speed;
        let step = self.velocity * self.dt;
        self.position = self.position + step;
        self.total_distance += step.magnitude();

        debug!(
            missile_id = %self.id,
            time = t,
            range = range,
            "MISSILE_GUIDANCE"
        );

        self.output()
    }

    fn intercept_state(&self) -> InterceptState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(launch_time: f64, kill_distance: f64) -> MissileParameters {
        MissileParameters {
            start: Vector3::new(13000.0, 12000.0, 0.0),
            speed: 800.0,
            launch_time,
            kill_distance,
        }
    }

    #[test]
    fn test_holds_before_launch() {
        let mut missile = Missile::new("M".to_string(), params(1.0, 50.0), 0.1);
        let target = Vector3::new(0.0, 0.0, 12000.0);

        let out = missile.advance(0.5, target);
        assert_eq!(out.state, InterceptState::NotLaunched);
        assert_eq!(out.position, missile.params.start);
        assert_eq!(out.velocity, Vector3::zero());

        let out = missile.advance(1.0, target);
        assert_eq!(out.state, InterceptState::Tracking);
        assert!(missile.is_active());
    }

    #[test]
    fn test_pure_pursuit_velocity() {
        let mut missile = Missile::new("M".to_string(), params(0.0, 50.0), 0.1);
        let target = Vector3::new(0.0, 0.0, 12000.0);
        let previous = missile.position;

        let out = missile.advance(0.1, target);
        let expected_dir = (target - previous).normalize_or_zero();

        assert!((out.velocity.magnitude() - 800.0).abs() < 1e-9);
        assert!((out.velocity.normalize_or_zero().dot(&expected_dir) - 1.0).abs() < 1e-12);
        assert!(out.position.distance_3d(&(previous + out.velocity * 0.1)) < 1e-9);
    }

    #[test]
    fn test_intercept_uses_pre_update_range() {
        let mut missile = Missile::new("M".to_string(), params(0.0, 50.0), 0.1);
        missile.position = Vector3::new(0.0, 0.0, 0.0);

        // 更新前の距離が60mなのでこのティックでは迎撃しない
        let out = missile.advance(0.1, Vector3::new(60.0, 0.0, 0.0));
        assert_eq!(out.state, InterceptState::Tracking);
        assert!((out.position.x - 80.0).abs() < 1e-9);

        // 更新前の距離が40mで迎撃、位置は更新前のまま
        let out = missile.advance(0.2, Vector3::new(120.0, 0.0, 0.0));
        assert_eq!(out.state, InterceptState::Intercepted { index: 2, time: 0.2 });
        assert!((out.position.x - 80.0).abs() < 1e-9);
        assert_eq!(out.velocity, Vector3::zero());
    }

    #[test]
    fn test_intercept_is_terminal() {
        let mut missile = Missile::new("M".to_string(), params(0.0, 50.0), 0.1);
        let target = missile.position + Vector3::new(10.0, 0.0, 0.0);

        let first = missile.advance(0.1, target);
        assert!(first.state.is_intercepted());

        for k in 2..20 {
            let far = Vector3::new(1.0e5, -1.0e5, 3.0e3);
            let out = missile.advance(k as f64 * 0.1, far);
            assert_eq!(out.position, first.position);
            assert_eq!(out.velocity, Vector3::zero());
            assert_eq!(out.state, first.state);
        }
        assert!(!missile.is_active());
    }

    #[test]
    fn test_coincident_target_does_not_produce_nan() {
        // キル距離を極小にしても視線長ゼロは迎撃扱い
        let mut missile = Missile::new("M".to_string(), params(0.0, 1e-12), 0.1);
        let out = missile.advance(0.1, missile.params.start);

        assert!(out.state.is_intercepted());
        assert!(out.position.is_finite() && out.velocity.is_finite());
    }

    #[test]
    fn test_kill_distance_thresholds() {
        // 同じ幾何でもキル距離によって迎撃判定が変わる
        for (kill_distance, expect_hit) in [(50.0, true), (35.0, false)] {
            let mut missile = Missile::new("M".to_string(), params(0.0, kill_distance), 0.1);
            let target = missile.position + Vector3::new(0.0, 40.0, 0.0);
            let out = missile.advance(0.1, target);
            assert_eq!(out.state.is_intercepted(), expect_hit);
        }
    }

    #[test]
    fn test_attitude_and_heading_error() {
        let level = Attitude3D::from_velocity(&Vector3::new(0.0, 10.0, 0.0));
        assert!((level.yaw - 90.0).abs() < 1e-9);
        assert!(level.pitch.abs() < 1e-9);

        let climb = Attitude3D::from_velocity(&Vector3::new(1.0, 0.0, 1.0));
        assert!((climb.pitch - 45.0).abs() < 1e-9);

        let still = Attitude3D::from_velocity(&Vector3::zero());
        assert_eq!(still, Attitude3D { pitch: 0.0, yaw: 0.0 });

        let origin = Vector3::zero();
        let err = heading_error_deg(&Vector3::new(1.0, 0.0, 0.0), &origin, &Vector3::new(0.0, 5.0, 0.0));
        assert!((err - 90.0).abs() < 1e-9);
        assert_eq!(heading_error_deg(&Vector3::zero(), &origin, &Vector3::new(1.0, 0.0, 0.0)), 0.0);
    }
}
