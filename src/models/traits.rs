use crate::models::common::*;
use crate::models::missile::{GuidanceOutput, InterceptState};

/// 全てのシミュレーションエージェントが実装する基本インターフェース
pub trait IAgent {
    /// エージェントIDの取得
    fn get_id(&self) -> String;

    /// エージェントがアクティブかどうか
    fn is_active(&self) -> bool;
}

/// 経過時刻から位置を決定する軌道モデルのインターフェース
pub trait ITrajectory {
    /// 時刻`t`における位置を返す
    ///
    /// 時刻は単調増加で呼び出されることを前提とします。
    fn position_at(&mut self, t: f64) -> Position3D;
}

/// ターゲット位置に対する誘導則のインターフェース
pub trait IGuidance {
    /// 1ティック分誘導計算と運動更新を行う
    fn advance(&mut self, t: f64, target_position: Position3D) -> GuidanceOutput;

    /// 現在の迎撃状態
    fn intercept_state(&self) -> InterceptState;
}
