//! 実行結果の事後解析
//!
//! 生成済みの運動記録から命中サンプル、最接近点、命中時の姿勢と視線誤差を求めます。
//! 命中判定距離は生成時のキル距離とは独立した設定値です。

use std::fmt::Write;

use crate::models::{Attitude3D, InterceptState, heading_error_deg};
use crate::simulation::{KinematicRecord, SimulationRun};

/// 解析上の交戦状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngagementStatus {
    Hit,
    Track,
}

impl std::fmt::Display for EngagementStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngagementStatus::Hit => write!(f, "HIT"),
            EngagementStatus::Track => write!(f, "TRACK"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngagementAnalysis {
    pub hit_distance: f64,
    /// 各サンプルのミサイル・ターゲット間距離
    pub separations: Vec<f64>,
    /// 距離が命中判定距離以下となった最初のサンプル、なければ最終サンプル
    pub hit_index: usize,
    /// 評価サンプルの運動記録
    pub hit_record: KinematicRecord,
    pub status: EngagementStatus,
    pub closest_index: usize,
    pub closest_distance: f64,
    pub closest_time: f64,
    /// 命中サンプルでの速度と視線のなす角（度）
    pub heading_error_deg: f64,
    pub missile_attitude: Attitude3D,
    pub target_attitude: Attitude3D,
    /// 生成時の迎撃状態
    pub intercept: InterceptState,
    pub intercept_index: Option<usize>,
    pub intercept_time: Option<f64>,
}

impl EngagementAnalysis {
    /// 実行結果を評価
    ///
    /// 記録が空の場合は`None`を返します。
    pub fn evaluate(run: &SimulationRun, hit_distance: f64) -> Option<Self> {
        if run.records.is_empty() {
            return None;
        }

        let separations: Vec<f64> = run.records.iter().map(|r| r.separation()).collect();

        let first_hit = separations.iter().position(|&d| d <= hit_distance);
        let (hit_index, status) = match first_hit {
            Some(i) => (i, EngagementStatus::Hit),
            None => (separations.len() - 1, EngagementStatus::Track),
        };

        let (closest_index, closest_distance) = separations
            .iter()
            .copied()
            .enumerate()
            .fold((0, f64::INFINITY), |best, (i, d)| if d < best.1 { (i, d) } else { best });

        let record = run.records[hit_index];

        Some(Self {
            hit_distance,
            hit_index,
            hit_record: record,
            status,
            closest_index,
            closest_distance,
            closest_time: run.records[closest_index].t,
            heading_error_deg: heading_error_deg(
                &record.missile_velocity,
                &record.missile_position,
                &record.target_position,
            ),
            missile_attitude: Attitude3D::from_velocity(&record.missile_velocity),
            target_attitude: Attitude3D::from_velocity(&record.target_velocity),
            intercept: run.intercept,
            intercept_index: run.intercept_index(),
            intercept_time: run.intercept_time(),
            separations,
        })
    }

    /// 解析結果の概要を文字列として組み立てる
    ///
    /// 評価時に保持した値のみを使用し、元の実行結果には依存しません。
    pub fn summary(&self) -> String {
        let record = &self.hit_record;
        let mut out = String::new();

        let _ = writeln!(out, "=== 交戦解析 ===");
        match (self.intercept_index, self.intercept_time) {
            (Some(index), Some(time)) => {
                let _ = writeln!(out, "迎撃: サンプル {} ({:.2}秒)", index, time);
            }
            _ if self.intercept == InterceptState::NotLaunched => {
                let _ = writeln!(out, "迎撃: なし (未発射)");
            }
            _ => {
                let _ = writeln!(out, "迎撃: なし (追尾中のまま終了)");
            }
        }
        let _ = writeln!(out, "判定: {} (命中判定距離 {:.1}m)", self.status, self.hit_distance);
        let _ = writeln!(out, "評価サンプル: {} ({:.2}秒)", self.hit_index, record.t);
        let _ = writeln!(out, "ミサイル位置: ({:.1}, {:.1}, {:.1})",
                         record.missile_position.x, record.missile_position.y, record.missile_position.z);
        let _ = writeln!(out, "ターゲット位置: ({:.1}, {:.1}, {:.1})",
                         record.target_position.x, record.target_position.y, record.target_position.z);
        let _ = writeln!(out, "相対距離: {:.2}m", self.separations[self.hit_index]);
        let _ = writeln!(out, "最接近: {:.2}m (サンプル {}, {:.2}秒)",
                         self.closest_distance, self.closest_index, self.closest_time);
        let _ = writeln!(out, "視線誤差: {:.2}度", self.heading_error_deg);
        let _ = writeln!(out, "ミサイル姿勢: ピッチ {:.1}度 / ヨー {:.1}度",
                         self.missile_attitude.pitch, self.missile_attitude.yaw);
        let _ = writeln!(out, "ターゲット姿勢: ピッチ {:.1}度 / ヨー {:.1}度",
                         self.target_attitude.pitch, self.target_attitude.yaw);
        out
    }

    /// 解析結果の概要を表示
    pub fn print_summary(&self) {
        print!("{}", self.summary());
    }
}
