// 基本的なデータ型と数学ユーティリティ
pub mod common;

// エージェントの基本インターフェース（trait）定義
pub mod traits;

// 各エージェントモデルの実装
pub mod target;
pub mod missile;

// 便利な re-export
pub use common::*;
pub use traits::*;
pub use target::TargetTrajectoryModel;
pub use missile::{Attitude3D, InterceptState, Missile, heading_error_deg};
