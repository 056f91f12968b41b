//! 運動記録のCSV出力
//!
//! 列順はミサイル（位置・速度）、ターゲット（位置・速度）の順です。

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::simulation::{KinematicRecord, SimulationRun};

pub const CSV_HEADER: &str = "time,mx,my,mz,mvx,mvy,mvz,tx,ty,tz,tvx,tvy,tvz";

/// CSV出力エラー
#[derive(Debug)]
pub enum ExportError {
    IoError(PathBuf, std::io::Error),
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::IoError(path, err) => {
                write!(f, "CSV書き込みエラー {}: {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for ExportError {}

/// CSV行の作成
pub fn create_csv_row(record: &KinematicRecord) -> String {
    let m = record.missile_position;
    let mv = record.missile_velocity;
    let p = record.target_position;
    let v = record.target_velocity;
    format!(
        "{},{},{},{},{},{},{},{},{},{},{},{},{}",
        record.t, m.x, m.y, m.z, mv.x, mv.y, mv.z, p.x, p.y, p.z, v.x, v.y, v.z
    )
}

/// ヘッダーと全サンプルを書き込む
pub fn write_csv<W: Write>(writer: &mut W, run: &SimulationRun) -> Result<(), std::io::Error> {
    writeln!(writer, "{}", CSV_HEADER)?;
    for record in &run.records {
        writeln!(writer, "{}", create_csv_row(record))?;
    }
    writer.flush()
}

/// ファイルへCSVを出力
///
/// 親ディレクトリが存在しない場合は作成します。
pub fn export_csv<P: AsRef<Path>>(path: P, run: &SimulationRun) -> Result<(), ExportError> {
    let path = path.as_ref();
    let io_err = |e| ExportError::IoError(path.to_path_buf(), e);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    write_csv(&mut writer, run).map_err(io_err)?;

    info!(
        path = %path.display(),
        rows = run.records.len(),
        "CSV_EXPORTED: 運動記録を出力しました"
    );
    Ok(())
}
