#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

pub const TRIP_LOG_HEADER: &str =
    "vehicle_number,vehicle_type,departure_time,arrival_time,origin,destination";

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` under the workspace, creating parent directories.
    pub fn write(&self, name: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, contents).expect("write temp file contents");
        path
    }
}

/// One aggregate survey line: date, time and `(offset, count)` pairs placed
/// into the 24 vehicle-type count columns.
pub fn survey_line(date: &str, time: &str, counts: &[(usize, u32)]) -> String {
    let mut cells = vec![String::new(); 24];
    for (offset, count) in counts {
        cells[*offset] = count.to_string();
    }
    format!("{date},{time},{}", cells.join(","))
}

/// Aggregate export the way the portal converter writes it: a title row used
/// as the header, a metadata row, then interval lines.
pub fn survey_csv(lines: &[String]) -> String {
    let mut out = String::from("Traffic Count Survey,Start Time,Motorized Vehicle,Non-motorized Vehicle\n");
    out.push_str("Date,Time,Multi Axle Truck,Heavy Truck,Light Truck,Big Bus\n");
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
    out
}

pub fn trip_log_csv(rows: &[&str]) -> String {
    let mut out = format!("{TRIP_LOG_HEADER}\n");
    for row in rows {
        out.push_str(row);
        out.push('\n');
    }
    out
}
