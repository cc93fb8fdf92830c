//! Settlement CSV artifact
//!
//! One file per job: a header line, then one row per merchant/day. Row
//! order follows map iteration and is not part of the contract; consumers
//! compare rows as a set.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::aggregate::{DayTotals, SettlementKey};

pub const CSV_HEADER: &str = "merchant_id,date,gross,fee,net,txn_count";

/// Buffered CSV writer for one settlement run.
pub struct ReportWriter {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl ReportWriter {
    /// Create `<out_dir>/<job_id>.csv` (and the directory if missing) and
    /// write the header line.
    pub fn create(out_dir: &Path, job_id: &str) -> std::io::Result<Self> {
        std::fs::create_dir_all(out_dir)?;
        let path = out_dir.join(format!("{job_id}.csv"));
        let file = File::create(&path)?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "{CSV_HEADER}")?;
        Ok(Self { writer, path })
    }

    /// Append one merchant/day row. Dates render as `YYYY-MM-DD`, integer
    /// fields as base-10 signed integers.
    pub fn write_row(&mut self, key: &SettlementKey, totals: &DayTotals) -> std::io::Result<()> {
        writeln!(
            self.writer,
            "{},{},{},{},{},{}",
            key.merchant_id,
            key.day.format("%Y-%m-%d"),
            totals.gross_cents,
            totals.fee_cents,
            totals.net_cents,
            totals.txn_count,
        )
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn writes_header_and_formatted_rows() {
        let dir = std::env::temp_dir().join(format!("report-test-{}", uuid::Uuid::new_v4()));
        let mut report = ReportWriter::create(&dir, "job_x").unwrap();

        report
            .write_row(
                &SettlementKey {
                    merchant_id: "A".to_string(),
                    day: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
                },
                &DayTotals {
                    gross_cents: 1500,
                    fee_cents: 45,
                    net_cents: 1455,
                    txn_count: 2,
                },
            )
            .unwrap();
        report
            .write_row(
                &SettlementKey {
                    merchant_id: "B".to_string(),
                    day: NaiveDate::from_ymd_opt(2025, 1, 11).unwrap(),
                },
                &DayTotals {
                    gross_cents: 200,
                    fee_cents: -6,
                    net_cents: 206,
                    txn_count: 1,
                },
            )
            .unwrap();
        report.flush().unwrap();

        let content = std::fs::read_to_string(report.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines,
            vec![
                "merchant_id,date,gross,fee,net,txn_count",
                "A,2025-01-10,1500,45,1455,2",
                "B,2025-01-11,200,-6,206,1",
            ]
        );

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn artifact_path_is_job_scoped() {
        let dir = std::env::temp_dir().join(format!("report-test-{}", uuid::Uuid::new_v4()));
        let report = ReportWriter::create(&dir, "job_y").unwrap();
        assert_eq!(report.path(), dir.join("job_y.csv"));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
