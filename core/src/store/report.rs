use super::{parse_amount, Store};
use crate::{error::{DistError, DistResult}, report::DailyReport};
use rusqlite::{params, OptionalExtension};

impl Store {
    // ── Report ────────────────────────────────────────────────────

    pub fn save_report(&self, report: &DailyReport) -> DistResult<()> {
        self.conn.execute(
            "INSERT INTO report (report_id, date, target_amount, total_amount, payload, generated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                report.id,
                report.date.to_string(),
                report.target_amount.to_string(),
                report.total_amount.to_string(),
                serde_json::to_string(report)?,
                report.generated_at.to_rfc3339(),
            ],
        )?;
        log::info!("report {} saved for {}", report.id, report.date);
        Ok(())
    }

    pub fn report_by_id(&self, report_id: &str) -> DistResult<Option<DailyReport>> {
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT payload FROM report WHERE report_id = ?1",
                params![report_id],
                |row| row.get(0),
            )
            .optional()?;
        payload
            .map(|p| serde_json::from_str::<DailyReport>(&p).map_err(DistError::from))
            .transpose()
    }

    /// All reports in the order they were saved.
    pub fn all_reports(&self) -> DistResult<Vec<DailyReport>> {
        let mut stmt = self
            .conn
            .prepare("SELECT payload FROM report ORDER BY rowid ASC")?;
        let payloads = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        payloads
            .iter()
            .map(|p| serde_json::from_str::<DailyReport>(p).map_err(DistError::from))
            .collect()
    }

    /// Returns false when nothing was deleted.
    pub fn delete_report(&self, report_id: &str) -> DistResult<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM report WHERE report_id = ?1", params![report_id])?;
        Ok(deleted > 0)
    }

    pub fn report_count(&self) -> DistResult<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM report", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Sum of generated totals across every stored report.
    pub fn reported_total(&self) -> DistResult<crate::types::Amount> {
        let mut stmt = self.conn.prepare("SELECT total_amount FROM report")?;
        let totals = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        totals.iter().map(|t| parse_amount(t)).sum()
    }
}
