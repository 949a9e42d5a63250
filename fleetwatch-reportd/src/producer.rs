//! Report document production
//!
//! The producer is trait-based so a real PDF renderer can plug in without
//! touching the worker's protocol handling. The built-in implementation
//! renders the same content as a plain-text document, which keeps the whole
//! pipeline exercised end to end.

use std::collections::BTreeMap;

use anyhow::Result;
use chrono::{DateTime, Utc};
use fleetwatch_core::domain::outage::OutageRecord;
use fleetwatch_core::domain::report::ReportKind;
use fleetwatch_core::dto::outage::OutageQuery;

/// Produces the report document for a job
pub trait ReportProducer: Send + Sync {
    fn produce(
        &self,
        kind: ReportKind,
        query: &OutageQuery,
        outages: &[OutageRecord],
    ) -> Result<Vec<u8>>;
}

/// Built-in plain-text document producer
#[derive(Default)]
pub struct DocumentProducer;

impl DocumentProducer {
    pub fn new() -> Self {
        Self
    }

    fn summary(&self, query: &OutageQuery, outages: &[OutageRecord]) -> String {
        let mut doc = header("FLEET OUTAGE SUMMARY", query);

        // worker id -> (outage count, closed downtime, has an ongoing outage)
        let mut per_worker: BTreeMap<&str, (usize, i64, bool)> = BTreeMap::new();
        for outage in outages {
            let entry = per_worker.entry(outage.worker_id.as_str()).or_default();
            entry.0 += 1;
            entry.1 += outage.duration_ms.unwrap_or(0);
            entry.2 |= outage.is_open();
        }

        doc.push_str(&format!("Workers affected: {}\n", per_worker.len()));
        doc.push_str(&format!("Total outages: {}\n\n", outages.len()));

        for (worker_id, (count, downtime_ms, ongoing)) in per_worker {
            let mut line = format!(
                "{}: {} outage(s), {} downtime",
                worker_id,
                count,
                format_duration(downtime_ms)
            );
            if ongoing {
                line.push_str(" (one ongoing)");
            }
            line.push('\n');
            doc.push_str(&line);
        }

        doc
    }

    fn detailed(&self, query: &OutageQuery, outages: &[OutageRecord]) -> String {
        let mut doc = header("FLEET OUTAGE DETAIL", query);

        doc.push_str(&format!("Total outages: {}\n\n", outages.len()));

        for outage in outages {
            let end = match outage.ended_at {
                Some(ended) => format_time(ended),
                None => "ongoing".to_string(),
            };
            let duration = match outage.duration_ms {
                Some(ms) => format_duration(ms),
                None => "-".to_string(),
            };
            doc.push_str(&format!(
                "{}  {} .. {}  ({})\n",
                outage.worker_id,
                format_time(outage.started_at),
                end,
                duration
            ));
        }

        doc
    }
}

impl ReportProducer for DocumentProducer {
    fn produce(
        &self,
        kind: ReportKind,
        query: &OutageQuery,
        outages: &[OutageRecord],
    ) -> Result<Vec<u8>> {
        let text = match kind {
            ReportKind::Summary => self.summary(query, outages),
            ReportKind::Detailed => self.detailed(query, outages),
        };
        Ok(text.into_bytes())
    }
}

fn header(title: &str, query: &OutageQuery) -> String {
    let mut doc = String::new();
    doc.push_str(title);
    doc.push('\n');
    doc.push_str(&format!(
        "Range: {} .. {}\n",
        format_bound(query.start_time, "beginning"),
        format_bound(query.end_time, "now")
    ));
    doc.push_str(&format!("Generated: {}\n\n", format_time(Utc::now())));
    doc
}

fn format_bound(ms: Option<i64>, fallback: &str) -> String {
    ms.and_then(DateTime::from_timestamp_millis)
        .map(format_time)
        .unwrap_or_else(|| fallback.to_string())
}

fn format_time(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

fn format_duration(ms: i64) -> String {
    let seconds = ms / 1_000;
    let hours = seconds / 3_600;
    let minutes = (seconds % 3_600) / 60;
    let seconds = seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(ms: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(ms).unwrap()
    }

    fn closed(worker_id: &str, start_ms: i64, end_ms: i64) -> OutageRecord {
        let mut record = OutageRecord::open(worker_id, ts(start_ms));
        record.close(ts(end_ms));
        record
    }

    #[test]
    fn test_summary_aggregates_per_worker() {
        let outages = vec![
            closed("rig-01", 0, 60_000),
            closed("rig-01", 120_000, 300_000),
            closed("rig-02", 0, 30_000),
        ];

        let producer = DocumentProducer::new();
        let bytes = producer
            .produce(ReportKind::Summary, &OutageQuery::all(), &outages)
            .unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.contains("FLEET OUTAGE SUMMARY"));
        assert!(text.contains("Workers affected: 2"));
        assert!(text.contains("Total outages: 3"));
        assert!(text.contains("rig-01: 2 outage(s), 4m 0s downtime"));
        assert!(text.contains("rig-02: 1 outage(s), 30s downtime"));
    }

    #[test]
    fn test_summary_flags_ongoing_outage() {
        let outages = vec![OutageRecord::open("rig-03", ts(0))];

        let producer = DocumentProducer::new();
        let bytes = producer
            .produce(ReportKind::Summary, &OutageQuery::all(), &outages)
            .unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.contains("rig-03: 1 outage(s), 0s downtime (one ongoing)"));
    }

    #[test]
    fn test_detailed_lists_every_interval() {
        let outages = vec![closed("rig-01", 0, 5_400_000), OutageRecord::open("rig-02", ts(0))];

        let producer = DocumentProducer::new();
        let bytes = producer
            .produce(ReportKind::Detailed, &OutageQuery::all(), &outages)
            .unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.contains("FLEET OUTAGE DETAIL"));
        assert!(text.contains("Total outages: 2"));
        assert!(text.contains("rig-01"));
        assert!(text.contains("(1h 30m 0s)"));
        assert!(text.contains("ongoing"));
    }

    #[test]
    fn test_empty_range_still_produces_a_document() {
        let producer = DocumentProducer::new();
        let bytes = producer
            .produce(ReportKind::Summary, &OutageQuery::all(), &[])
            .unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.contains("Total outages: 0"));
        assert!(text.contains("Range: beginning .. now"));
    }
}
