//! Report job domain types

use serde::{Deserialize, Serialize};

/// Kind of compiled report a job produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Summary,
    Detailed,
}

impl ReportKind {
    /// Parses the lowercase wire/path form
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "summary" => Some(ReportKind::Summary),
            "detailed" => Some(ReportKind::Detailed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Summary => "summary",
            ReportKind::Detailed => "detailed",
        }
    }
}

/// Externally observable lifecycle phase of a report job
///
/// The server holds the payload-carrying state machine; this closed enum is
/// what status replies and the diagnostic dump expose. Completed and Failed
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobPhase {
    Waiting,
    Processing,
    Completed,
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_kind_parse_roundtrip() {
        assert_eq!(ReportKind::parse("summary"), Some(ReportKind::Summary));
        assert_eq!(ReportKind::parse("detailed"), Some(ReportKind::Detailed));
        assert_eq!(ReportKind::parse("Summary"), None);
        assert_eq!(ReportKind::parse("weekly"), None);
        assert_eq!(ReportKind::parse(ReportKind::Detailed.as_str()), Some(ReportKind::Detailed));
    }

    #[test]
    fn test_job_phase_wire_format() {
        assert_eq!(serde_json::to_string(&JobPhase::Processing).unwrap(), "\"processing\"");
        assert_eq!(serde_json::to_string(&JobPhase::Failed).unwrap(), "\"failed\"");
    }
}
