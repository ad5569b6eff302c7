//! Run summary: counters, created names, per-row reports and the text log.

use serde::Serialize;

use crate::messages::{Message, MessageCatalog};

/// Why a row stopped before completing every step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowFailure {
    UnknownUser,
    UnknownGroup,
    GroupCreationFailed,
    GroupingCreationFailed,
    LinkCreationFailed,
    MembershipAddFailed,
}

/// Final state of one processed row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "failure")]
pub enum RowOutcome {
    Completed,
    Failed(RowFailure),
}

/// Report for one processed row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowReport {
    pub line_number: u64,
    pub identifier: String,
    pub outcome: RowOutcome,
}

/// Names of entities created during a run, in creation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CreatedNames {
    names: Vec<String>,
}

impl CreatedNames {
    pub fn record(&mut self, name: &str) {
        self.names.push(name.to_string());
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Each name preceded by one space, e.g. `" TeamX TeamY"`.
    #[must_use]
    pub fn joined(&self) -> String {
        self.names.iter().map(|n| format!(" {n}")).collect()
    }
}

/// Accumulated outcome of a reconciliation run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub enrolled_count: usize,
    pub groups_created: CreatedNames,
    pub groupings_created: CreatedNames,
    pub rows: Vec<RowReport>,
    log: String,
    #[serde(skip)]
    finalized: bool,
}

impl RunSummary {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The text log rendered so far.
    #[must_use]
    pub fn log(&self) -> &str {
        &self.log
    }

    #[must_use]
    pub fn into_log(self) -> String {
        self.log
    }

    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Number of rows that reached the per-row routine.
    #[must_use]
    pub fn processed_rows(&self) -> usize {
        self.rows.len()
    }

    /// Rows that stopped early, with the reason.
    pub fn failures(&self) -> impl Iterator<Item = (&RowReport, RowFailure)> {
        self.rows.iter().filter_map(|r| match r.outcome {
            RowOutcome::Failed(f) => Some((r, f)),
            RowOutcome::Completed => None,
        })
    }

    /// Append a message fragment without a line terminator.
    pub fn push(&mut self, catalog: &dyn MessageCatalog, locale: &str, message: &Message) {
        self.log.push_str(&catalog.format(message, locale));
    }

    /// Append a message followed by a line terminator.
    pub fn push_line(&mut self, catalog: &dyn MessageCatalog, locale: &str, message: &Message) {
        self.push(catalog, locale, message);
        self.end_line();
    }

    pub fn end_line(&mut self) {
        self.log.push('\n');
    }

    pub fn report(&mut self, line_number: u64, identifier: &str, outcome: RowOutcome) {
        self.rows.push(RowReport {
            line_number,
            identifier: identifier.to_string(),
            outcome,
        });
    }

    /// Append the three closing statistics lines. Only the first call has
    /// any effect.
    pub fn finalize(&mut self, catalog: &dyn MessageCatalog, locale: &str) {
        if self.finalized {
            return;
        }
        let lines = [
            Message::StatsEnrolled {
                count: self.enrolled_count,
            },
            Message::StatsGroups {
                count: self.groups_created.count(),
                names: self.groups_created.joined(),
            },
            Message::StatsGroupings {
                count: self.groupings_created.count(),
                names: self.groupings_created.joined(),
            },
        ];
        for line in &lines {
            self.push_line(catalog, locale, line);
        }
        self.finalized = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::TemplateCatalog;

    #[test]
    fn test_created_names_count_matches_split() {
        let mut names = CreatedNames::default();
        names.record("TeamX");
        names.record("TeamY");

        assert_eq!(names.joined(), " TeamX TeamY");
        assert_eq!(names.count(), names.joined().split_whitespace().count());
    }

    #[test]
    fn test_finalize_appends_stats_once() {
        let catalog = TemplateCatalog::english();
        let mut summary = RunSummary::new();
        summary.enrolled_count = 2;
        summary.groups_created.record("TeamX");

        summary.finalize(&catalog, "en");
        summary.finalize(&catalog, "en");

        assert!(summary.is_finalized());
        assert_eq!(
            summary.log(),
            "2 user(s) enrolled\n1 group(s) created: TeamX\n0 grouping(s) created:\n"
        );
    }

    #[test]
    fn test_failures_lists_failed_rows_only() {
        let mut summary = RunSummary::new();
        summary.report(2, "alice", RowOutcome::Completed);
        summary.report(3, "ghost", RowOutcome::Failed(RowFailure::UnknownUser));

        let failures: Vec<_> = summary.failures().collect();
        assert_eq!(summary.processed_rows(), 2);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0.identifier, "ghost");
        assert_eq!(failures[0].1, RowFailure::UnknownUser);
    }
}
