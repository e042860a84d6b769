/// Per-run accounting for the batch load stage.
///
/// `inserted_rows` only counts batches that fully succeeded; a batch is
/// all-or-nothing from the caller's perspective.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOutcome {
    pub total_rows: usize,
    pub inserted_rows: usize,
    pub failed_batches: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// Every batch was inserted.
    Full,
    /// Some batches failed, some succeeded.
    Partial,
    /// No rows made it to the sink.
    Nothing,
}

impl LoadOutcome {
    pub fn status(&self) -> LoadStatus {
        if self.inserted_rows == 0 {
            LoadStatus::Nothing
        } else if self.failed_batches.is_empty() {
            LoadStatus::Full
        } else {
            LoadStatus::Partial
        }
    }

    pub fn summary(&self) -> String {
        if self.failed_batches.is_empty() {
            format!(
                "Load complete: inserted {}/{} rows",
                self.inserted_rows, self.total_rows
            )
        } else {
            format!(
                "Load complete: inserted {}/{} rows, failed batches: {:?}",
                self.inserted_rows, self.total_rows, self.failed_batches
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_status_classification() {
        let full = LoadOutcome {
            total_rows: 450,
            inserted_rows: 450,
            failed_batches: vec![],
        };
        assert_eq!(full.status(), LoadStatus::Full);

        let partial = LoadOutcome {
            total_rows: 450,
            inserted_rows: 250,
            failed_batches: vec![1],
        };
        assert_eq!(partial.status(), LoadStatus::Partial);

        let nothing = LoadOutcome {
            total_rows: 450,
            inserted_rows: 0,
            failed_batches: vec![0, 1, 2],
        };
        assert_eq!(nothing.status(), LoadStatus::Nothing);
    }

    #[test]
    fn test_summary_mentions_failed_batches() {
        let outcome = LoadOutcome {
            total_rows: 400,
            inserted_rows: 200,
            failed_batches: vec![1],
        };

        let summary = outcome.summary();
        assert!(summary.contains("200/400"));
        assert!(summary.contains("[1]"));
    }
}
