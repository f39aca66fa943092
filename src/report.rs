/*!
Batch operations never stop at the first bad item.
They return whatever they could compute together with one `BatchFailure` per item that could not be processed.
*/

use log::warn;

use crate::error::VariantError;

/// A single item of a batch that could not be processed
#[derive(Clone, Debug, PartialEq)]
pub struct BatchFailure {
    /// Human readable description of the failed item, e.g. a label or a source id
    item: String,
    /// Why it failed
    error: VariantError
}

impl BatchFailure {
    pub fn new<S: Into<String>>(item: S, error: VariantError) -> BatchFailure {
        BatchFailure {
            item: item.into(),
            error
        }
    }

    // Getters
    pub fn item(&self) -> &str {
        &self.item
    }

    pub fn error(&self) -> &VariantError {
        &self.error
    }
}

/// Partial results of a batch operation plus the items that failed
#[derive(Clone, Debug, PartialEq)]
pub struct BatchReport<T> {
    results: T,
    failures: Vec<BatchFailure>
}

impl<T> BatchReport<T> {
    /// Constructor
    pub fn new(results: T, failures: Vec<BatchFailure>) -> BatchReport<T> {
        BatchReport {
            results,
            failures
        }
    }

    // Getters
    pub fn results(&self) -> &T {
        &self.results
    }

    pub fn failures(&self) -> &[BatchFailure] {
        &self.failures
    }

    /// Returns true if no item failed
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn into_parts(self) -> (T, Vec<BatchFailure>) {
        (self.results, self.failures)
    }
}

/// Logs and wraps a failure for one batch item
pub(crate) fn record_failure<S: Into<String>>(failures: &mut Vec<BatchFailure>, item: S, error: VariantError) {
    let failure = BatchFailure::new(item, error);
    warn!("Skipping {}: {}", failure.item, failure.error);
    failures.push(failure);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report() {
        let mut failures = vec![];
        record_failure(&mut failures, "mCherry", VariantError::LengthMismatch { reference_len: 236, observed_len: 230 });
        let report = BatchReport::new(vec![1, 2], failures);
        assert!(!report.is_complete());
        assert_eq!(report.failures()[0].item(), "mCherry");
        assert_eq!(
            report.failures()[0].error().to_string(),
            "Sequence length mismatch: reference has 236 residues, observed has 230"
        );

        let (results, failures) = report.into_parts();
        assert_eq!(results, vec![1, 2]);
        assert_eq!(failures.len(), 1);
        assert!(BatchReport::new((), vec![]).is_complete());
    }
}
