//! Step results collected during one publish and their aggregation.

use crate::error::PublishError;

/// Ordered outcomes of the packaging, transfer and record steps of one publish.
#[derive(Debug, Clone, Default)]
pub struct StepResults {
    steps: Vec<Result<(), PublishError>>,
}

impl StepResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, step: Result<(), PublishError>) {
        self.steps.push(step);
    }

    pub fn ok(&mut self) {
        self.steps.push(Ok(()));
    }

    pub fn fail(&mut self, err: PublishError) {
        self.steps.push(Err(err));
    }

    pub fn extend(&mut self, other: StepResults) {
        self.steps.extend(other.steps);
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn has_failures(&self) -> bool {
        self.steps.iter().any(|step| step.is_err())
    }

    pub fn success_count(&self) -> usize {
        self.steps.iter().filter(|step| step.is_ok()).count()
    }

    /// Drop every OK step and keep the failures in order.
    pub fn prune(self) -> Vec<PublishError> {
        self.steps.into_iter().filter_map(|step| step.err()).collect()
    }

    /// Collapse into one outcome: OK if nothing failed, otherwise one
    /// `Aggregate` error naming the module.
    pub fn aggregate(self, module: &str) -> Result<(), PublishError> {
        let errors = self.prune();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(PublishError::Aggregate {
                module: module.to_string(),
                errors,
            })
        }
    }
}
