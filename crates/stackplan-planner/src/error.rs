/// Failure of a planning call.
///
/// Every variant aborts the current decision; nothing is retried.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum PlanError {
    #[display("no legal action available")]
    NoLegalAction,
    #[display("evaluation on the worker pool failed")]
    WorkerFailure(WorkerFailure),
}

impl From<WorkerFailure> for PlanError {
    fn from(failure: WorkerFailure) -> Self {
        Self::WorkerFailure(failure)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum WorkerFailure {
    #[display("utility panicked while scoring node {index}")]
    Panicked { index: usize },
    #[display("worker pool disconnected")]
    Disconnected,
}
