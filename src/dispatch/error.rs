use std::time::Duration;
use thiserror::Error;

use crate::pipeline::PipelineError;

#[derive(Debug, Error)]
pub enum DispatchError {
    /// Rejected before entering the pipeline.
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("classification timed out after {}s", after.as_secs_f32())]
    Timeout { after: Duration },

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("inference worker failed: {reason}")]
    WorkerFailed { reason: String },

    #[error("inference pool is shut down")]
    PoolClosed,
}
