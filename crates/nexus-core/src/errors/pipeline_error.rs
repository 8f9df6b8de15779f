/// Pipeline orchestration errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    #[error("chunk source unavailable: {reason}")]
    ChunkSourceUnavailable { reason: String },

    #[error("worker pool error: {reason}")]
    WorkerPool { reason: String },

    #[error("batch of {size} chunks exceeds the limit of {max}")]
    BatchTooLarge { size: usize, max: usize },

    #[error("incremental flush scheduler is already running")]
    SchedulerRunning,
}
