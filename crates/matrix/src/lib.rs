/// Parameter matrix for batch generation
///
/// Expands named parameter ranges into the cartesian product of generation
/// jobs, each with a content-derived id, and tracks the resulting jobs while
/// an external runner executes them.
use thiserror::Error;

pub mod axis;
pub mod batch;
pub mod board;
pub mod generate;
pub mod job;
pub mod range;
pub mod validate;

pub use axis::MatrixAxis;
pub use batch::{group_for_batching, group_indices, BatchKey};
pub use board::{JobBoard, MatrixProgress};
pub use generate::{estimate_job_count, generate_jobs, MatrixAxes, MatrixGenerator};
pub use job::{job_id, JobStatus, MatrixJob};
pub use range::{
    parse_parameter_input, parse_parameter_input_with_limit, ParamValue, ParameterRange,
    RangeKind, MAX_RANGE_VALUES,
};
pub use validate::{validate_parameter_range, RangeValidation};

#[derive(Debug, Error)]
pub enum MatrixError {
    #[error("axis {0} has no values")]
    EmptyAxis(MatrixAxis),
    #[error("invalid value {value} for axis {axis}: {reason}")]
    InvalidValue {
        axis: MatrixAxis,
        value: ParamValue,
        reason: String,
    },
    #[error("matrix expands to {count} jobs, limit is {limit}")]
    TooManyJobs { count: usize, limit: usize },
    #[error("unknown matrix axis: {0}")]
    UnknownAxis(String),
    #[error("job not found: {0}")]
    JobNotFound(usize),
    #[error("job {index} cannot move from {from} to {to}")]
    IllegalTransition {
        index: usize,
        from: JobStatus,
        to: JobStatus,
    },
}
