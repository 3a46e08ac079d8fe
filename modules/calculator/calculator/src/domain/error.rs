/// Business errors of the calculation service.
///
/// Both variants mean the request itself is malformed; they are reported as
/// `InvalidArgument` on the wire and must never be retried.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ComputeError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
}
