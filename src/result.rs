use super::errors::ExecutorError;

pub type ExecutorResult<T> = Result<T, ExecutorError>;
