//! Error handling for the application

use thiserror::Error;

/// Instruction-building errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InstructionError {
    #[error("Invalid price: {0}")]
    InvalidPrice(f64),

    #[error("Invalid amount: {0}")]
    InvalidAmount(f64),

    #[error("Invalid slippage: {0}%")]
    InvalidSlippage(f64),

    #[error("Instruction encoding failed: {0}")]
    Encoding(String),
}

/// Execution-related errors
#[derive(Error, Debug, Clone)]
pub enum ExecutionError {
    /// Simulation reported a program error; the attempt is abandoned.
    #[error("Simulation aborted: {0}")]
    SimulationAbort(String),

    #[error("Submission failed: {0}")]
    SubmissionFailure(String),

    /// Confirmation was not observed in time. The transaction may still land.
    #[error("Confirmation not observed after {attempts} attempts")]
    PollTimeout { attempts: u32 },

    #[error("Transaction assembly failed: {0}")]
    Assembly(String),

    #[error(transparent)]
    Instruction(#[from] InstructionError),

    #[error("Network error: {0}")]
    NetworkError(String),
}

/// General application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Blockchain error: {0}")]
    BlockchainError(String),

    #[error("Execution error: {0}")]
    ExecutionError(String),

    #[error("Fee market error: {0}")]
    FeeMarketError(String),

    #[error("Notification error: {0}")]
    NotificationError(String),
}

impl From<ExecutionError> for AppError {
    fn from(err: ExecutionError) -> Self {
        AppError::ExecutionError(err.to_string())
    }
}

impl From<InstructionError> for AppError {
    fn from(err: InstructionError) -> Self {
        AppError::ExecutionError(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::BlockchainError(format!("HTTP request failed: {}", err))
    }
}
