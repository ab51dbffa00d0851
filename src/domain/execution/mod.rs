//! Execution domain - swap instructions, transaction assembly, error decoding

pub mod constants;
mod instruction_builder;
mod program_errors;
mod transaction_assembler;

pub use instruction_builder::{BuiltSwap, PumpFunInstructionBuilder, SwapQuote, SwapRequest};
pub use program_errors::{
    custom_error_code, describe_program_error, describe_simulation_failure,
    DEFAULT_FAILURE_MESSAGE,
};
pub use transaction_assembler::{
    compute_unit_price, priority_fee_instructions, tip_instruction, FeeParams,
    TransactionAssembler,
};
