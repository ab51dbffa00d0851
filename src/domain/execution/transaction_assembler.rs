//! Wraps a swap instruction into a signed v0 transaction

use solana_sdk::{
    compute_budget::ComputeBudgetInstruction,
    hash::Hash,
    instruction::Instruction,
    message::{v0, VersionedMessage},
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    system_instruction,
    transaction::VersionedTransaction,
};
use spl_associated_token_account::{
    get_associated_token_address, instruction::create_associated_token_account_idempotent,
};

use super::constants::{BASE_FEE_SOL, COMPUTE_UNIT_LIMIT, JITO_TIP_ACCOUNTS};
use super::instruction_builder::BuiltSwap;
use crate::shared::errors::ExecutionError;
use crate::shared::types::Side;

/// Convert a SOL-denominated priority fee into a compute-unit price (micro-lamports).
pub fn compute_unit_price(priority_fee_sol: f64, units: u32) -> u64 {
    let adjusted = (priority_fee_sol - BASE_FEE_SOL).max(0.0);
    let micro_lamports = (adjusted * 1e15 / units as f64).floor();
    if micro_lamports.is_finite() && micro_lamports >= 1.0 {
        micro_lamports as u64
    } else {
        1
    }
}

/// Compute-unit price followed by compute-unit limit.
pub fn priority_fee_instructions(priority_fee_sol: f64) -> Vec<Instruction> {
    vec![
        ComputeBudgetInstruction::set_compute_unit_price(compute_unit_price(
            priority_fee_sol,
            COMPUTE_UNIT_LIMIT,
        )),
        ComputeBudgetInstruction::set_compute_unit_limit(COMPUTE_UNIT_LIMIT),
    ]
}

/// Relay tip transfer, or nothing for a zero tip.
pub fn tip_instruction(payer: &Pubkey, tip_lamports: u64) -> Option<Instruction> {
    (tip_lamports > 0)
        .then(|| system_instruction::transfer(payer, &JITO_TIP_ACCOUNTS[0], tip_lamports))
}

/// Fee settings for one transaction.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeeParams {
    pub priority_fee_sol: f64,
    /// Only applied to buys.
    pub tip_lamports: u64,
}

pub struct TransactionAssembler;

impl TransactionAssembler {
    /// Full instruction sequence around `swap`, in execution order.
    pub fn instructions(
        owner: &Pubkey,
        swap: &BuiltSwap,
        fees: FeeParams,
    ) -> Result<Vec<Instruction>, ExecutionError> {
        let native_mint = spl_token::native_mint::id();
        let token_program = spl_token::id();
        let wsol_account = get_associated_token_address(owner, &native_mint);

        let mut instructions = priority_fee_instructions(fees.priority_fee_sol);

        match swap.side {
            Side::Buy => {
                instructions.extend(tip_instruction(owner, fees.tip_lamports));
                instructions.push(create_associated_token_account_idempotent(
                    owner,
                    owner,
                    &native_mint,
                    &token_program,
                ));
                instructions.push(system_instruction::transfer(
                    owner,
                    &wsol_account,
                    swap.quote.in_amount,
                ));
                instructions.push(
                    spl_token::instruction::sync_native(&token_program, &wsol_account)
                        .map_err(|e| ExecutionError::Assembly(format!("sync_native: {}", e)))?,
                );
                instructions.push(create_associated_token_account_idempotent(
                    owner,
                    owner,
                    &swap.mint,
                    &token_program,
                ));
            }
            Side::Sell => {
                instructions.push(create_associated_token_account_idempotent(
                    owner,
                    owner,
                    &native_mint,
                    &token_program,
                ));
            }
        }

        instructions.push(swap.instruction.clone());
        instructions.push(
            spl_token::instruction::close_account(&token_program, &wsol_account, owner, owner, &[])
                .map_err(|e| ExecutionError::Assembly(format!("close_account: {}", e)))?,
        );

        Ok(instructions)
    }

    /// Compile and sign a v0 transaction with `payer` as fee payer.
    pub fn assemble(
        payer: &Keypair,
        instructions: &[Instruction],
        blockhash: Hash,
    ) -> Result<VersionedTransaction, ExecutionError> {
        let message = v0::Message::try_compile(&payer.pubkey(), instructions, &[], blockhash)
            .map_err(|e| ExecutionError::Assembly(format!("compile message: {}", e)))?;

        VersionedTransaction::try_new(VersionedMessage::V0(message), &[payer])
            .map_err(|e| ExecutionError::Assembly(format!("sign transaction: {}", e)))
    }
}
