//! pump.fun buy/sell instruction construction

use borsh::BorshSerialize;
use serde::Serialize;
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    system_program, sysvar,
};
use spl_associated_token_account::get_associated_token_address;

use super::constants::{
    discriminators, PUMP_FUN_EVENT_AUTHORITY, PUMP_FUN_FEE_RECIPIENT, PUMP_FUN_GLOBAL,
    PUMP_FUN_PROGRAM_ID,
};
use crate::shared::errors::InstructionError;
use crate::shared::types::{PoolRefs, Side, SOL_DECIMALS};

const UNIT: f64 = 1_000_000_000.0;

/// Inputs for one swap against a bonding curve.
#[derive(Debug, Clone)]
pub struct SwapRequest {
    pub side: Side,
    /// Quote per base ratio taken from the observed trade.
    pub price: f64,
    /// UI amount: SOL for buys, tokens for sells.
    pub amount: f64,
    /// Decimals of the traded token. Only used for sells.
    pub decimals: u8,
    pub slippage_pct: f64,
    pub owner: Pubkey,
    pub mint: Pubkey,
    pub pool_refs: PoolRefs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SwapQuote {
    pub in_amount: u64,
    pub out_amount: u64,
}

/// A swap instruction plus what the assembler needs around it.
#[derive(Debug, Clone)]
pub struct BuiltSwap {
    pub side: Side,
    pub instruction: Instruction,
    pub quote: SwapQuote,
    pub mint: Pubkey,
    pub user_token_account: Pubkey,
}

#[derive(BorshSerialize)]
struct SwapArgs {
    amount: u64,
    limit: u64,
}

pub struct PumpFunInstructionBuilder;

impl PumpFunInstructionBuilder {
    pub fn build(request: &SwapRequest) -> Result<BuiltSwap, InstructionError> {
        validate(request)?;

        let (discriminator, args, quote) = match request.side {
            Side::Buy => {
                let amount_base = to_base_units(request.amount, SOL_DECIMALS)?;
                let token_out = (amount_base as f64 * request.price / UNIT).floor() as u64;
                let max_cost =
                    (amount_base as f64 * (1.0 + request.slippage_pct / 100.0)).floor() as u64;
                (
                    discriminators::BUY,
                    SwapArgs { amount: token_out, limit: max_cost },
                    SwapQuote { in_amount: amount_base, out_amount: token_out },
                )
            }
            Side::Sell => {
                let raw_amount = to_base_units(request.amount, request.decimals)?;
                let min_output = (request.amount
                    * request.price
                    * UNIT
                    * (1.0 - request.slippage_pct / 100.0))
                    .floor() as u64;
                (
                    discriminators::SELL,
                    SwapArgs { amount: raw_amount, limit: min_output },
                    SwapQuote { in_amount: raw_amount, out_amount: min_output },
                )
            }
        };

        let mut data = Vec::with_capacity(24);
        data.extend_from_slice(&discriminator);
        data.extend(
            args.try_to_vec()
                .map_err(|e| InstructionError::Encoding(e.to_string()))?,
        );

        let user_token_account = get_associated_token_address(&request.owner, &request.mint);

        Ok(BuiltSwap {
            side: request.side,
            instruction: Instruction {
                program_id: PUMP_FUN_PROGRAM_ID,
                accounts: swap_accounts(request, &user_token_account),
                data,
            },
            quote,
            mint: request.mint,
            user_token_account,
        })
    }
}

fn validate(request: &SwapRequest) -> Result<(), InstructionError> {
    if !request.price.is_finite() || request.price <= 0.0 {
        return Err(InstructionError::InvalidPrice(request.price));
    }
    if !request.amount.is_finite() || request.amount <= 0.0 {
        return Err(InstructionError::InvalidAmount(request.amount));
    }
    if !(0.0..=100.0).contains(&request.slippage_pct) {
        return Err(InstructionError::InvalidSlippage(request.slippage_pct));
    }
    Ok(())
}

fn to_base_units(amount: f64, decimals: u8) -> Result<u64, InstructionError> {
    let raw = (amount * 10_f64.powi(decimals as i32)).floor();
    if raw < 1.0 || raw >= u64::MAX as f64 {
        return Err(InstructionError::InvalidAmount(amount));
    }
    Ok(raw as u64)
}

/// The 12-entry account list. Slots 9 and 10 differ between buy and sell.
fn swap_accounts(request: &SwapRequest, user_token_account: &Pubkey) -> Vec<AccountMeta> {
    let (slot_9, slot_10) = match request.side {
        Side::Buy => (spl_token::id(), sysvar::rent::id()),
        Side::Sell => (spl_associated_token_account::id(), spl_token::id()),
    };

    vec![
        AccountMeta::new_readonly(PUMP_FUN_GLOBAL, false),
        AccountMeta::new(PUMP_FUN_FEE_RECIPIENT, false),
        AccountMeta::new_readonly(request.mint, false),
        AccountMeta::new(request.pool_refs.bonding_curve, false),
        AccountMeta::new(request.pool_refs.associated_bonding_curve, false),
        AccountMeta::new(*user_token_account, false),
        AccountMeta::new(request.owner, true),
        AccountMeta::new_readonly(system_program::id(), false),
        AccountMeta::new_readonly(slot_9, false),
        AccountMeta::new_readonly(slot_10, false),
        AccountMeta::new_readonly(PUMP_FUN_EVENT_AUTHORITY, false),
        AccountMeta::new_readonly(PUMP_FUN_PROGRAM_ID, false),
    ]
}
