//! Utility functions and helpers

use solana_sdk::native_token::LAMPORTS_PER_SOL;

/// Calculate percentage change
pub fn calculate_percentage_change(old_value: f64, new_value: f64) -> f64 {
    if old_value > 0.0 {
        ((new_value - old_value) / old_value) * 100.0
    } else {
        0.0
    }
}

pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

pub fn sol_to_lamports(sol: f64) -> u64 {
    let lamports = (sol * LAMPORTS_PER_SOL as f64).round();
    if lamports.is_finite() && lamports > 0.0 {
        lamports as u64
    } else {
        0
    }
}

pub fn solscan_link(signature: &str) -> String {
    format!("https://solscan.io/tx/{}", signature)
}

/// Random id used to correlate log lines of one swap attempt
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
