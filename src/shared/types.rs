//! Common types used across the application

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::fmt;
use std::str::FromStr;

/// Native asset decimals (lamports per SOL = 10^9).
pub const SOL_DECIMALS: u8 = 9;

/// Trade direction as seen from the observed wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Reason code attached to a sell.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Normal,
    StopLoss,
    TakeProfit,
    Update,
    Other(String),
}

impl Origin {
    /// Risk exits close a position regardless of the PnL sign.
    pub fn is_risk_exit(&self) -> bool {
        matches!(self, Origin::StopLoss | Origin::TakeProfit)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Origin::Normal => "normal",
            Origin::StopLoss => "stop_loss",
            Origin::TakeProfit => "take_profit",
            Origin::Update => "update",
            Origin::Other(value) => value,
        }
    }
}

impl From<&str> for Origin {
    fn from(value: &str) -> Self {
        match value {
            "normal" => Origin::Normal,
            "stop_loss" => Origin::StopLoss,
            "take_profit" => Origin::TakeProfit,
            "update" => Origin::Update,
            other => Origin::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bonding-curve accounts of a pump.fun asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolRefs {
    pub bonding_curve: Pubkey,
    pub associated_bonding_curve: Pubkey,
}

impl PoolRefs {
    /// Both references must be present and valid base58 keys.
    pub fn parse(bonding_curve: Option<&str>, associated_bonding_curve: Option<&str>) -> Option<Self> {
        let bonding_curve = Pubkey::from_str(bonding_curve?.trim()).ok()?;
        let associated_bonding_curve = Pubkey::from_str(associated_bonding_curve?.trim()).ok()?;
        Some(Self {
            bonding_curve,
            associated_bonding_curve,
        })
    }
}

/// Inbound trade event as delivered by the trade feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeEvent {
    #[serde(default)]
    pub creator: String,
    pub mint: String,
    pub amount: String,
    pub sol_amount: String,
    #[serde(default)]
    pub bonding_curve: Option<String>,
    #[serde(default)]
    pub associated_bonding_curve: Option<String>,
    #[serde(default, alias = "decimal")]
    pub decimals: Option<u8>,
    pub is_buy: bool,
    #[serde(default = "default_origin")]
    pub origin: String,
    #[serde(default)]
    pub timestamp: f64,
    #[serde(default)]
    pub signature: String,
}

fn default_origin() -> String {
    "normal".to_string()
}

impl TradeEvent {
    pub fn side(&self) -> Side {
        if self.is_buy {
            Side::Buy
        } else {
            Side::Sell
        }
    }

    pub fn origin(&self) -> Origin {
        Origin::from(self.origin.as_str())
    }

    pub fn token_amount(&self) -> Option<f64> {
        self.amount.trim().parse::<f64>().ok().filter(|v| v.is_finite())
    }

    pub fn sol_amount(&self) -> Option<f64> {
        self.sol_amount.trim().parse::<f64>().ok().filter(|v| v.is_finite())
    }

    /// Price in SOL per token: `sol_amount / amount`.
    pub fn price(&self) -> Option<f64> {
        let amount = self.token_amount()?;
        if amount == 0.0 {
            return None;
        }
        let price = self.sol_amount()? / amount;
        price.is_finite().then_some(price)
    }

    pub fn pool_refs(&self) -> Option<PoolRefs> {
        PoolRefs::parse(
            self.bonding_curve.as_deref(),
            self.associated_bonding_curve.as_deref(),
        )
    }
}
