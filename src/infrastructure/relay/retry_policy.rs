//! Bounded polling policy and relay region rotation

use rand::Rng;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Fixed-delay retry ceiling with optional random jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
    pub jitter: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
            jitter: Duration::ZERO,
        }
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    /// Bundle status polling: 20 attempts, 1s apart.
    pub fn bundle_status() -> Self {
        Self::new(20, Duration::from_secs(1))
    }

    /// Signature status polling: 30 attempts, 1s apart.
    pub fn signature_status() -> Self {
        Self::new(30, Duration::from_secs(1))
    }

    pub fn next_delay(&self) -> Duration {
        let jitter_ms = self.jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return self.delay;
        }
        self.delay + Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
    }
}

/// Block-engine region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum Region {
    Amsterdam,
    Frankfurt,
    NewYork,
    Tokyo,
    Default,
}

impl Region {
    pub const ROTATION: [Region; 5] = [
        Region::Amsterdam,
        Region::Frankfurt,
        Region::NewYork,
        Region::Tokyo,
        Region::Default,
    ];

    pub fn base_url(&self) -> &'static str {
        match self {
            Region::Amsterdam => "https://amsterdam.mainnet.block-engine.jito.wtf",
            Region::Frankfurt => "https://frankfurt.mainnet.block-engine.jito.wtf",
            Region::NewYork => "https://ny.mainnet.block-engine.jito.wtf",
            Region::Tokyo => "https://tokyo.mainnet.block-engine.jito.wtf",
            Region::Default => "https://mainnet.block-engine.jito.wtf",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Amsterdam => "ams",
            Region::Frankfurt => "ger",
            Region::NewYork => "ny",
            Region::Tokyo => "tokyo",
            Region::Default => "default",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ams" | "amsterdam" => Ok(Region::Amsterdam),
            "ger" | "frankfurt" => Ok(Region::Frankfurt),
            "ny" | "newyork" => Ok(Region::NewYork),
            "tokyo" => Ok(Region::Tokyo),
            "default" | "mainnet" => Ok(Region::Default),
            other => Err(format!("unknown relay region: {}", other)),
        }
    }
}

impl TryFrom<String> for Region {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Round-robin over a fixed region list. Shared across tasks.
#[derive(Debug)]
pub struct RegionRotation {
    regions: Vec<Region>,
    cursor: AtomicUsize,
}

impl Default for RegionRotation {
    fn default() -> Self {
        Self::new(Region::ROTATION.to_vec())
    }
}

impl RegionRotation {
    /// An empty list falls back to the default region only.
    pub fn new(regions: Vec<Region>) -> Self {
        let regions = if regions.is_empty() {
            vec![Region::Default]
        } else {
            regions
        };
        Self {
            regions,
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn next(&self) -> Region {
        let idx = self.cursor.fetch_add(1, Ordering::Relaxed) % self.regions.len();
        self.regions[idx]
    }
}
