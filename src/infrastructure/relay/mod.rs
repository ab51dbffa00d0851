//! Tip relay (Jito block engine) access

pub mod jito_client;
pub mod retry_policy;
pub mod tip_floor;

pub use jito_client::{JitoRelayClient, RelayMode, RelayReceipt, RelayTransport};
pub use retry_policy::{Region, RegionRotation, RetryPolicy};
pub use tip_floor::{JitoTipFloorClient, DEFAULT_TIP_FLOOR_URL};
