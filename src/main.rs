use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use curvemirror::{app, config};

#[derive(Parser, Debug)]
#[command(version, about = "Copy trader for pump.fun bonding curves with tip-relay submission")]
struct Args {
    /// Path to config file (optional)
    #[arg(long)]
    config: Option<String>,

    /// RPC endpoint URL
    #[arg(long)]
    rpc_url: Option<String>,

    /// Path to keypair file
    #[arg(long)]
    keypair: Option<String>,

    /// SOL spent on each copied buy
    #[arg(long)]
    buy_amount: Option<f64>,

    /// Slippage tolerance in percent
    #[arg(long)]
    slippage_pct: Option<f64>,

    /// Priority fee in SOL
    #[arg(long)]
    priority_fee: Option<f64>,

    /// Address the trade feed WebSocket server binds to
    #[arg(long)]
    feed_bind: Option<String>,

    /// Only simulate transactions without sending them
    #[arg(long)]
    simulate_only: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    // Priority: CLI args > Config file > Defaults
    let mut base_config = match &args.config {
        Some(config_path) => config::Config::from_file(config_path)?,
        None => config::Config::default(),
    };

    if let Some(rpc_url) = args.rpc_url {
        base_config.rpc.url = rpc_url;
    }
    if let Some(keypair) = args.keypair {
        base_config.wallet.keypair = Some(keypair);
    }
    if let Some(buy_amount) = args.buy_amount {
        base_config.trade.buy_amount_sol = buy_amount;
    }
    if let Some(slippage_pct) = args.slippage_pct {
        base_config.trade.slippage_pct = slippage_pct;
    }
    if let Some(priority_fee) = args.priority_fee {
        base_config.trade.priority_fee_sol = priority_fee;
    }
    if let Some(feed_bind) = args.feed_bind {
        base_config.feed.bind = feed_bind;
    }

    let app_cfg = app::AppCfg::from_config(base_config, args.simulate_only)?;
    app::run(app_cfg).await
}
