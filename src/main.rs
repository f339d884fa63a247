//! Batch Auction - Binary Entry Point
//!
//! Runs one auction end to end against an in-memory ledger and a manual
//! clock, and prints the settlement receipt.

use std::path::PathBuf;

use alloy_primitives::Address;
use clap::Parser;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use batch_auction::types::price::{from_base_units, mul_div, to_base_units, DEFAULT_DECIMALS};
use batch_auction::types::QUEUE_START;
use batch_auction::{AuctionHouse, AuctionParams, EngineConfig, InMemoryLedger, ManualClock};

#[derive(Debug, Parser)]
#[command(name = "batch-auction", about = "Run a demo batch auction")]
struct Args {
    /// TOML engine configuration
    #[arg(long, env = "BATCH_AUCTION_CONFIG")]
    config: Option<PathBuf>,

    /// Tokens auctioned, in whole units
    #[arg(long, default_value = "10")]
    supply: String,

    /// Fee in thousandths of the supply
    #[arg(long, default_value_t = 0)]
    fee: u64,
}

fn units(amount: &str) -> Result<u128, String> {
    to_base_units(amount, DEFAULT_DECIMALS).ok_or_else(|| format!("invalid amount {amount}"))
}

fn human(amount: u128) -> String {
    from_base_units(amount, DEFAULT_DECIMALS).unwrap_or_else(|| amount.to_string())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "batch_auction=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => EngineConfig::from_path(path)?,
        None => EngineConfig::default(),
    };
    info!(?config, "Configuration loaded");

    println!("===========================================");
    println!("  Batch Auction - Demo");
    println!("===========================================");
    println!();

    let auctioning = Address::repeat_byte(0xa1);
    let bidding = Address::repeat_byte(0xb1);
    let operator = Address::repeat_byte(0xee);
    let auctioneer = Address::repeat_byte(0x01);
    let bidders = [
        (Address::repeat_byte(0x11), "2", "1"),
        (Address::repeat_byte(0x12), "4", "1.5"),
        (Address::repeat_byte(0x13), "5", "1"),
        (Address::repeat_byte(0x14), "3", "2"),
    ];

    let supply = units(&args.supply)?;
    let mut ledger = InMemoryLedger::new();
    ledger.mint(auctioning, auctioneer, supply.saturating_mul(2));
    ledger.approve(auctioning, auctioneer, supply.saturating_mul(2));
    for (bidder, _, _) in &bidders {
        ledger.mint(bidding, *bidder, units("100")?);
        ledger.approve(bidding, *bidder, units("100")?);
    }

    let clock = ManualClock::new(1_000);
    let mut house = AuctionHouse::new(config, operator, ledger, clock.clone());
    house.set_fee_parameters(operator, args.fee, operator)?;

    let auction_id = house.initiate_auction(
        auctioneer,
        AuctionParams {
            auctioning_token: auctioning,
            bidding_token: bidding,
            auction_start: 1_000,
            cancellation_deadline: 1_500,
            auction_end: 2_000,
            auctioned_sell_amount: supply,
            min_buy_amount: units("1")?,
            minimum_bid_amount: units("0.01")?,
            min_funding_threshold: units("1")?,
            is_atomic_closure_allowed: false,
            allow_list: None,
            allow_list_data: Vec::new(),
        },
    )?;
    println!("Auction {auction_id}: {} tokens on offer", human(supply));

    let mut placed = Vec::new();
    for (bidder, buy, sell) in &bidders {
        let orders = house.place_orders(
            auction_id,
            *bidder,
            &[(units(buy)?, units(sell)?)],
            &[QUEUE_START.encode()],
            &[],
        )?;
        println!("  {bidder} bids {sell} for at least {buy}");
        placed.push(orders);
    }

    clock.set(2_000);
    let receipt = house.settle_auction(auction_id)?;
    println!();
    println!("Settled:");
    let price = mul_div(receipt.clearing_sell_amount, units("1")?, receipt.clearing_buy_amount);
    println!(
        "  Price: {} bidding per auctioned token",
        human(price.unwrap_or_default())
    );
    println!("  Raised: {}", human(receipt.raised));
    println!("  Sold: {}", human(receipt.auctioneer_fill));
    println!("  Book root: {}", receipt.book_root_hex());

    let bytes = ssz_rs::serialize(&receipt).map_err(|e| format!("{e:?}"))?;
    println!("  Receipt: {} bytes SSZ", bytes.len());
    println!();

    for orders in &placed {
        if orders.is_empty() {
            continue;
        }
        let owed = house.claim_from_participant_orders(auction_id, orders)?;
        println!(
            "  user {} receives {} auctioned, {} refunded",
            orders[0].owner_id,
            human(owed.auctioning),
            human(owed.bidding)
        );
    }
    Ok(())
}
