//! The auction house: every exposed operation over all auctions.
//!
//! ## Operation Shape
//!
//! Each mutating operation runs in the same order:
//!
//! 1. Validate against the current state and the clock
//! 2. Compute the new state and one [`TransferBatch`]
//! 3. Ask the ledger to apply the batch
//! 4. Commit
//!
//! Step 4 cannot fail, so a failure anywhere leaves nothing behind. Queue
//! insertions done in step 2 are rolled back if step 3 fails.

use std::collections::{HashMap, HashSet};

use alloy_primitives::Address;
use tracing::{debug, info, instrument, warn};

use crate::access::{admits, AccessControlGate, AdmissionRequest};
use crate::auction::data::{Auction, AuctionData, AuctionParams, FeeSnapshot, Phase};
use crate::auction::settlement::{self, ClaimAmounts};
use crate::auction::users::UserRegistry;
use crate::clock::Clock;
use crate::config::{EngineConfig, FEE_DENOMINATOR};
use crate::engine::{advance, InterimState};
use crate::error::AuctionError;
use crate::ledger::{AssetLedger, TransferBatch};
use crate::orderbook::{OrderQueue, QueueError};
use crate::types::price::wide_mul;
use crate::types::{Order, OrderKey, SettlementReceipt};

/// A bid as submitted: `(buy_amount, sell_amount)`, i.e. the least amount
/// of auctioned tokens wanted for the bidding tokens offered.
pub type Bid = (u128, u128);

pub struct AuctionHouse<L, C> {
    config: EngineConfig,
    operator: Address,
    fee: FeeSnapshot,
    users: UserRegistry,
    /// `auctions[id - 1]`
    auctions: Vec<Auction>,
    gates: HashMap<Address, Box<dyn AccessControlGate>>,
    ledger: L,
    clock: C,
}

impl<L: AssetLedger, C: Clock> AuctionHouse<L, C> {
    /// Fees start at zero, paid to the operator.
    pub fn new(config: EngineConfig, operator: Address, ledger: L, clock: C) -> Self {
        Self {
            config,
            operator,
            fee: FeeSnapshot {
                numerator: 0,
                receiver: operator,
            },
            users: UserRegistry::new(),
            auctions: Vec::new(),
            gates: HashMap::new(),
            ledger,
            clock,
        }
    }

    // ========================================================================
    // Administration
    // ========================================================================

    #[instrument(skip_all, fields(identity = %identity))]
    pub fn register_user(&mut self, identity: Address) -> Result<u64, AuctionError> {
        let id = self.users.register(identity)?;
        info!(user_id = id, "User registered");
        Ok(id)
    }

    /// Change the fee for auctions created from now on.
    #[instrument(skip_all, fields(numerator = numerator))]
    pub fn set_fee_parameters(
        &mut self,
        caller: Address,
        numerator: u64,
        receiver: Address,
    ) -> Result<(), AuctionError> {
        if caller != self.operator {
            return Err(AuctionError::NotOperator(caller));
        }
        if numerator > self.config.max_fee_numerator {
            return Err(AuctionError::FeeTooHigh {
                numerator,
                max: self.config.max_fee_numerator,
            });
        }
        self.fee = FeeSnapshot { numerator, receiver };
        info!(%receiver, "Fee parameters updated");
        Ok(())
    }

    /// Make `gate` reachable under `identity` for auctions that name it.
    pub fn install_gate(&mut self, identity: Address, gate: Box<dyn AccessControlGate>) {
        debug!(%identity, "Gate installed");
        self.gates.insert(identity, gate);
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Create an auction and pull the supply plus fee from the auctioneer.
    ///
    /// # Returns
    ///
    /// The new auction id. Ids start at 1.
    #[instrument(skip_all, fields(auctioneer = %auctioneer))]
    pub fn initiate_auction(
        &mut self,
        auctioneer: Address,
        params: AuctionParams,
    ) -> Result<u64, AuctionError> {
        let now = self.clock.now();
        params.validate(now)?;

        let (owner_id, _) = self.users.resolve(&auctioneer);
        let initial_order =
            Order::new(owner_id, params.min_buy_amount, params.auctioned_sell_amount)?;
        let fee_amount =
            settlement::fee_amount(params.auctioned_sell_amount, self.fee.numerator, FEE_DENOMINATOR)?;
        let deposit = params
            .auctioned_sell_amount
            .checked_add(fee_amount)
            .ok_or(AuctionError::Overflow)?;

        let mut batch = TransferBatch::new();
        batch.pull(params.auctioning_token, auctioneer, deposit);
        self.ledger.apply(&batch)?;

        self.users.commit(auctioneer);
        let auction_id = self.auctions.len() as u64 + 1;
        let data = AuctionData {
            auction_id,
            auctioneer,
            auctioning_token: params.auctioning_token,
            bidding_token: params.bidding_token,
            auction_start: params.auction_start,
            auction_end: params.auction_end,
            cancellation_deadline: params.cancellation_deadline,
            initial_order,
            minimum_bid_amount: params.minimum_bid_amount,
            min_funding_threshold: params.min_funding_threshold,
            is_atomic_closure_allowed: params.is_atomic_closure_allowed,
            fee: self.fee,
            fee_amount,
            allow_list: params.allow_list,
            allow_list_data: params.allow_list_data,
            interim: InterimState::default(),
            incremental_started: false,
            settlement: None,
        };
        self.auctions.push(Auction {
            data,
            queue: OrderQueue::with_capacity(self.config.queue_capacity),
        });

        info!(
            auction_id,
            sell_amount = initial_order.sell_amount,
            min_buy_amount = initial_order.buy_amount,
            fee_amount,
            "Auction initiated"
        );
        Ok(auction_id)
    }

    /// Place bids. Bids already live in the queue are skipped and not
    /// charged; the rest are paid for with a single pull.
    ///
    /// # Arguments
    ///
    /// * `bids` - `(buy_amount, sell_amount)` pairs
    /// * `hints` - One insertion hint per bid, `QUEUE_START` when unknown
    /// * `authorization` - Proof for the auction's allow-list gate, if any
    ///
    /// # Returns
    ///
    /// The orders actually placed.
    pub fn place_orders(
        &mut self,
        auction_id: u64,
        placer: Address,
        bids: &[Bid],
        hints: &[OrderKey],
        authorization: &[u8],
    ) -> Result<Vec<Order>, AuctionError> {
        self.place_orders_on_behalf(auction_id, placer, placer, bids, hints, authorization)
    }

    /// Place bids owned by `owner` and paid for by `payer`. The owner is the
    /// one admitted by the gate, and the only one who may cancel or whose
    /// address receives claims.
    #[instrument(
        skip_all,
        fields(auction_id = auction_id, payer = %payer, owner = %owner, count = bids.len())
    )]
    pub fn place_orders_on_behalf(
        &mut self,
        auction_id: u64,
        payer: Address,
        owner: Address,
        bids: &[Bid],
        hints: &[OrderKey],
        authorization: &[u8],
    ) -> Result<Vec<Order>, AuctionError> {
        let now = self.clock.now();
        let auction = find_mut(&mut self.auctions, auction_id)?;
        auction.data.require_phase(now, Phase::Open)?;
        if bids.is_empty() {
            return Err(AuctionError::EmptyBatch);
        }
        check_hints(bids.len(), hints.len())?;

        let (owner_id, _) = self.users.resolve(&owner);
        check_admission(&self.gates, &auction.data, owner, authorization)?;
        let orders = bids
            .iter()
            .map(|&(buy, sell)| admit_bid(&auction.data, owner_id, buy, sell))
            .collect::<Result<Vec<_>, _>>()?;

        let placed = insert_batch(&mut auction.queue, &orders, hints)?;
        let deposit = sum_sell(&placed)?;

        let mut batch = TransferBatch::new();
        batch.pull(auction.data.bidding_token, payer, deposit);
        if let Err(err) = self.ledger.apply(&batch) {
            rollback(&mut auction.queue, &placed);
            return Err(err.into());
        }

        self.users.commit(owner);
        info!(
            owner_id,
            placed = placed.len(),
            skipped = orders.len() - placed.len(),
            deposit,
            "Orders placed"
        );
        Ok(placed)
    }

    /// Cancel own orders before the cancellation deadline. Orders no longer
    /// in the queue refund nothing.
    ///
    /// # Returns
    ///
    /// The bidding tokens refunded.
    #[instrument(skip_all, fields(auction_id = auction_id, caller = %caller))]
    pub fn cancel_orders(
        &mut self,
        auction_id: u64,
        caller: Address,
        orders: &[Order],
    ) -> Result<u128, AuctionError> {
        let now = self.clock.now();
        let auction = find_mut(&mut self.auctions, auction_id)?;
        if now >= auction.data.cancellation_deadline {
            return Err(AuctionError::CancellationClosed(auction_id));
        }
        let caller_id = self.users.id_of(&caller).ok_or(AuctionError::UnknownUser(caller))?;

        let mut seen = HashSet::new();
        let mut cancelled = Vec::new();
        for order in orders {
            if order.owner_id != caller_id {
                return Err(AuctionError::NotOrderOwner {
                    owner_id: order.owner_id,
                    caller_id,
                });
            }
            let key = order.encode();
            if order.is_real() && auction.queue.contains(&key) && seen.insert(key) {
                cancelled.push(*order);
            }
        }
        let refund = sum_sell(&cancelled)?;

        let mut batch = TransferBatch::new();
        batch.pay(auction.data.bidding_token, caller, refund);
        self.ledger.apply(&batch)?;

        for order in &cancelled {
            auction.queue.remove(&order.encode())?;
        }
        info!(cancelled = cancelled.len(), refund, "Orders cancelled");
        Ok(refund)
    }

    /// Sum `steps` more orders ahead of settlement.
    #[instrument(skip_all, fields(auction_id = auction_id, steps = steps))]
    pub fn precalculate_sell_amount_sum(
        &mut self,
        auction_id: u64,
        steps: usize,
    ) -> Result<InterimState, AuctionError> {
        let now = self.clock.now();
        let auction = find_mut(&mut self.auctions, auction_id)?;
        auction.data.require_phase(now, Phase::AwaitingSettlement)?;

        let interim = advance(
            &auction.queue,
            &auction.data.initial_order,
            &auction.data.interim,
            steps,
            self.config.max_orders_per_auction,
        )?;

        auction.data.interim = interim;
        auction.data.incremental_started = true;
        debug!(sum = interim.sum_bid_amount, "Interim sum advanced");
        Ok(interim)
    }

    /// Fix the clearing price and pay out the auctioneer and fee receiver.
    #[instrument(skip_all, fields(auction_id = auction_id))]
    pub fn settle_auction(&mut self, auction_id: u64) -> Result<SettlementReceipt, AuctionError> {
        let now = self.clock.now();
        let auction = find_mut(&mut self.auctions, auction_id)?;
        auction.data.require_phase(now, Phase::AwaitingSettlement)?;

        let (record, batch) = settlement::settle(auction, now)?;
        self.ledger.apply(&batch)?;

        let receipt = record.receipt.clone();
        auction.data.settlement = Some(record);
        auction.queue.clear_history();
        info!(
            clearing_owner_id = receipt.clearing_owner_id,
            raised = receipt.raised,
            min_funding_not_reached = receipt.min_funding_not_reached,
            book_root = %receipt.book_root_hex(),
            "Auction settled"
        );
        Ok(receipt)
    }

    /// Place one last bid and settle in the same step.
    #[instrument(skip_all, fields(auction_id = auction_id, caller = %caller))]
    pub fn settle_auction_atomically(
        &mut self,
        auction_id: u64,
        caller: Address,
        bids: &[Bid],
        hints: &[OrderKey],
        authorization: &[u8],
    ) -> Result<SettlementReceipt, AuctionError> {
        let now = self.clock.now();
        let auction = find_mut(&mut self.auctions, auction_id)?;
        auction.data.require_phase(now, Phase::AwaitingSettlement)?;
        if !auction.data.is_atomic_closure_allowed {
            return Err(AuctionError::AtomicClosureDisabled(auction_id));
        }
        if bids.len() != 1 {
            return Err(AuctionError::AtomicBatchSize(bids.len()));
        }
        check_hints(bids.len(), hints.len())?;
        if auction.data.incremental_started {
            return Err(AuctionError::IncrementalStarted(auction_id));
        }

        let (owner_id, _) = self.users.resolve(&caller);
        check_admission(&self.gates, &auction.data, caller, authorization)?;
        let (buy, sell) = bids[0];
        let order = admit_bid(&auction.data, owner_id, buy, sell)?;

        let placed = insert_batch(&mut auction.queue, &[order], hints)?;
        let deposit = sum_sell(&placed)?;
        let bidding_token = auction.data.bidding_token;

        let settled = settlement::settle(auction, now).and_then(|(record, payouts)| {
            let mut batch = TransferBatch::new();
            batch.pull(bidding_token, caller, deposit);
            batch.extend(payouts);
            self.ledger.apply(&batch)?;
            Ok(record)
        });
        let record = match settled {
            Ok(record) => record,
            Err(err) => {
                rollback(&mut auction.queue, &placed);
                return Err(err);
            }
        };

        self.users.commit(caller);
        let receipt = record.receipt.clone();
        auction.data.settlement = Some(record);
        auction.queue.clear_history();
        info!(
            owner_id,
            deposit,
            raised = receipt.raised,
            "Auction settled atomically"
        );
        Ok(receipt)
    }

    /// Pay out one owner's orders after settlement. Each order can be
    /// claimed once; claimed orders leave the queue.
    #[instrument(skip_all, fields(auction_id = auction_id, count = orders.len()))]
    pub fn claim_from_participant_orders(
        &mut self,
        auction_id: u64,
        orders: &[Order],
    ) -> Result<ClaimAmounts, AuctionError> {
        let now = self.clock.now();
        let auction = find_mut(&mut self.auctions, auction_id)?;
        let record = auction.data.settled(now)?;

        let first = orders.first().ok_or(AuctionError::EmptyBatch)?;
        if orders.iter().any(|o| o.owner_id != first.owner_id) {
            return Err(AuctionError::MixedOwners);
        }

        let mut seen = HashSet::new();
        for order in orders {
            let key = order.encode();
            if !order.is_real() || !auction.queue.contains(&key) || !seen.insert(key) {
                return Err(AuctionError::NotClaimable(key));
            }
        }
        let owner = self
            .users
            .address_of(first.owner_id)
            .ok_or(AuctionError::NotClaimable(first.encode()))?;
        let owed = settlement::total_claim(record, orders)?;

        let mut batch = TransferBatch::new();
        batch
            .pay(auction.data.auctioning_token, owner, owed.auctioning)
            .pay(auction.data.bidding_token, owner, owed.bidding);
        self.ledger.apply(&batch)?;

        for order in orders {
            auction.queue.take(&order.encode())?;
        }
        info!(
            owner_id = first.owner_id,
            auctioning = owed.auctioning,
            bidding = owed.bidding,
            "Orders claimed"
        );
        Ok(owed)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn auction(&self, auction_id: u64) -> Option<&Auction> {
        let index = usize::try_from(auction_id.checked_sub(1)?).ok()?;
        self.auctions.get(index)
    }

    pub fn phase(&self, auction_id: u64) -> Result<Phase, AuctionError> {
        let auction = self.require(auction_id)?;
        Ok(auction.data.phase(self.clock.now()))
    }

    /// Seconds until the auction closes, `0` once it has.
    pub fn seconds_remaining(&self, auction_id: u64) -> Result<u64, AuctionError> {
        let auction = self.require(auction_id)?;
        Ok(auction.data.auction_end.saturating_sub(self.clock.now()))
    }

    /// Whether `order` is live in the auction's queue. Sentinels never count.
    pub fn contains_order(&self, auction_id: u64, order: &Order) -> Result<bool, AuctionError> {
        let auction = self.require(auction_id)?;
        Ok(!order.is_sentinel() && auction.queue.contains(&order.encode()))
    }

    pub fn user_id(&self, identity: &Address) -> Option<u64> {
        self.users.id_of(identity)
    }

    pub fn fee_parameters(&self) -> FeeSnapshot {
        self.fee
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn operator(&self) -> Address {
        self.operator
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn require(&self, auction_id: u64) -> Result<&Auction, AuctionError> {
        self.auction(auction_id)
            .ok_or(AuctionError::UnknownAuction(auction_id))
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn find_mut(auctions: &mut [Auction], auction_id: u64) -> Result<&mut Auction, AuctionError> {
    auction_id
        .checked_sub(1)
        .and_then(|i| usize::try_from(i).ok())
        .and_then(|i| auctions.get_mut(i))
        .ok_or(AuctionError::UnknownAuction(auction_id))
}

fn check_hints(orders: usize, hints: usize) -> Result<(), AuctionError> {
    if orders != hints {
        return Err(AuctionError::HintCountMismatch { orders, hints });
    }
    Ok(())
}

/// Ask the auction's gate, if it names one. A named gate that is not
/// installed admits nobody.
fn check_admission(
    gates: &HashMap<Address, Box<dyn AccessControlGate>>,
    data: &AuctionData,
    placer: Address,
    authorization: &[u8],
) -> Result<(), AuctionError> {
    let Some(gate_id) = data.allow_list else {
        return Ok(());
    };
    let request = AdmissionRequest {
        placer,
        auction_id: data.auction_id,
        access_data: &data.allow_list_data,
        authorization,
    };
    let admitted = match gates.get(&gate_id) {
        Some(gate) => admits(gate.as_ref(), &request),
        None => {
            warn!(gate = %gate_id, "Auction names a gate that is not installed");
            false
        }
    };
    if !admitted {
        return Err(AuctionError::AccessDenied {
            placer,
            auction_id: data.auction_id,
        });
    }
    Ok(())
}

/// Check a bid against the auction and turn it into an order.
fn admit_bid(
    data: &AuctionData,
    owner_id: u64,
    buy_amount: u128,
    sell_amount: u128,
) -> Result<Order, AuctionError> {
    if buy_amount == 0 {
        return Err(AuctionError::ZeroBuyAmount);
    }
    let initial = &data.initial_order;
    if wide_mul(buy_amount, initial.buy_amount) >= wide_mul(initial.sell_amount, sell_amount) {
        return Err(AuctionError::LimitNotBetterThanReserve);
    }
    if sell_amount <= data.minimum_bid_amount {
        return Err(AuctionError::BelowMinimumBid {
            sell_amount,
            minimum: data.minimum_bid_amount,
        });
    }
    Ok(Order::new(owner_id, buy_amount, sell_amount)?)
}

/// Insert orders, skipping ones already live. On any other error every
/// insert of this batch is undone.
fn insert_batch(
    queue: &mut OrderQueue,
    orders: &[Order],
    hints: &[OrderKey],
) -> Result<Vec<Order>, AuctionError> {
    let mut placed = Vec::with_capacity(orders.len());
    for (order, hint) in orders.iter().zip(hints) {
        match queue.insert(*order, hint) {
            Ok(hops) => {
                debug!(owner_id = order.owner_id, hops, "Order queued");
                placed.push(*order);
            }
            Err(QueueError::DuplicateOrder(key)) => {
                debug!(key = %key, "Duplicate order skipped");
            }
            Err(err) => {
                rollback(queue, &placed);
                return Err(err.into());
            }
        }
    }
    Ok(placed)
}

fn rollback(queue: &mut OrderQueue, placed: &[Order]) {
    for order in placed.iter().rev() {
        let undone = queue.rollback_insert(&order.encode());
        debug_assert!(undone.is_ok(), "rolled back order must be live");
    }
}

fn sum_sell(orders: &[Order]) -> Result<u128, AuctionError> {
    orders.iter().try_fold(0u128, |sum, order| {
        sum.checked_add(order.sell_amount).ok_or(AuctionError::Overflow)
    })
}

// ============================================================================
// Unit Tests
// ============================================================================
