//! Error types for auction operations.
//!
//! Every exposed operation returns [`AuctionError`]. Component errors from
//! the queue, the clearing engine and the ledger convert into it with `?`.
//! No operation commits state before it knows it will succeed, so an error
//! always means nothing changed.
//!
//! # Error Categories
//!
//! - **Validation**: degenerate amounts, bad time windows, bad batches
//! - **AccessDenied**: the allow-list gate did not admit the placer
//! - **State**: operation invoked in the wrong lifecycle phase
//! - **Integrity**: bounds exceeded or fixed-width arithmetic would overflow
//! - **Ownership**: acting on somebody else's orders or operator settings
//! - **Ledger**: the asset ledger refused a transfer

use alloy_primitives::Address;
use thiserror::Error;

use crate::auction::Phase;
use crate::engine::EngineError;
use crate::ledger::LedgerError;
use crate::orderbook::QueueError;
use crate::types::{OrderError, OrderKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    AccessDenied,
    State,
    Integrity,
    Ownership,
    Ledger,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuctionError {
    #[error("Invalid auction parameters: {0}")]
    InvalidParameters(&'static str),

    #[error("Order buy amount must be positive")]
    ZeroBuyAmount,

    #[error("Order limit is not better than the reserve price")]
    LimitNotBetterThanReserve,

    #[error("Order sells {sell_amount}, must exceed {minimum}")]
    BelowMinimumBid { sell_amount: u128, minimum: u128 },

    #[error("{orders} orders but {hints} hints")]
    HintCountMismatch { orders: usize, hints: usize },

    #[error("Fee numerator {numerator} exceeds cap {max}")]
    FeeTooHigh { numerator: u64, max: u64 },

    #[error("Order batch is empty")]
    EmptyBatch,

    #[error("Atomic settlement takes exactly one order, got {0}")]
    AtomicBatchSize(usize),

    #[error("Placer {placer} not admitted to auction {auction_id}")]
    AccessDenied { placer: Address, auction_id: u64 },

    #[error("Auction {0} does not exist")]
    UnknownAuction(u64),

    #[error("Auction {auction_id} is {actual:?}, operation needs {expected:?}")]
    WrongPhase {
        auction_id: u64,
        expected: Phase,
        actual: Phase,
    },

    #[error("Cancellation period of auction {0} is over")]
    CancellationClosed(u64),

    #[error("Identity {0} is already registered")]
    AlreadyRegistered(Address),

    #[error("Identity {0} is not registered")]
    UnknownUser(Address),

    #[error("Atomic closure is not allowed for auction {0}")]
    AtomicClosureDisabled(u64),

    #[error("Incremental summing already started for auction {0}")]
    IncrementalStarted(u64),

    #[error("Order {0} cannot be claimed")]
    NotClaimable(OrderKey),

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Order of user {owner_id} cannot be changed by user {caller_id}")]
    NotOrderOwner { owner_id: u64, caller_id: u64 },

    #[error("Claim batch mixes orders of several owners")]
    MixedOwners,

    #[error("{0} is not the operator")]
    NotOperator(Address),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

impl AuctionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuctionError::InvalidParameters(_)
            | AuctionError::ZeroBuyAmount
            | AuctionError::LimitNotBetterThanReserve
            | AuctionError::BelowMinimumBid { .. }
            | AuctionError::HintCountMismatch { .. }
            | AuctionError::FeeTooHigh { .. }
            | AuctionError::EmptyBatch
            | AuctionError::AtomicBatchSize(_) => ErrorKind::Validation,

            AuctionError::AccessDenied { .. } => ErrorKind::AccessDenied,

            AuctionError::UnknownAuction(_)
            | AuctionError::WrongPhase { .. }
            | AuctionError::CancellationClosed(_)
            | AuctionError::AlreadyRegistered(_)
            | AuctionError::UnknownUser(_)
            | AuctionError::AtomicClosureDisabled(_)
            | AuctionError::IncrementalStarted(_)
            | AuctionError::NotClaimable(_) => ErrorKind::State,

            AuctionError::Overflow | AuctionError::Order(_) => ErrorKind::Integrity,

            AuctionError::NotOrderOwner { .. }
            | AuctionError::MixedOwners
            | AuctionError::NotOperator(_) => ErrorKind::Ownership,

            AuctionError::Queue(err) => queue_kind(err),
            AuctionError::Engine(EngineError::ZeroSteps) => ErrorKind::Validation,
            AuctionError::Engine(EngineError::Queue(err)) => queue_kind(err),
            AuctionError::Engine(_) => ErrorKind::Integrity,

            AuctionError::Ledger(_) => ErrorKind::Ledger,
        }
    }

    /// Returns true if this is a validation error
    pub fn is_validation_error(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }
}

fn queue_kind(err: &QueueError) -> ErrorKind {
    match err {
        QueueError::OrderNotFound(_) => ErrorKind::State,
        QueueError::DuplicateOrder(_)
        | QueueError::SentinelImmutable
        | QueueError::DegenerateOrder(_) => ErrorKind::Validation,
    }
}
