//! Asset custody collaborator.
//!
//! The engine never holds balances itself. Every operation collects the
//! movements it needs into a [`TransferBatch`] and hands the whole batch to
//! an [`AssetLedger`]. Auction state is committed only after the batch has
//! been applied, so a ledger failure leaves the auction untouched.
//!
//! [`InMemoryLedger`] is a reference ledger with balances, allowances and an
//! engine custody account. Its `apply` is all-or-nothing, as every ledger's
//! must be.

use std::collections::HashMap;

use alloy_primitives::Address;
use thiserror::Error;

/// Tokens are identified by their address.
pub type TokenId = Address;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("{account} holds {available} of {token}, needs {needed}")]
    InsufficientBalance {
        token: TokenId,
        account: Address,
        needed: u128,
        available: u128,
    },

    #[error("{account} approved {available} of {token}, needs {needed}")]
    InsufficientAllowance {
        token: TokenId,
        account: Address,
        needed: u128,
        available: u128,
    },

    #[error("custody holds {available} of {token}, needs {needed}")]
    InsufficientCustody {
        token: TokenId,
        needed: u128,
        available: u128,
    },

    #[error("balance overflow for {token}")]
    Overflow { token: TokenId },
}

// ============================================================================
// Transfers
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transfer {
    /// Pull from an account into engine custody
    In {
        token: TokenId,
        from: Address,
        amount: u128,
    },
    /// Pay out of engine custody
    Out {
        token: TokenId,
        to: Address,
        amount: u128,
    },
}

/// Ordered movements applied as one unit. Zero amounts are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferBatch {
    transfers: Vec<Transfer>,
}

impl TransferBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pull(&mut self, token: TokenId, from: Address, amount: u128) -> &mut Self {
        if amount > 0 {
            self.transfers.push(Transfer::In { token, from, amount });
        }
        self
    }

    pub fn pay(&mut self, token: TokenId, to: Address, amount: u128) -> &mut Self {
        if amount > 0 {
            self.transfers.push(Transfer::Out { token, to, amount });
        }
        self
    }

    pub fn extend(&mut self, other: TransferBatch) {
        self.transfers.extend(other.transfers);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transfer> {
        self.transfers.iter()
    }

    pub fn len(&self) -> usize {
        self.transfers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transfers.is_empty()
    }

    /// Total paid out of custody in `token`
    pub fn paid(&self, token: TokenId) -> u128 {
        self.transfers
            .iter()
            .filter_map(|transfer| match transfer {
                Transfer::Out { token: t, amount, .. } if *t == token => Some(*amount),
                _ => None,
            })
            .sum()
    }
}

// ============================================================================
// Ledger trait
// ============================================================================

/// Custody backend for the auction house.
///
/// `apply` must be all-or-nothing: when it returns an error, none of the
/// batch's transfers may remain applied. The house commits auction state only
/// after `apply` succeeds, so a ledger that leaves a prefix of the batch
/// applied would let a retried operation move the same funds twice.
/// Ledgers that are cheap to clone can delegate to [`apply_staged`].
pub trait AssetLedger {
    fn transfer_in(&mut self, token: TokenId, from: Address, amount: u128)
        -> Result<(), LedgerError>;

    fn transfer_out(&mut self, token: TokenId, to: Address, amount: u128)
        -> Result<(), LedgerError>;

    /// Apply every transfer of `batch` in order, or none of them.
    fn apply(&mut self, batch: &TransferBatch) -> Result<(), LedgerError>;
}

/// All-or-nothing `apply` for cloneable ledgers: run the batch on a copy
/// and swap it in only if every transfer succeeded.
pub fn apply_staged<L>(ledger: &mut L, batch: &TransferBatch) -> Result<(), LedgerError>
where
    L: AssetLedger + Clone,
{
    let mut staged = ledger.clone();
    for transfer in batch.iter() {
        match *transfer {
            Transfer::In { token, from, amount } => staged.transfer_in(token, from, amount)?,
            Transfer::Out { token, to, amount } => staged.transfer_out(token, to, amount)?,
        }
    }
    *ledger = staged;
    Ok(())
}

// ============================================================================
// In-memory ledger
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    balances: HashMap<(TokenId, Address), u128>,
    allowances: HashMap<(TokenId, Address), u128>,
    custody: HashMap<TokenId, u128>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mint(&mut self, token: TokenId, account: Address, amount: u128) {
        let balance = self.balances.entry((token, account)).or_default();
        *balance = balance.saturating_add(amount);
    }

    /// Let the engine pull up to `amount` of `token` from `owner`.
    pub fn approve(&mut self, token: TokenId, owner: Address, amount: u128) {
        self.allowances.insert((token, owner), amount);
    }

    pub fn balance_of(&self, token: TokenId, account: Address) -> u128 {
        self.balances.get(&(token, account)).copied().unwrap_or(0)
    }

    pub fn allowance(&self, token: TokenId, owner: Address) -> u128 {
        self.allowances.get(&(token, owner)).copied().unwrap_or(0)
    }

    /// Amount of `token` held by the engine
    pub fn custody_of(&self, token: TokenId) -> u128 {
        self.custody.get(&token).copied().unwrap_or(0)
    }
}

impl AssetLedger for InMemoryLedger {
    fn transfer_in(
        &mut self,
        token: TokenId,
        from: Address,
        amount: u128,
    ) -> Result<(), LedgerError> {
        let available = self.balance_of(token, from);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                token,
                account: from,
                needed: amount,
                available,
            });
        }
        let approved = self.allowance(token, from);
        if approved < amount {
            return Err(LedgerError::InsufficientAllowance {
                token,
                account: from,
                needed: amount,
                available: approved,
            });
        }
        let held = self
            .custody_of(token)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow { token })?;

        self.balances.insert((token, from), available - amount);
        self.allowances.insert((token, from), approved - amount);
        self.custody.insert(token, held);
        Ok(())
    }

    fn transfer_out(
        &mut self,
        token: TokenId,
        to: Address,
        amount: u128,
    ) -> Result<(), LedgerError> {
        let held = self.custody_of(token);
        if held < amount {
            return Err(LedgerError::InsufficientCustody {
                token,
                needed: amount,
                available: held,
            });
        }
        let balance = self
            .balance_of(token, to)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow { token })?;

        self.custody.insert(token, held - amount);
        self.balances.insert((token, to), balance);
        Ok(())
    }

    fn apply(&mut self, batch: &TransferBatch) -> Result<(), LedgerError> {
        apply_staged(self, batch)
    }
}
