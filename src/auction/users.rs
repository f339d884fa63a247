//! Append-only identity registry.
//!
//! Identities get consecutive owner ids starting at 1 in registration
//! order. Equal-priced orders are ordered by owner id, so registration
//! order can decide which of them fills first.

use std::collections::HashMap;

use alloy_primitives::Address;

use crate::error::AuctionError;

#[derive(Debug, Clone, Default)]
pub struct UserRegistry {
    ids: HashMap<Address, u64>,
    /// `addresses[id - 1]`
    addresses: Vec<Address>,
}

impl UserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, identity: Address) -> Result<u64, AuctionError> {
        if self.ids.contains_key(&identity) {
            return Err(AuctionError::AlreadyRegistered(identity));
        }
        Ok(self.push(identity))
    }

    /// Id the identity has or would get if registered now.
    ///
    /// # Returns
    ///
    /// The id and whether it still needs to be committed with [`Self::commit`].
    pub fn resolve(&self, identity: &Address) -> (u64, bool) {
        match self.ids.get(identity) {
            Some(&id) => (id, false),
            None => (self.addresses.len() as u64 + 1, true),
        }
    }

    /// Register `identity` if [`Self::resolve`] reported it as new.
    pub fn commit(&mut self, identity: Address) -> u64 {
        match self.ids.get(&identity) {
            Some(&id) => id,
            None => self.push(identity),
        }
    }

    pub fn id_of(&self, identity: &Address) -> Option<u64> {
        self.ids.get(identity).copied()
    }

    pub fn address_of(&self, id: u64) -> Option<Address> {
        let index = usize::try_from(id.checked_sub(1)?).ok()?;
        self.addresses.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    fn push(&mut self, identity: Address) -> u64 {
        self.addresses.push(identity);
        let id = self.addresses.len() as u64;
        self.ids.insert(identity, id);
        id
    }
}
