//! Admission control for order placement.
//!
//! An auction may name an allow-list gate. Before any order from that
//! auction is admitted the gate is asked, and only the exact
//! [`ADMISSION_MAGIC`] value lets the order in. Any other value, and any
//! error, rejects the placement. Gates are consulted through `&self`, so an
//! implementation cannot mutate itself while deciding.

pub mod allow_list;

use alloy_primitives::Address;
use thiserror::Error;

pub use allow_list::{AllowListGate, SignatureVerifier};

/// Success value a gate must return to admit an order.
pub const ADMISSION_MAGIC: [u8; 4] = [0x19, 0xa0, 0x5a, 0x7e];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    #[error("access data is not a 20-byte signer")]
    MalformedAccessData,

    #[error("no signer recovered from authorization")]
    Unrecoverable,

    #[error("authorization signed by {recovered}, expected {expected}")]
    SignerMismatch { expected: Address, recovered: Address },

    #[error("gate rejected placer: {0}")]
    Rejected(String),
}

/// Everything a gate sees about one placement.
#[derive(Debug, Clone, Copy)]
pub struct AdmissionRequest<'a> {
    pub placer: Address,
    pub auction_id: u64,
    /// Opaque configuration the auctioneer attached to the auction
    pub access_data: &'a [u8],
    /// Proof supplied by the placer
    pub authorization: &'a [u8],
}

pub trait AccessControlGate {
    fn is_admitted(&self, request: &AdmissionRequest<'_>) -> Result<[u8; 4], GateError>;
}

/// Evaluate a gate strictly on its return value.
pub fn admits(gate: &dyn AccessControlGate, request: &AdmissionRequest<'_>) -> bool {
    matches!(gate.is_admitted(request), Ok(value) if value == ADMISSION_MAGIC)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Result<[u8; 4], GateError>);

    impl AccessControlGate for Fixed {
        fn is_admitted(&self, _: &AdmissionRequest<'_>) -> Result<[u8; 4], GateError> {
            self.0.clone()
        }
    }

    fn request() -> AdmissionRequest<'static> {
        AdmissionRequest {
            placer: Address::repeat_byte(1),
            auction_id: 1,
            access_data: &[],
            authorization: &[],
        }
    }

    #[test]
    fn test_only_magic_value_admits() {
        assert!(admits(&Fixed(Ok(ADMISSION_MAGIC)), &request()));
        assert!(!admits(&Fixed(Ok([0x19, 0xa0, 0x5a, 0x7f])), &request()));
        assert!(!admits(&Fixed(Ok([0; 4])), &request()));
    }

    #[test]
    fn test_error_rejects() {
        let gate = Fixed(Err(GateError::Rejected("blocked".into())));
        assert!(!admits(&gate, &request()));
    }
}
