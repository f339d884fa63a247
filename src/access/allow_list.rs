//! Signature-based allow-list gate.
//!
//! The auctioneer stores a signer identity as the auction's access data and
//! hands out signatures over `(domain_separator, placer, auction_id)`. The
//! domain separator binds each signature to one network and one gate
//! instance, so it cannot be replayed elsewhere.

use alloy_primitives::{Address, B256, U256};
use sha2::{Digest, Sha256};

use crate::access::{AccessControlGate, AdmissionRequest, GateError, ADMISSION_MAGIC};

const DOMAIN_TAG: &[u8] = b"BatchAuctionAllowList";
const ADDRESS_BYTES: usize = 20;

/// Recovers the signer of a 32-byte message.
pub trait SignatureVerifier {
    fn recover(&self, message: &B256, signature: &[u8]) -> Option<Address>;
}

#[derive(Debug, Clone)]
pub struct AllowListGate<V> {
    address: Address,
    network_id: u64,
    verifier: V,
}

impl<V: SignatureVerifier> AllowListGate<V> {
    /// # Arguments
    ///
    /// * `address` - Identity the gate is installed under
    /// * `network_id` - Network the signatures are valid on
    /// * `verifier` - Signature recovery primitive
    pub fn new(address: Address, network_id: u64, verifier: V) -> Self {
        Self {
            address,
            network_id,
            verifier,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn domain_separator(&self) -> B256 {
        let mut hasher = Sha256::new();
        hasher.update(DOMAIN_TAG);
        hasher.update(self.network_id.to_be_bytes());
        hasher.update(self.address.as_slice());
        B256::from_slice(&hasher.finalize())
    }

    /// Message the auctioneer signs to admit `placer` into `auction_id`.
    pub fn message(&self, placer: Address, auction_id: u64) -> B256 {
        let mut hasher = Sha256::new();
        hasher.update(self.domain_separator().as_slice());
        hasher.update(placer.as_slice());
        hasher.update(U256::from(auction_id).to_be_bytes::<32>());
        B256::from_slice(&hasher.finalize())
    }
}

impl<V: SignatureVerifier> AccessControlGate for AllowListGate<V> {
    fn is_admitted(&self, request: &AdmissionRequest<'_>) -> Result<[u8; 4], GateError> {
        if request.access_data.len() != ADDRESS_BYTES {
            return Err(GateError::MalformedAccessData);
        }
        let expected = Address::from_slice(request.access_data);

        let message = self.message(request.placer, request.auction_id);
        let recovered = self
            .verifier
            .recover(&message, request.authorization)
            .ok_or(GateError::Unrecoverable)?;

        if recovered != expected {
            return Err(GateError::SignerMismatch {
                expected,
                recovered,
            });
        }
        Ok(ADMISSION_MAGIC)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::admits;

    /// Signature is `signer || sha256(message || signer)`.
    struct DigestVerifier;

    impl DigestVerifier {
        fn sign(signer: Address, message: &B256) -> Vec<u8> {
            let mut sig = signer.to_vec();
            sig.extend_from_slice(&Sha256::digest([message.as_slice(), signer.as_slice()].concat()));
            sig
        }
    }

    impl SignatureVerifier for DigestVerifier {
        fn recover(&self, message: &B256, signature: &[u8]) -> Option<Address> {
            if signature.len() != 52 {
                return None;
            }
            let signer = Address::from_slice(&signature[..20]);
            (Self::sign(signer, message) == signature).then_some(signer)
        }
    }

    const GATE: Address = Address::repeat_byte(0x6a);
    const SIGNER_BYTES: [u8; 20] = [0x51; 20];
    const SIGNER: Address = Address::new(SIGNER_BYTES);
    const PLACER: Address = Address::repeat_byte(0x90);

    fn gate(network_id: u64) -> AllowListGate<DigestVerifier> {
        AllowListGate::new(GATE, network_id, DigestVerifier)
    }

    #[test]
    fn test_signed_placer_admitted() {
        let gate = gate(1);
        let sig = DigestVerifier::sign(SIGNER, &gate.message(PLACER, 7));
        let request = AdmissionRequest {
            placer: PLACER,
            auction_id: 7,
            access_data: &SIGNER_BYTES,
            authorization: &sig,
        };
        assert_eq!(gate.is_admitted(&request), Ok(ADMISSION_MAGIC));
    }

    #[test]
    fn test_signature_for_other_auction_rejected() {
        let gate = gate(1);
        let sig = DigestVerifier::sign(SIGNER, &gate.message(PLACER, 8));
        let request = AdmissionRequest {
            placer: PLACER,
            auction_id: 7,
            access_data: &SIGNER_BYTES,
            authorization: &sig,
        };
        assert!(!admits(&gate, &request));
    }

    #[test]
    fn test_signature_from_other_network_rejected() {
        let sig = DigestVerifier::sign(SIGNER, &gate(5).message(PLACER, 7));
        let request = AdmissionRequest {
            placer: PLACER,
            auction_id: 7,
            access_data: &SIGNER_BYTES,
            authorization: &sig,
        };
        assert_eq!(gate(1).is_admitted(&request), Err(GateError::Unrecoverable));
    }

    #[test]
    fn test_wrong_signer_rejected() {
        let gate = gate(1);
        let other = Address::repeat_byte(0x33);
        let sig = DigestVerifier::sign(other, &gate.message(PLACER, 7));
        let request = AdmissionRequest {
            placer: PLACER,
            auction_id: 7,
            access_data: &SIGNER_BYTES,
            authorization: &sig,
        };
        assert_eq!(
            gate.is_admitted(&request),
            Err(GateError::SignerMismatch {
                expected: SIGNER,
                recovered: other
            })
        );
    }

    #[test]
    fn test_malformed_access_data() {
        let request = AdmissionRequest {
            placer: PLACER,
            auction_id: 7,
            access_data: &[1, 2, 3],
            authorization: &[],
        };
        assert_eq!(gate(1).is_admitted(&request), Err(GateError::MalformedAccessData));
    }

    #[test]
    fn test_domain_separator_binds_gate_and_network() {
        let a = gate(1).domain_separator();
        assert_ne!(a, gate(2).domain_separator());
        assert_ne!(
            a,
            AllowListGate::new(Address::repeat_byte(1), 1, DigestVerifier).domain_separator()
        );
    }
}
