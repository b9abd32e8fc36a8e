//! Shelley address helpers
//!
//! Only the pieces the toolchain needs: enterprise script addresses and
//! extracting the payment key hash from a base or enterprise address.

use crate::crypto::hash::HASH_224_SIZE;
use crate::ledger::types::{ContextError, Network, PubKeyHash};
use bech32::{FromBase32, ToBase32, Variant};

/// Header type nibble for an enterprise address with a script payment part
const ENTERPRISE_SCRIPT: u8 = 0b0111;

/// Bech32 enterprise address for a script hash
pub fn script_address(
    script_hash: &[u8; HASH_224_SIZE],
    network: Network,
) -> Result<String, ContextError> {
    let mut payload = Vec::with_capacity(1 + HASH_224_SIZE);
    payload.push((ENTERPRISE_SCRIPT << 4) | network.id());
    payload.extend_from_slice(script_hash);

    bech32::encode(network.address_prefix(), payload.to_base32(), Variant::Bech32)
        .map_err(|e| ContextError::InvalidAddress(e.to_string()))
}

/// Decode a bech32 address into its raw bytes
pub fn decode_address(address: &str) -> Result<(String, Vec<u8>), ContextError> {
    let (hrp, data, _variant) =
        bech32::decode(address).map_err(|e| ContextError::InvalidAddress(e.to_string()))?;
    let bytes =
        Vec::<u8>::from_base32(&data).map_err(|e| ContextError::InvalidAddress(e.to_string()))?;
    if bytes.is_empty() {
        return Err(ContextError::InvalidAddress("empty payload".to_string()));
    }
    Ok((hrp, bytes))
}

/// Payment key hash of a Shelley address, if its payment part is a key
pub fn payment_key_hash(address: &str) -> Result<PubKeyHash, ContextError> {
    let (_, bytes) = decode_address(address)?;
    let address_type = bytes[0] >> 4;

    // Types 0-7 are Shelley addresses; bit 0 set means a script payment part
    if address_type > 7 || address_type & 1 == 1 {
        return Err(ContextError::NoPaymentKey);
    }
    if bytes.len() < 1 + HASH_224_SIZE {
        return Err(ContextError::InvalidAddress(format!(
            "payload too short: {} bytes",
            bytes.len()
        )));
    }
    PubKeyHash::from_slice(&bytes[1..1 + HASH_224_SIZE])
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: &str = "addr_test1qpmtp5t0t5y6cqkaz7rfsyrx7mld77kpvksgkwm0p7en7qum7a589n30e80tclzrrnj8qr4qvzj6al0vpgtnmrkkksnqd8upj0";

    #[test]
    fn test_payment_key_hash_of_base_address() {
        let pkh = payment_key_hash(OWNER).unwrap();
        assert_eq!(
            pkh.to_string(),
            "76b0d16f5d09ac02dd1786981066f6fedf7ac165a08b3b6f0fb33f03"
        );
    }

    #[test]
    fn test_script_address_has_no_payment_key() {
        let addr = script_address(&[7u8; 28], Network::Testnet).unwrap();
        assert!(addr.starts_with("addr_test1w"));
        assert_eq!(payment_key_hash(&addr), Err(ContextError::NoPaymentKey));
    }

    #[test]
    fn test_script_address_roundtrip() {
        let hash = [0x42u8; 28];
        let addr = script_address(&hash, Network::Mainnet).unwrap();
        let (hrp, bytes) = decode_address(&addr).unwrap();
        assert_eq!(hrp, "addr");
        assert_eq!(bytes[0], 0x71);
        assert_eq!(&bytes[1..], &hash[..]);
    }

    #[test]
    fn test_invalid_address() {
        assert!(matches!(
            payment_key_hash("not-an-address"),
            Err(ContextError::InvalidAddress(_))
        ));
    }
}
