//! Wallet address encoding.
//!
//! `cst_` + base32(public key) + base32(first 5 bytes of Blake2b-256(public
//! key)), 52 + 8 characters after the prefix. The alphabet drops the
//! look-alike characters `0 2 l v`.

use custos_types::{PublicKey, WalletAddress};

use crate::{blake2b_256, CryptoError};

const ALPHABET: &[u8; 32] = b"13456789abcdefghijkmnopqrstuwxyz";

const KEY_CHARS: usize = 52;
const CHECKSUM_LEN: usize = 5;
const CHECKSUM_CHARS: usize = 8;

fn symbol_value(c: u8) -> Option<u8> {
    ALPHABET.iter().position(|&a| a == c).map(|p| p as u8)
}

/// Big-endian base32, zero-padding the final group on the right.
fn encode_base32(bytes: &[u8], out: &mut String) {
    let mut acc: u32 = 0;
    let mut bits = 0u32;
    for &b in bytes {
        acc = (acc << 8) | u32::from(b);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(ALPHABET[((acc >> bits) & 0x1f) as usize] as char);
        }
        acc &= (1 << bits) - 1;
    }
    if bits > 0 {
        out.push(ALPHABET[((acc << (5 - bits)) & 0x1f) as usize] as char);
    }
}

/// Inverse of [`encode_base32`] for exactly `N` output bytes.
fn decode_base32<const N: usize>(s: &str) -> Option<[u8; N]> {
    let mut out = [0u8; N];
    let mut acc: u32 = 0;
    let mut bits = 0u32;
    let mut written = 0;
    for c in s.bytes() {
        acc = (acc << 5) | u32::from(symbol_value(c)?);
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            if written == N {
                return None;
            }
            out[written] = (acc >> bits) as u8;
            written += 1;
        }
        acc &= (1 << bits) - 1;
    }
    (written == N).then_some(out)
}

fn checksum(key: &[u8; 32]) -> [u8; CHECKSUM_LEN] {
    let mut sum = [0u8; CHECKSUM_LEN];
    sum.copy_from_slice(&blake2b_256(key)[..CHECKSUM_LEN]);
    sum
}

/// The address of `public_key`.
pub fn derive_address(public_key: &PublicKey) -> WalletAddress {
    let mut s = String::with_capacity(WalletAddress::PREFIX.len() + KEY_CHARS + CHECKSUM_CHARS);
    s.push_str(WalletAddress::PREFIX);
    encode_base32(public_key.as_bytes(), &mut s);
    encode_base32(&checksum(public_key.as_bytes()), &mut s);
    WalletAddress::new(s)
}

/// Recover the public key behind an address, in any letter case, checking
/// length, alphabet and checksum.
pub fn decode_address(address: &str) -> Result<PublicKey, CryptoError> {
    let invalid = || CryptoError::InvalidAddress(address.to_string());
    let lower = address.trim().to_ascii_lowercase();
    let body = lower.strip_prefix(WalletAddress::PREFIX).ok_or_else(invalid)?;
    if body.len() != KEY_CHARS + CHECKSUM_CHARS {
        return Err(invalid());
    }
    let (key_part, sum_part) = body.split_at(KEY_CHARS);
    let key: [u8; 32] = decode_base32(key_part).ok_or_else(invalid)?;
    let sum: [u8; CHECKSUM_LEN] = decode_base32(sum_part).ok_or_else(invalid)?;
    if sum != checksum(&key) {
        return Err(invalid());
    }
    Ok(PublicKey(key))
}

pub fn validate_address(address: &str) -> bool {
    decode_address(address).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::keypair_from_seed;

    #[test]
    fn shape_of_a_derived_address() {
        let addr = derive_address(&keypair_from_seed(&[1u8; 32]).public);
        assert!(addr.as_str().starts_with("cst_"));
        assert_eq!(addr.as_str().len(), 4 + 52 + 8);
        assert!(addr.as_str()[4..].bytes().all(|c| ALPHABET.contains(&c)));
    }

    #[test]
    fn decode_returns_the_public_key() {
        let kp = keypair_from_seed(&[7u8; 32]);
        let addr = derive_address(&kp.public);
        assert_eq!(decode_address(addr.as_str()).unwrap(), kp.public);
        assert_eq!(
            decode_address(&addr.as_str().to_ascii_uppercase()).unwrap(),
            kp.public
        );
    }

    #[test]
    fn distinct_keys_distinct_addresses() {
        let a = derive_address(&keypair_from_seed(&[1u8; 32]).public);
        let b = derive_address(&keypair_from_seed(&[2u8; 32]).public);
        assert_ne!(a, b);
    }

    #[test]
    fn corrupted_checksum_is_rejected() {
        let addr = derive_address(&keypair_from_seed(&[5u8; 32]).public).to_string();
        let last = addr.as_bytes()[addr.len() - 1];
        let swap = if last == b'1' { '3' } else { '1' };
        let bad = format!("{}{swap}", &addr[..addr.len() - 1]);
        assert!(!validate_address(&bad));
    }

    #[test]
    fn malformed_addresses_are_rejected() {
        assert!(!validate_address(""));
        assert!(!validate_address("cst_"));
        assert!(!validate_address("cst_tooshort"));
        let addr = derive_address(&keypair_from_seed(&[4u8; 32]).public).to_string();
        assert!(!validate_address(&addr.replacen("cst_", "xyz_", 1)));
        // '0' is outside the alphabet.
        assert!(!validate_address(&format!("cst_0{}", &addr[5..])));
    }

    #[test]
    fn base32_round_trips_odd_lengths() {
        let mut s = String::new();
        encode_base32(&[0xde, 0xad, 0xbe, 0xef, 0x01], &mut s);
        assert_eq!(s.len(), 8);
        assert_eq!(decode_base32::<5>(&s), Some([0xde, 0xad, 0xbe, 0xef, 0x01]));
    }
}
