//! Blake2b-256, used for address checksums and deterministic test seeds.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};

pub fn blake2b_256(data: &[u8]) -> [u8; 32] {
    Blake2b::<U32>::digest(data).into()
}
