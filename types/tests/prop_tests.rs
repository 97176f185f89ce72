use proptest::prelude::*;

use custos_types::{Timestamp, WalletAddress};

proptest! {
    /// Timestamp ordering: new(a) <= new(b) iff a <= b.
    #[test]
    fn timestamp_ordering(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let ta = Timestamp::new(a);
        let tb = Timestamp::new(b);
        prop_assert_eq!(ta <= tb, a <= b);
        prop_assert_eq!(ta == tb, a == b);
    }

    /// plus_secs never wraps around.
    #[test]
    fn timestamp_plus_saturates(a in 0u64..u64::MAX, d in 0u64..u64::MAX) {
        let t = Timestamp::new(a).plus_secs(d);
        prop_assert!(t >= Timestamp::new(a));
    }

    /// has_expired agrees with plain arithmetic.
    #[test]
    fn timestamp_has_expired(start in 0u64..1_000_000, dur in 0u64..1_000_000, now in 0u64..3_000_000) {
        let t = Timestamp::new(start);
        prop_assert_eq!(t.has_expired(dur, Timestamp::new(now)), now >= start + dur);
    }

    /// Parsing is insensitive to the case the caller used.
    #[test]
    fn address_parse_case_insensitive(body in "[a-z0-9]{1,60}") {
        let lower = WalletAddress::parse(&format!("cst_{body}")).unwrap();
        let upper = WalletAddress::parse(&format!("CST_{}", body.to_ascii_uppercase())).unwrap();
        prop_assert_eq!(lower, upper);
    }

    /// Addresses survive the storage encoding unchanged.
    #[test]
    fn address_bincode_roundtrip(body in "[a-z0-9]{1,60}") {
        let addr = WalletAddress::parse(&format!("cst_{body}")).unwrap();
        let encoded = bincode::serialize(&addr).unwrap();
        let decoded: WalletAddress = bincode::deserialize(&encoded).unwrap();
        prop_assert_eq!(decoded, addr);
    }
}
