//! Context binding of signed messages.
//!
//! A signed message is only accepted for the operation it names: ballots
//! must carry `VOTE:{id}`, attestation signatures `ATTESTATION:{id}` and
//! login responses `Nonce: {nonce}`. A tag only matches when it is not
//! immediately followed by another identifier character, so `VOTE:v1`
//! does not satisfy a check for `VOTE:v`.

use custos_types::WalletAddress;
use serde::{Deserialize, Serialize};

/// A wallet-signed message submitted on behalf of `address`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedMessage {
    pub address: WalletAddress,
    pub message: String,
    pub signature: String,
}

pub fn vote_tag(vote_id: &str) -> String {
    format!("VOTE:{vote_id}")
}

pub fn attestation_tag(attestation_id: &str) -> String {
    format!("ATTESTATION:{attestation_id}")
}

pub fn nonce_tag(nonce: &str) -> String {
    format!("Nonce: {nonce}")
}

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Whether `message` contains `tag` as a complete token.
pub fn contains_tag(message: &str, tag: &str) -> bool {
    if tag.is_empty() {
        return false;
    }
    message.match_indices(tag).any(|(start, _)| {
        let end = start + tag.len();
        !message[end..].chars().next().is_some_and(is_id_char)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_tag_matches() {
        assert!(contains_tag("I approve VOTE:v1 today", &vote_tag("v1")));
        assert!(contains_tag("VOTE:v1", &vote_tag("v1")));
        assert!(contains_tag("VOTE:v1\nChoice: APPROVE", &vote_tag("v1")));
    }

    #[test]
    fn prefix_of_longer_id_does_not_match() {
        assert!(!contains_tag("VOTE:v10", &vote_tag("v1")));
        assert!(!contains_tag("VOTE:v1_b", &vote_tag("v1")));
        assert!(!contains_tag("VOTE:vote_ab12-APPROVE", &vote_tag("vote_ab12")));
        assert!(contains_tag("VOTE:v10 VOTE:v1", &vote_tag("v1")));
    }

    #[test]
    fn other_context_does_not_match() {
        assert!(!contains_tag("ATTESTATION:A1", &vote_tag("A1")));
        assert!(!contains_tag("anything", ""));
    }

    #[test]
    fn nonce_tag_format() {
        let msg = "Sign in.\nNonce: abc123";
        assert!(contains_tag(msg, &nonce_tag("abc123")));
        assert!(!contains_tag(msg, &nonce_tag("abc12")));
    }
}
