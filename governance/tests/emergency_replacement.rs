mod common;

use common::{address, Harness};
use custos_governance::{Choice, ReplacementRequest, TrusteeStatus, VoteStatus};
use custos_store::Collection;

fn approved_emergency_vote(h: &Harness) -> String {
    let vote = h
        .engine
        .emergency()
        .propose_replacement(&h.admin(), "Replace carol", "unreachable", None)
        .unwrap();
    assert_eq!(vote.quorum_required, 2);
    h.ballot("alice", &vote.id, Choice::Approve).unwrap();
    let v = h.ballot("bob", &vote.id, Choice::Approve).unwrap();
    assert_eq!(v.status, VoteStatus::Approved);
    vote.id
}

fn request(vote_id: &str, remove: &str, add: &str) -> ReplacementRequest {
    ReplacementRequest {
        vote_id: vote_id.to_string(),
        remove_address: address(remove),
        add_address: address(add),
        add_trustee_id: format!("t_{add}"),
    }
}

#[test]
fn end_to_end_replacement() {
    let h = Harness::new(&["alice", "bob", "carol"]);
    let vote_id = approved_emergency_vote(&h);

    let outcome = h
        .engine
        .emergency()
        .execute_replacement(&h.admin(), request(&vote_id, "carol", "erin"))
        .unwrap();
    assert_eq!(outcome.retired.status, TrusteeStatus::Retired);
    assert_eq!(outcome.retired.reason.as_deref(), Some("EMERGENCY_REPLACEMENT_APPROVED"));
    assert!(outcome.retired.retired_at.is_some());
    assert_eq!(outcome.admitted.status, TrusteeStatus::Active);

    let registry = h.engine.registry();
    let carol = registry.get("t_carol").unwrap().unwrap();
    assert_eq!(carol.status, TrusteeStatus::Retired);
    let active: Vec<String> = registry.list_active().unwrap().into_iter().map(|t| t.id).collect();
    assert!(active.contains(&"t_erin".to_string()));
    assert!(!active.contains(&"t_carol".to_string()));
    assert_eq!(active.len(), 3);
    assert_eq!(registry.list_all().unwrap().len(), 5);

    let vote = h.engine.votes().get_vote(&h.admin(), &vote_id).unwrap();
    assert_eq!(vote.status, VoteStatus::Executed);
    let exec = vote.execution.unwrap();
    assert_eq!(exec.remove_address, address("carol"));
    assert_eq!(exec.add_address, address("erin"));
    assert_eq!(exec.add_trustee_id, "t_erin");

    let err = h
        .engine
        .emergency()
        .execute_replacement(&h.admin(), request(&vote_id, "bob", "frank"))
        .unwrap_err();
    assert_eq!(err.code(), "NOT_APPROVED");
}

#[test]
fn preconditions_are_checked_in_order() {
    let h = Harness::new(&["alice", "bob", "carol"]);
    let emergency = h.engine.emergency();
    let admin = h.admin();

    let err = emergency
        .execute_replacement(&admin, request("vote_missing", "carol", "erin"))
        .unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");

    let standard = h.create_vote("STANDARD");
    h.ballot("alice", &standard.id, Choice::Approve).unwrap();
    h.ballot("bob", &standard.id, Choice::Approve).unwrap();
    let err = emergency
        .execute_replacement(&admin, request(&standard.id, "carol", "erin"))
        .unwrap_err();
    assert_eq!(err.code(), "WRONG_VOTE_TYPE");

    let open = emergency
        .propose_replacement(&admin, "Replace carol", "", None)
        .unwrap();
    let err = emergency
        .execute_replacement(&admin, request(&open.id, "carol", "erin"))
        .unwrap_err();
    assert_eq!(err.code(), "NOT_APPROVED");

    let err = emergency
        .execute_replacement(&h.session("alice"), request(&open.id, "carol", "erin"))
        .unwrap_err();
    assert_eq!(err.code(), "FORBIDDEN");
}

#[test]
fn unknown_retiree_aborts_everything() {
    let h = Harness::new(&["alice", "bob", "carol"]);
    let vote_id = approved_emergency_vote(&h);
    let commits = h.store.commit_count();

    let err = h
        .engine
        .emergency()
        .execute_replacement(&h.admin(), request(&vote_id, "mallory", "erin"))
        .unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");
    assert_eq!(h.store.commit_count(), commits);
    assert_eq!(h.store.len(Collection::Trustees), 4);
    let vote = h.engine.votes().get_vote(&h.admin(), &vote_id).unwrap();
    assert_eq!(vote.status, VoteStatus::Approved);
}

#[test]
fn non_voting_retiree_aborts_everything() {
    let h = Harness::new(&["alice", "bob", "carol"]);
    let vote_id = approved_emergency_vote(&h);
    let commits = h.store.commit_count();

    let err = h
        .engine
        .emergency()
        .execute_replacement(&h.admin(), request(&vote_id, "admin", "erin"))
        .unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");
    assert_eq!(h.store.commit_count(), commits);

    let registry = h.engine.registry();
    assert_eq!(registry.active_count().unwrap(), 3);
    let admin = registry.get("admin").unwrap().unwrap();
    assert_eq!(admin.status, TrusteeStatus::Active);
    assert!(registry.get("t_erin").unwrap().is_none());
    let vote = h.engine.votes().get_vote(&h.admin(), &vote_id).unwrap();
    assert_eq!(vote.status, VoteStatus::Approved);
}

#[test]
fn newcomer_must_be_new() {
    let h = Harness::new(&["alice", "bob", "carol"]);
    let vote_id = approved_emergency_vote(&h);
    let emergency = h.engine.emergency();

    let err = emergency
        .execute_replacement(&h.admin(), request(&vote_id, "carol", "alice"))
        .unwrap_err();
    assert_eq!(err.code(), "ALREADY_ACTIVE");

    let mut dup = request(&vote_id, "carol", "erin");
    dup.add_trustee_id = "t_bob".into();
    let err = emergency.execute_replacement(&h.admin(), dup).unwrap_err();
    assert_eq!(err.code(), "DUPLICATE_ID");
}

#[test]
fn storage_failure_persists_no_half_replacement() {
    let h = Harness::new(&["alice", "bob", "carol"]);
    let vote_id = approved_emergency_vote(&h);
    h.store.fail_commits(true);
    let err = h
        .engine
        .emergency()
        .execute_replacement(&h.admin(), request(&vote_id, "carol", "erin"))
        .unwrap_err();
    assert_eq!(err.code(), "STORAGE");
    h.store.fail_commits(false);

    let carol = h.engine.registry().get("t_carol").unwrap().unwrap();
    assert_eq!(carol.status, TrusteeStatus::Active);
    assert!(h.engine.registry().get("t_erin").unwrap().is_none());
}

#[test]
fn replacement_changes_future_quorums_only() {
    let h = Harness::new(&["alice", "bob", "carol"]);
    let before = h.create_vote("STANDARD");
    let vote_id = approved_emergency_vote(&h);
    h.engine
        .emergency()
        .execute_replacement(&h.admin(), request(&vote_id, "carol", "erin"))
        .unwrap();

    let stored = h.engine.votes().get_vote(&h.admin(), &before.id).unwrap();
    assert_eq!(stored.quorum_required, 2);

    let report = h.engine.audit().export(&h.admin()).unwrap();
    assert_eq!(report.trustees.len(), 5);
    assert_eq!(report.active_votes.len(), 2);
    let text = report.render_text();
    assert!(text.contains("EMERGENCY_REPLACEMENT_APPROVED"));
    assert!(text.contains(&format!("replaced {}", address("carol"))));
}
