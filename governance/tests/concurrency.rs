mod common;

use std::sync::Arc;
use std::thread;

use common::{address, Harness};
use custos_governance::{
    ActionType, Choice, GovernanceParams, QuorumPolicy, ReplacementRequest, TrusteeStatus,
    VoteStatus,
};

const NAMES: [&str; 8] = ["t0", "t1", "t2", "t3", "t4", "t5", "t6", "t7"];

#[test]
fn concurrent_ballots_on_one_vote_lose_no_update() {
    let mut params = GovernanceParams::default();
    params.policies.insert(ActionType::STANDARD, QuorumPolicy::fixed(8));
    let h = Arc::new(Harness::with_params(&NAMES, params));
    let vote = h.create_vote("STANDARD");
    assert_eq!(vote.quorum_required, 8);

    let handles: Vec<_> = NAMES
        .into_iter()
        .map(|name| {
            let h = Arc::clone(&h);
            let vote_id = vote.id.clone();
            thread::spawn(move || h.ballot(name, &vote_id, Choice::Approve).map(|_| ()))
        })
        .collect();
    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    let stored = h.engine.votes().get_vote(&h.admin(), &vote.id).unwrap();
    assert_eq!(stored.ballots.len(), NAMES.len());
    assert_eq!(stored.status, VoteStatus::Approved);
}

#[test]
fn racing_duplicate_ballots_store_one() {
    let h = Arc::new(Harness::new(&["alice", "bob", "carol", "dave", "erin"]));
    let vote = h.create_vote("STANDARD");

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let h = Arc::clone(&h);
            let vote_id = vote.id.clone();
            thread::spawn(move || h.ballot("alice", &vote_id, Choice::Approve).map(|_| ()))
        })
        .collect();
    for handle in handles {
        handle.join().unwrap().unwrap();
    }
    let stored = h.engine.votes().get_vote(&h.admin(), &vote.id).unwrap();
    assert_eq!(stored.ballots.len(), 1);
}

#[test]
fn independent_votes_proceed_in_parallel() {
    let h = Arc::new(Harness::new(&["alice", "bob", "carol"]));
    let ids: Vec<String> = (0..4).map(|_| h.create_vote("STANDARD").id).collect();

    let handles: Vec<_> = ids
        .iter()
        .cloned()
        .flat_map(|id| {
            ["alice", "bob"].into_iter().map(move |name| (id.clone(), name))
        })
        .map(|(id, name)| {
            let h = Arc::clone(&h);
            thread::spawn(move || h.ballot(name, &id, Choice::Approve).map(|_| ()))
        })
        .collect();
    for handle in handles {
        handle.join().unwrap().unwrap();
    }
    for id in ids {
        let v = h.engine.votes().get_vote(&h.admin(), &id).unwrap();
        assert_eq!(v.status, VoteStatus::Approved);
    }
}

#[test]
fn audit_export_sees_a_replacement_whole_or_not_at_all() {
    let h = Arc::new(Harness::new(&["alice", "bob", "carol"]));
    let vote = h
        .engine
        .emergency()
        .propose_replacement(&h.admin(), "Replace carol", "", None)
        .unwrap();
    h.ballot("alice", &vote.id, Choice::Approve).unwrap();
    h.ballot("bob", &vote.id, Choice::Approve).unwrap();

    let exporter = {
        let h = Arc::clone(&h);
        let vote_id = vote.id.clone();
        thread::spawn(move || {
            for _ in 0..200 {
                let report = h.engine.audit().export(&h.admin()).unwrap();
                let executed = report
                    .active_votes
                    .iter()
                    .any(|e| e.vote.id == vote_id && e.vote.status == VoteStatus::Executed);
                let carol_retired = report
                    .trustees
                    .iter()
                    .any(|t| t.id == "t_carol" && t.status == TrusteeStatus::Retired);
                let erin_seated = report.trustees.iter().any(|t| t.id == "t_erin");
                assert_eq!(executed, carol_retired);
                assert_eq!(executed, erin_seated);
            }
        })
    };

    h.engine
        .emergency()
        .execute_replacement(
            &h.admin(),
            ReplacementRequest {
                vote_id: vote.id.clone(),
                remove_address: address("carol"),
                add_address: address("erin"),
                add_trustee_id: "t_erin".into(),
            },
        )
        .unwrap();
    exporter.join().unwrap();
}
