use std::collections::BTreeSet;
use std::time::Duration;

use instant::Instant;
use pretty_assertions::assert_eq;
use undercover::error::VoteRejection;
use undercover::player::{PeerId, Player, Role};
use undercover::round::{Phase, Resolution, Round, RoundOutcome, VoteProgress};
use undercover::test_util::{sample_players, seeded_rng};
use undercover::word_pair::WordPair;


fn with_undercover(mut players: Vec<Player>, undercover: &str) -> Vec<Player> {
    for p in players.iter_mut() {
        if p.id.as_str() == undercover {
            p.role = Role::Undercover;
        }
    }
    players
}

fn new_round(names: &[&str], undercover: &str) -> Round {
    let players = with_undercover(sample_players(names), undercover);
    let starter = players[0].id.clone();
    Round::new(
        players,
        WordPair::new("Kaffee", "Tee"),
        Duration::from_secs(60 * names.len() as u64),
        starter,
        Instant::now(),
    )
}

fn vote(round: &mut Round, voter: &str, target: &str) -> VoteProgress {
    round.record_vote(&PeerId::new(voter), &PeerId::new(target)).unwrap()
}


#[test]
fn tie_is_broken_among_leaders_only() {
    let mut seen = BTreeSet::new();
    for seed in 0..100 {
        let mut round = new_round(&["A", "B", "C", "D", "E"], "e");
        assert!(round.stop_discussion());
        assert_eq!(vote(&mut round, "c", "a"), VoteProgress::Pending);
        assert_eq!(vote(&mut round, "d", "a"), VoteProgress::Pending);
        assert_eq!(vote(&mut round, "a", "b"), VoteProgress::Pending);
        assert_eq!(vote(&mut round, "e", "b"), VoteProgress::Pending);
        assert_eq!(vote(&mut round, "b", "c"), VoteProgress::Complete);
        let resolution = round.resolve(&mut seeded_rng(seed), Instant::now());
        let Resolution::Continue { eliminated } = resolution else {
            panic!("Unexpected resolution: {resolution:?}");
        };
        assert_ne!(eliminated, PeerId::new("c"));
        seen.insert(eliminated);
    }
    assert_eq!(seen, BTreeSet::from([PeerId::new("a"), PeerId::new("b")]));
}

#[test]
fn undercover_elimination_ends_round() {
    let mut round = new_round(&["A", "B", "C"], "b");
    assert!(round.stop_discussion());
    vote(&mut round, "a", "b");
    vote(&mut round, "c", "b");
    assert_eq!(vote(&mut round, "b", "a"), VoteProgress::Complete);
    assert_eq!(round.resolve(&mut seeded_rng(1), Instant::now()), Resolution::Over {
        eliminated: PeerId::new("b"),
        outcome: RoundOutcome::NormalsWin,
        message: "The normal players win! The undercover was B.".to_owned(),
    });
    assert_eq!(round.phase(), Phase::Ended);
}

#[test]
fn void_votes_start_voting_over() {
    let mut round = new_round(&["A", "B", "C", "D"], "d");
    assert!(round.stop_discussion());
    vote(&mut round, "a", "b");
    vote(&mut round, "c", "b");
    vote(&mut round, "d", "b");
    assert_eq!(round.remove_player(&PeerId::new("b")), VoteProgress::Complete);
    assert_eq!(round.resolve(&mut seeded_rng(1), Instant::now()), Resolution::Revote);
    assert_eq!(round.phase(), Phase::Voting);
    assert!(round.eliminated().is_empty());
    assert_eq!(round.tally().num_voters(), 0);
    assert!(!round.countdown().is_running());
}

#[test]
fn vote_for_departed_player_is_void() {
    let mut round = new_round(&["A", "B", "C", "D", "E"], "e");
    assert!(round.stop_discussion());
    assert_eq!(round.remove_player(&PeerId::new("b")), VoteProgress::Pending);
    assert_eq!(vote(&mut round, "a", "b"), VoteProgress::Pending);
    assert!(round.tally().has_voted(&PeerId::new("a")));
    assert_eq!(round.tally().votes_for(&PeerId::new("b")), 0);
    assert_eq!(
        round.record_vote(&PeerId::new("a"), &PeerId::new("c")),
        Err(VoteRejection::AlreadyVoted)
    );
    // Never a member of the round: still rejected.
    assert_eq!(
        round.record_vote(&PeerId::new("c"), &PeerId::new("x")),
        Err(VoteRejection::InvalidTarget)
    );
    vote(&mut round, "c", "a");
    vote(&mut round, "d", "a");
    assert_eq!(vote(&mut round, "e", "a"), VoteProgress::Complete);
    assert_eq!(
        round.resolve(&mut seeded_rng(1), Instant::now()),
        Resolution::Continue { eliminated: PeerId::new("a") }
    );
}

#[test]
fn votes_only_count_during_voting() {
    let mut round = new_round(&["A", "B", "C"], "a");
    assert!(round.record_vote(&PeerId::new("a"), &PeerId::new("b")).is_err());
    assert!(round.stop_discussion());
    assert!(!round.stop_discussion());
    assert!(round.record_vote(&PeerId::new("a"), &PeerId::new("b")).is_ok());
}

#[test]
fn countdown_expiry_starts_voting() {
    let start = Instant::now();
    let players = with_undercover(sample_players(&["A", "B", "C"]), "a");
    let starter = players[1].id.clone();
    let mut round =
        Round::new(players, WordPair::new("Sonne", "Mond"), Duration::from_secs(3), starter, start);
    assert!(!round.tick(start + Duration::from_secs(2)));
    assert_eq!(round.phase(), Phase::Discussion);
    assert!(round.tick(start + Duration::from_secs(3)));
    assert_eq!(round.phase(), Phase::Voting);
    assert!(!round.tick(start + Duration::from_secs(10)));
}
