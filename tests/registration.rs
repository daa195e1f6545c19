//! Integration tests for tournament creation, registration and withdrawal.

use bracket_engine::logic::{register_entrant, withdraw_entrant};
use bracket_engine::{
    BracketEngine, BracketError, BracketStore, Entrant, MemoryStore, NewTournament,
    RegistrationStatus, TournamentStatus, TournamentUpdate,
};
use chrono::{Duration, Utc};
use uuid::Uuid;

fn engine() -> BracketEngine<MemoryStore> {
    BracketEngine::new(MemoryStore::new())
}

#[test]
fn create_rejects_invalid_settings() {
    let engine = engine();
    assert!(matches!(
        engine.create_tournament(NewTournament::new("   ")),
        Err(BracketError::InvalidSettings(_))
    ));
    let mut settings = NewTournament::new("Cup");
    settings.min_players = 1;
    assert!(matches!(
        engine.create_tournament(settings),
        Err(BracketError::InvalidSettings(_))
    ));
    let mut settings = NewTournament::new("Cup");
    settings.min_players = 8;
    settings.max_players = 4;
    assert!(matches!(
        engine.create_tournament(settings),
        Err(BracketError::InvalidSettings(_))
    ));
}

#[test]
fn created_tournament_is_pending() {
    let engine = engine();
    let t = engine.create_tournament(NewTournament::new("  Cup ")).unwrap();
    let stored = engine.tournament(t.id).unwrap();
    assert_eq!(stored.status, TournamentStatus::Pending);
    assert_eq!(stored.name, "Cup");
    assert!(engine.entrants(t.id).unwrap().is_empty());
}

#[test]
fn duplicate_registration_is_rejected() {
    let engine = engine();
    let t = engine.create_tournament(NewTournament::new("Cup")).unwrap();
    let alice = Entrant::new("Alice");
    engine.register_entrant(t.id, alice.clone()).unwrap();
    assert!(matches!(
        engine.register_entrant(t.id, alice.clone()),
        Err(BracketError::DuplicateRegistration(id)) if id == alice.id
    ));
    assert_eq!(engine.entrants(t.id).unwrap().len(), 1);
}

#[test]
fn registration_stops_at_max_players() {
    let engine = engine();
    let mut settings = NewTournament::new("Cup");
    settings.max_players = 2;
    let t = engine.create_tournament(settings).unwrap();
    engine.register_entrant(t.id, Entrant::new("A")).unwrap();
    engine.register_entrant(t.id, Entrant::new("B")).unwrap();
    assert!(matches!(
        engine.register_entrant(t.id, Entrant::new("C")),
        Err(BracketError::TournamentFull { max_players: 2 })
    ));
}

#[test]
fn registration_into_unknown_tournament_fails() {
    let engine = engine();
    assert!(matches!(
        engine.register_entrant(Uuid::new_v4(), Entrant::new("A")),
        Err(BracketError::TournamentNotFound(_))
    ));
}

#[test]
fn withdraw_before_deadline_frees_the_slot() {
    let engine = engine();
    let deadline = Utc::now() + Duration::hours(1);
    let t = engine
        .create_tournament(NewTournament::new("Cup").with_registration_deadline(deadline))
        .unwrap();
    let alice = Entrant::new("Alice");
    engine.register_entrant(t.id, alice.clone()).unwrap();

    let status = engine.withdraw_entrant(t.id, alice.id).unwrap();
    assert_eq!(status, RegistrationStatus::Withdrawn);
    assert!(engine.entrants(t.id).unwrap().is_empty());
    let withdrawn = engine
        .store()
        .entrants(t.id, &[RegistrationStatus::Withdrawn])
        .unwrap();
    assert_eq!(withdrawn.len(), 1);

    // A withdrawn entrant may come back.
    engine.register_entrant(t.id, alice.clone()).unwrap();
    let listed = engine.entrants(t.id).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].status, RegistrationStatus::Active);
}

#[test]
fn withdraw_after_deadline_is_a_forfeit() {
    let store = MemoryStore::new();
    let deadline = Utc::now();
    let t = bracket_engine::logic::create_tournament(
        &store,
        NewTournament::new("Cup").with_registration_deadline(deadline),
    )
    .unwrap();
    let alice = Entrant::new("Alice");
    register_entrant(&store, t.id, alice.clone(), deadline - Duration::minutes(5)).unwrap();

    let status = withdraw_entrant(&store, t.id, alice.id, deadline + Duration::minutes(5)).unwrap();
    assert_eq!(status, RegistrationStatus::Forfeited);
    let forfeited = store
        .entrants(t.id, &[RegistrationStatus::Forfeited])
        .unwrap();
    assert_eq!(forfeited.len(), 1);
}

#[test]
fn register_after_deadline_is_closed() {
    let store = MemoryStore::new();
    let deadline = Utc::now();
    let t = bracket_engine::logic::create_tournament(
        &store,
        NewTournament::new("Cup").with_registration_deadline(deadline),
    )
    .unwrap();
    assert!(matches!(
        register_entrant(&store, t.id, Entrant::new("Late"), deadline + Duration::seconds(1)),
        Err(BracketError::RegistrationClosed)
    ));
    // Exactly at the deadline is still on time.
    register_entrant(&store, t.id, Entrant::new("Punctual"), deadline).unwrap();
}

#[test]
fn registration_and_withdrawal_close_once_started() {
    let engine = engine();
    let t = engine.create_tournament(NewTournament::new("Cup")).unwrap();
    let alice = Entrant::new("Alice");
    engine.register_entrant(t.id, alice.clone()).unwrap();
    engine.register_entrant(t.id, Entrant::new("Bob")).unwrap();
    engine.generate_bracket_and_start(t.id).unwrap();

    assert!(matches!(
        engine.withdraw_entrant(t.id, alice.id),
        Err(BracketError::InvalidState(TournamentStatus::Ongoing))
    ));
    assert!(matches!(
        engine.register_entrant(t.id, Entrant::new("Carol")),
        Err(BracketError::InvalidState(TournamentStatus::Ongoing))
    ));
}

#[test]
fn unknown_entrant_cannot_withdraw() {
    let engine = engine();
    let t = engine.create_tournament(NewTournament::new("Cup")).unwrap();
    let stranger = Uuid::new_v4();
    assert!(matches!(
        engine.withdraw_entrant(t.id, stranger),
        Err(BracketError::EntrantNotFound(id)) if id == stranger
    ));
    assert!(matches!(
        engine.forfeit_registration(t.id, stranger),
        Err(BracketError::EntrantNotFound(_))
    ));
}

#[test]
fn forfeited_registration_still_counts_toward_capacity() {
    let engine = engine();
    let mut settings = NewTournament::new("Cup");
    settings.max_players = 2;
    let t = engine.create_tournament(settings).unwrap();
    let a = Entrant::new("A");
    engine.register_entrant(t.id, a.clone()).unwrap();
    engine.register_entrant(t.id, Entrant::new("B")).unwrap();
    engine.forfeit_registration(t.id, a.id).unwrap();
    assert!(matches!(
        engine.register_entrant(t.id, Entrant::new("C")),
        Err(BracketError::TournamentFull { .. })
    ));
}

#[test]
fn registration_is_refused_unless_open() {
    for status in [TournamentStatus::RegistrationClosed, TournamentStatus::Failed] {
        let engine = engine();
        let t = engine.create_tournament(NewTournament::new("Cup")).unwrap();
        engine
            .store()
            .update_tournament(t.id, &TournamentUpdate::status(status))
            .unwrap();
        assert!(
            matches!(
                engine.register_entrant(t.id, Entrant::new("A")),
                Err(BracketError::InvalidState(s)) if s == status
            ),
            "status = {status}"
        );
    }
}

#[test]
fn closing_short_of_minimum_fails_the_tournament() {
    let engine = engine();
    let mut settings = NewTournament::new("Cup");
    settings.min_players = 3;
    let t = engine.create_tournament(settings).unwrap();
    engine.register_entrant(t.id, Entrant::new("A")).unwrap();
    engine.register_entrant(t.id, Entrant::new("B")).unwrap();

    assert_eq!(engine.close_registration(t.id).unwrap(), TournamentStatus::Failed);
    assert!(matches!(
        engine.generate_bracket_and_start(t.id),
        Err(BracketError::InvalidState(TournamentStatus::Failed))
    ));
    assert!(matches!(
        engine.close_registration(t.id),
        Err(BracketError::InvalidState(TournamentStatus::Failed))
    ));
}

#[test]
fn extension_reopens_registration() {
    let engine = engine();
    let mut settings = NewTournament::new("Cup");
    settings.min_players = 3;
    let t = engine.create_tournament(settings).unwrap();
    engine.register_entrant(t.id, Entrant::new("A")).unwrap();
    engine.register_entrant(t.id, Entrant::new("B")).unwrap();
    engine.close_registration(t.id).unwrap();

    let deadline = Utc::now() + Duration::days(1);
    engine.extend_registration(t.id, deadline).unwrap();
    let reopened = engine.tournament(t.id).unwrap();
    assert_eq!(reopened.status, TournamentStatus::ExtendedRegistration);
    assert_eq!(reopened.registration_deadline, Some(deadline));

    engine.register_entrant(t.id, Entrant::new("C")).unwrap();
    assert_eq!(
        engine.close_registration(t.id).unwrap(),
        TournamentStatus::RegistrationClosed
    );
    assert_eq!(engine.generate_bracket_and_start(t.id).unwrap().len(), 2);
}

#[test]
fn extension_needs_a_future_deadline() {
    let engine = engine();
    let t = engine.create_tournament(NewTournament::new("Cup")).unwrap();
    assert!(matches!(
        engine.extend_registration(t.id, Utc::now() - Duration::minutes(1)),
        Err(BracketError::InvalidSettings(_))
    ));
    assert_eq!(engine.tournament(t.id).unwrap().status, TournamentStatus::Pending);
}

#[test]
fn withdrawing_after_close_is_a_forfeit() {
    let engine = engine();
    let t = engine.create_tournament(NewTournament::new("Cup")).unwrap();
    let alice = Entrant::new("Alice");
    engine.register_entrant(t.id, alice.clone()).unwrap();
    engine.register_entrant(t.id, Entrant::new("Bob")).unwrap();
    engine.close_registration(t.id).unwrap();

    assert_eq!(
        engine.withdraw_entrant(t.id, alice.id).unwrap(),
        RegistrationStatus::Forfeited
    );
}
