//! Tournament creation and entrant registration, withdrawal and forfeits.

use crate::logic::{load_tournament, MIN_ENTRANTS};
use crate::models::{
    BracketError, Entrant, EntrantId, NewTournament, RegistrationStatus, Tournament, TournamentId,
    TournamentStatus, TournamentUpdate,
};
use crate::store::{BracketStore, StoreError};
use chrono::{DateTime, Utc};
use log::{info, warn};

/// Create a pending tournament from validated settings.
pub fn create_tournament<S>(store: &S, settings: NewTournament) -> Result<Tournament, BracketError>
where
    S: BracketStore + ?Sized,
{
    settings.validate()?;
    let tournament = Tournament::new(settings);
    store.create_tournament(tournament.clone())?;
    info!("Created tournament {} ({})", tournament.id, tournament.name);
    Ok(tournament)
}

/// Register an entrant while registration is open (`pending` or `extended_registration`)
/// and the deadline has not passed.
///
/// A withdrawn entrant may register again; anyone else already registered is a duplicate.
pub fn register_entrant<S>(
    store: &S,
    tournament_id: TournamentId,
    entrant: Entrant,
    now: DateTime<Utc>,
) -> Result<(), BracketError>
where
    S: BracketStore + ?Sized,
{
    let tournament = load_tournament(store, tournament_id)?;
    if !tournament.status.accepts_registrations() {
        return Err(BracketError::InvalidState(tournament.status));
    }
    if tournament.registration_closed_at(now) {
        return Err(BracketError::RegistrationClosed);
    }
    let registered = store.entrants(
        tournament_id,
        &[RegistrationStatus::Active, RegistrationStatus::Forfeited],
    )?;
    if registered.iter().any(|e| e.id == entrant.id) {
        return Err(BracketError::DuplicateRegistration(entrant.id));
    }
    if registered.len() >= tournament.max_players {
        return Err(BracketError::TournamentFull {
            max_players: tournament.max_players,
        });
    }
    let entrant = Entrant {
        status: RegistrationStatus::Active,
        ..entrant
    };
    info!("Entrant {} registered for tournament {}", entrant.id, tournament_id);
    store.register_entrant(tournament_id, entrant)?;
    Ok(())
}

/// Leave a tournament that has not started.
///
/// Before the registration deadline this is a withdrawal (not ranked); after it, or once
/// registration is closed, a forfeit.
pub fn withdraw_entrant<S>(
    store: &S,
    tournament_id: TournamentId,
    entrant_id: EntrantId,
    now: DateTime<Utc>,
) -> Result<RegistrationStatus, BracketError>
where
    S: BracketStore + ?Sized,
{
    let tournament = load_tournament(store, tournament_id)?;
    if !tournament.status.can_start() {
        return Err(BracketError::InvalidState(tournament.status));
    }
    let closed = tournament.status == TournamentStatus::RegistrationClosed;
    let status = if closed || tournament.registration_closed_at(now) {
        RegistrationStatus::Forfeited
    } else {
        RegistrationStatus::Withdrawn
    };
    set_status(store, tournament_id, entrant_id, status)?;
    info!(
        "Entrant {} left tournament {} ({:?})",
        entrant_id, tournament_id, status
    );
    Ok(status)
}

/// Close registration: `registration_closed` with enough active entrants, `failed` without.
///
/// Returns the new status.
pub fn close_registration<S>(
    store: &S,
    tournament_id: TournamentId,
) -> Result<TournamentStatus, BracketError>
where
    S: BracketStore + ?Sized,
{
    let tournament = load_tournament(store, tournament_id)?;
    if !tournament.status.accepts_registrations() {
        return Err(BracketError::InvalidState(tournament.status));
    }
    let active = store
        .entrants(tournament_id, &[RegistrationStatus::Active])?
        .len();
    let required = tournament.min_players.max(MIN_ENTRANTS);
    let status = if active >= required {
        TournamentStatus::RegistrationClosed
    } else {
        warn!(
            "Tournament {} failed: {} of {} required entrants at close",
            tournament_id, active, required
        );
        TournamentStatus::Failed
    };
    store.update_tournament(tournament_id, &TournamentUpdate::status(status))?;
    info!("Registration closed for tournament {} ({})", tournament_id, status);
    Ok(status)
}

/// Reopen registration until a later `deadline`. Also revives a failed tournament.
pub fn extend_registration<S>(
    store: &S,
    tournament_id: TournamentId,
    deadline: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<(), BracketError>
where
    S: BracketStore + ?Sized,
{
    let tournament = load_tournament(store, tournament_id)?;
    if tournament.status.is_started() {
        return Err(BracketError::InvalidState(tournament.status));
    }
    if deadline <= now {
        return Err(BracketError::InvalidSettings(
            "extended deadline must be in the future".into(),
        ));
    }
    store.update_tournament(tournament_id, &TournamentUpdate::extended(deadline))?;
    info!(
        "Registration for tournament {} extended until {}",
        tournament_id, deadline
    );
    Ok(())
}

/// Mark an entrant's registration forfeited, at any stage. They rank below everyone else.
pub fn forfeit_registration<S>(
    store: &S,
    tournament_id: TournamentId,
    entrant_id: EntrantId,
) -> Result<(), BracketError>
where
    S: BracketStore + ?Sized,
{
    load_tournament(store, tournament_id)?;
    set_status(store, tournament_id, entrant_id, RegistrationStatus::Forfeited)?;
    info!("Entrant {} forfeited tournament {}", entrant_id, tournament_id);
    Ok(())
}

fn set_status<S>(
    store: &S,
    tournament_id: TournamentId,
    entrant_id: EntrantId,
    status: RegistrationStatus,
) -> Result<(), BracketError>
where
    S: BracketStore + ?Sized,
{
    match store.set_registration_status(tournament_id, entrant_id, status) {
        Err(StoreError::NotFound { .. }) => Err(BracketError::EntrantNotFound(entrant_id)),
        other => other.map_err(BracketError::from),
    }
}
