//! Squad session authority and message dispatch
//!
//! This module contains the per-squad session struct: the single server-held
//! truth for which stage the squad is on and for the live puzzle instance.
//! It routes incoming operative messages, answers clue requests, evaluates
//! guesses, and on the winning guess advances the squad and broadcasts
//! the transition to every connected operative exactly once.
//!
//! One owner per squad: every mutating method takes `&mut self`. Callers
//! that receive operative messages concurrently must funnel them through a
//! per-squad lock or a single-consumer task; inside that exclusive region
//! marking the puzzle solved and advancing the stage are one atomic step, so
//! no operative can observe a stage-advance notification for an instance
//! that is not yet solved, and no squad can be advanced twice.

use serde::{Deserialize, Serialize};

use crate::{
    jammer::{self, ConfigError, JammerConfig, JammerInstance},
    roster::{self, Id, Roster},
    session::Tunnel,
    squad_id::SquadId,
    stage::{Stage, StageState},
};

/// Messages an operative can send to the squad authority
///
/// Operative identity is implicit in the connection; the engine receives it
/// alongside the message, never inside the payload.
#[derive(Debug, Deserialize, Clone)]
pub enum IncomingMessage {
    /// Request this operative's clue for the live puzzle
    RequestClue,
    /// Submit a guess naming a symbol on the jammer grid
    JammerGuess {
        /// Index of the guessed symbol
        symbol_index: usize,
    },
    /// Request the squad-wide transition after a local success
    ///
    /// The request surface, not the authority: the server honors it only
    /// when the live puzzle is solved and the target matches its configured
    /// successor, and the monotonic stage guard collapses duplicates.
    SquadAdvance {
        /// The stage the operative asks the squad to move to
        to: Stage,
    },
}

/// Update messages broadcast to the whole squad
#[derive(Debug, Serialize, Clone)]
pub enum UpdateMessage {
    /// The squad has moved to a new stage; every operative switches view
    ViewChange {
        /// The stage all squad members are now on
        view: Stage,
    },
}

/// Sync messages for operatives connecting or reconnecting
#[derive(Debug, Serialize, Clone)]
pub enum SyncMessage {
    /// The squad's current stage (a state snapshot, not a replayed event)
    Stage {
        /// The stage all squad members are currently on
        view: Stage,
    },
}

/// The server-held session state for one squad
///
/// Owns the roster, the monotonic stage pointer, and the live jammer
/// instance while the squad is on that stage.
#[derive(Debug, Serialize, Deserialize)]
pub struct SquadSession {
    /// The squad this session belongs to
    squad_id: SquadId,
    /// Operatives registered to the squad
    roster: Roster,
    /// The squad's shared stage pointer
    stage: StageState,
    /// Puzzle configuration used when the squad enters the jammer stage
    jammer_config: JammerConfig,
    /// The live puzzle instance, present only on the jammer stage
    jammer: Option<JammerInstance>,
}

impl SquadSession {
    /// Creates a session for a freshly formed squad, resting in the lobby
    ///
    /// The configuration is validated later, when the squad actually enters
    /// the jammer stage and the instance is created against the squad size
    /// at that moment.
    pub fn new(squad_id: SquadId, jammer_config: JammerConfig) -> Self {
        Self {
            squad_id,
            roster: Roster::new(),
            stage: StageState::new(),
            jammer_config,
            jammer: None,
        }
    }

    /// The squad this session belongs to
    pub fn squad_id(&self) -> SquadId {
        self.squad_id
    }

    /// The stage the squad is currently on
    ///
    /// Read access for the surrounding session layer, which uses it to
    /// resynchronize operatives on reconnect.
    pub fn current_stage(&self) -> Stage {
        self.stage.current()
    }

    /// Registers an operative with the squad
    ///
    /// # Errors
    ///
    /// Returns [`roster::Error::SquadFull`] when the squad is at capacity.
    pub fn add_member(&mut self, member: Id) -> Result<(), roster::Error> {
        self.roster.add_member(member)
    }

    /// Deregisters an operative and closes their tunnel if one is live
    ///
    /// After removal the operative receives no further broadcasts; callers
    /// must pair every registration with a removal on disconnect or view
    /// teardown so a departed operative cannot act on a later transition.
    pub fn remove_member<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &mut self,
        member: Id,
        tunnel_finder: F,
    ) {
        if self.roster.remove_member(member) {
            Roster::close_session(member, tunnel_finder);
        }
    }

    /// Number of operatives registered to the squad
    pub fn member_count(&self) -> usize {
        self.roster.member_count()
    }

    /// Moves the squad to `next` and broadcasts the transition
    ///
    /// Monotonic: a duplicate or backward target is a logged no-op
    /// returning `Ok(false)`. When the move takes effect, the stage pointer
    /// mutation, the puzzle-instance lifecycle step, and the single
    /// [`UpdateMessage::ViewChange`] broadcast to every connected operative
    /// (the triggering one included) all happen inside this exclusive
    /// region.
    ///
    /// Entering [`Stage::SignalJammer`] creates the puzzle instance;
    /// advancing past it drops the instance.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the move would enter the jammer stage
    /// and the configuration cannot serve the current squad; the stage
    /// pointer is left untouched and nothing is broadcast.
    pub fn advance_squad<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &mut self,
        next: Stage,
        tunnel_finder: F,
    ) -> Result<bool, ConfigError> {
        if next <= self.stage.current() {
            log::warn!(
                "squad {}: ignored non-advancing transition to {next:?}",
                self.squad_id
            );
            return Ok(false);
        }

        // Validate before mutating: a bad jammer configuration must keep
        // the squad off that stage entirely.
        let jammer = if next == Stage::SignalJammer {
            Some(JammerInstance::new(
                self.jammer_config.clone(),
                self.roster.member_count(),
            )?)
        } else {
            None
        };

        let advanced = self.stage.advance(next);
        debug_assert!(advanced, "strictly-ahead target must advance");
        self.jammer = jammer;

        log::info!("squad {} advanced to {next:?}", self.squad_id);
        self.roster
            .announce(&UpdateMessage::ViewChange { view: next }.into(), tunnel_finder);

        Ok(true)
    }

    /// Routes one incoming operative message
    ///
    /// Messages from IDs not on the roster are dropped. Failure verdicts
    /// go back to the submitting operative only; a winning guess advances
    /// the whole squad before this method returns.
    pub fn receive_message<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &mut self,
        member: Id,
        message: IncomingMessage,
        tunnel_finder: F,
    ) {
        if !self.roster.contains(member) {
            return;
        }

        match message {
            IncomingMessage::RequestClue => {
                let clue = match self.jammer.as_mut() {
                    Some(jammer) => jammer.clue_for(member).map(str::to_owned),
                    None => {
                        log::warn!(
                            "squad {}: clue requested outside the jammer stage",
                            self.squad_id
                        );
                        None
                    }
                };
                self.roster.send_message(
                    &jammer::UpdateMessage::ClueReveal { clue }.into(),
                    member,
                    tunnel_finder,
                );
            }
            IncomingMessage::JammerGuess { symbol_index } => {
                let Some(jammer) = self.jammer.as_mut() else {
                    // No live instance: the puzzle is over (or never began),
                    // so the guess is a no-op failure.
                    self.roster.send_message(
                        &jammer::UpdateMessage::GuessOutcome { success: false }.into(),
                        member,
                        tunnel_finder,
                    );
                    return;
                };

                let outcome = jammer.submit_guess(member, symbol_index);
                let advance_to = jammer.advance_to();

                self.roster.send_message(
                    &jammer::UpdateMessage::GuessOutcome {
                        success: outcome.is_success(),
                    }
                    .into(),
                    member,
                    &tunnel_finder,
                );

                if outcome.is_success() {
                    // Solved and advanced in the same exclusive region; the
                    // broadcast is the squad's single source of truth for
                    // the transition.
                    if let Err(e) = self.advance_squad(advance_to, &tunnel_finder) {
                        log::error!("squad {}: advance after solve failed: {e}", self.squad_id);
                    }
                }
            }
            IncomingMessage::SquadAdvance { to } => {
                let solved_and_matching = self
                    .jammer
                    .as_ref()
                    .is_some_and(|j| j.is_solved() && j.advance_to() == to);

                if solved_and_matching {
                    if let Err(e) = self.advance_squad(to, &tunnel_finder) {
                        log::error!("squad {}: requested advance failed: {e}", self.squad_id);
                    }
                } else {
                    // Normal case after a guess-time advance: the solver's
                    // deferred request arrives once the instance is gone.
                    log::debug!(
                        "squad {}: ignored advance request to {to:?} from {member}",
                        self.squad_id
                    );
                }
            }
        }
    }

    /// Resynchronizes a connecting or reconnecting operative
    ///
    /// Sends the current stage as a state snapshot and, while the jammer
    /// instance is live, the operative's committed clue (committed now if
    /// they never fetched one) together with the solved flag. An operative
    /// who reconnects after the squad moved on receives the current stage,
    /// not a replay of the missed transition.
    pub fn sync_member<T: Tunnel, F: Fn(Id) -> Option<T>>(&mut self, member: Id, tunnel_finder: F) {
        if !self.roster.contains(member) {
            return;
        }

        self.roster.send_state(
            &SyncMessage::Stage {
                view: self.stage.current(),
            }
            .into(),
            member,
            &tunnel_finder,
        );

        if let Some(jammer) = self.jammer.as_mut() {
            let clue = jammer.clue_for(member).map(str::to_owned);
            let solved = jammer.is_solved();
            self.roster.send_state(
                &jammer::SyncMessage::Status { clue, solved }.into(),
                member,
                tunnel_finder,
            );
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use itertools::Itertools;
    use std::{
        collections::HashMap,
        sync::{Arc, Mutex},
        time::Duration,
    };

    #[derive(Debug, Clone, Default)]
    struct MockTunnel {
        messages: Arc<Mutex<Vec<crate::UpdateMessage>>>,
        states: Arc<Mutex<Vec<crate::SyncMessage>>>,
    }

    impl MockTunnel {
        fn view_changes(&self) -> Vec<Stage> {
            self.messages
                .lock()
                .unwrap()
                .iter()
                .filter_map(|m| match m {
                    crate::UpdateMessage::Squad(UpdateMessage::ViewChange { view }) => Some(*view),
                    crate::UpdateMessage::Jammer(_) => None,
                })
                .collect_vec()
        }

        fn guess_outcomes(&self) -> Vec<bool> {
            self.messages
                .lock()
                .unwrap()
                .iter()
                .filter_map(|m| match m {
                    crate::UpdateMessage::Jammer(jammer::UpdateMessage::GuessOutcome {
                        success,
                    }) => Some(*success),
                    _ => None,
                })
                .collect_vec()
        }

        fn clues(&self) -> Vec<Option<String>> {
            self.messages
                .lock()
                .unwrap()
                .iter()
                .filter_map(|m| match m {
                    crate::UpdateMessage::Jammer(jammer::UpdateMessage::ClueReveal { clue }) => {
                        Some(clue.clone())
                    }
                    _ => None,
                })
                .collect_vec()
        }
    }

    impl Tunnel for MockTunnel {
        fn send_message(&self, message: &crate::UpdateMessage) {
            self.messages.lock().unwrap().push(message.clone());
        }

        fn send_state(&self, message: &crate::SyncMessage) {
            self.states.lock().unwrap().push(message.clone());
        }

        fn close(self) {}
    }

    struct Rig {
        session: SquadSession,
        members: Vec<Id>,
        tunnels: HashMap<Id, MockTunnel>,
    }

    impl Rig {
        /// Squad of `n` on the jammer stage with a pool of `n` clues.
        fn on_jammer(n: usize) -> Self {
            let config = JammerConfig {
                symbol_count: 9,
                solution: 4,
                clue_pool: (0..n).map(|i| format!("intel fragment {i}")).collect(),
                feedback_delay: Duration::from_millis(1500),
                advance_to: Stage::Tumbler,
            };

            let mut session = SquadSession::new(SquadId::new(), config);
            let members = (0..n).map(|_| Id::new()).collect_vec();
            let tunnels: HashMap<Id, MockTunnel> = members
                .iter()
                .map(|m| (*m, MockTunnel::default()))
                .collect();

            for member in &members {
                session.add_member(*member).unwrap();
            }

            {
                let finder = Self::finder_of(&tunnels);
                session.advance_squad(Stage::SignalJammer, &finder).unwrap();
            }

            // Discard the ViewChange from entering the stage so tests
            // observe only what happens during the puzzle.
            for tunnel in tunnels.values() {
                tunnel.messages.lock().unwrap().clear();
            }

            Self {
                session,
                members,
                tunnels,
            }
        }

        fn finder_of(
            tunnels: &HashMap<Id, MockTunnel>,
        ) -> impl Fn(Id) -> Option<MockTunnel> + '_ {
            move |id| tunnels.get(&id).cloned()
        }
    }

    #[test]
    fn test_correct_guess_broadcasts_one_view_change_to_everyone() {
        let mut rig = Rig::on_jammer(3);
        let [a, b, c] = [rig.members[0], rig.members[1], rig.members[2]];

        let finder = Rig::finder_of(&rig.tunnels);
        rig.session
            .receive_message(a, IncomingMessage::JammerGuess { symbol_index: 4 }, &finder);

        // The solver saw success, then everyone (solver included) got
        // exactly one transition to the same next stage.
        assert_eq!(rig.tunnels[&a].guess_outcomes(), vec![true]);
        for member in [a, b, c] {
            assert_eq!(rig.tunnels[&member].view_changes(), vec![Stage::Tumbler]);
        }
        assert_eq!(rig.session.current_stage(), Stage::Tumbler);

        // A later guess against the same instance fails quietly for the
        // submitter and moves nobody.
        rig.session
            .receive_message(b, IncomingMessage::JammerGuess { symbol_index: 4 }, &finder);
        assert_eq!(rig.tunnels[&b].guess_outcomes(), vec![false]);
        for member in [a, b, c] {
            assert_eq!(rig.tunnels[&member].view_changes(), vec![Stage::Tumbler]);
        }
    }

    #[test]
    fn test_wrong_guess_answers_submitter_only() {
        let mut rig = Rig::on_jammer(2);
        let [a, b] = [rig.members[0], rig.members[1]];

        let finder = Rig::finder_of(&rig.tunnels);
        rig.session
            .receive_message(a, IncomingMessage::JammerGuess { symbol_index: 2 }, &finder);

        assert_eq!(rig.tunnels[&a].guess_outcomes(), vec![false]);
        assert!(rig.tunnels[&b].messages.lock().unwrap().is_empty());
        assert_eq!(rig.session.current_stage(), Stage::SignalJammer);
    }

    #[test]
    fn test_clues_are_unique_and_refetch_is_stable() {
        let mut rig = Rig::on_jammer(3);
        let finder = Rig::finder_of(&rig.tunnels);

        for member in rig.members.clone() {
            rig.session
                .receive_message(member, IncomingMessage::RequestClue, &finder);
            rig.session
                .receive_message(member, IncomingMessage::RequestClue, &finder);
        }

        let mut seen = Vec::new();
        for member in &rig.members {
            let clues = rig.tunnels[member].clues();
            assert_eq!(clues.len(), 2);
            assert_eq!(clues[0], clues[1]);
            seen.push(clues[0].clone().unwrap());
        }
        assert!(seen.iter().all_unique());
    }

    #[test]
    fn test_deferred_advance_request_is_a_noop_after_solve() {
        let mut rig = Rig::on_jammer(2);
        let a = rig.members[0];

        let finder = Rig::finder_of(&rig.tunnels);
        rig.session
            .receive_message(a, IncomingMessage::JammerGuess { symbol_index: 4 }, &finder);
        assert_eq!(rig.session.current_stage(), Stage::Tumbler);

        // The solver's feedback-delayed request arrives afterwards.
        rig.session
            .receive_message(a, IncomingMessage::SquadAdvance { to: Stage::Tumbler }, &finder);

        for member in &rig.members {
            assert_eq!(rig.tunnels[member].view_changes(), vec![Stage::Tumbler]);
        }
    }

    #[test]
    fn test_advance_request_ignored_while_unsolved() {
        let mut rig = Rig::on_jammer(2);
        let a = rig.members[0];

        let finder = Rig::finder_of(&rig.tunnels);
        rig.session
            .receive_message(a, IncomingMessage::SquadAdvance { to: Stage::Tumbler }, &finder);

        assert_eq!(rig.session.current_stage(), Stage::SignalJammer);
        for member in &rig.members {
            assert!(rig.tunnels[member].view_changes().is_empty());
        }
    }

    #[test]
    fn test_removed_member_receives_no_broadcast() {
        let mut rig = Rig::on_jammer(3);
        let [a, departed] = [rig.members[0], rig.members[2]];

        let finder = Rig::finder_of(&rig.tunnels);
        rig.session.remove_member(departed, &finder);
        rig.session
            .receive_message(a, IncomingMessage::JammerGuess { symbol_index: 4 }, &finder);

        assert!(rig.tunnels[&departed].view_changes().is_empty());
        assert_eq!(rig.tunnels[&a].view_changes(), vec![Stage::Tumbler]);
    }

    #[test]
    fn test_messages_from_strangers_are_dropped() {
        let mut rig = Rig::on_jammer(2);
        let stranger = Id::new();
        let stranger_tunnel = MockTunnel::default();

        let mut tunnels = rig.tunnels.clone();
        tunnels.insert(stranger, stranger_tunnel.clone());
        let finder = Rig::finder_of(&tunnels);

        rig.session.receive_message(
            stranger,
            IncomingMessage::JammerGuess { symbol_index: 4 },
            &finder,
        );

        assert!(stranger_tunnel.messages.lock().unwrap().is_empty());
        assert_eq!(rig.session.current_stage(), Stage::SignalJammer);
    }

    #[test]
    fn test_pool_smaller_than_squad_blocks_the_stage() {
        let config = JammerConfig {
            symbol_count: 9,
            solution: 4,
            clue_pool: vec!["only clue".to_string()],
            feedback_delay: Duration::from_millis(1500),
            advance_to: Stage::Tumbler,
        };

        let mut session = SquadSession::new(SquadId::new(), config);
        let members = [Id::new(), Id::new()];
        let tunnels: HashMap<Id, MockTunnel> = members
            .iter()
            .map(|m| (*m, MockTunnel::default()))
            .collect();
        for member in members {
            session.add_member(member).unwrap();
        }

        let finder = Rig::finder_of(&tunnels);
        let result = session.advance_squad(Stage::SignalJammer, &finder);

        assert!(matches!(result, Err(ConfigError::PoolTooSmall { .. })));
        assert_eq!(session.current_stage(), Stage::Lobby);
        for member in members {
            assert!(tunnels[&member].view_changes().is_empty());
        }
    }

    #[test]
    fn test_guess_without_live_instance_fails_quietly() {
        let config = JammerConfig {
            symbol_count: 9,
            solution: 4,
            clue_pool: vec!["clue".to_string()],
            feedback_delay: Duration::from_millis(1500),
            advance_to: Stage::Tumbler,
        };

        let mut session = SquadSession::new(SquadId::new(), config);
        let member = Id::new();
        let tunnel = MockTunnel::default();
        session.add_member(member).unwrap();

        let tunnels: HashMap<Id, MockTunnel> = [(member, tunnel.clone())].into();
        let finder = Rig::finder_of(&tunnels);

        session.receive_message(
            member,
            IncomingMessage::JammerGuess { symbol_index: 4 },
            &finder,
        );

        assert_eq!(tunnel.guess_outcomes(), vec![false]);
        assert_eq!(session.current_stage(), Stage::Lobby);
        assert_eq!(session.member_count(), 1);
        assert_eq!(session.squad_id().to_string().len(), 5);
    }

    #[test]
    fn test_sync_member_sends_current_stage_and_puzzle_status() {
        let mut rig = Rig::on_jammer(2);
        let [a, b] = [rig.members[0], rig.members[1]];

        let finder = Rig::finder_of(&rig.tunnels);
        rig.session.sync_member(a, &finder);

        let states = rig.tunnels[&a].states.lock().unwrap().clone();
        assert_eq!(states.len(), 2);
        assert!(matches!(
            states[0],
            crate::SyncMessage::Squad(SyncMessage::Stage {
                view: Stage::SignalJammer
            })
        ));
        assert!(matches!(
            &states[1],
            crate::SyncMessage::Jammer(jammer::SyncMessage::Status {
                clue: Some(_),
                solved: false,
            })
        ));

        // After the squad moves on there is no puzzle status to report.
        rig.session
            .receive_message(b, IncomingMessage::JammerGuess { symbol_index: 4 }, &finder);
        rig.session.sync_member(a, &finder);

        let states = rig.tunnels[&a].states.lock().unwrap().clone();
        assert_eq!(states.len(), 3);
        assert!(matches!(
            states[2],
            crate::SyncMessage::Squad(SyncMessage::Stage {
                view: Stage::Tumbler
            })
        ));
    }

    #[test]
    fn test_sync_clue_matches_earlier_fetch() {
        let mut rig = Rig::on_jammer(2);
        let a = rig.members[0];

        let finder = Rig::finder_of(&rig.tunnels);
        rig.session
            .receive_message(a, IncomingMessage::RequestClue, &finder);
        rig.session.sync_member(a, &finder);

        let fetched = rig.tunnels[&a].clues()[0].clone().unwrap();
        let states = rig.tunnels[&a].states.lock().unwrap().clone();
        let synced = states
            .iter()
            .find_map(|s| match s {
                crate::SyncMessage::Jammer(jammer::SyncMessage::Status { clue, .. }) => {
                    clue.clone()
                }
                crate::SyncMessage::Squad(_) => None,
            })
            .unwrap();

        assert_eq!(fetched, synced);
    }
}
