//! Drives a [`Game`] for a user interface.
//!
//! The session turns UI input (`specify_coordinate`, `change_player_kind`,
//! `reset`, `confirm_pass`) into game transitions, saves after each one and
//! reports the outcome to a [`GameObserver`]. Computer players think on
//! background threads; their results are applied on the caller's thread
//! through [`GameSession::poll`] or [`GameSession::wait_for_computer`].

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::ai::{ComputerPlayer, OperationResult, ThinkTask};
use crate::config::SessionConfig;
use crate::error::GameError;
use crate::game::{Game, TurnAdvance};
use crate::persistence::{self, GameRepository};
use crate::types::{Coordinate, DiscCount, GameSnapshot, Message, PlayerKind, Side};

/// Presentation callbacks. Every method defaults to doing nothing.
pub trait GameObserver {
    /// The whole game was replaced (start, load or reset).
    fn game_reloaded(&mut self, _snapshot: &GameSnapshot) {}

    fn message_changed(&mut self, _message: Message) {}

    fn disc_count_changed(&mut self, _count: DiscCount) {}

    /// `coordinates` now hold `side`: the placed cell first, then captures.
    fn discs_changed(&mut self, _side: Side, _coordinates: &[Coordinate]) {}

    /// `side` had no placement and was skipped. The session waits for
    /// [`GameSession::confirm_pass`] before the game goes on.
    fn passed(&mut self, _side: Side) {}

    fn thinking_started(&mut self, _side: Side) {}

    fn thinking_stopped(&mut self, _side: Side) {}
}

impl GameObserver for () {}

/// One running [`ThinkTask`] per side at most.
#[derive(Debug, Default)]
pub struct ThinkSlots {
    slots: Mutex<[Option<ThinkTask>; 2]>,
}

impl ThinkSlots {
    fn lock(&self) -> MutexGuard<'_, [Option<ThinkTask>; 2]> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores `task` for its side and returns the task it replaced, already
    /// cancelled.
    pub fn replace(&self, task: ThinkTask) -> Option<ThinkTask> {
        let index = task.side().index();
        let previous = self.lock()[index].replace(task);
        previous.inspect(ThinkTask::cancel)
    }

    /// Cancels and forgets the task of `side`. Returns whether there was one.
    pub fn cancel(&self, side: Side) -> bool {
        let task = self.lock()[side.index()].take();
        task.inspect(ThinkTask::cancel).is_some()
    }

    /// Cancels every task and returns the sides that were thinking.
    pub fn cancel_all(&self) -> Vec<Side> {
        Side::BOTH
            .into_iter()
            .filter(|&side| self.cancel(side))
            .collect()
    }

    pub fn is_thinking(&self, side: Side) -> bool {
        self.lock()[side.index()].is_some()
    }

    /// Removes and returns the results of every finished task.
    pub fn take_finished(&self) -> Vec<(Side, OperationResult)> {
        let mut slots = self.lock();
        let mut finished = Vec::new();
        for slot in slots.iter_mut() {
            let Some(result) = slot.as_ref().and_then(ThinkTask::try_result) else {
                continue;
            };
            if let Some(task) = slot.take() {
                finished.push((task.side(), result));
            }
        }
        finished
    }

    /// Blocks up to `timeout` for the task of `side`. The task stays in its
    /// slot if it is still thinking.
    pub fn wait(&self, side: Side, timeout: Duration) -> Option<OperationResult> {
        let task = self.lock()[side.index()].take()?;
        if let Some(result) = task.wait_timeout(timeout) {
            return Some(result);
        }

        let mut slots = self.lock();
        if slots[side.index()].is_none() {
            slots[side.index()] = Some(task);
        }
        None
    }
}

pub struct GameSession<R, O> {
    game: Game,
    repository: R,
    observer: O,
    computer: ComputerPlayer,
    slots: ThinkSlots,
    pending_pass: Option<Side>,
}

impl<R, O> GameSession<R, O>
where
    R: GameRepository,
    O: GameObserver,
{
    /// Session with a random computer player thinking for
    /// `config.think_delay()`.
    pub fn new(config: &SessionConfig, repository: R, observer: O) -> Self {
        Self::with_computer(
            ComputerPlayer::with_random_selector(config.think_delay()),
            repository,
            observer,
        )
    }

    pub fn with_computer(computer: ComputerPlayer, repository: R, observer: O) -> Self {
        Self {
            game: Game::new(),
            repository,
            observer,
            computer,
            slots: ThinkSlots::default(),
            pending_pass: None,
        }
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    /// The side waiting for [`GameSession::confirm_pass`], if any.
    pub fn pending_pass(&self) -> Option<Side> {
        self.pending_pass
    }

    pub fn is_thinking(&self, side: Side) -> bool {
        self.slots.is_thinking(side)
    }

    /// Loads the saved game (a fresh one if loading fails), publishes it and
    /// lets the side to move play.
    pub fn start(&mut self) {
        self.stop_all_thinking();
        self.game = persistence::load_or_new(&self.repository);
        self.pending_pass = None;
        info!(turn = ?self.game.turn(), "session started");
        self.reload();
        self.wait_for_player();
    }

    /// Throws the current game away and starts a new one.
    pub fn reset(&mut self) {
        self.stop_all_thinking();
        self.game = self.game.reset();
        self.pending_pass = None;
        info!("game reset");
        self.save();
        self.reload();
        self.wait_for_player();
    }

    /// A manual player picked a cell. Ignored when it is not a manual
    /// player's turn or a pass is waiting to be confirmed.
    pub fn specify_coordinate(&mut self, x: i32, y: i32) -> Result<(), GameError> {
        let Some(side) = self.game.turn() else {
            return Ok(());
        };
        if self.pending_pass.is_some() || self.game.players().kind(side) != PlayerKind::Manual {
            debug!(%side, x, y, "ignoring coordinate");
            return Ok(());
        }
        self.apply_placement(side, Coordinate::new(x, y))
    }

    pub fn change_player_kind(&mut self, side: Side, kind: PlayerKind) {
        self.game = self.game.change_player(side, kind);
        self.save();
        self.stop_thinking(side);
        if self.game.turn() == Some(side) && self.pending_pass.is_none() {
            self.wait_for_player();
        }
    }

    /// The user acknowledged a pass; the side to move plays.
    pub fn confirm_pass(&mut self) {
        if self.pending_pass.take().is_some() {
            self.wait_for_player();
        }
    }

    /// Applies the results of finished computer players. Returns how many
    /// results were handled.
    pub fn poll(&mut self) -> usize {
        let finished = self.slots.take_finished();
        let handled = finished.len();
        for (side, result) in finished {
            self.apply_result(side, result);
        }
        handled
    }

    /// Blocks up to `timeout` for the computer player whose turn it is and
    /// applies its result.
    pub fn wait_for_computer(&mut self, timeout: Duration) -> Option<OperationResult> {
        let side = self.game.turn()?;
        let result = self.slots.wait(side, timeout)?;
        self.apply_result(side, result);
        Some(result)
    }

    fn apply_result(&mut self, side: Side, result: OperationResult) {
        self.observer.thinking_stopped(side);
        if self.game.turn() != Some(side) {
            debug!(%side, ?result, "discarding stale computer result");
            return;
        }

        match result {
            OperationResult::Coordinate(coordinate) => {
                if let Err(err) = self.apply_placement(side, coordinate) {
                    warn!(%err, "computer chose an unplaceable coordinate");
                }
            }
            OperationResult::Pass => self.next_turn(),
            OperationResult::Cancelled => {}
        }
    }

    fn apply_placement(&mut self, side: Side, coordinate: Coordinate) -> Result<(), GameError> {
        let placement = self.game.place(side, coordinate)?;
        self.game = placement.game;
        self.observer.discs_changed(side, &placement.changed);
        self.observer.disc_count_changed(self.game.disc_count());
        self.next_turn();
        Ok(())
    }

    fn next_turn(&mut self) {
        let (game, advance) = self.game.advance_turn();
        self.game = game;
        self.save();
        self.observer.message_changed(self.game.message());

        match advance {
            TurnAdvance::Continue(_) => self.wait_for_player(),
            TurnAdvance::Passed { passed, .. } => {
                self.pending_pass = Some(passed);
                self.observer.passed(passed);
            }
            TurnAdvance::GameOver { winner } => info!(?winner, "game over"),
        }
    }

    /// Starts the computer player when it is its turn; manual players are
    /// simply waited for.
    fn wait_for_player(&mut self) {
        let Some(side) = self.game.turn() else {
            return;
        };
        if self.game.players().kind(side) != PlayerKind::Computer {
            return;
        }

        self.stop_thinking(side);
        let task = self.computer.start(self.game.board().clone(), side);
        let _ = self.slots.replace(task);
        self.observer.thinking_started(side);
    }

    fn stop_thinking(&mut self, side: Side) {
        if self.slots.cancel(side) {
            self.observer.thinking_stopped(side);
        }
    }

    fn stop_all_thinking(&mut self) {
        for side in self.slots.cancel_all() {
            self.observer.thinking_stopped(side);
        }
    }

    fn reload(&mut self) {
        self.observer.game_reloaded(&self.game.snapshot());
        self.observer.message_changed(self.game.message());
        self.observer.disc_count_changed(self.game.disc_count());
    }

    fn save(&self) {
        if let Err(err) = persistence::save(&self.repository, &self.game) {
            warn!(%err, "failed to save game");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::ai::FirstPlaceableSelector;
    use crate::board::Board;
    use crate::game::Players;
    use crate::persistence::MemoryRepository;

    const WAIT: Duration = Duration::from_secs(5);

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Reloaded(GameSnapshot),
        Message(Message),
        Count(DiscCount),
        Discs(Side, Vec<Coordinate>),
        Passed(Side),
        ThinkingStarted(Side),
        ThinkingStopped(Side),
    }

    #[derive(Debug, Default)]
    struct Recorder {
        events: Vec<Event>,
    }

    impl Recorder {
        fn take(&mut self) -> Vec<Event> {
            std::mem::take(&mut self.events)
        }
    }

    impl GameObserver for Recorder {
        fn game_reloaded(&mut self, snapshot: &GameSnapshot) {
            self.events.push(Event::Reloaded(snapshot.clone()));
        }

        fn message_changed(&mut self, message: Message) {
            self.events.push(Event::Message(message));
        }

        fn disc_count_changed(&mut self, count: DiscCount) {
            self.events.push(Event::Count(count));
        }

        fn discs_changed(&mut self, side: Side, coordinates: &[Coordinate]) {
            self.events.push(Event::Discs(side, coordinates.to_vec()));
        }

        fn passed(&mut self, side: Side) {
            self.events.push(Event::Passed(side));
        }

        fn thinking_started(&mut self, side: Side) {
            self.events.push(Event::ThinkingStarted(side));
        }

        fn thinking_stopped(&mut self, side: Side) {
            self.events.push(Event::ThinkingStopped(side));
        }
    }

    fn c(x: i32, y: i32) -> Coordinate {
        Coordinate::new(x, y)
    }

    fn turn_message(side: Side) -> Event {
        Event::Message(Message {
            side: Some(side),
            label: "'s turn",
        })
    }

    fn session_with(
        think_delay: Duration,
        repository: MemoryRepository,
    ) -> GameSession<MemoryRepository, Recorder> {
        let computer = ComputerPlayer::new(Arc::new(FirstPlaceableSelector), think_delay);
        let mut session = GameSession::with_computer(computer, repository, Recorder::default());
        session.start();
        session
    }

    fn started_session() -> GameSession<MemoryRepository, Recorder> {
        session_with(Duration::ZERO, MemoryRepository::new())
    }

    fn saved(game: &Game) -> MemoryRepository {
        MemoryRepository::with_data(persistence::encode(game).unwrap())
    }

    #[test]
    fn start_without_save_publishes_a_new_game() {
        let mut session = started_session();

        assert_eq!(session.game(), &Game::new());
        assert_eq!(
            session.observer_mut().take(),
            vec![
                Event::Reloaded(Game::new().snapshot()),
                turn_message(Side::Dark),
                Event::Count(DiscCount { dark: 2, light: 2 }),
            ]
        );
    }

    #[test]
    fn start_restores_the_saved_game() {
        let game = Game::new()
            .place(Side::Dark, c(3, 2))
            .unwrap()
            .game
            .change_turn(Some(Side::Light));

        let session = session_with(Duration::ZERO, saved(&game));

        assert_eq!(session.game(), &game);
    }

    #[test]
    fn manual_placement_flips_saves_and_hands_over() {
        let mut session = started_session();
        session.observer_mut().take();

        session.specify_coordinate(3, 2).unwrap();

        assert_eq!(
            session.observer_mut().take(),
            vec![
                Event::Discs(Side::Dark, vec![c(3, 2), c(3, 3)]),
                Event::Count(DiscCount { dark: 4, light: 1 }),
                turn_message(Side::Light),
            ]
        );
        let stored = persistence::load(session.repository()).unwrap();
        assert_eq!(stored.turn(), Some(Side::Light));
        assert_eq!(&stored, session.game());
    }

    #[test]
    fn illegal_placement_is_rejected_without_changes() {
        let mut session = started_session();
        session.observer_mut().take();

        let result = session.specify_coordinate(0, 0);

        assert_eq!(
            result,
            Err(GameError::PlacementRejected {
                side: Side::Dark,
                coordinate: c(0, 0)
            })
        );
        assert_eq!(session.game(), &Game::new());
        assert!(session.observer().events.is_empty());
    }

    #[test]
    fn computer_answers_after_manual_move() {
        let mut session = started_session();
        session.change_player_kind(Side::Light, PlayerKind::Computer);
        session.specify_coordinate(3, 2).unwrap();
        assert!(session.is_thinking(Side::Light));

        let result = session.wait_for_computer(WAIT);

        assert_eq!(result, Some(OperationResult::Coordinate(c(2, 2))));
        assert_eq!(session.game().turn(), Some(Side::Dark));
        assert_eq!(session.game().board().disc_at(c(2, 2)), Some(Side::Light));
        assert!(!session.is_thinking(Side::Light));

        let events = session.observer_mut().take();
        let tail = &events[events.len() - 5..];
        assert_eq!(
            tail,
            &[
                Event::ThinkingStarted(Side::Light),
                Event::ThinkingStopped(Side::Light),
                Event::Discs(Side::Light, vec![c(2, 2), c(3, 3)]),
                Event::Count(DiscCount { dark: 3, light: 3 }),
                turn_message(Side::Dark),
            ]
        );
    }

    #[test]
    fn coordinates_are_ignored_on_a_computer_turn() {
        let mut session = session_with(Duration::from_secs(10), MemoryRepository::new());
        session.change_player_kind(Side::Dark, PlayerKind::Computer);

        session.specify_coordinate(3, 2).unwrap();

        assert_eq!(session.game().board(), &Board::new());
        assert!(session.is_thinking(Side::Dark));
    }

    #[test]
    fn poll_applies_finished_results() {
        let mut session = started_session();
        session.change_player_kind(Side::Dark, PlayerKind::Computer);

        let deadline = std::time::Instant::now() + WAIT;
        while session.poll() == 0 {
            assert!(std::time::Instant::now() < deadline, "computer never finished");
            thread::sleep(Duration::from_millis(5));
        }

        assert_eq!(session.game().turn(), Some(Side::Light));
        assert_eq!(session.game().board().disc_at(c(3, 2)), Some(Side::Dark));
    }

    #[test]
    fn switching_back_to_manual_cancels_thinking() {
        let mut session = session_with(Duration::from_secs(10), MemoryRepository::new());
        session.change_player_kind(Side::Dark, PlayerKind::Computer);
        session.observer_mut().take();

        session.change_player_kind(Side::Dark, PlayerKind::Manual);

        assert!(!session.is_thinking(Side::Dark));
        assert_eq!(
            session.observer_mut().take(),
            vec![Event::ThinkingStopped(Side::Dark)]
        );
        assert_eq!(session.poll(), 0);
        assert_eq!(session.wait_for_computer(Duration::from_millis(10)), None);
        assert_eq!(session.game().board(), &Board::new());
        assert_eq!(
            session.game().players(),
            Players::new(PlayerKind::Manual, PlayerKind::Manual)
        );
    }

    #[test]
    fn changing_one_player_keeps_the_other_and_is_saved() {
        let mut session = started_session();

        session.change_player_kind(Side::Light, PlayerKind::Computer);

        let stored = persistence::load(session.repository()).unwrap();
        assert_eq!(
            stored.players(),
            Players::new(PlayerKind::Manual, PlayerKind::Computer)
        );
        assert!(!session.is_thinking(Side::Light));
    }

    #[test]
    fn pass_waits_for_confirmation() {
        let board: Board = "
            ------ox
            --------
            ------ox
            --------
            --------
            --------
            --------
            --------
        "
        .parse()
        .unwrap();
        let game = Game::from_parts(Some(Side::Dark), Players::default(), board);
        let mut session = session_with(Duration::ZERO, saved(&game));
        session.observer_mut().take();

        session.specify_coordinate(5, 0).unwrap();

        assert_eq!(session.pending_pass(), Some(Side::Light));
        assert_eq!(session.game().turn(), Some(Side::Dark));
        let events = session.observer_mut().take();
        assert_eq!(events.last(), Some(&Event::Passed(Side::Light)));

        session.specify_coordinate(5, 2).unwrap();
        assert_eq!(session.game().board().disc_at(c(5, 2)), None);

        session.confirm_pass();
        session.specify_coordinate(5, 2).unwrap();

        assert_eq!(session.pending_pass(), None);
        assert_eq!(session.game().turn(), None);
        assert_eq!(
            session.game().message(),
            Message {
                side: Some(Side::Dark),
                label: " won"
            }
        );
    }

    #[test]
    fn reset_cancels_thinking_and_starts_over() {
        let mut session = session_with(Duration::from_secs(10), MemoryRepository::new());
        session.specify_coordinate(3, 2).unwrap();
        session.change_player_kind(Side::Light, PlayerKind::Computer);
        assert!(session.is_thinking(Side::Light));
        session.observer_mut().take();

        session.reset();

        assert!(!session.is_thinking(Side::Light));
        assert_eq!(session.game(), &Game::new());
        assert_eq!(
            session.observer_mut().take(),
            vec![
                Event::ThinkingStopped(Side::Light),
                Event::Reloaded(Game::new().snapshot()),
                turn_message(Side::Dark),
                Event::Count(DiscCount { dark: 2, light: 2 }),
            ]
        );
        assert_eq!(persistence::load(session.repository()).unwrap(), Game::new());
    }

    #[test]
    fn unreadable_save_starts_a_new_game() {
        let session = session_with(Duration::ZERO, MemoryRepository::with_data("{\"turn\":"));

        assert_eq!(session.game(), &Game::new());
    }

    #[test]
    fn think_slots_replace_cancels_previous_task() {
        let computer =
            ComputerPlayer::new(Arc::new(FirstPlaceableSelector), Duration::from_secs(10));
        let slots = ThinkSlots::default();

        assert!(slots.replace(computer.start(Board::new(), Side::Dark)).is_none());
        let replaced = slots
            .replace(computer.start(Board::new(), Side::Dark))
            .expect("first task is replaced");

        assert!(replaced.is_cancelled());
        assert_eq!(replaced.wait_timeout(WAIT), Some(OperationResult::Cancelled));
        assert!(slots.is_thinking(Side::Dark));
        assert!(!slots.is_thinking(Side::Light));
        assert_eq!(slots.take_finished(), vec![]);
        assert_eq!(slots.cancel_all(), vec![Side::Dark]);
        assert!(!slots.is_thinking(Side::Dark));
    }

    #[test]
    fn result_for_the_side_not_to_move_is_discarded() {
        let mut session = started_session();
        session.observer_mut().take();
        let computer = ComputerPlayer::new(Arc::new(FirstPlaceableSelector), Duration::ZERO);
        let _ = session
            .slots
            .replace(computer.start(Board::new(), Side::Light));

        let deadline = std::time::Instant::now() + WAIT;
        while session.poll() == 0 {
            assert!(std::time::Instant::now() < deadline, "computer never finished");
            thread::sleep(Duration::from_millis(5));
        }

        assert_eq!(session.game(), &Game::new());
        assert_eq!(
            session.observer_mut().take(),
            vec![Event::ThinkingStopped(Side::Light)]
        );
    }

    #[test]
    fn cancelled_result_leaves_the_game_alone() {
        let mut session = started_session();
        session.observer_mut().take();

        session.apply_result(Side::Dark, OperationResult::Cancelled);

        assert_eq!(session.game(), &Game::new());
        assert_eq!(
            session.observer_mut().take(),
            vec![Event::ThinkingStopped(Side::Dark)]
        );
    }

    #[test]
    fn save_with_an_unplayable_turn_starts_a_new_game() {
        let board: Board = "
            ------ox
            --------
            --------
            --------
            --------
            --------
            --------
            --------
        "
        .parse()
        .unwrap();
        let stuck = Game::from_parts(Some(Side::Light), Players::default(), board);

        let mut session = session_with(Duration::ZERO, saved(&stuck));

        assert_eq!(session.game(), &Game::new());
        session.specify_coordinate(3, 2).unwrap();
        assert_eq!(session.game().turn(), Some(Side::Light));
    }
}
