use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Instant;

use log::{debug, info, trace};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::clock::{Clock, SystemClock};
use crate::countdown::{Countdown, TimerId, ROUND_SECONDS};
use crate::prompt::{sample_prompt, RoundPrompt};
use crate::session::{GameSession, GameStatus, GameSummary, GameView, RoundOutcome};

/// Points available for an instant correct press; each elapsed ms costs one
pub const HIT_BUDGET_MS: u64 = 1000;
pub const MISS_PENALTY: i64 = 100;
pub const TIMEOUT_PENALTY: i64 = 75;

pub const DEFAULT_TOTAL_ROUNDS: u32 = 20;
pub const ROUND_CHOICES: [u32; 4] = [10, 20, 30, 50];

/// Change notifications for subscribers of the engine
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineEvent {
    GameStarted { total_rounds: u32 },
    RoundDealt { round: u32, prompt: RoundPrompt },
    Scored { outcome: RoundOutcome, score: i64 },
    Finished { score: i64 },
    ReturnedToMenu,
}

/// Points awarded for a correct press after `reaction_ms`
pub fn hit_points(reaction_ms: u64) -> i64 {
    HIT_BUDGET_MS.saturating_sub(reaction_ms) as i64
}

/// Round/countdown/scoring state machine. Owns the session record and the
/// only countdown handle; all mutation goes through `&mut self`.
#[derive(Debug)]
pub struct RoundEngine<C: Clock = SystemClock, R: Rng = StdRng> {
    clock: C,
    rng: R,
    total_rounds: u32,
    session: GameSession,
    countdown: Countdown,
    subscribers: Vec<Sender<EngineEvent>>,
}

impl RoundEngine {
    pub fn new(total_rounds: u32) -> Self {
        Self::with_parts(SystemClock, StdRng::from_entropy(), total_rounds)
    }
}

impl<C: Clock, R: Rng> RoundEngine<C, R> {
    pub fn with_parts(clock: C, rng: R, total_rounds: u32) -> Self {
        Self {
            clock,
            rng,
            total_rounds,
            session: GameSession::default(),
            countdown: Countdown::new(),
            subscribers: Vec::new(),
        }
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn status(&self) -> GameStatus {
        self.session.status
    }

    pub fn total_rounds(&self) -> u32 {
        self.total_rounds
    }

    /// Change the round count for the next game. Refused while a game is
    /// running.
    pub fn set_total_rounds(&mut self, total_rounds: u32) -> bool {
        if self.session.status == GameStatus::Playing {
            return false;
        }
        self.total_rounds = total_rounds;
        true
    }

    pub fn subscribe(&mut self) -> Receiver<EngineEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn view(&self) -> GameView {
        let prompt = self.session.current_prompt;
        GameView {
            status: self.session.status,
            word: prompt.map(|p| p.word),
            required_key: prompt.map(|p| p.key),
            time_left: self.session.time_left,
            score: self.session.score,
            round_index: self.session.round_index,
            total_rounds: self.total_rounds,
            last_outcome: self.session.last_outcome,
        }
    }

    pub fn summary(&self) -> GameSummary {
        GameSummary::from_session(&self.session)
    }

    /// Id of the tick currently outstanding, if any
    pub fn pending_tick(&self) -> Option<TimerId> {
        self.countdown.pending()
    }

    pub fn next_tick_due(&self) -> Option<Instant> {
        self.countdown.next_due()
    }

    /// The live tick id if its deadline has passed on the engine's clock
    pub fn due_tick(&self) -> Option<TimerId> {
        self.countdown.due(self.clock.now())
    }

    /// Start (or restart) a game. Always succeeds.
    pub fn start_game(&mut self, total_rounds: u32) {
        self.countdown.cancel();
        self.total_rounds = total_rounds;
        self.session = GameSession {
            status: GameStatus::Playing,
            ..GameSession::default()
        };

        info!("starting game with {} rounds", total_rounds);
        self.notify(EngineEvent::GameStarted { total_rounds });

        self.advance_round();
    }

    /// Deal the next round, or finish the game once every round was dealt.
    /// Does nothing outside `Playing`.
    pub fn advance_round(&mut self) {
        if self.session.status != GameStatus::Playing {
            return;
        }

        self.countdown.cancel();

        if self.session.round_index >= self.total_rounds {
            self.session.status = GameStatus::Finished;
            self.session.current_prompt = None;
            self.session.round_started_at = None;

            let score = self.session.score;
            info!(
                "game finished after {} rounds with score {}",
                self.session.round_index, score
            );
            self.notify(EngineEvent::Finished { score });
            return;
        }

        let prompt = sample_prompt(&mut self.rng);
        let now = self.clock.now();

        self.session.current_prompt = Some(prompt);
        self.session.time_left = ROUND_SECONDS;
        self.session.round_index += 1;
        self.session.round_started_at = Some(now);
        self.countdown.schedule(now);

        let round = self.session.round_index;
        debug!("round {}: {} -> {}", round, prompt.word, prompt.key);
        self.notify(EngineEvent::RoundDealt { round, prompt });
    }

    /// Handle a raw key name. Ignored unless a game is running.
    pub fn on_key_press(&mut self, raw_key: &str) {
        if self.session.status != GameStatus::Playing {
            return;
        }
        let Some(prompt) = self.session.current_prompt else {
            return;
        };

        if prompt.matches(raw_key) {
            let now = self.clock.now();
            let reaction_ms = self
                .session
                .round_started_at
                .map(|started| now.saturating_duration_since(started).as_millis() as u64)
                .unwrap_or(0);

            self.apply(RoundOutcome::Hit {
                reaction_ms,
                points: hit_points(reaction_ms),
            });
            self.advance_round();
        } else {
            self.apply(RoundOutcome::Miss);
        }
    }

    /// Handle a countdown tick. Ticks whose id is not the live one are
    /// dropped without touching the session.
    pub fn on_tick(&mut self, id: TimerId) {
        if self.session.status != GameStatus::Playing {
            trace!("ignoring tick {:?} outside of play", id);
            return;
        }
        let Some(due) = self.countdown.fire(id) else {
            trace!("dropping stale tick {:?}", id);
            return;
        };

        self.session.time_left = self.session.time_left.saturating_sub(1);

        if self.session.time_left == 0 {
            self.apply(RoundOutcome::Timeout);
            self.advance_round();
        } else {
            // relative to the deadline so a late wake-up doesn't stretch the round
            self.countdown.schedule(due);
        }
    }

    /// Fire the live tick if it is due. Returns whether one fired.
    pub fn poll_tick(&mut self) -> bool {
        match self.due_tick() {
            Some(id) => {
                self.on_tick(id);
                true
            }
            None => false,
        }
    }

    /// Leave the results screen. Only valid from `Finished`.
    pub fn reset_to_menu(&mut self) {
        if self.session.status != GameStatus::Finished {
            return;
        }
        self.countdown.cancel();
        self.session = GameSession::default();
        debug!("back to menu, {} rounds configured", self.total_rounds);
        self.notify(EngineEvent::ReturnedToMenu);
    }

    fn apply(&mut self, outcome: RoundOutcome) {
        self.session.score += outcome.delta();
        self.session.last_outcome = Some(outcome);
        self.session.history.record(outcome);
        if !matches!(outcome, RoundOutcome::Miss) {
            self.session.history.score_timeline.push(self.session.score);
        }

        let score = self.session.score;
        debug!("{:?} -> score {}", outcome, score);
        self.notify(EngineEvent::Scored { outcome, score });
    }

    fn notify(&mut self, event: EngineEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::countdown::TICK_INTERVAL;
    use assert_matches::assert_matches;
    use std::rc::Rc;

    type TestEngine = RoundEngine<Rc<ManualClock>, StdRng>;

    fn engine(total_rounds: u32) -> (TestEngine, Rc<ManualClock>) {
        let clock = Rc::new(ManualClock::new());
        let engine =
            RoundEngine::with_parts(Rc::clone(&clock), StdRng::seed_from_u64(1), total_rounds);
        (engine, clock)
    }

    fn correct_key(engine: &TestEngine) -> String {
        engine.view().required_key.unwrap().to_string()
    }

    fn wait_one_second(engine: &mut TestEngine, clock: &ManualClock) {
        clock.advance(TICK_INTERVAL);
        assert!(engine.poll_tick(), "a tick should be due");
    }

    #[test]
    fn new_engine_is_not_started() {
        let (engine, _) = engine(DEFAULT_TOTAL_ROUNDS);
        let view = engine.view();
        assert_eq!(view.status, GameStatus::NotStarted);
        assert_eq!(view.round_index, 0);
        assert_eq!(view.score, 0);
        assert_eq!(view.word, None);
        assert_eq!(engine.pending_tick(), None);
    }

    #[test]
    fn start_game_deals_first_round() {
        let (mut engine, _) = engine(10);
        engine.start_game(10);

        let view = engine.view();
        assert_eq!(view.status, GameStatus::Playing);
        assert_eq!(view.round_index, 1);
        assert_eq!(view.time_left, 3);
        assert_eq!(view.score, 0);
        assert!(view.word.is_some());
        assert!(engine.pending_tick().is_some());
    }

    #[test]
    fn key_presses_before_start_are_ignored() {
        let (mut engine, _) = engine(10);
        engine.on_key_press("q");
        engine.on_key_press("x");
        assert_eq!(engine.view().score, 0);
        assert_eq!(engine.status(), GameStatus::NotStarted);
    }

    #[test]
    fn correct_press_scores_by_reaction_time() {
        let (mut engine, clock) = engine(10);
        engine.start_game(10);

        clock.advance_ms(200);
        let key = correct_key(&engine);
        engine.on_key_press(&key);

        let view = engine.view();
        assert_eq!(view.score, 800);
        assert_eq!(view.round_index, 2);
        assert_matches!(
            view.last_outcome,
            Some(RoundOutcome::Hit {
                reaction_ms: 200,
                points: 800
            })
        );
    }

    #[test]
    fn correct_press_is_case_insensitive() {
        let (mut engine, _) = engine(10);
        engine.start_game(10);

        let key = correct_key(&engine).to_lowercase();
        engine.on_key_press(&key);
        assert_eq!(engine.view().score, 1000);
        assert_eq!(engine.view().round_index, 2);
    }

    #[test]
    fn slow_correct_press_scores_zero() {
        let (mut engine, clock) = engine(10);
        engine.start_game(10);
        engine.session.score = -40;

        clock.advance_ms(1000);
        let key = correct_key(&engine);
        engine.on_key_press(&key);
        assert_eq!(engine.view().score, -40);

        clock.advance_ms(2500);
        let key = correct_key(&engine);
        engine.on_key_press(&key);
        assert_eq!(engine.view().score, -40);
        assert_eq!(engine.view().round_index, 3);
    }

    #[test]
    fn missing_start_timestamp_counts_as_instant() {
        let (mut engine, clock) = engine(10);
        engine.start_game(10);
        engine.session.round_started_at = None;

        clock.advance_ms(400);
        let key = correct_key(&engine);
        engine.on_key_press(&key);
        assert_eq!(engine.view().score, 1000);
    }

    #[test]
    fn wrong_key_costs_100_and_keeps_round() {
        let (mut engine, clock) = engine(10);
        engine.start_game(10);
        let before = engine.view();
        let tick = engine.pending_tick();

        clock.advance_ms(300);
        engine.on_key_press("1");
        engine.on_key_press("Shift");

        let after = engine.view();
        assert_eq!(after.score, -200);
        assert_eq!(after.word, before.word);
        assert_eq!(after.round_index, before.round_index);
        assert_eq!(after.time_left, before.time_left);
        assert_eq!(engine.pending_tick(), tick);
        assert_eq!(after.last_outcome, Some(RoundOutcome::Miss));
    }

    #[test]
    fn ticks_count_down_then_time_out() {
        let (mut engine, clock) = engine(10);
        engine.start_game(10);

        wait_one_second(&mut engine, &clock);
        assert_eq!(engine.view().time_left, 2);
        wait_one_second(&mut engine, &clock);
        assert_eq!(engine.view().time_left, 1);
        assert_eq!(engine.view().round_index, 1);

        wait_one_second(&mut engine, &clock);
        let view = engine.view();
        assert_eq!(view.score, -75);
        assert_eq!(view.round_index, 2);
        assert_eq!(view.time_left, 3);
        assert_eq!(view.last_outcome, Some(RoundOutcome::Timeout));
    }

    #[test]
    fn tick_is_not_due_early() {
        let (mut engine, clock) = engine(10);
        engine.start_game(10);
        clock.advance_ms(999);
        assert!(!engine.poll_tick());
        assert_eq!(engine.view().time_left, 3);
    }

    #[test]
    fn stale_tick_after_hit_has_no_effect() {
        let (mut engine, clock) = engine(10);
        engine.start_game(10);
        let stale = engine.pending_tick().unwrap();

        clock.advance_ms(100);
        let key = correct_key(&engine);
        engine.on_key_press(&key);
        let before = engine.view();

        clock.advance(TICK_INTERVAL);
        engine.on_tick(stale);

        let after = engine.view();
        assert_eq!(after.time_left, before.time_left);
        assert_eq!(after.score, before.score);
        assert_eq!(after.round_index, before.round_index);
        assert_ne!(engine.pending_tick(), Some(stale));
    }

    #[test]
    fn scenario_hit_miss_timeout() {
        let (mut engine, clock) = engine(10);
        engine.start_game(10);

        clock.advance_ms(200);
        let key = correct_key(&engine);
        engine.on_key_press(&key);
        assert_eq!(engine.view().score, 800);

        engine.on_key_press("1");
        assert_eq!(engine.view().score, 700);

        for _ in 0..3 {
            wait_one_second(&mut engine, &clock);
        }
        assert_eq!(engine.view().score, 625);
        assert_eq!(engine.view().round_index, 3);
    }

    #[test]
    fn all_rounds_time_out() {
        let (mut engine, clock) = engine(10);
        let events = engine.subscribe();
        engine.start_game(10);

        for _ in 0..30 {
            wait_one_second(&mut engine, &clock);
        }

        let view = engine.view();
        assert_eq!(view.score, -750);
        assert_eq!(view.status, GameStatus::Finished);
        assert_eq!(view.round_index, 10);
        assert_eq!(view.word, None);
        assert_eq!(engine.pending_tick(), None);

        let finished = events
            .try_iter()
            .filter(|e| matches!(e, EngineEvent::Finished { .. }))
            .count();
        assert_eq!(finished, 1);
    }

    #[test]
    fn round_index_never_exceeds_total() {
        let (mut engine, clock) = engine(5);
        engine.start_game(5);

        for step in 0..40u64 {
            clock.advance_ms(150);
            match step % 3 {
                0 => {
                    if let Some(key) = engine.view().required_key {
                        engine.on_key_press(&key.to_string());
                    }
                }
                1 => engine.on_key_press("9"),
                _ => {
                    engine.poll_tick();
                }
            }
            assert!(engine.view().round_index <= 5);
        }
        assert_eq!(engine.status(), GameStatus::Finished);
        assert_eq!(engine.view().round_index, 5);
    }

    #[test]
    fn ticks_and_keys_after_finish_are_ignored() {
        let (mut engine, clock) = engine(1);
        engine.start_game(1);
        let last_tick = engine.pending_tick().unwrap();
        let key = correct_key(&engine);
        engine.on_key_press(&key);
        assert_eq!(engine.status(), GameStatus::Finished);

        let score = engine.view().score;
        clock.advance(TICK_INTERVAL);
        engine.on_tick(last_tick);
        engine.on_key_press("x");
        assert_eq!(engine.view().score, score);
        assert_eq!(engine.view().round_index, 1);
    }

    #[test]
    fn penalties_apply_regardless_of_sign() {
        let (mut engine, _) = engine(10);
        engine.start_game(10);
        engine.session.score = 50;
        engine.on_key_press("1");
        assert_eq!(engine.view().score, -50);
        engine.on_key_press("1");
        assert_eq!(engine.view().score, -150);
    }

    #[test]
    fn restart_is_idempotent() {
        let (mut engine, clock) = engine(20);
        engine.start_game(10);
        for _ in 0..30 {
            wait_one_second(&mut engine, &clock);
        }
        assert_eq!(engine.status(), GameStatus::Finished);

        for _ in 0..2 {
            engine.reset_to_menu();
            engine.start_game(20);
            let view = engine.view();
            assert_eq!(view.score, 0);
            assert_eq!(view.status, GameStatus::Playing);
            assert_eq!(view.round_index, 1);
            assert_eq!(view.total_rounds, 20);
            assert_eq!(engine.summary().timeouts, 0);
        }
    }

    #[test]
    fn start_while_playing_restarts() {
        let (mut engine, _) = engine(10);
        engine.start_game(10);
        let old_tick = engine.pending_tick().unwrap();
        engine.on_key_press("1");

        engine.start_game(30);
        assert_eq!(engine.view().score, 0);
        assert_eq!(engine.view().round_index, 1);
        assert_eq!(engine.view().total_rounds, 30);
        assert_ne!(engine.pending_tick(), Some(old_tick));
    }

    #[test]
    fn reset_to_menu_only_from_finished() {
        let (mut engine, _) = engine(10);
        engine.start_game(10);
        engine.reset_to_menu();
        assert_eq!(engine.status(), GameStatus::Playing);

        engine.start_game(1);
        let key = correct_key(&engine);
        engine.on_key_press(&key);
        engine.reset_to_menu();

        let view = engine.view();
        assert_eq!(view.status, GameStatus::NotStarted);
        assert_eq!(view.round_index, 0);
        assert_eq!(view.total_rounds, 1);
        assert_eq!(engine.pending_tick(), None);
    }

    #[test]
    fn round_count_is_locked_while_playing() {
        let (mut engine, _) = engine(20);
        assert!(engine.set_total_rounds(30));
        engine.start_game(engine.total_rounds());
        assert!(!engine.set_total_rounds(50));
        assert_eq!(engine.view().total_rounds, 30);
    }

    #[test]
    fn advance_round_outside_play_is_noop() {
        let (mut engine, _) = engine(10);
        engine.advance_round();
        assert_eq!(engine.status(), GameStatus::NotStarted);
        assert_eq!(engine.view().round_index, 0);
    }

    #[test]
    fn zero_rounds_finishes_immediately() {
        let (mut engine, _) = engine(0);
        engine.start_game(0);
        assert_eq!(engine.status(), GameStatus::Finished);
        assert_eq!(engine.view().round_index, 0);
        assert_eq!(engine.pending_tick(), None);
    }

    #[test]
    fn subscribers_see_round_flow() {
        let (mut engine, clock) = engine(2);
        let events = engine.subscribe();
        engine.start_game(2);
        clock.advance_ms(250);
        let key = correct_key(&engine);
        engine.on_key_press(&key);

        let received: Vec<EngineEvent> = events.try_iter().collect();
        assert_matches!(
            received[0],
            EngineEvent::GameStarted { total_rounds: 2 }
        );
        assert_matches!(received[1], EngineEvent::RoundDealt { round: 1, .. });
        assert_matches!(
            received[2],
            EngineEvent::Scored {
                outcome: RoundOutcome::Hit { points: 750, .. },
                score: 750
            }
        );
        assert_matches!(received[3], EngineEvent::RoundDealt { round: 2, .. });
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let (mut engine, _) = engine(2);
        drop(engine.subscribe());
        let live = engine.subscribe();
        engine.start_game(2);
        assert_eq!(engine.subscribers.len(), 1);
        assert!(live.try_recv().is_ok());
    }

    #[test]
    fn late_wakeup_keeps_tick_cadence() {
        let (mut engine, clock) = engine(10);
        engine.start_game(10);
        let started = engine.session().round_started_at.unwrap();

        clock.advance_ms(1400);
        assert!(engine.poll_tick());
        assert_eq!(
            engine.next_tick_due(),
            Some(started + TICK_INTERVAL + TICK_INTERVAL)
        );
    }

    #[test]
    fn summary_tracks_timeline() {
        let (mut engine, clock) = engine(2);
        engine.start_game(2);
        clock.advance_ms(100);
        let key = correct_key(&engine);
        engine.on_key_press(&key);
        engine.on_key_press("1");
        for _ in 0..3 {
            wait_one_second(&mut engine, &clock);
        }

        let summary = engine.summary();
        assert_eq!(summary.score, 725);
        assert_eq!(summary.hits, 1);
        assert_eq!(summary.misses, 1);
        assert_eq!(summary.timeouts, 1);
        assert_eq!(summary.best_reaction_ms, Some(100));
        assert_eq!(summary.score_timeline, vec![900, 725]);
    }
}
