use std::rc::Rc;
use std::time::{Duration, SystemTime};

use log::{debug, trace};
use uuid::Uuid;

use super::clock::{Clock, ScheduledEvent, TimerHandle, TimerKind};
use crate::helpers::seconds_until;
use crate::model::{
    TimerRegimeKind, BLITZ_DURATION, BOT_TURN_DELAY, CHAOS_INTERVAL, COUNTDOWN_TICK,
    NEXT_ROUND_DELAY,
};

/// Owns every timer handle the engine has scheduled, so that a round change
/// or settlement can cancel them in one place.
pub struct TimerCoordinator {
    clock: Rc<dyn Clock>,
    handles: Vec<TimerHandle>,
    chaos_expiry: Option<TimerHandle>,
    regime: TimerRegimeKind,
    deadline: Option<SystemTime>,
}

impl TimerCoordinator {
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self {
            clock,
            handles: Vec::new(),
            chaos_expiry: None,
            regime: TimerRegimeKind::None,
            deadline: None,
        }
    }

    pub fn clock(&self) -> &Rc<dyn Clock> {
        &self.clock
    }

    fn after(&mut self, delay: Duration, round_id: Uuid, kind: TimerKind) -> TimerHandle {
        let handle = self
            .clock
            .schedule_after(delay, ScheduledEvent { round_id, kind });
        self.handles.push(handle);
        handle
    }

    fn every(&mut self, period: Duration, round_id: Uuid, kind: TimerKind) -> TimerHandle {
        let handle = self
            .clock
            .schedule_every(period, ScheduledEvent { round_id, kind });
        self.handles.push(handle);
        handle
    }

    /// Starts the timer family for a mode. Any running family is cancelled
    /// first so at most one is ever active.
    pub fn start_regime(&mut self, regime: TimerRegimeKind, round_id: Uuid) {
        if self.regime != TimerRegimeKind::None {
            self.cancel_all();
        }
        let now = self.clock.now();
        match regime {
            TimerRegimeKind::None => return,
            TimerRegimeKind::Chaos => {
                self.every(COUNTDOWN_TICK, round_id, TimerKind::CountdownTick);
                self.every(CHAOS_INTERVAL, round_id, TimerKind::ChaosReroll);
                self.chaos_expiry =
                    Some(self.after(CHAOS_INTERVAL, round_id, TimerKind::ChaosExpired));
                self.deadline = Some(now + CHAOS_INTERVAL);
            }
            TimerRegimeKind::DoubleChaos => {
                self.every(COUNTDOWN_TICK, round_id, TimerKind::CountdownTick);
                self.every(CHAOS_INTERVAL, round_id, TimerKind::DoubleChaosReroll);
                self.deadline = Some(now + CHAOS_INTERVAL);
            }
            TimerRegimeKind::Blitz => {
                self.every(COUNTDOWN_TICK, round_id, TimerKind::CountdownTick);
                self.after(BLITZ_DURATION, round_id, TimerKind::BlitzExpired);
                self.deadline = Some(now + BLITZ_DURATION);
            }
        }
        debug!(target: "timers", "Started {:?} timers for round {}", regime, round_id);
        self.regime = regime;
    }

    /// Called after a chaos or double chaos reroll: the countdown restarts and
    /// the chaos watchdog is pushed back a full interval.
    pub fn restart_cycle(&mut self, round_id: Uuid) {
        self.deadline = Some(self.clock.now() + CHAOS_INTERVAL);
        if let Some(handle) = self.chaos_expiry.take() {
            self.clock.cancel(handle);
            self.handles.retain(|h| *h != handle);
            self.chaos_expiry = Some(self.after(CHAOS_INTERVAL, round_id, TimerKind::ChaosExpired));
        }
    }

    pub fn seconds_remaining(&self) -> Option<u64> {
        self.deadline
            .map(|deadline| seconds_until(deadline, self.clock.now()))
    }

    pub fn schedule_bot_turn(&mut self, round_id: Uuid) {
        self.after(BOT_TURN_DELAY, round_id, TimerKind::BotTurn);
    }

    pub fn schedule_next_round(&mut self, round_id: Uuid) {
        self.after(NEXT_ROUND_DELAY, round_id, TimerKind::NextRound);
    }

    pub fn cancel_all(&mut self) {
        if !self.handles.is_empty() {
            trace!(target: "timers", "Cancelling {} timers", self.handles.len());
        }
        for handle in self.handles.drain(..) {
            self.clock.cancel(handle);
        }
        self.chaos_expiry = None;
        self.deadline = None;
        self.regime = TimerRegimeKind::None;
    }

    pub fn pop_due(&self) -> Option<ScheduledEvent> {
        self.clock.pop_due()
    }
}
