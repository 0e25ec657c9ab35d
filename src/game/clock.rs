use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, NaiveDate, Utc};
use log::trace;
use uuid::Uuid;

pub type TimerHandle = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// One second countdown display for chaos, double chaos and blitz
    CountdownTick,
    ChaosReroll,
    ChaosExpired,
    DoubleChaosReroll,
    BlitzExpired,
    BotTurn,
    NextRound,
}

/// What a timer delivers when it fires. Only the round id and kind travel with
/// it; the engine re-reads its own state when handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledEvent {
    pub round_id: Uuid,
    pub kind: TimerKind,
}

/// Time source and timer scheduler the engine runs against
pub trait Clock {
    fn now(&self) -> SystemTime;

    /// Current UTC calendar date
    fn today(&self) -> NaiveDate {
        DateTime::<Utc>::from(self.now()).date_naive()
    }

    fn schedule_after(&self, delay: Duration, event: ScheduledEvent) -> TimerHandle;
    fn schedule_every(&self, period: Duration, event: ScheduledEvent) -> TimerHandle;
    fn cancel(&self, handle: TimerHandle) -> bool;

    /// Removes and returns the earliest event whose due time has passed
    fn pop_due(&self) -> Option<ScheduledEvent>;

    /// When the next pending timer is due, if any
    fn next_due(&self) -> Option<SystemTime>;
}

#[derive(Debug, Clone, Copy)]
struct QueuedTimer {
    handle: TimerHandle,
    event: ScheduledEvent,
    period: Option<Duration>,
}

/// Pending timers ordered by due time, then by scheduling order so that
/// timers due at the same instant fire first-in first-out.
#[derive(Debug, Default)]
pub struct TimerQueue {
    queue: BTreeMap<(SystemTime, u64), QueuedTimer>,
    keys: HashMap<TimerHandle, (SystemTime, u64)>,
    next_seq: u64,
    next_handle: TimerHandle,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, due: SystemTime, timer: QueuedTimer) {
        let key = (due, self.next_seq);
        self.next_seq += 1;
        self.keys.insert(timer.handle, key);
        self.queue.insert(key, timer);
    }

    pub fn schedule(
        &mut self,
        due: SystemTime,
        period: Option<Duration>,
        event: ScheduledEvent,
    ) -> TimerHandle {
        let handle = self.next_handle;
        self.next_handle += 1;
        self.insert(
            due,
            QueuedTimer {
                handle,
                event,
                period,
            },
        );
        trace!(target: "timers", "Scheduled {:?} as #{} due {:?}", event.kind, handle, due);
        handle
    }

    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        match self.keys.remove(&handle) {
            Some(key) => self.queue.remove(&key).is_some(),
            None => false,
        }
    }

    /// Pops the earliest timer due at or before `now`. Repeating timers are
    /// re-armed one period after their previous due time.
    pub fn pop_due(&mut self, now: SystemTime) -> Option<ScheduledEvent> {
        let (&key, _) = self.queue.first_key_value()?;
        if key.0 > now {
            return None;
        }
        let timer = self.queue.remove(&key)?;
        self.keys.remove(&timer.handle);
        if let Some(period) = timer.period {
            self.insert(key.0 + period, timer);
        }
        Some(timer.event)
    }

    pub fn next_due(&self) -> Option<SystemTime> {
        self.queue.keys().next().map(|(due, _)| *due)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// Wall-clock time; the host polls `pop_due` to deliver timers
#[derive(Debug, Default)]
pub struct SystemClock {
    timers: RefCell<TimerQueue>,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }

    fn schedule_after(&self, delay: Duration, event: ScheduledEvent) -> TimerHandle {
        let due = self.now() + delay;
        self.timers.borrow_mut().schedule(due, None, event)
    }

    fn schedule_every(&self, period: Duration, event: ScheduledEvent) -> TimerHandle {
        let due = self.now() + period;
        self.timers.borrow_mut().schedule(due, Some(period), event)
    }

    fn cancel(&self, handle: TimerHandle) -> bool {
        self.timers.borrow_mut().cancel(handle)
    }

    fn pop_due(&self) -> Option<ScheduledEvent> {
        let now = self.now();
        self.timers.borrow_mut().pop_due(now)
    }

    fn next_due(&self) -> Option<SystemTime> {
        self.timers.borrow().next_due()
    }
}

/// Simulated time that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<SystemTime>,
    timers: RefCell<TimerQueue>,
}

impl ManualClock {
    pub fn new(start: SystemTime) -> Self {
        Self {
            now: Cell::new(start),
            timers: RefCell::new(TimerQueue::new()),
        }
    }

    /// Starts at midnight UTC on `date`
    pub fn at_date(date: NaiveDate) -> Self {
        let start = date
            .and_hms_opt(0, 0, 0)
            .map(|datetime| SystemTime::from(datetime.and_utc()))
            .unwrap_or(SystemTime::UNIX_EPOCH);
        Self::new(start)
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn pending(&self) -> usize {
        self.timers.borrow().len()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> SystemTime {
        self.now.get()
    }

    fn schedule_after(&self, delay: Duration, event: ScheduledEvent) -> TimerHandle {
        let due = self.now() + delay;
        self.timers.borrow_mut().schedule(due, None, event)
    }

    fn schedule_every(&self, period: Duration, event: ScheduledEvent) -> TimerHandle {
        let due = self.now() + period;
        self.timers.borrow_mut().schedule(due, Some(period), event)
    }

    fn cancel(&self, handle: TimerHandle) -> bool {
        self.timers.borrow_mut().cancel(handle)
    }

    fn pop_due(&self) -> Option<ScheduledEvent> {
        let now = self.now();
        self.timers.borrow_mut().pop_due(now)
    }

    fn next_due(&self) -> Option<SystemTime> {
        self.timers.borrow().next_due()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: TimerKind) -> ScheduledEvent {
        ScheduledEvent {
            round_id: Uuid::nil(),
            kind,
        }
    }

    fn clock() -> ManualClock {
        ManualClock::new(SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000))
    }

    #[test]
    fn test_one_shot_fires_once_when_due() {
        let clock = clock();
        clock.schedule_after(Duration::from_millis(800), event(TimerKind::BotTurn));

        assert_eq!(clock.pop_due(), None);
        clock.advance(Duration::from_millis(799));
        assert_eq!(clock.pop_due(), None);
        clock.advance(Duration::from_millis(1));
        assert_eq!(clock.pop_due(), Some(event(TimerKind::BotTurn)));
        assert_eq!(clock.pop_due(), None);
        assert_eq!(clock.pending(), 0);
    }

    #[test]
    fn test_repeating_timer_rearms() {
        let clock = clock();
        clock.schedule_every(Duration::from_secs(1), event(TimerKind::CountdownTick));

        clock.advance(Duration::from_millis(3_500));
        let mut fired = 0;
        while clock.pop_due().is_some() {
            fired += 1;
        }
        assert_eq!(fired, 3);
        assert_eq!(clock.pending(), 1);
    }

    #[test]
    fn test_ties_fire_in_scheduling_order() {
        let clock = clock();
        clock.schedule_every(Duration::from_secs(15), event(TimerKind::ChaosReroll));
        clock.schedule_after(Duration::from_secs(15), event(TimerKind::ChaosExpired));

        clock.advance(Duration::from_secs(15));
        assert_eq!(clock.pop_due(), Some(event(TimerKind::ChaosReroll)));
        assert_eq!(clock.pop_due(), Some(event(TimerKind::ChaosExpired)));
    }

    #[test]
    fn test_next_due_is_earliest_pending() {
        let clock = clock();
        assert_eq!(clock.next_due(), None);
        let start = clock.now();
        clock.schedule_after(Duration::from_secs(3), event(TimerKind::NextRound));
        let bot = clock.schedule_after(Duration::from_millis(800), event(TimerKind::BotTurn));
        assert_eq!(clock.next_due(), Some(start + Duration::from_millis(800)));

        clock.cancel(bot);
        assert_eq!(clock.next_due(), Some(start + Duration::from_secs(3)));
    }

    #[test]
    fn test_cancel() {
        let clock = clock();
        let handle = clock.schedule_every(Duration::from_secs(15), event(TimerKind::ChaosReroll));
        assert!(clock.cancel(handle));
        assert!(!clock.cancel(handle));

        clock.advance(Duration::from_secs(60));
        assert_eq!(clock.pop_due(), None);
    }

    #[test]
    fn test_today_is_utc_date() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let clock = ManualClock::at_date(date);
        assert_eq!(clock.today(), date);
        clock.advance(Duration::from_secs(24 * 3600 - 1));
        assert_eq!(clock.today(), date);
        clock.advance(Duration::from_secs(1));
        assert_eq!(clock.today(), date.succ_opt().unwrap());
    }
}
