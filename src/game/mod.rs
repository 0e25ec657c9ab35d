pub mod achievements;
pub mod bot_opponent;
pub mod clock;
pub mod easter_eggs;
pub mod game_engine;
pub mod math_hint;
pub mod number_generator;
pub mod round;
pub mod scoring;
pub mod settings;
pub mod stats_manager;
pub mod storage;
pub mod timer_coordinator;

pub use achievements::{AchievementContext, AchievementEngine};
pub use bot_opponent::{BotSkill, BotState, Turn};
pub use clock::{Clock, ManualClock, ScheduledEvent, SystemClock, TimerHandle, TimerKind};
pub use easter_eggs::{EasterEggTracker, GuessObservation};
pub use game_engine::{GameEngine, GuessOutcome};
pub use number_generator::NumberGenerator;
pub use round::{RoundPhase, RoundState, StreakState};
pub use settings::{PlayerProfile, Settings};
pub use stats_manager::{SettledRound, StatsManager};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use timer_coordinator::TimerCoordinator;
