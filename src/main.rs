use std::cell::RefCell;
use std::io::{self, BufRead};
use std::rc::Rc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use log::{info, warn};

use guess_rush::events::{Channel, EventHandler};
use guess_rush::game::achievements::describe;
use guess_rush::game::{
    Clock, FileStorage, GameEngine, MemoryStorage, PlayerProfile, Settings, Storage, SystemClock,
};
use guess_rush::helpers::Capitalize;
use guess_rush::model::{
    Achievement, Difficulty, FeedbackKind, GameEngineCommand, GameEngineEvent, GameMode,
};
use guess_rush::Destroyable;

/// Longest the console waits for input before checking timers again
const MAX_WAIT: Duration = Duration::from_millis(500);

fn init_logging() {
    env_logger::init();
}

/// Prints engine events to the terminal
struct ConsoleRenderer {
    last_tick: Option<u64>,
}

impl ConsoleRenderer {
    fn new() -> Self {
        Self { last_tick: None }
    }
}

impl EventHandler<GameEngineEvent> for ConsoleRenderer {
    fn handle_event(&mut self, event: &GameEngineEvent) {
        match event {
            GameEngineEvent::RoundStarted(round) => {
                self.last_tick = None;
                let attempts = round
                    .max_attempts
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "unlimited".to_string());
                println!(
                    "\n== {} ({}) == range {}-{}, attempts: {}",
                    round.mode.key().capitalize(),
                    round.difficulty.key().capitalize(),
                    round.min_range,
                    round.max_range,
                    attempts
                );
            }
            GameEngineEvent::Feedback { message, kind } => {
                let prefix = match kind {
                    FeedbackKind::Info => "",
                    FeedbackKind::Hint => "> ",
                    FeedbackKind::Success => "*** ",
                    FeedbackKind::Warning => "! ",
                    FeedbackKind::Error => "x ",
                };
                println!("{}{}", prefix, message);
            }
            GameEngineEvent::HelpRevealed { .. } | GameEngineEvent::DailyAlreadyPlayed(_) => {}
            GameEngineEvent::BotGuessed { message, .. } => println!("[bot] {}", message),
            GameEngineEvent::RangeChanged {
                min_range,
                max_range,
            } => println!("Range is now {}-{}", min_range, max_range),
            GameEngineEvent::TimerTick(seconds) => {
                if self.last_tick != Some(*seconds) && (*seconds <= 5 || seconds % 5 == 0) {
                    println!("({}s)", seconds);
                }
                self.last_tick = Some(*seconds);
            }
            GameEngineEvent::RoundSettled(_) | GameEngineEvent::EasterEggDiscovered(_) => {}
            GameEngineEvent::AchievementUnlocked { achievement, tier } => println!(
                "{} Achievement unlocked: {} ({}) - {}",
                tier.icon(),
                achievement,
                tier,
                describe(*achievement, *tier)
            ),
            GameEngineEvent::StatsUpdated(stats) => println!(
                "Played {}, won {}, level {} {}",
                stats.games_played,
                stats.games_won,
                stats.ranking.current_level,
                stats.ranking.current_title
            ),
        }
    }
}

fn open_storage() -> Rc<dyn Storage> {
    let data_dir = Settings::data_dir();
    match FileStorage::new(&data_dir) {
        Ok(storage) => {
            info!(target: "storage", "Using data directory {}", data_dir.display());
            Rc::new(storage)
        }
        Err(e) => {
            warn!(
                target: "storage",
                "Cannot use {}, progress will not be kept: {}",
                data_dir.display(),
                e
            );
            Rc::new(MemoryStorage::new())
        }
    }
}

fn print_usage() {
    println!("Commands:");
    println!("  <number>                   guess");
    println!("  new <mode> [difficulty]    start a round");
    println!("  restart                    same mode again");
    println!("  help                       reveal a range around the number");
    println!("  stats | achievements       show progress");
    println!("  reset-stats | reset-achievements");
    println!("  quit");
    let modes: Vec<&str> = GameMode::all().iter().map(|m| m.key()).collect();
    println!("Modes: {}", modes.join(", "));
}

fn print_stats(engine: &GameEngine) {
    let stats = engine.stats();
    let progress = engine.ranking_progress();
    println!(
        "Games {} / wins {} / best score {} / avg win time {:.1}s / hints {}",
        stats.games_played,
        stats.games_won,
        stats.best_score.unwrap_or(0),
        stats.avg_win_time,
        stats.hints_used
    );
    println!(
        "Level {} {} ({} XP, {}% to {})",
        progress.current_level,
        progress.current_title,
        progress.total_experience,
        progress.progress_percentage,
        progress.next_title
    );
    for (mode, by_difficulty) in &stats.advanced_stats {
        for (difficulty, mode_stats) in by_difficulty {
            let calculated = mode_stats.calculated();
            println!(
                "  {:<12} {:<7} played {:>3}, success {:>3}%, avg {:>4.1} guesses, avg score {}",
                mode.key(),
                difficulty.key(),
                mode_stats.games_played,
                calculated.success_rate,
                calculated.average_attempts,
                calculated.average_score
            );
        }
    }
}

fn print_achievements(engine: &GameEngine) {
    let achievements = engine.achievements();
    for achievement in Achievement::all() {
        match achievements.held_tier(achievement) {
            Some(tier) => println!("{} {} ({})", tier.icon(), achievement, tier),
            None if achievement.is_secret() => println!("   ???"),
            None => println!("   {} - {}", achievement, achievement.summary()),
        }
    }
}

/// How long to block on stdin: until the next timer is due, capped at `MAX_WAIT`
fn wait_for(clock: &SystemClock) -> Duration {
    match clock.next_due() {
        Some(due) => due
            .duration_since(clock.now())
            .unwrap_or(Duration::ZERO)
            .min(MAX_WAIT),
        None => MAX_WAIT,
    }
}

fn parse_new_game(args: &[&str], settings: &Settings) -> Result<(GameMode, Difficulty), String> {
    let mode = match args.first() {
        Some(raw) => raw.parse::<GameMode>()?,
        None => settings.default_mode,
    };
    let difficulty = match args.get(1) {
        Some(raw) => raw.parse::<Difficulty>()?,
        None => settings.default_difficulty,
    };
    Ok((mode, difficulty))
}

fn main() {
    init_logging();

    let storage = open_storage();
    let mut profile = PlayerProfile::load(storage.as_ref());
    println!("Guess Rush - welcome, {}!", profile.display_name());
    if !profile.welcome_completed {
        print_usage();
        profile.welcome_completed = true;
        if let Err(e) = profile.save(storage.as_ref()) {
            warn!(target: "storage", "Could not save profile: {}", e);
        }
    }

    let (command_emitter, command_observer) = Channel::<GameEngineCommand>::new();
    let (event_emitter, event_observer) = Channel::<GameEngineEvent>::new();
    let renderer = RefCell::new(ConsoleRenderer::new());
    event_observer.subscribe(move |event: &GameEngineEvent| {
        renderer.borrow_mut().handle_event(event);
    });

    let clock = Rc::new(SystemClock::new());
    let engine = GameEngine::new(
        command_observer,
        event_emitter,
        clock.clone(),
        storage,
        Settings::seed_from_env(),
    );
    command_emitter.emit(GameEngineCommand::Restart);

    let (line_sender, lines) = mpsc::channel::<String>();
    thread::spawn(move || {
        for line in io::stdin().lock().lines().map_while(Result::ok) {
            if line_sender.send(line).is_err() {
                break;
            }
        }
    });

    loop {
        match lines.recv_timeout(wait_for(&clock)) {
            Ok(line) => {
                let words: Vec<&str> = line.split_whitespace().collect();
                match words.as_slice() {
                    [] => {}
                    ["quit"] | ["exit"] => break,
                    ["new", args @ ..] => {
                        let parsed = parse_new_game(args, engine.borrow().settings());
                        match parsed {
                            Ok((mode, difficulty)) => {
                                command_emitter.emit(GameEngineCommand::NewGame(mode, difficulty))
                            }
                            Err(e) => println!("x {}", e),
                        }
                    }
                    ["restart"] => command_emitter.emit(GameEngineCommand::Restart),
                    ["help"] => command_emitter.emit(GameEngineCommand::UseHelp),
                    ["stats"] => print_stats(&engine.borrow()),
                    ["achievements"] => print_achievements(&engine.borrow()),
                    ["reset-stats"] => command_emitter.emit(GameEngineCommand::ResetStats),
                    ["reset-achievements"] => {
                        command_emitter.emit(GameEngineCommand::ResetAchievements)
                    }
                    ["?"] | ["usage"] => print_usage(),
                    _ => command_emitter.emit(GameEngineCommand::SubmitGuess(line.clone())),
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
        if clock.next_due().is_some_and(|due| due <= clock.now()) {
            command_emitter.emit(GameEngineCommand::TimersDue);
        }
    }

    engine.borrow_mut().destroy();
    println!("Bye!");
}
