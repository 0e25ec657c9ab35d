use super::{Difficulty, GameMode};

#[derive(Debug, Clone)]
pub enum GameEngineCommand {
    NewGame(GameMode, Difficulty),
    /// Starts another round with the current mode and difficulty
    Restart,
    SubmitGuess(String),
    UseHelp,
    /// Deliver every scheduled timer event that has come due
    TimersDue,
    ResetStats,
    ResetAchievements,
}
