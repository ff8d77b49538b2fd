/// Events emitted while interpreting commands.
/// The presentation layer consumes these for messages and highlights.

use crate::domain::board::Pos;

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    RobotMoved { from: Pos, to: Pos },
    RobotJumped { from: Pos, to: Pos },
    HeroAcquired { id: String, label: String },
    StorageUnlocked,
    BoxOpened,
    RunFinished,
}
