pub mod event;
pub mod interpreter;
pub mod runner;
pub mod save;
pub mod variant;
pub mod world;
