pub mod player;
pub mod process;
