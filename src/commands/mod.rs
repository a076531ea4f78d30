pub mod simulation_command;

pub use self::simulation_command::*;
