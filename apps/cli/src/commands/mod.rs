//! 命令定义和实现

pub mod config;
pub mod corner;
pub mod grid;
pub mod r#move;
pub mod position;
pub mod preset;
pub mod scan;
pub mod stop;

pub use config::ConfigCommand;
pub use corner::CornerCommand;
pub use grid::GridCommand;
pub use r#move::MoveCommand;
pub use position::PositionCommand;
pub use preset::PresetCommand;
pub use scan::ScanCommand;
pub use stop::StopCommand;
