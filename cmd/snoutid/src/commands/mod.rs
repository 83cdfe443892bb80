//! CLI commands module.

mod identify;
mod list;
mod quality;
mod register;
mod util;

pub use identify::IdentifyCommand;
pub use list::ListCommand;
pub use quality::QualityCommand;
pub use register::RegisterCommand;
