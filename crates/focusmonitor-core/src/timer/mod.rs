mod machine;
mod ticker;

pub use machine::{Command, FocusMachine};
pub use ticker::Ticker;
