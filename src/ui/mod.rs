mod cli;
mod surface;
#[cfg(test)]
mod tests;

pub use cli::{parse_input, Args, Cli, UserInput};
pub use surface::{ButtonIcon, ForegroundSurface};
