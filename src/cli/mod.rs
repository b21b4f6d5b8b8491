mod commands;

pub use commands::{Cli, Commands, FocusArg, MethodArg, SettingsAction, SourceArgs};
