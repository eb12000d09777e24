use clap::{builder::ValueParser, Arg, ArgAction, Command};

pub const ARG_VERBOSITY: &str = "verbosity";

/// Level names accepted by `MUET_LOG_LEVEL`, in `-v` count order.
const LEVEL_NAMES: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Accept either a `-v` count (0..=5) or a level name.
fn parse_level(raw: &str) -> Result<u8, String> {
    if let Ok(count) = raw.parse::<u8>() {
        return if count <= 5 {
            Ok(count)
        } else {
            Err(format!("verbosity {count} is out of range (0-5)"))
        };
    }

    let name = raw.to_ascii_lowercase();
    LEVEL_NAMES
        .iter()
        .position(|level| *level == name)
        .and_then(|index| u8::try_from(index).ok())
        .ok_or_else(|| format!("unknown log level '{raw}'"))
}

#[must_use]
pub fn validator_log_level() -> ValueParser {
    ValueParser::from(parse_level)
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Repeat to raise verbosity, or set MUET_LOG_LEVEL=error|warn|info|debug|trace")
            .env("MUET_LOG_LEVEL")
            .global(true)
            .action(ArgAction::Count)
            .value_parser(validator_log_level()),
    )
}
