use clap::{Arg, ArgMatches, Command};
use std::path::PathBuf;

pub const ARG_TEMPLATES_DIR: &str = "templates-dir";
pub const ARG_STATIC_DIR: &str = "static-dir";

#[derive(Debug, Clone)]
pub struct Options {
    pub templates_dir: Option<PathBuf>,
    pub static_dir: PathBuf,
}

impl Options {
    #[must_use]
    pub fn parse(matches: &ArgMatches) -> Self {
        Self {
            templates_dir: matches
                .get_one::<String>(ARG_TEMPLATES_DIR)
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            static_dir: matches
                .get_one::<String>(ARG_STATIC_DIR)
                .map_or_else(|| PathBuf::from("javascript"), PathBuf::from),
        }
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_TEMPLATES_DIR)
                .long(ARG_TEMPLATES_DIR)
                .help("Directory with *.html templates (defaults to the built-in templates)")
                .env("MUET_TEMPLATES_DIR"),
        )
        .arg(
            Arg::new(ARG_STATIC_DIR)
                .long(ARG_STATIC_DIR)
                .help("Directory served under /javascript")
                .env("MUET_STATIC_DIR")
                .default_value("javascript"),
        )
}
