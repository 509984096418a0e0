//! Command-line argument parsing (spec.md §1 "the command-line argument
//! parser" is an external collaborator; §6 "Process interface" gives its
//! exact surface).
//!
//! Grounded in how the teacher's own `pgwm/src/main.rs` hand-parses
//! `std::env::args()` with a single `match` rather than pulling in a
//! dependency for a half-dozen flags; this module follows the same
//! precedent for fensterchef's slightly larger option set.

use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    All,
    Info,
    Error,
    Nothing,
}

impl Verbosity {
    #[must_use]
    pub fn filter(self) -> log::LevelFilter {
        match self {
            Verbosity::All => log::LevelFilter::Trace,
            Verbosity::Info => log::LevelFilter::Info,
            Verbosity::Error => log::LevelFilter::Error,
            Verbosity::Nothing => log::LevelFilter::Off,
        }
    }

    fn parse(word: &str) -> Option<Self> {
        match word {
            "all" => Some(Verbosity::All),
            "info" => Some(Verbosity::Info),
            "error" => Some(Verbosity::Error),
            "nothing" => Some(Verbosity::Nothing),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Options {
    pub verbosity: Verbosity,
    pub config: Option<PathBuf>,
    pub command: Option<String>,
}

impl Default for Options {
    fn default() -> Self {
        Options { verbosity: Verbosity::Info, config: None, command: None }
    }
}

/// What to do after parsing: run normally, or exit immediately (with the
/// given process exit code) after `--help`/`--usage`/`--version` or a
/// parse error has already printed its message.
pub enum Outcome {
    Run(Options),
    Exit(i32),
}

const USAGE: &str = "\
Usage: fensterchef [options]

Options:
  -h, --help                 print this help text and exit
      --usage                print usage and exit
  -v, --version              print the version and exit
  -d, --verbosity LEVEL      all|info|error|nothing (default: info)
      --verbose              shorthand for --verbosity all
      --config FILE          use FILE instead of the discovered configuration
  -e, --command COMMAND...   run COMMAND through the configuration interpreter and exit
";

/// Parses `args` (excluding argv[0]). Long and short options accept either
/// `--opt=value`/`-o=value` or a following word as the value (spec.md §6).
#[must_use]
pub fn parse(args: impl IntoIterator<Item = String>) -> Outcome {
    let mut options = Options::default();
    let mut iter = args.into_iter().peekable();

    while let Some(arg) = iter.next() {
        let (flag, inline_value) = split_inline_value(&arg);
        match flag {
            "--help" | "-h" => {
                print!("{USAGE}");
                return Outcome::Exit(0);
            }
            "--usage" => {
                print!("{USAGE}");
                return Outcome::Exit(0);
            }
            "--version" | "-v" => {
                println!("fensterchef {}", env!("CARGO_PKG_VERSION"));
                return Outcome::Exit(0);
            }
            "--verbosity" | "-d" => {
                let Some(value) = inline_value.map(str::to_string).or_else(|| iter.next()) else {
                    eprintln!("{flag} requires a value");
                    return Outcome::Exit(1);
                };
                let Some(v) = Verbosity::parse(&value) else {
                    eprintln!("invalid verbosity {value:?} (expected all|info|error|nothing)");
                    return Outcome::Exit(1);
                };
                options.verbosity = v;
            }
            "--verbose" => options.verbosity = Verbosity::All,
            "--config" => {
                let Some(value) = inline_value.map(str::to_string).or_else(|| iter.next()) else {
                    eprintln!("--config requires a file path");
                    return Outcome::Exit(1);
                };
                options.config = Some(PathBuf::from(value));
            }
            "--command" | "-e" => {
                let rest: Vec<String> = std::iter::once(inline_value.map(str::to_string))
                    .flatten()
                    .chain(iter.by_ref())
                    .collect();
                if rest.is_empty() {
                    eprintln!("{flag} requires a command");
                    return Outcome::Exit(1);
                }
                options.command = Some(rest.join(" "));
            }
            other => {
                eprintln!("unrecognized option {other:?}");
                eprintln!("{USAGE}");
                return Outcome::Exit(1);
            }
        }
    }
    Outcome::Run(options)
}

fn split_inline_value(arg: &str) -> (&str, Option<&str>) {
    match arg.split_once('=') {
        Some((flag, value)) => (flag, Some(value)),
        None => (arg, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_verbosity_with_equals() {
        let Outcome::Run(opts) = parse(["--verbosity=error".to_string()]) else { panic!("expected Run") };
        assert_eq!(opts.verbosity, Verbosity::Error);
    }

    #[test]
    fn parses_verbosity_with_space() {
        let Outcome::Run(opts) = parse(["-d".to_string(), "all".to_string()]) else { panic!("expected Run") };
        assert_eq!(opts.verbosity, Verbosity::All);
    }

    #[test]
    fn command_absorbs_remaining_words() {
        let Outcome::Run(opts) =
            parse(["-e".to_string(), "quit".to_string()]) else { panic!("expected Run") };
        assert_eq!(opts.command.as_deref(), Some("quit"));
    }

    #[test]
    fn help_exits_zero() {
        matches!(parse(["--help".to_string()]), Outcome::Exit(0));
    }
}
