use crate::parser::RecoveryMode;
use clap::{Arg, ArgAction, ArgMatches, Command};
use tracing::Level;

/// How diagnostics are written to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderStyle {
    /// Source snippets with labels, via `ariadne`.
    #[default]
    Annotated,
    /// Headline, detail and hint as plain text.
    Plain,
}

/// Settings shared by the file runner, `--expr` and the REPL.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunConfig {
    pub recovery: RecoveryMode,
    pub render: RenderStyle,
    pub dump_ast: bool,
    pub verbosity: u8,
}

impl RunConfig {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        let recovery = match matches.get_one::<String>("recovery").map(String::as_str) {
            Some("best-effort") => RecoveryMode::BestEffort,
            _ => RecoveryMode::Strict,
        };
        let render = if matches.get_flag("plain") {
            RenderStyle::Plain
        } else {
            RenderStyle::Annotated
        };

        Self {
            recovery,
            render,
            dump_ast: matches.get_flag("dump-ast"),
            verbosity: matches.get_count("verbose"),
        }
    }

    /// Log level for the `tracing` subscriber; warnings are always shown.
    pub fn log_level(&self) -> Level {
        match self.verbosity {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}

pub fn command() -> Command {
    Command::new("tinypas")
        .about("An interpreter for a small Pascal subset with friendly diagnostics")
        .arg(
            Arg::new("file")
                .help("The program file to execute")
                .value_name("FILE")
                .index(1),
        )
        .arg(
            Arg::new("expr")
                .short('e')
                .long("expr")
                .value_name("EXPR")
                .help("Evaluate a single integer expression and print the result")
                .conflicts_with("file"),
        )
        .arg(
            Arg::new("interactive")
                .short('i')
                .long("interactive")
                .help("Start in interactive REPL mode")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("recovery")
                .long("recovery")
                .value_name("MODE")
                .help("How to handle syntax errors inside 'begin ... end'")
                .value_parser(["strict", "best-effort"])
                .default_value("strict"),
        )
        .arg(
            Arg::new("dump-ast")
                .long("dump-ast")
                .help("Print the parsed program back as source before running it")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("plain")
                .long("plain")
                .help("Report diagnostics as plain text instead of annotated source")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Increase log output (-v info, -vv debug, -vvv trace)")
                .action(ArgAction::Count),
        )
}
