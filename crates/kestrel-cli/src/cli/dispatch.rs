//! Dispatch logic: extract params from ArgMatches and convert to command args.
//!
//! - `*Params` structs mirror command `*Args` but are populated from clap
//! - `from_matches()` pulls the fields a command uses, ignoring hidden ones
//! - `Into<*Args>` impls bridge dispatch and the command handlers

use std::path::PathBuf;

use clap::ArgMatches;
use kestrel_lib::Verbosity;

use super::ColorChoice;
use crate::commands::build::BuildArgs;
use crate::commands::check::CheckArgs;
use crate::commands::dump::DumpArgs;
use crate::commands::exec::ExecArgs;
use crate::commands::trace::TraceArgs;

const DEFAULT_FUEL: u32 = 1_000_000;

pub struct CheckParams {
    pub program_path: Option<PathBuf>,
    pub eval_text: Option<String>,
    pub strict: bool,
    pub color: ColorChoice,
}

impl CheckParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            program_path: m.get_one::<PathBuf>("program_path").cloned(),
            eval_text: m.get_one::<String>("eval_text").cloned(),
            strict: m.get_flag("strict"),
            color: parse_color(m),
        }
    }
}

impl From<CheckParams> for CheckArgs {
    fn from(p: CheckParams) -> Self {
        Self {
            program_path: p.program_path,
            eval_text: p.eval_text,
            strict: p.strict,
            color: p.color.should_colorize(),
        }
    }
}

pub struct DumpParams {
    pub program_path: Option<PathBuf>,
    pub eval_text: Option<String>,
    pub unlinked: bool,
    pub color: ColorChoice,
    // Note: output, json, compact, verbose, fuel are parsed but not extracted
}

impl DumpParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            program_path: m.get_one::<PathBuf>("program_path").cloned(),
            eval_text: m.get_one::<String>("eval_text").cloned(),
            unlinked: m.get_flag("unlinked"),
            color: parse_color(m),
        }
    }
}

impl From<DumpParams> for DumpArgs {
    fn from(p: DumpParams) -> Self {
        Self {
            program_path: p.program_path,
            eval_text: p.eval_text,
            unlinked: p.unlinked,
            color: p.color.should_colorize(),
        }
    }
}

pub struct BuildParams {
    pub program_path: Option<PathBuf>,
    pub eval_text: Option<String>,
    pub output: Option<PathBuf>,
    pub color: ColorChoice,
}

impl BuildParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            program_path: m.get_one::<PathBuf>("program_path").cloned(),
            eval_text: m.get_one::<String>("eval_text").cloned(),
            output: m.get_one::<PathBuf>("output").cloned(),
            color: parse_color(m),
        }
    }

    /// Explicit `-o`, else the program path with a `.kbc` extension.
    pub fn output_path(&self) -> Option<PathBuf> {
        if let Some(out) = &self.output {
            return Some(out.clone());
        }
        self.program_path
            .as_ref()
            .filter(|p| p.as_os_str() != "-")
            .map(|p| p.with_extension("kbc"))
    }
}

impl From<BuildParams> for BuildArgs {
    fn from(p: BuildParams) -> Self {
        let output = p.output_path();
        Self {
            program_path: p.program_path,
            eval_text: p.eval_text,
            output,
            color: p.color.should_colorize(),
        }
    }
}

pub struct ExecParams {
    pub program_path: Option<PathBuf>,
    pub eval_text: Option<String>,
    pub json: bool,
    pub compact: bool,
    pub fuel: u32,
    pub color: ColorChoice,
}

impl ExecParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            program_path: m.get_one::<PathBuf>("program_path").cloned(),
            eval_text: m.get_one::<String>("eval_text").cloned(),
            json: m.get_flag("json"),
            compact: m.get_flag("compact"),
            fuel: parse_fuel(m),
            color: parse_color(m),
        }
    }
}

impl From<ExecParams> for ExecArgs {
    fn from(p: ExecParams) -> Self {
        // Pretty by default when stdout is a TTY, unless --compact is passed
        let pretty = !p.compact && std::io::IsTerminal::is_terminal(&std::io::stdout());

        Self {
            program_path: p.program_path,
            eval_text: p.eval_text,
            json: p.json,
            pretty,
            fuel: p.fuel,
            color: p.color.should_colorize(),
        }
    }
}

pub struct TraceParams {
    pub program_path: Option<PathBuf>,
    pub eval_text: Option<String>,
    pub verbose: u8,
    pub fuel: u32,
    pub color: ColorChoice,
}

impl TraceParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            program_path: m.get_one::<PathBuf>("program_path").cloned(),
            eval_text: m.get_one::<String>("eval_text").cloned(),
            verbose: m.get_count("verbose"),
            fuel: parse_fuel(m),
            color: parse_color(m),
        }
    }

    pub fn verbosity(&self) -> Verbosity {
        match self.verbose {
            0 => Verbosity::Default,
            1 => Verbosity::Verbose,
            _ => Verbosity::VeryVerbose,
        }
    }
}

impl From<TraceParams> for TraceArgs {
    fn from(p: TraceParams) -> Self {
        Self {
            verbosity: p.verbosity(),
            program_path: p.program_path,
            eval_text: p.eval_text,
            fuel: p.fuel,
            color: p.color.should_colorize(),
        }
    }
}

/// Parse --color flag into ColorChoice.
fn parse_color(m: &ArgMatches) -> ColorChoice {
    match m.get_one::<String>("color").map(|s| s.as_str()) {
        Some("always") => ColorChoice::Always,
        Some("never") => ColorChoice::Never,
        _ => ColorChoice::Auto,
    }
}

fn parse_fuel(m: &ArgMatches) -> u32 {
    m.get_one::<u32>("fuel").copied().unwrap_or(DEFAULT_FUEL)
}
