//! Command builders for the CLI.
//!
//! Each command is built from the shared arg builders in `args.rs`.
//! dump/build/exec/trace accept each other's runtime flags, with the ones a
//! command ignores hidden from `--help`.

use clap::Command;

use super::args::*;

/// Add hidden build args (for commands that don't write an image).
fn with_hidden_build_args(cmd: Command) -> Command {
    cmd.arg(output_file_arg().hide(true))
}

/// Add hidden exec output args (for commands that don't report JSON).
fn with_hidden_exec_args(cmd: Command) -> Command {
    cmd.arg(json_arg().hide(true))
        .arg(compact_arg().hide(true))
}

/// Add hidden trace args (for commands that don't run).
fn with_hidden_trace_args(cmd: Command) -> Command {
    cmd.arg(verbose_arg().hide(true))
        .arg(fuel_arg().hide(true))
}

/// Build the complete CLI with all subcommands.
pub fn build_cli() -> Command {
    Command::new("kestrel")
        .about("Compile, inspect and run Kestrel programs")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(check_command())
        .subcommand(dump_command())
        .subcommand(build_command())
        .subcommand(exec_command())
        .subcommand(trace_command())
}

/// Compile a program and report diagnostics.
pub fn check_command() -> Command {
    Command::new("check")
        .about("Compile a program and report diagnostics")
        .override_usage(
            "\
  kestrel check <PROGRAM>
  kestrel check -e <TEXT>",
        )
        .after_help(
            r#"EXAMPLES:
  kestrel check prog.kst              # errors and warnings
  kestrel check prog.kst --strict     # fail on warnings too
  kestrel check -e 'x = 1; print x;'  # inline program"#,
        )
        .arg(program_path_arg())
        .arg(eval_arg())
        .arg(strict_arg())
        .arg(color_arg())
}

/// Show compiled bytecode.
///
/// Accepts all runtime flags for a unified CLI experience, but only uses
/// program/unlinked/color.
pub fn dump_command() -> Command {
    let cmd = Command::new("dump")
        .about("Show compiled bytecode")
        .override_usage(
            "\
  kestrel dump <PROGRAM>
  kestrel dump -e <TEXT> [--unlinked]",
        )
        .after_help(
            r#"EXAMPLES:
  kestrel dump prog.kst               # linked listing and symbols
  kestrel dump prog.kst --unlinked    # before link (forward jumps as ????)
  kestrel dump prog.kbc               # built image"#,
        )
        .arg(program_path_arg())
        .arg(eval_arg())
        .arg(unlinked_arg())
        .arg(color_arg());

    with_hidden_build_args(with_hidden_trace_args(with_hidden_exec_args(cmd)))
}

/// Compile and link a program into an image file.
pub fn build_command() -> Command {
    let cmd = Command::new("build")
        .about("Compile and link a program into an image file")
        .override_usage(
            "\
  kestrel build <PROGRAM> [-o <FILE>]
  kestrel build -e <TEXT> -o <FILE>",
        )
        .after_help(
            r#"EXAMPLES:
  kestrel build prog.kst              # writes prog.kbc
  kestrel build prog.kst -o out.kbc
  kestrel exec out.kbc                # run the image"#,
        )
        .arg(program_path_arg())
        .arg(eval_arg())
        .arg(output_file_arg())
        .arg(color_arg());

    with_hidden_trace_args(with_hidden_exec_args(cmd))
}

/// Run a program and print its output.
///
/// Accepts trace flags for a unified CLI experience, but ignores -v.
pub fn exec_command() -> Command {
    let cmd = Command::new("exec")
        .about("Run a program and print its output")
        .override_usage(
            "\
  kestrel exec <PROGRAM>
  kestrel exec -e <TEXT>",
        )
        .after_help(
            r#"EXAMPLES:
  kestrel exec prog.kst               # one printed value per line
  kestrel exec prog.kbc --json        # JSON report
  kestrel exec -e 'print 6 * 7;'      # inline program"#,
        )
        .arg(program_path_arg())
        .arg(eval_arg())
        .arg(json_arg())
        .arg(compact_arg())
        .arg(fuel_arg())
        .arg(color_arg());

    with_hidden_build_args(cmd.arg(verbose_arg().hide(true)))
}

/// Trace execution instruction by instruction.
///
/// Accepts exec output flags for a unified CLI experience, but ignores them.
pub fn trace_command() -> Command {
    let cmd = Command::new("trace")
        .about("Trace execution instruction by instruction")
        .override_usage(
            "\
  kestrel trace <PROGRAM> [-v|-vv]
  kestrel trace -e <TEXT> [-v|-vv]",
        )
        .after_help(
            r#"EXAMPLES:
  kestrel trace prog.kst              # instructions and printed values
  kestrel trace prog.kst -v           # plus register writes
  kestrel trace prog.kst -vv          # plus stack stores and frame registers"#,
        )
        .arg(program_path_arg())
        .arg(eval_arg())
        .arg(verbose_arg())
        .arg(fuel_arg())
        .arg(color_arg());

    with_hidden_build_args(with_hidden_exec_args(cmd))
}
