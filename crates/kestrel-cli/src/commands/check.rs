use std::path::PathBuf;

use kestrel_lib::Interpreter;

use super::program_loader::{load_program, render_diagnostics};

pub struct CheckArgs {
    pub program_path: Option<PathBuf>,
    pub eval_text: Option<String>,
    pub strict: bool,
    pub color: bool,
}

pub fn run(args: CheckArgs) {
    let input = load_program(args.program_path.as_deref(), args.eval_text.as_deref())
        .unwrap_or_else(|msg| {
            eprintln!("error: {}", msg);
            std::process::exit(1);
        });

    let Some((name, text)) = input.as_source() else {
        eprintln!("error: check expects source text, got a built image");
        std::process::exit(1);
    };

    let mut interp = Interpreter::new();
    let failed = match interp.compile(text) {
        Ok(warnings) => args.strict && warnings.has_warnings(),
        Err(e) if e.diagnostics().is_none() => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
        Err(_) => true,
    };

    let diagnostics = interp.diagnostics();
    if !diagnostics.is_empty() {
        eprint!("{}", render_diagnostics(diagnostics, name, text, args.color));
    }
    if failed {
        std::process::exit(1);
    }

    // Silent on success (like cargo check)
}
