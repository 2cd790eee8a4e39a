use std::path::PathBuf;

use kestrel_lib::Interpreter;

use super::program_loader::{load_program, prepare};

pub struct BuildArgs {
    pub program_path: Option<PathBuf>,
    pub eval_text: Option<String>,
    pub output: Option<PathBuf>,
    pub color: bool,
}

pub fn run(args: BuildArgs) {
    let Some(output) = args.output else {
        eprintln!("error: -o/--output is required when the program is not a file");
        std::process::exit(1);
    };

    let input = load_program(args.program_path.as_deref(), args.eval_text.as_deref())
        .unwrap_or_else(|msg| {
            eprintln!("error: {}", msg);
            std::process::exit(1);
        });

    let interp = prepare(&input, Interpreter::builder(), args.color);
    let Some(image) = interp.image() else {
        eprintln!("error: program did not link");
        std::process::exit(1);
    };

    if let Err(e) = image.save(&output) {
        eprintln!("error: failed to write '{}': {}", output.display(), e);
        std::process::exit(1);
    }
}
