use std::path::PathBuf;

use kestrel_lib::{Colors, Interpreter, dump};

use super::program_loader::{ProgramInput, compile_or_exit, load_program};

pub struct DumpArgs {
    pub program_path: Option<PathBuf>,
    pub eval_text: Option<String>,
    pub unlinked: bool,
    pub color: bool,
}

pub fn run(args: DumpArgs) {
    let input = load_program(args.program_path.as_deref(), args.eval_text.as_deref())
        .unwrap_or_else(|msg| {
            eprintln!("error: {}", msg);
            std::process::exit(1);
        });
    let colors = Colors::new(args.color);

    let (name, text) = match &input {
        ProgramInput::Image(image) => {
            print!("{}", dump(image, colors));
            return;
        }
        ProgramInput::Source { name, text } => (name, text),
    };

    let mut interp = Interpreter::new();
    compile_or_exit(&mut interp, name, text, args.color);
    if !args.unlinked
        && let Err(e) = interp.link()
    {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }

    match interp.disassemble(colors) {
        Ok(listing) => print!("{}", listing),
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    }
}
