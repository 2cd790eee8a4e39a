//! Shared input handling: every command takes a source file, a built image,
//! stdin, or inline text.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use kestrel_lib::bytecode::MAGIC;
use kestrel_lib::{Diagnostics, Image, Interpreter, InterpreterBuilder};

/// What the user handed us.
pub enum ProgramInput {
    Source { name: String, text: String },
    Image(Image),
}

impl ProgramInput {
    pub fn as_source(&self) -> Option<(&str, &str)> {
        match self {
            Self::Source { name, text } => Some((name, text)),
            Self::Image(_) => None,
        }
    }
}

pub fn load_program(
    program_path: Option<&Path>,
    eval_text: Option<&str>,
) -> Result<ProgramInput, String> {
    if let Some(text) = eval_text {
        return Ok(ProgramInput::Source {
            name: "<eval>".to_owned(),
            text: text.to_owned(),
        });
    }

    let Some(path) = program_path else {
        return Err("program is required: use a positional path or -e/--eval".to_owned());
    };

    let (name, bytes) = if path.as_os_str() == "-" {
        let mut buf = Vec::new();
        io::stdin()
            .read_to_end(&mut buf)
            .map_err(|e| format!("failed to read stdin: {e}"))?;
        ("<stdin>".to_owned(), buf)
    } else {
        let bytes =
            fs::read(path).map_err(|e| format!("failed to read '{}': {e}", path.display()))?;
        (path.display().to_string(), bytes)
    };

    classify(name, bytes)
}

/// Images are recognized by their magic, not their extension.
pub fn classify(name: String, bytes: Vec<u8>) -> Result<ProgramInput, String> {
    if bytes.starts_with(&MAGIC) {
        let image = Image::from_bytes(&bytes).map_err(|e| format!("{name}: {e}"))?;
        return Ok(ProgramInput::Image(image));
    }
    let text = String::from_utf8(bytes).map_err(|_| format!("{name}: not valid UTF-8"))?;
    Ok(ProgramInput::Source { name, text })
}

pub fn render_diagnostics(diagnostics: &Diagnostics, name: &str, text: &str, color: bool) -> String {
    diagnostics
        .printer()
        .source(text)
        .path(name)
        .colored(color)
        .render()
}

/// Compile and link, or adopt the image as is. Exits on failure.
pub fn prepare(input: &ProgramInput, builder: InterpreterBuilder, color: bool) -> Interpreter {
    let mut interp = builder.build();
    match input {
        ProgramInput::Image(image) => interp.load_image(image.clone()),
        ProgramInput::Source { name, text } => {
            compile_or_exit(&mut interp, name, text, color);
            if let Err(e) = interp.link() {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
    }
    interp
}

/// Compile, echoing warnings to stderr. Exits with the rendered errors on failure.
pub fn compile_or_exit(interp: &mut Interpreter, name: &str, text: &str, color: bool) {
    match interp.compile(text) {
        Ok(warnings) => {
            if !warnings.is_empty() {
                eprint!("{}", render_diagnostics(warnings, name, text, color));
            }
        }
        Err(e) => {
            match e.diagnostics() {
                Some(d) => eprint!("{}", render_diagnostics(d, name, text, color)),
                None => eprintln!("error: {e}"),
            }
            std::process::exit(1);
        }
    }
}
