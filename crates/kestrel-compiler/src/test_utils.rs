use kestrel_bytecode::{Image, dump_code};
use kestrel_core::Colors;

use crate::{Diagnostics, Error, Program, compile, link};

/// Compile a source that must succeed.
#[track_caller]
pub fn compile_ok(source: &str) -> (Program, Diagnostics) {
    match compile(source) {
        Ok(result) => result,
        Err(Error::CompileFailed(diagnostics)) => {
            panic!("expected success, got:\n{}", diagnostics.printer().render())
        }
        Err(e) => panic!("expected success, got {e}"),
    }
}

/// Unlinked listing of a source that must compile.
#[track_caller]
pub fn listing(source: &str) -> String {
    let (program, _) = compile_ok(source);
    dump_code(program.code.as_bytes(), Colors::OFF)
}

/// Compile and link a source that must succeed at both.
#[track_caller]
pub fn image(source: &str) -> Image {
    let (program, _) = compile_ok(source);
    link(program).unwrap()
}

/// Plain diagnostics of a source that must fail to compile.
#[track_caller]
pub fn errors(source: &str) -> String {
    match compile(source) {
        Err(Error::CompileFailed(diagnostics)) => diagnostics.printer().render(),
        Err(e) => panic!("expected diagnostics, got {e}"),
        Ok(_) => panic!("expected diagnostics, compiled cleanly"),
    }
}

/// Plain warnings of a source that compiles.
#[track_caller]
pub fn warnings(source: &str) -> String {
    compile_ok(source).1.printer().render()
}
