//! Trace execution for debugging.

use std::path::PathBuf;

use kestrel_lib::{Colors, FuelLimits, Interpreter, PrintTracer, Verbosity};

use super::program_loader::{load_program, prepare};

pub struct TraceArgs {
    pub program_path: Option<PathBuf>,
    pub eval_text: Option<String>,
    pub verbosity: Verbosity,
    pub fuel: u32,
    pub color: bool,
}

pub fn run(args: TraceArgs) {
    let input = load_program(args.program_path.as_deref(), args.eval_text.as_deref())
        .unwrap_or_else(|msg| {
            eprintln!("error: {}", msg);
            std::process::exit(1);
        });

    let builder = Interpreter::builder().limits(FuelLimits::new().exec_fuel(args.fuel));
    let mut interp = prepare(&input, builder, args.color);
    let mut tracer = PrintTracer::new(args.verbosity, Colors::new(args.color));

    let result = interp.run_with(&mut tracer);
    tracer.print();

    // The fault line is already part of the trace.
    if result.is_err() {
        std::process::exit(2);
    }
}
