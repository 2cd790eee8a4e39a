//! Kestrel: a small imperative language compiled to register-machine bytecode.
//!
//! The [`Interpreter`] drives the three stages in order: compile source
//! into an unlinked program, link it into an [`Image`], then run the image
//! on a fresh [`VM`].
//!
//! # Example
//!
//! ```
//! use kestrel_lib::{Interpreter, Value};
//!
//! let mut interp = Interpreter::new();
//! interp.compile("x = 10; y = 3; print x % y;").unwrap();
//! interp.link().unwrap();
//! interp.run().unwrap();
//! assert_eq!(interp.printed(), [Value::Int(1)]);
//! ```

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod error;
mod interpreter;


pub use error::{Error, Result, UsageError};
pub use interpreter::{Interpreter, InterpreterBuilder};

pub use kestrel_bytecode::{Image, ImageError, dump};
pub use kestrel_compiler::{Diagnostics, DiagnosticsPrinter, LinkError, Program, Severity};
pub use kestrel_core::Colors;
pub use kestrel_vm::{
    FuelLimits, NoopTracer, PrintTracer, RunOutcome, RuntimeError, Tracer, VM, Value, Verbosity,
};

pub use kestrel_bytecode as bytecode;
pub use kestrel_compiler as compiler;
pub use kestrel_vm as vm;
