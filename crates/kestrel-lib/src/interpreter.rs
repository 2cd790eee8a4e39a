//! Stage-checked driver over compiler, linker and VM.

use std::path::Path;

use kestrel_bytecode::{CODE_SIZE, CodeBuffer, Image, PrintFormat, WORD, dump};
use kestrel_compiler::compile::{Constant, ValueType, dump_symbols};
use kestrel_compiler::{CodeBuilder, Diagnostics, Program, SymbolInfo};
use kestrel_core::Colors;
use kestrel_vm::{FuelLimits, NoopTracer, RunOutcome, Tracer, VM, VMBuilder, Value};

use crate::{Error, Result, UsageError};

enum Stage {
    Empty,
    Compiled(Program),
    Linked(Image),
}

pub struct InterpreterBuilder {
    vm: VMBuilder,
    code_limit: usize,
}

impl InterpreterBuilder {
    pub fn limits(mut self, limits: FuelLimits) -> Self {
        self.vm = self.vm.limits(limits);
        self
    }

    pub fn stack_size(mut self, bytes: usize) -> Self {
        self.vm = self.vm.stack_size(bytes);
        self
    }

    /// Bytes of code a compilation may emit.
    pub fn code_limit(mut self, bytes: usize) -> Self {
        self.code_limit = bytes;
        self
    }

    pub fn build(self) -> Interpreter {
        Interpreter {
            stage: Stage::Empty,
            vm: self.vm.build(),
            code_limit: self.code_limit,
            diagnostics: Diagnostics::new(),
            globals: Vec::new(),
            has_run: false,
        }
    }
}

/// One program's trip through the pipeline.
///
/// `compile` must succeed before `link`, and `link` before `run`; calling
/// them out of order fails with a [`UsageError`]. A new `compile` starts
/// over from scratch.
pub struct Interpreter {
    stage: Stage,
    vm: VM,
    code_limit: usize,
    diagnostics: Diagnostics,
    globals: Vec<SymbolInfo>,
    has_run: bool,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> InterpreterBuilder {
        InterpreterBuilder {
            vm: VM::builder(),
            code_limit: CODE_SIZE,
        }
    }

    /// Compile `source`, discarding whatever the interpreter held before.
    ///
    /// Returns the warnings on success. On failure the diagnostics are both
    /// in the error and in [`Interpreter::diagnostics`].
    pub fn compile(&mut self, source: &str) -> Result<&Diagnostics> {
        self.stage = Stage::Empty;
        self.globals.clear();
        self.has_run = false;

        let builder = CodeBuilder::with_code(CodeBuffer::with_limit(self.code_limit));
        match kestrel_compiler::compile_with(source, builder) {
            Ok((program, warnings)) => {
                self.diagnostics = warnings;
                self.globals = program.globals.clone();
                self.stage = Stage::Compiled(program);
                Ok(&self.diagnostics)
            }
            Err(e) => {
                self.diagnostics = match &e {
                    kestrel_compiler::Error::CompileFailed(d) => d.clone(),
                    _ => Diagnostics::new(),
                };
                Err(e.into())
            }
        }
    }

    pub fn compile_file(&mut self, path: impl AsRef<Path>) -> Result<&Diagnostics> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.compile(&source)
    }

    /// Resolve the compiled program into an executable image.
    pub fn link(&mut self) -> Result<&Image> {
        let program = match std::mem::replace(&mut self.stage, Stage::Empty) {
            Stage::Compiled(program) => program,
            Stage::Empty => return Err(UsageError::NotCompiled.into()),
            linked @ Stage::Linked(_) => {
                self.stage = linked;
                return Err(UsageError::AlreadyLinked.into());
            }
        };

        let image = kestrel_compiler::link(program)?;
        self.stage = Stage::Linked(image);
        self.image().ok_or_else(|| UsageError::NotLinked.into())
    }

    /// Adopt an already linked image, e.g. one loaded from disk.
    ///
    /// Symbol information does not survive persistence, so
    /// [`Interpreter::global`] finds nothing afterwards.
    pub fn load_image(&mut self, image: Image) {
        self.stage = Stage::Linked(image);
        self.diagnostics = Diagnostics::new();
        self.globals.clear();
        self.has_run = false;
    }

    pub fn run(&mut self) -> Result<RunOutcome> {
        self.run_with(&mut NoopTracer)
    }

    /// Run the linked image from a clean register file and stack.
    pub fn run_with<T: Tracer>(&mut self, tracer: &mut T) -> Result<RunOutcome> {
        let Stage::Linked(image) = &self.stage else {
            return Err(UsageError::NotLinked.into());
        };
        self.has_run = false;
        let outcome = self.vm.execute_with(image, tracer)?;
        self.has_run = true;
        Ok(outcome)
    }

    /// Listing of the current code: unresolved before `link`, resolved after.
    pub fn disassemble(&self, colors: Colors) -> Result<String> {
        match &self.stage {
            Stage::Empty => Err(UsageError::NotCompiled.into()),
            Stage::Compiled(program) => Ok(program.dump(colors)),
            Stage::Linked(image) => {
                let mut out = dump(image, colors);
                out.push('\n');
                out.push_str(&dump_symbols(&self.globals, colors));
                Ok(out)
            }
        }
    }

    /// Value of a top-level name after a completed run.
    ///
    /// Constants are answered without running.
    pub fn global(&self, name: &str) -> Option<Value> {
        let sym = self.globals.iter().find(|s| s.name == name)?;
        if let Some(constant) = sym.constant {
            return Some(match constant {
                Constant::Int(v) => Value::Int(v),
                Constant::Float(v) => Value::Float(v),
                Constant::Bool(b) => Value::Int(b as i32),
            });
        }
        if !self.has_run {
            return None;
        }

        // The prologue pushes the caller's ebp, so slots hang below top - WORD.
        let frame_base = self.vm.stack().top() - WORD as i32;
        let word = self.vm.read_word(frame_base - sym.offset)?;
        let format = match sym.ty {
            ValueType::Float => PrintFormat::Float,
            ValueType::Int | ValueType::Bool => PrintFormat::Int,
        };
        Some(Value::from_word(word, format))
    }

    /// Warnings of the last successful compile, or errors of the last failed one.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn program(&self) -> Option<&Program> {
        match &self.stage {
            Stage::Compiled(program) => Some(program),
            _ => None,
        }
    }

    pub fn image(&self) -> Option<&Image> {
        match &self.stage {
            Stage::Linked(image) => Some(image),
            _ => None,
        }
    }

    pub fn globals(&self) -> &[SymbolInfo] {
        &self.globals
    }

    /// Values printed by the last run, including one that faulted.
    pub fn printed(&self) -> &[Value] {
        self.vm.printed()
    }

    pub fn vm(&self) -> &VM {
        &self.vm
    }
}
