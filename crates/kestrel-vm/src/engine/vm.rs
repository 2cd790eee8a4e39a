//! Virtual machine executing a linked image.

use kestrel_bytecode::{
    BinaryOp, ENTRY_SIZE, Image, Instruction, Move, Reg, STACK_SIZE, Source, Special, WORD,
    written_registers,
};

use super::error::RuntimeError;
use super::registers::Registers;
use super::stack::Stack;
use super::trace::{NoopTracer, Tracer};
use super::value::Value;

/// Runtime limits for execution.
#[derive(Clone, Copy, Debug)]
pub struct FuelLimits {
    /// Maximum instructions executed (default: 1,000,000).
    pub exec_fuel: u32,
}

impl Default for FuelLimits {
    fn default() -> Self {
        Self {
            exec_fuel: 1_000_000,
        }
    }
}

impl FuelLimits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exec_fuel(mut self, fuel: u32) -> Self {
        self.exec_fuel = fuel;
        self
    }
}

/// Builder for [`VM`].
#[derive(Clone, Copy, Debug)]
pub struct VMBuilder {
    limits: FuelLimits,
    stack_size: usize,
}

impl VMBuilder {
    pub fn limits(mut self, limits: FuelLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Stack memory in bytes, clamped to what an `i32` address can reach.
    pub fn stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = bytes.min(i32::MAX as usize);
        self
    }

    pub fn build(self) -> VM {
        VM {
            regs: Registers::default(),
            stack: Stack::new(self.stack_size),
            printed: Vec::new(),
            steps: 0,
            limits: self.limits,
        }
    }
}

/// State after the instruction pointer reached the end of the code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunOutcome {
    pub registers: Registers,
    pub steps: u32,
}

/// Virtual machine: register file, stack memory, and the values printed so
/// far. Each `execute` starts from a clean state.
pub struct VM {
    regs: Registers,
    stack: Stack,
    printed: Vec<Value>,
    steps: u32,
    limits: FuelLimits,
}

impl Default for VM {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl VM {
    pub fn builder() -> VMBuilder {
        VMBuilder {
            limits: FuelLimits::default(),
            stack_size: STACK_SIZE,
        }
    }

    pub fn registers(&self) -> &Registers {
        &self.regs
    }

    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    /// Values printed by the last run, including one that faulted.
    pub fn printed(&self) -> &[Value] {
        &self.printed
    }

    /// Instructions completed by the last run.
    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// Word at stack address `addr`.
    pub fn read_word(&self, addr: i32) -> Option<i32> {
        self.stack.read(addr)
    }

    /// Execute from the image entry to its end.
    ///
    /// This is a convenience method that uses `NoopTracer`, which gets
    /// completely optimized away at compile time.
    pub fn execute(&mut self, image: &Image) -> Result<RunOutcome, RuntimeError> {
        self.execute_with(image, &mut NoopTracer)
    }

    /// Execute with a tracer for debugging.
    pub fn execute_with<T: Tracer>(
        &mut self,
        image: &Image,
        tracer: &mut T,
    ) -> Result<RunOutcome, RuntimeError> {
        self.reset(image.entry());
        let result = self.run(image, tracer);
        match &result {
            Ok(outcome) => tracer.trace_halt(&outcome.registers, outcome.steps),
            Err(e) => tracer.trace_fault(e),
        }
        result
    }

    fn reset(&mut self, entry: u32) {
        self.stack.clear();
        self.regs = Registers::new(self.stack.top(), entry);
        self.printed.clear();
        self.steps = 0;
    }

    fn run<T: Tracer>(&mut self, image: &Image, tracer: &mut T) -> Result<RunOutcome, RuntimeError> {
        let end = image.end();
        let mut fuel = self.limits.exec_fuel;

        while self.regs.eip < end {
            let addr = self.regs.eip;
            if fuel == 0 {
                return Err(RuntimeError::ExecFuelExhausted {
                    addr,
                    limit: self.limits.exec_fuel,
                });
            }
            fuel -= 1;

            let instr = image
                .decode_at(addr)
                .map_err(|source| RuntimeError::InvalidInstruction { addr, source })?;
            tracer.trace_instruction(addr, &instr);

            self.regs.eip = self.step(addr, instr, end, tracer)?;
            self.steps += 1;

            for reg in written_registers(&instr) {
                tracer.trace_write(reg, self.regs.get(reg));
            }
        }

        Ok(RunOutcome {
            registers: self.regs,
            steps: self.steps,
        })
    }

    /// Execute one instruction; returns the address of the next one.
    fn step<T: Tracer>(
        &mut self,
        addr: u32,
        instr: Instruction,
        end: u32,
        tracer: &mut T,
    ) -> Result<u32, RuntimeError> {
        let next = addr + ENTRY_SIZE as u32;
        match instr {
            Instruction::Special(special) => self.exec_special(addr, special, tracer)?,
            Instruction::Push(reg) => self.push(addr, self.regs.get(reg))?,
            Instruction::PushAdd(reg, imm) => {
                self.push(addr, self.regs.get(reg).wrapping_add(imm))?
            }
            Instruction::Pop(reg) => {
                // `pop ebp` closes the frame.
                if reg == Reg::Esp {
                    return Err(reserved(addr, reg, "pop"));
                }
                let value = self.pop(addr)?;
                self.regs.set(reg, value);
            }
            Instruction::Mov(m) => self.exec_move(addr, m, tracer)?,
            Instruction::Binary { op, dst, src } => self.exec_binary(addr, op, dst, src)?,
            Instruction::Unary { op, reg } => {
                self.data_register(addr, reg, op.mnemonic())?;
                self.regs.set(reg, op.eval(self.regs.get(reg)));
            }
            Instruction::JumpIfZero { cond, target } => {
                self.data_register(addr, cond, "jz")?;
                if self.regs.get(cond) == 0 {
                    return self.jump(addr, target, end);
                }
            }
            Instruction::JumpIfNonZero { cond, target } => {
                self.data_register(addr, cond, "jnz")?;
                if self.regs.get(cond) != 0 {
                    return self.jump(addr, target, end);
                }
            }
            Instruction::Jump { target } => return self.jump(addr, target, end),
        }
        Ok(next)
    }

    fn exec_special<T: Tracer>(
        &mut self,
        addr: u32,
        special: Special,
        tracer: &mut T,
    ) -> Result<(), RuntimeError> {
        let (word, format) = match special {
            Special::Print { reg, format } => {
                self.data_register(addr, reg, "print")?;
                (self.regs.get(reg), format)
            }
            Special::PrintMem { reg, format } => (self.load(addr, self.regs.get(reg))?, format),
        };
        let value = Value::from_word(word, format);
        self.printed.push(value);
        tracer.trace_print(value);
        Ok(())
    }

    fn exec_move<T: Tracer>(&mut self, addr: u32, m: Move, tracer: &mut T) -> Result<(), RuntimeError> {
        match m {
            Move::RegImm { dst, imm } => {
                self.data_register(addr, dst, "mov")?;
                self.regs.set(dst, imm);
            }
            // `mov ebp, esp` opens the frame.
            Move::RegReg {
                dst: Reg::Ebp,
                src: Reg::Esp,
            } => self.regs.ebp = self.regs.esp,
            Move::RegReg { dst, src } => {
                self.data_register(addr, dst, "mov")?;
                self.regs.set(dst, self.regs.get(src));
            }
            Move::RegMem { dst, offset } => {
                self.data_register(addr, dst, "mov")?;
                let value = self.load(addr, self.slot(offset))?;
                self.regs.set(dst, value);
            }
            Move::MemReg { offset, src } => {
                let target = self.slot(offset);
                let value = self.regs.get(src);
                self.store(addr, target, value)?;
                tracer.trace_store(target, value);
            }
            Move::MemMem { dst, src } => {
                let value = self.load(addr, self.slot(src))?;
                let target = self.slot(dst);
                self.store(addr, target, value)?;
                tracer.trace_store(target, value);
            }
        }
        Ok(())
    }

    fn exec_binary(
        &mut self,
        addr: u32,
        op: BinaryOp,
        dst: Reg,
        src: Source,
    ) -> Result<(), RuntimeError> {
        let rhs = match src {
            Source::Imm(v) => v,
            Source::Reg(reg) => {
                self.data_register(addr, reg, op.mnemonic())?;
                self.regs.get(reg)
            }
        };
        // Frame setup and teardown move the stack pointers by a constant.
        let frame_adjust = matches!(op, BinaryOp::Add | BinaryOp::Sub) && matches!(src, Source::Imm(_));
        if !frame_adjust {
            self.data_register(addr, dst, op.mnemonic())?;
        }

        let value = op
            .eval(self.regs.get(dst), rhs)
            .ok_or(RuntimeError::DivisionByZero { addr })?;
        if dst == Reg::Esp {
            self.check_stack_pointer(addr, value)?;
        }
        self.regs.set(dst, value);
        Ok(())
    }

    fn data_register(&self, addr: u32, reg: Reg, mnemonic: &'static str) -> Result<(), RuntimeError> {
        if reg.is_reserved() {
            return Err(reserved(addr, reg, mnemonic));
        }
        Ok(())
    }


    fn jump(&self, addr: u32, target: i32, end: u32) -> Result<u32, RuntimeError> {
        let valid = target >= 0 && target as u32 <= end && target as usize % ENTRY_SIZE == 0;
        if !valid {
            return Err(RuntimeError::InvalidJumpTarget { addr, target });
        }
        Ok(target as u32)
    }

    /// Address of the variable slot `[ebp - offset]`.
    fn slot(&self, offset: i32) -> i32 {
        self.regs.ebp.wrapping_sub(offset)
    }

    fn load(&self, addr: u32, target: i32) -> Result<i32, RuntimeError> {
        self.stack
            .read(target)
            .ok_or(RuntimeError::MemoryOutOfBounds { addr, target })
    }

    fn store(&mut self, addr: u32, target: i32, value: i32) -> Result<(), RuntimeError> {
        if self.stack.write(target, value) {
            Ok(())
        } else {
            Err(RuntimeError::MemoryOutOfBounds { addr, target })
        }
    }

    fn check_stack_pointer(&self, addr: u32, esp: i32) -> Result<(), RuntimeError> {
        if esp < 0 {
            return Err(RuntimeError::StackOverflow { addr });
        }
        if esp > self.stack.top() {
            return Err(RuntimeError::StackUnderflow { addr });
        }
        Ok(())
    }

    fn push(&mut self, addr: u32, value: i32) -> Result<(), RuntimeError> {
        let esp = match self.regs.esp.checked_sub(WORD as i32) {
            Some(esp) if esp >= 0 => esp,
            _ => return Err(RuntimeError::StackOverflow { addr }),
        };
        self.store(addr, esp, value)?;
        self.regs.esp = esp;
        Ok(())
    }

    fn pop(&mut self, addr: u32) -> Result<i32, RuntimeError> {
        let esp = self.regs.esp;
        let next = match esp.checked_add(WORD as i32) {
            Some(next) if next <= self.stack.top() => next,
            _ => return Err(RuntimeError::StackUnderflow { addr }),
        };
        let value = self.load(addr, esp)?;
        self.regs.esp = next;
        Ok(value)
    }
}

fn reserved(addr: u32, reg: Reg, mnemonic: &'static str) -> RuntimeError {
    RuntimeError::ReservedRegister {
        addr,
        reg,
        mnemonic,
    }
}
