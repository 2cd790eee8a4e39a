use kestrel_bytecode::{
    BinaryOp, CodeBuffer, Image, Instruction, Move, PrintFormat, Reg, STACK_SIZE, Source, Special,
};

use super::*;

fn image(instrs: &[Instruction]) -> Image {
    let mut code = CodeBuffer::new();
    for instr in instrs {
        code.push(*instr).unwrap();
    }
    Image::new(code.into_bytes(), 0).unwrap()
}

fn mov(dst: Reg, imm: i32) -> Instruction {
    Instruction::Mov(Move::RegImm { dst, imm })
}

fn bin(op: BinaryOp, dst: Reg, src: Source) -> Instruction {
    Instruction::Binary { op, dst, src }
}

fn print(reg: Reg) -> Instruction {
    Instruction::Special(Special::Print {
        reg,
        format: PrintFormat::Int,
    })
}

fn prologue(frame: i32) -> [Instruction; 3] {
    [
        Instruction::Push(Reg::Ebp),
        Instruction::Mov(Move::RegReg {
            dst: Reg::Ebp,
            src: Reg::Esp,
        }),
        bin(BinaryOp::Sub, Reg::Esp, Source::Imm(frame)),
    ]
}

fn epilogue(frame: i32) -> [Instruction; 2] {
    [
        bin(BinaryOp::Add, Reg::Esp, Source::Imm(frame)),
        Instruction::Pop(Reg::Ebp),
    ]
}

#[test]
fn arithmetic_and_print() {
    let image = image(&[
        mov(Reg::Eax, 10),
        mov(Reg::Ebx, 3),
        bin(BinaryOp::Mod, Reg::Eax, Source::Reg(Reg::Ebx)),
        print(Reg::Eax),
    ]);
    let mut vm = VM::default();
    let outcome = vm.execute(&image).unwrap();

    assert_eq!(vm.printed(), [Value::Int(1)]);
    assert_eq!(outcome.registers.get(Reg::Eax), 1);
    assert_eq!(outcome.steps, 4);
}

#[test]
fn comparisons_write_booleans() {
    let image = image(&[
        mov(Reg::Eax, 2),
        bin(BinaryOp::SetL, Reg::Eax, Source::Imm(3)),
        mov(Reg::Ebx, 2),
        bin(BinaryOp::SetG, Reg::Ebx, Source::Imm(3)),
        Instruction::Unary {
            op: kestrel_bytecode::UnaryOp::Not,
            reg: Reg::Ebx,
        },
    ]);
    let outcome = VM::default().execute(&image).unwrap();

    assert_eq!(outcome.registers.get(Reg::Eax), 1);
    assert_eq!(outcome.registers.get(Reg::Ebx), 1);
}

#[test]
fn division_by_zero_halts_without_writing() {
    let image = image(&[
        mov(Reg::Eax, 7),
        mov(Reg::Ebx, 0),
        bin(BinaryOp::Div, Reg::Eax, Source::Reg(Reg::Ebx)),
        print(Reg::Eax),
    ]);
    let mut vm = VM::default();
    let err = vm.execute(&image).unwrap_err();

    assert_eq!(err, RuntimeError::DivisionByZero { addr: 18 });
    assert_eq!(err.addr(), 18);
    assert_eq!(vm.registers().get(Reg::Eax), 7);
    assert!(vm.printed().is_empty());
}

#[test]
fn frame_leaves_stack_balanced() {
    let mut instrs = Vec::new();
    instrs.extend(prologue(8));
    instrs.push(mov(Reg::Eax, 42));
    instrs.push(Instruction::Mov(Move::MemReg {
        offset: 8,
        src: Reg::Eax,
    }));
    instrs.extend(epilogue(8));
    let image = image(&instrs);

    let mut vm = VM::default();
    let outcome = vm.execute(&image).unwrap();
    let top = STACK_SIZE as i32;

    assert_eq!(outcome.registers.esp, top);
    assert_eq!(outcome.registers.ebp, top);
    // [ebp-8] with ebp = top - 4
    assert_eq!(vm.read_word(top - 12), Some(42));
}

#[test]
fn print_through_address() {
    let mut instrs = Vec::new();
    instrs.extend(prologue(4));
    instrs.extend([
        mov(Reg::Eax, 1.5f32.to_bits() as i32),
        Instruction::Mov(Move::MemReg {
            offset: 4,
            src: Reg::Eax,
        }),
        Instruction::PushAdd(Reg::Ebp, -4),
        Instruction::Pop(Reg::Ecx),
        Instruction::Special(Special::PrintMem {
            reg: Reg::Ecx,
            format: PrintFormat::Float,
        }),
    ]);
    instrs.extend(epilogue(4));

    let mut vm = VM::default();
    vm.execute(&image(&instrs)).unwrap();
    assert_eq!(vm.printed(), [Value::Float(1.5)]);
    assert_eq!(vm.printed()[0].to_string(), "1.5");
}

#[test]
fn memory_to_memory_copy() {
    let image = image(&[
        mov(Reg::Eax, 9),
        Instruction::Mov(Move::MemReg {
            offset: 4,
            src: Reg::Eax,
        }),
        Instruction::Mov(Move::MemMem { dst: 8, src: 4 }),
        Instruction::Mov(Move::RegMem {
            dst: Reg::Edi,
            offset: 8,
        }),
    ]);
    let outcome = VM::default().execute(&image).unwrap();
    assert_eq!(outcome.registers.get(Reg::Edi), 9);
}

#[test]
fn countdown_loop() {
    let image = image(&[
        mov(Reg::Eax, 3),
        print(Reg::Eax),
        bin(BinaryOp::Sub, Reg::Eax, Source::Imm(1)),
        Instruction::JumpIfNonZero {
            cond: Reg::Eax,
            target: 9,
        },
    ]);
    let mut vm = VM::default();
    vm.execute(&image).unwrap();
    assert_eq!(vm.printed(), [Value::Int(3), Value::Int(2), Value::Int(1)]);
}

#[test]
fn jump_to_end_halts() {
    let image = image(&[Instruction::Jump { target: 18 }, print(Reg::Eax)]);
    let mut vm = VM::default();
    let outcome = vm.execute(&image).unwrap();

    assert_eq!(outcome.steps, 1);
    assert!(vm.printed().is_empty());
}

#[test]
fn fuel_exhaustion() {
    let image = image(&[Instruction::Jump { target: 0 }]);
    let mut vm = VM::builder()
        .limits(FuelLimits::new().exec_fuel(100))
        .build();

    let err = vm.execute(&image).unwrap_err();

    assert_eq!(
        err,
        RuntimeError::ExecFuelExhausted {
            addr: 0,
            limit: 100,
        }
    );
    assert_eq!(err.addr(), 0);
    assert_eq!(
        err.to_string(),
        "execution limit of 100 instructions exceeded at 0000"
    );
    assert_eq!(vm.steps(), 100);
}

#[test]
fn stack_overflow() {
    let image = image(&[
        Instruction::Push(Reg::Eax),
        Instruction::Push(Reg::Eax),
        Instruction::Push(Reg::Eax),
    ]);
    let mut vm = VM::builder().stack_size(8).build();
    assert_eq!(
        vm.execute(&image).unwrap_err(),
        RuntimeError::StackOverflow { addr: 18 }
    );
}

#[test]
fn stack_underflow() {
    let image = image(&[Instruction::Pop(Reg::Eax)]);
    assert_eq!(
        VM::default().execute(&image).unwrap_err(),
        RuntimeError::StackUnderflow { addr: 0 }
    );
}

#[test]
fn frame_larger_than_stack() {
    let image = image(&[bin(BinaryOp::Sub, Reg::Esp, Source::Imm(64))]);
    let mut vm = VM::builder().stack_size(16).build();
    assert_eq!(
        vm.execute(&image).unwrap_err(),
        RuntimeError::StackOverflow { addr: 0 }
    );
}

#[test]
fn slot_above_stack_top() {
    let image = image(&[Instruction::Mov(Move::RegMem {
        dst: Reg::Eax,
        offset: 0,
    })]);
    assert_eq!(
        VM::default().execute(&image).unwrap_err(),
        RuntimeError::MemoryOutOfBounds {
            addr: 0,
            target: STACK_SIZE as i32,
        }
    );
}

#[test]
fn stack_pointer_is_not_data() {
    let image = image(&[bin(BinaryOp::Mul, Reg::Esp, Source::Imm(2))]);
    let err = VM::default().execute(&image).unwrap_err();

    assert_eq!(
        err,
        RuntimeError::ReservedRegister {
            addr: 0,
            reg: Reg::Esp,
            mnemonic: "mul",
        }
    );
    assert_eq!(err.to_string(), "`mul` cannot operate on esp at 0000");
}

#[test]
fn stack_pointer_is_not_a_move_target() {
    let immediate = image(&[mov(Reg::Esp, i32::MIN), Instruction::Push(Reg::Eax)]);
    assert_eq!(
        VM::default().execute(&immediate).unwrap_err(),
        RuntimeError::ReservedRegister {
            addr: 0,
            reg: Reg::Esp,
            mnemonic: "mov",
        }
    );

    let copy = image(&[
        mov(Reg::Eax, 16),
        Instruction::Mov(Move::RegReg {
            dst: Reg::Esp,
            src: Reg::Eax,
        }),
    ]);
    assert_eq!(
        VM::default().execute(&copy).unwrap_err(),
        RuntimeError::ReservedRegister {
            addr: 9,
            reg: Reg::Esp,
            mnemonic: "mov",
        }
    );
}

#[test]
fn stack_pointer_is_not_popped() {
    let image = image(&[
        mov(Reg::Eax, i32::MIN),
        Instruction::Push(Reg::Eax),
        Instruction::Pop(Reg::Esp),
        Instruction::Push(Reg::Eax),
    ]);
    let mut vm = VM::default();

    assert_eq!(
        vm.execute(&image).unwrap_err(),
        RuntimeError::ReservedRegister {
            addr: 18,
            reg: Reg::Esp,
            mnemonic: "pop",
        }
    );
    assert_eq!(vm.registers().esp, STACK_SIZE as i32 - 4);
}

#[test]
fn base_pointer_only_takes_the_stack_pointer() {
    let copy = image(&[
        mov(Reg::Eax, 64),
        Instruction::Mov(Move::RegReg {
            dst: Reg::Ebp,
            src: Reg::Eax,
        }),
    ]);
    assert_eq!(
        VM::default().execute(&copy).unwrap_err(),
        RuntimeError::ReservedRegister {
            addr: 9,
            reg: Reg::Ebp,
            mnemonic: "mov",
        }
    );

    let load = image(&[Instruction::Mov(Move::RegMem {
        dst: Reg::Ebp,
        offset: 4,
    })]);
    assert_eq!(
        VM::default().execute(&load).unwrap_err(),
        RuntimeError::ReservedRegister {
            addr: 0,
            reg: Reg::Ebp,
            mnemonic: "mov",
        }
    );
}

#[test]
fn frame_forms_still_run() {
    let mut instrs = Vec::new();
    instrs.extend(prologue(0));
    instrs.extend(epilogue(0));
    let outcome = VM::default().execute(&image(&instrs)).unwrap();

    assert_eq!(outcome.registers.esp, STACK_SIZE as i32);
    assert_eq!(outcome.registers.ebp, STACK_SIZE as i32);
}

#[test]
fn push_and_pop_at_the_stack_edges() {
    let mut vm = VM::builder().stack_size(4).build();
    let pushes = image(&[Instruction::Push(Reg::Eax), Instruction::Push(Reg::Eax)]);
    assert_eq!(
        vm.execute(&pushes).unwrap_err(),
        RuntimeError::StackOverflow { addr: 9 }
    );
    assert_eq!(vm.registers().esp, 0);

    let pops = image(&[
        Instruction::Push(Reg::Eax),
        Instruction::Pop(Reg::Eax),
        Instruction::Pop(Reg::Eax),
    ]);
    assert_eq!(
        vm.execute(&pops).unwrap_err(),
        RuntimeError::StackUnderflow { addr: 18 }
    );
    assert_eq!(vm.registers().esp, 4);
}

#[test]
fn misaligned_jump() {
    let image = image(&[Instruction::Jump { target: 4 }]);
    assert_eq!(
        VM::default().execute(&image).unwrap_err(),
        RuntimeError::InvalidJumpTarget { addr: 0, target: 4 }
    );
}

#[test]
fn undecodable_bytes() {
    let image = Image::new(vec![0xee; 9], 0).unwrap();
    let err = VM::default().execute(&image).unwrap_err();
    assert!(matches!(err, RuntimeError::InvalidInstruction { addr: 0, .. }));
}

#[test]
fn rerun_starts_clean() {
    let image = image(&[
        Instruction::Mov(Move::RegMem {
            dst: Reg::Eax,
            offset: 4,
        }),
        bin(BinaryOp::Add, Reg::Eax, Source::Imm(1)),
        Instruction::Mov(Move::MemReg {
            offset: 4,
            src: Reg::Eax,
        }),
        print(Reg::Eax),
    ]);
    let mut vm = VM::default();
    vm.execute(&image).unwrap();
    vm.execute(&image).unwrap();
    assert_eq!(vm.printed(), [Value::Int(1)]);
}
