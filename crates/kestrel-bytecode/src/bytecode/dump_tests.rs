use kestrel_core::Colors;

use super::*;

fn program() -> CodeBuffer {
    let mut code = CodeBuffer::new();
    let program = [
        Instruction::Push(Reg::Ebp),
        Instruction::Mov(Move::RegReg {
            dst: Reg::Ebp,
            src: Reg::Esp,
        }),
        Instruction::Mov(Move::RegMem {
            dst: Reg::Eax,
            offset: 4,
        }),
        Instruction::JumpIfZero {
            cond: Reg::Eax,
            target: UNKNOWN_ADDR,
        },
        Instruction::Special(Special::Print {
            reg: Reg::Eax,
            format: PrintFormat::Int,
        }),
        Instruction::Pop(Reg::Ebp),
    ];
    for instr in program {
        code.push(instr).unwrap();
    }
    code
}

#[test]
fn unresolved_code() {
    let code = program();

    insta::assert_snapshot!(dump_code(code.as_bytes(), Colors::OFF), @r"
    [code]
    0000  push     ebp
    0009  mov      ebp, esp
    0012  mov      eax, [ebp-4]
    001b  jz       eax, ????
    0024  print    eax
    002d  pop      ebp
    ");
}

#[test]
fn linked_image() {
    let mut code = program();
    code.patch(27, Slot::Second, 45).unwrap();
    let image = Image::new(code.into_bytes(), 0).unwrap();

    let out = dump(&image, Colors::OFF);
    let checksum = format!("{:08x}", image.header().checksum);

    assert!(out.starts_with("[header]\nentry  0000\nend    0036\ncrc32  "));
    assert!(out.contains(&checksum));
    assert!(out.contains("001b  jz       eax, 002d\n"));
    assert!(!out.contains("????"));
}

#[test]
fn empty_code() {
    insta::assert_snapshot!(dump_code(&[], Colors::OFF), @r"
    [code]
    ; empty
    ");
}

#[test]
fn invalid_bytes_are_marked() {
    let out = dump_code(&[0xff, 0, 0, 0, 0, 0, 0, 0, 0], Colors::OFF);
    assert_eq!(out, "[code]\n0000  <invalid opcode 0xff>\n");
}

#[test]
fn memory_operands() {
    let instr = Instruction::Mov(Move::MemMem { dst: 4, src: -8 });
    assert_eq!(format_instruction(&instr), "mov      [ebp-4], [ebp+8]");

    let instr = Instruction::PushAdd(Reg::Ebp, -12);
    assert_eq!(format_instruction(&instr), "pushadd  ebp, -12");
}

#[test]
fn entry_at_end_lists_nothing() {
    let code = program().into_bytes();
    let end = code.len() as u32;
    let image = Image::new(code, end).unwrap();

    let out = dump(&image, Colors::OFF);
    assert!(out.ends_with("[code]\n; empty\n"));
}
