use indoc::indoc;
use kestrel_bytecode::{
    CodeBuffer, Instruction, Reg, Slot, UNKNOWN_ADDR, decode_all, dump, format_instruction,
};
use kestrel_core::Colors;

use crate::Program;
use crate::link::{LinkError, link, resolve, verify};
use crate::test_utils::image;

fn program_of(instrs: &[Instruction]) -> Program {
    let mut code = CodeBuffer::new();
    for instr in instrs {
        code.push(*instr).unwrap();
    }
    Program {
        code,
        labels: Vec::new(),
        fixups: Vec::new(),
        frame_size: 0,
        entry: 0,
        globals: Vec::new(),
    }
}

fn lines(code: &[u8]) -> Vec<String> {
    decode_all(code)
        .map(|(addr, instr)| format!("{addr:04x}  {}", format_instruction(&instr.unwrap())))
        .collect()
}

#[test]
fn if_else_targets_are_patched() {
    let source = indoc! {"
        int x = 1;
        if (x < 2) print 1; else print 2;
    "};
    let image = image(source);
    let lines = lines(image.code());

    assert_eq!(lines[2], "0012  sub      esp, 4");
    assert_eq!(lines[7], "003f  jz       eax, 0063");
    assert_eq!(lines[10], "005a  jmp      0075");
    assert_eq!(lines[13], "0075  add      esp, 4");
}

#[test]
fn linked_image_dump() {
    let image = image("x = 10; y = 3; z = x % y; print z;");
    let out = dump(&image, Colors::OFF);

    assert!(out.starts_with("[header]\nentry  0000\nend    0090\n"));
    assert!(out.contains("0012  sub      esp, 12\n"));
    assert!(out.contains("0051  mod      eax, ebx\n"));
    assert!(!out.contains("????"));
}

#[test]
fn break_and_continue_resolve() {
    let source = indoc! {"
        i = 0;
        do {
            i = i + 1;
            if (i == 2) continue;
            if (i > 3) break;
        } while (i < 10);
    "};
    let image = image(source);
    assert!(verify(image.code()).is_ok());
}

#[test]
fn leftover_placeholder_is_unresolved() {
    let program = program_of(&[Instruction::Jump {
        target: UNKNOWN_ADDR,
    }]);
    assert_eq!(
        link(program).unwrap_err(),
        LinkError::UnresolvedReference { site: 0 }
    );
}

#[test]
fn target_inside_an_instruction() {
    let program = program_of(&[
        Instruction::Push(Reg::Ebp),
        Instruction::JumpIfZero {
            cond: Reg::Eax,
            target: 5,
        },
    ]);
    assert_eq!(
        link(program).unwrap_err(),
        LinkError::MisalignedTarget { site: 9, target: 5 }
    );
}

#[test]
fn target_past_the_end() {
    let program = program_of(&[Instruction::Jump { target: 27 }]);
    assert_eq!(
        link(program).unwrap_err(),
        LinkError::TargetOutOfRange {
            site: 0,
            target: 27,
            end: 9,
        }
    );
}

#[test]
fn jump_to_end_halts() {
    let program = program_of(&[Instruction::Jump { target: 9 }]);
    let image = link(program).unwrap();
    assert_eq!(image.end(), 9);
}

#[test]
fn resolve_rejects_bad_site() {
    let mut code = CodeBuffer::new();
    code.push(Instruction::Jump {
        target: UNKNOWN_ADDR,
    })
    .unwrap();

    assert_eq!(
        resolve(&mut code, 4, Slot::First, 0),
        Err(LinkError::InvalidFixup { site: 4 })
    );
    assert!(resolve(&mut code, 0, Slot::First, 0).is_ok());
    assert_eq!(code.get(0).unwrap(), Instruction::Jump { target: 0 });
}

#[test]
fn entry_outside_the_code() {
    let mut program = program_of(&[Instruction::Jump { target: 9 }]);
    program.entry = 18;
    assert_eq!(
        link(program).unwrap_err(),
        LinkError::InvalidEntry { entry: 18 }
    );
}
