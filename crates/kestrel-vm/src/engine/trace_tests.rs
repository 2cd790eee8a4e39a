use kestrel_bytecode::{
    BinaryOp, CodeBuffer, Image, Instruction, Move, PrintFormat, Reg, Source, Special,
};
use kestrel_core::Colors;

use super::*;

fn image(instrs: &[Instruction]) -> Image {
    let mut code = CodeBuffer::new();
    for instr in instrs {
        code.push(*instr).unwrap();
    }
    Image::new(code.into_bytes(), 0).unwrap()
}

fn sum() -> Image {
    image(&[
        Instruction::Mov(Move::RegImm {
            dst: Reg::Eax,
            imm: 2,
        }),
        Instruction::Binary {
            op: BinaryOp::Add,
            dst: Reg::Eax,
            src: Source::Imm(3),
        },
        Instruction::Special(Special::Print {
            reg: Reg::Eax,
            format: PrintFormat::Int,
        }),
    ])
}

fn trace(image: &Image, verbosity: Verbosity) -> String {
    let mut tracer = PrintTracer::new(verbosity, Colors::OFF);
    let _ = VM::default().execute_with(image, &mut tracer);
    tracer.render()
}

#[test]
fn default_verbosity() {
    insta::assert_snapshot!(trace(&sum(), Verbosity::Default), @r"
    0000  mov      eax, 2
    0009  add      eax, 3
    0012  print    eax
          > 5
    halt  3 steps, esp 131072
    ");
}

#[test]
fn verbose_shows_register_writes() {
    insta::assert_snapshot!(trace(&sum(), Verbosity::Verbose), @r"
    0000  mov      eax, 2
          eax = 2
    0009  add      eax, 3
          eax = 5
    0012  print    eax
          > 5
    halt  3 steps, esp 131072
    ");
}

#[test]
fn very_verbose_shows_stack_traffic() {
    let image = image(&[
        Instruction::Push(Reg::Ebp),
        Instruction::Mov(Move::MemReg {
            offset: 8,
            src: Reg::Eax,
        }),
        Instruction::Pop(Reg::Ebp),
    ]);

    insta::assert_snapshot!(trace(&image, Verbosity::VeryVerbose), @r"
    0000  push     ebp
          esp = 131068
    0009  mov      [ebp-8], eax
          [131064] = 0
    0012  pop      ebp
          ebp = 131072
          esp = 131072
    halt  3 steps, esp 131072
    ");
}

#[test]
fn fault_line() {
    let image = image(&[
        Instruction::Mov(Move::RegImm {
            dst: Reg::Eax,
            imm: 1,
        }),
        Instruction::Binary {
            op: BinaryOp::Div,
            dst: Reg::Eax,
            src: Source::Imm(0),
        },
    ]);

    insta::assert_snapshot!(trace(&image, Verbosity::Default), @r"
    0000  mov      eax, 1
    0009  div      eax, 0
    fault  division by zero at 0009
    ");
}

#[test]
fn colored_lines_carry_escapes() {
    let mut tracer = PrintTracer::new(Verbosity::Default, Colors::ON);
    VM::default().execute_with(&sum(), &mut tracer).unwrap();
    assert!(tracer.lines()[0].contains("\x1b[34mmov"));
    assert_eq!(tracer.lines().len(), 5);
}
