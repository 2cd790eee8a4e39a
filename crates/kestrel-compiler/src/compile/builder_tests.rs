use kestrel_bytecode::{CodeBuffer, ENTRY_SIZE, Instruction, Reg};
use rowan::{TextRange, TextSize};

use super::builder::CodeBuilder;
use super::program::FixupTarget;
use super::types::{BinOp, Constant, UnOp, ValueType};
use crate::Error;
use crate::diagnostics::DiagnosticKind;

fn at(offset: u32) -> TextRange {
    TextRange::empty(TextSize::from(offset))
}

fn started() -> CodeBuilder {
    let mut b = CodeBuilder::new();
    b.begin_program();
    b
}

const PROLOGUE: usize = 3 * ENTRY_SIZE;

#[test]
fn literal_operands_fold_without_code() {
    let mut b = started();
    let two = b.int(2, at(0));
    let three = b.int(3, at(4));
    let sum = b.binary(BinOp::Add, two, three, at(0)).unwrap();

    assert_eq!(b.node(sum).unwrap().as_constant(), Some(Constant::Int(5)));
    assert_eq!(b.code().len(), PROLOGUE);
}

#[test]
fn unary_folds() {
    let mut b = started();
    let five = b.int(5, at(0));
    let neg = b.unary(UnOp::Neg, five, at(0)).unwrap();
    let not = b.unary(UnOp::Not, neg, at(0)).unwrap();

    assert_eq!(b.node(not).unwrap().as_constant(), Some(Constant::Bool(false)));
    assert_eq!(b.code().len(), PROLOGUE);
}

#[test]
fn runtime_operand_emits_one_instruction() {
    let mut b = started();
    let one = b.int(1, at(0));
    b.assign("x", one, at(0));
    b.end_statement();
    let before = b.code().len();

    let x = b.variable("x", at(0)).unwrap();
    let two = b.int(2, at(0));
    let sum = b.binary(BinOp::Add, x, two, at(0)).unwrap();

    // load + add
    assert_eq!(b.code().len(), before + 2 * ENTRY_SIZE);
    assert_eq!(b.node(sum).unwrap().register(), Some(Reg::Eax));
    assert_eq!(b.node(sum).unwrap().ty, ValueType::Int);
}

#[test]
fn end_statement_releases_everything() {
    let mut b = started();
    let one = b.int(1, at(0));
    b.assign("x", one, at(0));
    let x = b.variable("x", at(0)).unwrap();
    let y = b.variable("x", at(0)).unwrap();
    b.binary(BinOp::Mul, x, y, at(0)).unwrap();
    b.int(7, at(0));

    assert_eq!(b.live_nodes(), 2);
    assert_eq!(b.registers_in_use(), 1);

    b.end_statement();
    assert_eq!(b.live_nodes(), 0);
    assert_eq!(b.registers_in_use(), 0);
}

#[test]
fn released_handle_is_stale() {
    let mut b = started();
    let one = b.int(1, at(0));
    b.end_statement();
    b.print(one);

    let err = b.finish().unwrap_err();
    assert!(matches!(err, Error::StaleNode(_)));
}

#[test]
fn shadowing_through_builder() {
    let mut b = started();
    b.declare("x", ValueType::Int, None, at(0));
    b.enter_scope();
    b.declare("x", ValueType::Int, None, at(1));
    assert_eq!(b.lookup("x").unwrap().offset, 8);
    b.exit_scope();

    assert_eq!(b.lookup("x").unwrap().offset, 4);
    assert!(b.diagnostics().is_empty());
}

#[test]
fn const_needs_constant_initializer() {
    let mut b = started();
    let one = b.int(1, at(0));
    b.assign("x", one, at(0));
    b.end_statement();

    let x = b.variable("x", at(10)).unwrap();
    b.declare_const("N", ValueType::Int, x, at(5));

    let kinds: Vec<_> = b.diagnostics().iter().map(|d| d.kind()).collect();
    assert_eq!(kinds, [DiagnosticKind::NotConstant]);
    assert!(b.lookup("N").is_none());
}

#[test]
fn bool_assignment_declares_int() {
    let mut b = started();
    let one = b.int(1, at(0));
    let two = b.int(2, at(0));
    let less = b.binary(BinOp::Lt, one, two, at(0)).unwrap();
    b.assign("flag", less, at(0));

    let (program, _) = b.finish().unwrap();
    let flag = program.global("flag").unwrap();
    assert_eq!(flag.ty, ValueType::Int);
    assert_eq!(flag.offset, 4);
}

#[test]
fn forward_jump_becomes_label_fixup() {
    let mut b = started();
    let label = b.new_label();
    let site = b.emit_jump().unwrap();
    b.jump_fixup(site, label);
    b.bind(label);

    let (program, _) = b.finish().unwrap();
    let label_fixups: Vec<_> = program
        .fixups
        .iter()
        .filter(|f| f.target == FixupTarget::Label(label))
        .collect();

    assert_eq!(label_fixups.len(), 1);
    assert_eq!(label_fixups[0].site, site);
    assert_eq!(program.label_address(label), Some(site + ENTRY_SIZE as u32));
}

#[test]
fn do_loop_jumps_back_resolved() {
    let mut b = started();
    b.begin_do();
    let head = b.code().next_offset();
    b.begin_do_condition();
    let cond = b.int(0, at(0));
    let cond = b.unary(UnOp::Not, cond, at(0));
    b.end_do(cond);

    // `!0` folds to true: mov + jnz back to the head
    let jnz = b.code().get(head + ENTRY_SIZE as u32).unwrap();
    assert_eq!(
        jnz,
        Instruction::JumpIfNonZero {
            cond: Reg::Eax,
            target: head as i32,
        }
    );
}

#[test]
fn code_size_limit_is_reported_once() {
    let mut b = CodeBuilder::with_code(CodeBuffer::with_limit(PROLOGUE));
    b.begin_program();
    for _ in 0..3 {
        let one = b.int(1, at(0));
        b.print(one);
        b.end_statement();
    }

    let Err(Error::CompileFailed(diagnostics)) = b.finish() else {
        panic!("expected failure");
    };
    let kinds: Vec<_> = diagnostics.iter().map(|d| d.kind()).collect();
    assert_eq!(kinds, [DiagnosticKind::CodeSizeExceeded]);
}

#[test]
fn register_exhaustion() {
    let mut b = started();
    let one = b.int(1, at(0));
    b.assign("a", one, at(0));
    b.end_statement();

    let mut held = Vec::new();
    for _ in 0..5 {
        let a = b.variable("a", at(0)).unwrap();
        let a2 = b.variable("a", at(0)).unwrap();
        held.push(b.binary(BinOp::Add, a, a2, at(0)).unwrap());
    }
    let a = b.variable("a", at(0)).unwrap();
    let a2 = b.variable("a", at(0)).unwrap();
    assert!(b.binary(BinOp::Add, a, a2, at(3)).is_none());

    let kinds: Vec<_> = b.diagnostics().iter().map(|d| d.kind()).collect();
    assert_eq!(kinds, [DiagnosticKind::RegisterExhausted]);
}
