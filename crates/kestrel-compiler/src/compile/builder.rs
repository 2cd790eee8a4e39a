//! Semantic actions driven by the parser.
//!
//! The parser calls into [`CodeBuilder`] as it recognizes constructs.
//! Expression actions return node handles; statement actions consume them
//! and append instructions. A failed action reports a diagnostic and
//! returns `None`. The parser keeps going and calls
//! [`CodeBuilder::end_statement`], which releases every outstanding node and
//! temporary register.
//!
//! Jumps whose target is not yet known are emitted with [`UNKNOWN_ADDR`] and
//! recorded as fixups; the linker patches them.

use kestrel_bytecode::{
    BinaryOp, CodeBuffer, CodeError, Instruction, Move, PrintFormat, Reg, Slot, Source, Special,
    UNKNOWN_ADDR,
};
use kestrel_core::{Interner, Symbol};
use rowan::TextRange;

use crate::diagnostics::{DiagnosticKind, Diagnostics};

use super::fold::{self, FoldError};
use super::nodes::{ExprNode, NodeArena, NodeId, Operand, StaleNode};
use super::program::{Fixup, FixupTarget, Label, Program, SymbolInfo};
use super::regs::RegisterPool;
use super::scope::{ScopeError, ScopeStack, SymbolDesc, SymbolKind};
use super::types::{BinOp, Constant, OpClass, UnOp, ValueType};

/// The current action failed and its diagnostic has been reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Abort;

type Emit<T> = Result<T, Abort>;

#[derive(Debug, Clone, Copy)]
struct LoopFrame {
    head: Label,
    continue_to: Label,
    break_to: Label,
}

pub struct CodeBuilder {
    interner: Interner,
    diagnostics: Diagnostics,
    nodes: NodeArena,
    scopes: ScopeStack,
    regs: RegisterPool,
    code: CodeBuffer,
    labels: Vec<Option<u32>>,
    fixups: Vec<Fixup>,
    loops: Vec<LoopFrame>,
    stale: Option<StaleNode>,
    code_full: bool,
    entry: u32,
}

impl Default for CodeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeBuilder {
    pub fn new() -> Self {
        Self::with_code(CodeBuffer::new())
    }

    /// Builder emitting into `code`, which decides the size limit.
    pub fn with_code(code: CodeBuffer) -> Self {
        Self {
            interner: Interner::new(),
            diagnostics: Diagnostics::new(),
            nodes: NodeArena::new(),
            scopes: ScopeStack::new(),
            regs: RegisterPool::new(),
            code,
            labels: Vec::new(),
            fixups: Vec::new(),
            loops: Vec::new(),
            stale: None,
            code_full: false,
            entry: 0,
        }
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    pub fn code(&self) -> &CodeBuffer {
        &self.code
    }

    pub fn live_nodes(&self) -> usize {
        self.nodes.live_count()
    }

    pub fn registers_in_use(&self) -> usize {
        self.regs.in_use_count()
    }

    pub fn node(&self, id: NodeId) -> Option<&ExprNode> {
        self.nodes.get(id).ok()
    }

    // ---- program ---------------------------------------------------------

    /// Emit the frame prologue. The frame size is patched at link time.
    pub fn begin_program(&mut self) {
        self.scopes.enter_frame();
        self.entry = self.code.next_offset();
        let _ = self.prologue();
    }

    fn prologue(&mut self) -> Emit<()> {
        self.emit(Instruction::Push(Reg::Ebp))?;
        self.emit(Instruction::Mov(Move::RegReg {
            dst: Reg::Ebp,
            src: Reg::Esp,
        }))?;
        let site = self.emit(Instruction::Binary {
            op: BinaryOp::Sub,
            dst: Reg::Esp,
            src: Source::Imm(0),
        })?;
        self.fixups.push(Fixup {
            site,
            slot: Slot::Second,
            target: FixupTarget::FrameSize,
        });
        Ok(())
    }

    fn epilogue(&mut self) -> Emit<()> {
        let site = self.emit(Instruction::Binary {
            op: BinaryOp::Add,
            dst: Reg::Esp,
            src: Source::Imm(0),
        })?;
        self.fixups.push(Fixup {
            site,
            slot: Slot::Second,
            target: FixupTarget::FrameSize,
        });
        self.emit(Instruction::Pop(Reg::Ebp))?;
        Ok(())
    }

    /// Close the program and hand over the unlinked result.
    ///
    /// Fails when an error diagnostic was reported; warnings travel with the
    /// program.
    pub fn finish(mut self) -> Result<(Program, Diagnostics), crate::Error> {
        self.end_statement();
        let _ = self.epilogue();

        if let Some(stale) = self.stale {
            return Err(stale.into());
        }
        if self.diagnostics.has_errors() {
            return Err(crate::Error::CompileFailed(self.diagnostics));
        }

        let globals = self
            .scopes
            .globals()
            .map(|desc| SymbolInfo {
                name: self.interner.resolve(desc.name).to_string(),
                ty: desc.ty,
                offset: desc.offset,
                constant: match desc.kind {
                    SymbolKind::Constant(c) => Some(c),
                    SymbolKind::Variable => None,
                },
            })
            .collect();

        let program = Program {
            code: self.code,
            labels: self.labels,
            fixups: self.fixups,
            frame_size: self.scopes.frame_size(),
            entry: self.entry,
            globals,
        };
        Ok((program, self.diagnostics))
    }

    /// Statement boundary: drop every node and temporary register.
    pub fn end_statement(&mut self) {
        self.nodes.release_all();
        self.regs.reset();
    }

    // ---- scopes ----------------------------------------------------------

    pub fn enter_scope(&mut self) {
        self.scopes.enter();
    }

    pub fn exit_scope(&mut self) {
        self.scopes.exit();
    }

    /// Look a name up through the enclosing scopes.
    pub fn lookup(&self, name: &str) -> Option<&SymbolDesc> {
        let sym = self.interner.get(name)?;
        self.scopes.lookup(sym).ok()
    }

    fn declare_symbol(
        &mut self,
        name: &str,
        ty: ValueType,
        kind: SymbolKind,
        span: TextRange,
    ) -> Emit<SymbolDesc> {
        let sym = self.interner.intern(name);
        match self.scopes.declare(sym, ty, kind, span) {
            Ok(desc) => Ok(desc),
            Err(ScopeError::Duplicate { previous }) => {
                self.diagnostics
                    .report(DiagnosticKind::DuplicateSymbol, span)
                    .message(name)
                    .related_to("previously declared here", previous)
                    .emit();
                Err(Abort)
            }
            Err(ScopeError::Unknown) => Err(Abort),
        }
    }

    // ---- expressions -----------------------------------------------------

    pub fn int(&mut self, value: i32, span: TextRange) -> NodeId {
        self.nodes
            .create(ExprNode::constant(Constant::Int(value), span))
    }

    pub fn float(&mut self, value: f32, span: TextRange) -> NodeId {
        self.nodes
            .create(ExprNode::constant(Constant::Float(value), span))
    }

    /// A use of a named variable or constant.
    pub fn variable(&mut self, name: &str, span: TextRange) -> Option<NodeId> {
        let sym = self.interner.intern(name);
        let Ok(desc) = self.scopes.lookup(sym).copied() else {
            self.diagnostics
                .report(DiagnosticKind::UnknownSymbol, span)
                .message(name)
                .emit();
            return None;
        };

        let node = match desc.kind {
            SymbolKind::Constant(c) => ExprNode {
                operand: Operand::Constant(c),
                ty: desc.ty,
                span,
            },
            SymbolKind::Variable => {
                if !desc.initialized {
                    self.diagnostics
                        .report(DiagnosticKind::UninitializedRead, span)
                        .message(name)
                        .related_to("declared here", desc.span)
                        .emit();
                }
                ExprNode {
                    operand: Operand::Addressed {
                        offset: desc.offset,
                        name: sym,
                    },
                    ty: desc.ty,
                    span,
                }
            }
        };
        Some(self.nodes.create(node))
    }

    /// `lhs op rhs`, folded when both sides are constant.
    pub fn binary(
        &mut self,
        op: BinOp,
        lhs: NodeId,
        rhs: NodeId,
        span: TextRange,
    ) -> Option<NodeId> {
        let lhs = self.take(lhs);
        let rhs = self.take(rhs);
        let (lhs, rhs) = (lhs.ok()?, rhs.ok()?);
        self.binary_nodes(op, lhs, rhs, span).ok()
    }

    fn binary_nodes(
        &mut self,
        op: BinOp,
        lhs: ExprNode,
        rhs: ExprNode,
        span: TextRange,
    ) -> Emit<NodeId> {
        let ty = fold::binary_type(op, lhs.ty, rhs.ty).map_err(|e| self.fold_error(e, span))?;

        if let Some(value) = fold::fold_binary(op, &lhs, &rhs).map_err(|e| {
            let at = if e == FoldError::DivisionByZero {
                rhs.span
            } else {
                span
            };
            self.fold_error(e, at)
        })? {
            return Ok(self.nodes.create(ExprNode::constant(value, span)));
        }

        if lhs.ty == ValueType::Float || rhs.ty == ValueType::Float {
            self.diagnostics
                .report(DiagnosticKind::FloatAtRuntime, span)
                .message(format!("`{}` needs both operands known at compile time", op.symbol()))
                .emit();
            return Err(Abort);
        }
        if op.is_division() && rhs.as_constant().is_some_and(Constant::is_zero) {
            self.diagnostics
                .report(DiagnosticKind::DivisionByZero, rhs.span)
                .emit();
            return Err(Abort);
        }

        let logical = op.class() == OpClass::Logical;
        let dst = self.load(&lhs)?;
        if logical && lhs.ty != ValueType::Bool {
            self.normalize(dst)?;
        }

        let src = match rhs.operand {
            Operand::Constant(c) => {
                let word = c.to_word();
                Source::Imm(if logical { (word != 0) as i32 } else { word })
            }
            _ => {
                let reg = self.load(&rhs)?;
                if logical && rhs.ty != ValueType::Bool {
                    self.normalize(reg)?;
                }
                Source::Reg(reg)
            }
        };

        self.emit(Instruction::Binary {
            op: op.machine(),
            dst,
            src,
        })?;
        if let Source::Reg(reg) = src {
            self.regs.free(reg);
        }

        Ok(self.nodes.create(ExprNode {
            operand: Operand::Register(dst),
            ty,
            span,
        }))
    }

    /// `op operand`, folded when the operand is constant.
    pub fn unary(&mut self, op: UnOp, operand: NodeId, span: TextRange) -> Option<NodeId> {
        let operand = self.take(operand).ok()?;
        self.unary_node(op, operand, span).ok()
    }

    fn unary_node(&mut self, op: UnOp, operand: ExprNode, span: TextRange) -> Emit<NodeId> {
        let ty = fold::unary_type(op, operand.ty).map_err(|e| self.fold_error(e, span))?;
        if let Some(value) = fold::fold_unary(op, &operand).map_err(|e| self.fold_error(e, span))? {
            return Ok(self.nodes.create(ExprNode::constant(value, span)));
        }
        if operand.ty == ValueType::Float {
            self.diagnostics
                .report(DiagnosticKind::FloatAtRuntime, span)
                .message(format!("`{}` needs its operand known at compile time", op.symbol()))
                .emit();
            return Err(Abort);
        }

        let reg = self.load(&operand)?;
        self.emit(Instruction::Unary {
            op: op.machine(),
            reg,
        })?;
        Ok(self.nodes.create(ExprNode {
            operand: Operand::Register(reg),
            ty,
            span,
        }))
    }

    /// Drop a node the parser no longer needs.
    pub fn discard(&mut self, id: NodeId) {
        if let Some(reg) = self.take(id).ok().and_then(|node| node.register()) {
            self.regs.free(reg);
        }
    }

    // ---- statements ------------------------------------------------------

    /// `int name;`, `float name = value;`
    pub fn declare(
        &mut self,
        name: &str,
        ty: ValueType,
        init: Option<NodeId>,
        span: TextRange,
    ) {
        let value = match init.map(|id| self.take(id)).transpose() {
            Ok(value) => value,
            Err(Abort) => return,
        };
        let Ok(desc) = self.declare_symbol(name, ty, SymbolKind::Variable, span) else {
            return;
        };
        if let Some(value) = value {
            let _ = self.store(&desc, value);
        }
    }

    /// `const int name = value;`
    pub fn declare_const(&mut self, name: &str, ty: ValueType, value: NodeId, span: TextRange) {
        let Ok(value) = self.take(value) else {
            return;
        };
        let Some(c) = value.as_constant() else {
            self.diagnostics
                .report(DiagnosticKind::NotConstant, value.span)
                .emit();
            return;
        };
        if !ty.accepts(value.ty) {
            self.type_mismatch(ty, value.ty, value.span);
            return;
        }
        let _ = self.declare_symbol(name, ty, SymbolKind::Constant(c.coerce(ty)), span);
    }

    /// `name = value;`. Assigning to an undeclared name declares it in the
    /// current scope with the value's type.
    pub fn assign(&mut self, name: &str, value: NodeId, span: TextRange) {
        let Ok(value) = self.take(value) else {
            return;
        };
        let sym = self.interner.intern(name);
        let desc = match self.scopes.lookup(sym).copied() {
            Ok(desc) => desc,
            Err(_) => {
                let ty = value.ty.storage();
                match self.declare_symbol(name, ty, SymbolKind::Variable, span) {
                    Ok(desc) => desc,
                    Err(Abort) => return,
                }
            }
        };
        if let SymbolKind::Constant(_) = desc.kind {
            self.diagnostics
                .report(DiagnosticKind::AssignToConstant, span)
                .message(name)
                .related_to("declared here", desc.span)
                .emit();
            return;
        }
        let _ = self.store(&desc, value);
    }

    fn store(&mut self, desc: &SymbolDesc, value: ExprNode) -> Emit<()> {
        if !desc.ty.accepts(value.ty) {
            self.type_mismatch(desc.ty, value.ty, value.span);
            return Err(Abort);
        }
        let offset = desc.offset;
        match value.operand {
            Operand::Addressed { offset: src, .. } if src == offset => {}
            Operand::Addressed { offset: src, .. } => {
                self.emit(Instruction::Mov(Move::MemMem { dst: offset, src }))?;
            }
            _ => {
                let reg = self.load(&value)?;
                self.emit(Instruction::Mov(Move::MemReg { offset, src: reg }))?;
                self.regs.free(reg);
            }
        }
        self.scopes.mark_initialized(desc.name);
        Ok(())
    }

    /// `print value;`
    pub fn print(&mut self, value: NodeId) {
        let Ok(value) = self.take(value) else {
            return;
        };
        let _ = self.print_node(value);
    }

    fn print_node(&mut self, value: ExprNode) -> Emit<()> {
        let format = match value.ty {
            ValueType::Float => PrintFormat::Float,
            ValueType::Int | ValueType::Bool => PrintFormat::Int,
        };
        let special = match value.operand {
            Operand::Addressed { offset, .. } => {
                // Materialize the slot address, then print through it.
                let reg = self.alloc(value.span)?;
                self.emit(Instruction::PushAdd(Reg::Ebp, -offset))?;
                self.emit(Instruction::Pop(reg))?;
                Special::PrintMem { reg, format }
            }
            _ => {
                let reg = self.load(&value)?;
                Special::Print { reg, format }
            }
        };
        self.emit(Instruction::Special(special))?;
        Ok(())
    }

    /// `value;`: the value's code is already emitted, only the node goes.
    pub fn expression_statement(&mut self, value: NodeId) {
        self.discard(value);
    }

    // ---- control flow ----------------------------------------------------

    pub fn new_label(&mut self) -> Label {
        self.labels.push(None);
        Label((self.labels.len() - 1) as u32)
    }

    /// Bind `label` to the next instruction.
    pub fn bind(&mut self, label: Label) {
        let here = self.code.next_offset();
        if let Some(slot) = self.labels.get_mut(label.0 as usize) {
            *slot = Some(here);
        }
    }

    fn label_address(&self, label: Label) -> Option<u32> {
        self.labels.get(label.0 as usize).copied().flatten()
    }

    /// Emit `jz cond, ????` and return its offset for patching.
    pub fn emit_jump_if_zero(&mut self, cond: Reg) -> Option<u32> {
        self.emit(Instruction::JumpIfZero {
            cond,
            target: UNKNOWN_ADDR,
        })
        .ok()
    }

    /// Emit `jnz cond, ????` and return its offset for patching.
    pub fn emit_jump_if_non_zero(&mut self, cond: Reg) -> Option<u32> {
        self.emit(Instruction::JumpIfNonZero {
            cond,
            target: UNKNOWN_ADDR,
        })
        .ok()
    }

    /// Emit `jmp ????` and return its offset for patching.
    pub fn emit_jump(&mut self) -> Option<u32> {
        self.emit(Instruction::Jump {
            target: UNKNOWN_ADDR,
        })
        .ok()
    }

    /// Record that the jump at `site` goes to `label`.
    pub fn jump_fixup(&mut self, site: u32, label: Label) {
        let slot = match self.code.get(site) {
            Ok(instr) => instr.target_slot(),
            Err(_) => None,
        };
        if let Some(slot) = slot {
            self.fixups.push(Fixup {
                site,
                slot,
                target: FixupTarget::Label(label),
            });
        }
    }

    /// Unconditional jump to `label`, resolved now if the label is bound.
    fn jump_to(&mut self, label: Label) -> Emit<()> {
        match self.label_address(label) {
            Some(addr) => {
                self.emit(Instruction::Jump {
                    target: addr as i32,
                })?;
            }
            None => {
                let site = self.emit_jump().ok_or(Abort)?;
                self.jump_fixup(site, label);
            }
        }
        Ok(())
    }

    fn condition(&mut self, cond: NodeId) -> Emit<Reg> {
        let cond = self.take(cond)?;
        if cond.ty == ValueType::Float {
            self.diagnostics
                .report(DiagnosticKind::TypeMismatch, cond.span)
                .message("condition must be int or bool, found float")
                .emit();
            return Err(Abort);
        }
        self.load(&cond)
    }

    /// Jump to `label` when `cond` is zero (`when_zero`) or non-zero.
    fn branch(&mut self, cond: Option<NodeId>, label: Label, when_zero: bool) {
        if let Some(cond) = cond {
            let _ = self.branch_on(cond, label, when_zero);
        }
        self.end_statement();
    }

    fn branch_on(&mut self, cond: NodeId, label: Label, when_zero: bool) -> Emit<()> {
        let reg = self.condition(cond)?;
        if let Some(addr) = self.label_address(label) {
            let target = addr as i32;
            let instr = if when_zero {
                Instruction::JumpIfZero { cond: reg, target }
            } else {
                Instruction::JumpIfNonZero { cond: reg, target }
            };
            self.emit(instr)?;
        } else {
            let site = if when_zero {
                self.emit_jump_if_zero(reg)
            } else {
                self.emit_jump_if_non_zero(reg)
            };
            self.jump_fixup(site.ok_or(Abort)?, label);
        }
        Ok(())
    }

    /// After `if (cond)`: skips the then-branch when `cond` is zero.
    /// Returns the label the then-branch falls out to.
    pub fn begin_if(&mut self, cond: Option<NodeId>) -> Label {
        let skip = self.new_label();
        self.branch(cond, skip, true);
        skip
    }

    /// At `else`: the then-branch jumps over the else-branch.
    /// Returns the label ending the whole statement.
    pub fn begin_else(&mut self, skip: Label) -> Label {
        let end = self.new_label();
        let _ = self.jump_to(end);
        self.bind(skip);
        end
    }

    pub fn end_if(&mut self, end: Label) {
        self.bind(end);
    }

    /// At `while`: binds the loop head, before the condition.
    pub fn begin_while(&mut self) {
        let head = self.new_label();
        self.bind(head);
        let exit = self.new_label();
        self.loops.push(LoopFrame {
            head,
            continue_to: head,
            break_to: exit,
        });
    }

    /// After `while (cond)`: leaves the loop when `cond` is zero.
    pub fn while_condition(&mut self, cond: Option<NodeId>) {
        if let Some(frame) = self.loops.last().copied() {
            self.branch(cond, frame.break_to, true);
        }
    }

    pub fn end_while(&mut self) {
        if let Some(frame) = self.loops.pop() {
            let _ = self.jump_to(frame.head);
            self.bind(frame.break_to);
        }
    }

    /// At `do`: binds the loop head.
    pub fn begin_do(&mut self) {
        let head = self.new_label();
        self.bind(head);
        let check = self.new_label();
        let exit = self.new_label();
        self.loops.push(LoopFrame {
            head,
            continue_to: check,
            break_to: exit,
        });
    }

    /// At the trailing `while` of a do-loop: `continue` lands here.
    pub fn begin_do_condition(&mut self) {
        if let Some(frame) = self.loops.last().copied() {
            self.bind(frame.continue_to);
        }
    }

    /// After `while (cond);`: loops back to the head while `cond` is non-zero.
    pub fn end_do(&mut self, cond: Option<NodeId>) {
        let Some(frame) = self.loops.pop() else {
            return;
        };
        self.branch(cond, frame.head, false);
        self.bind(frame.break_to);
    }

    pub fn break_statement(&mut self, span: TextRange) {
        self.loop_exit(span, "break", |f| f.break_to);
    }

    pub fn continue_statement(&mut self, span: TextRange) {
        self.loop_exit(span, "continue", |f| f.continue_to);
    }

    fn loop_exit(&mut self, span: TextRange, keyword: &str, target: fn(&LoopFrame) -> Label) {
        let Some(frame) = self.loops.last().copied() else {
            self.diagnostics
                .report(DiagnosticKind::BreakOutsideLoop, span)
                .message(keyword)
                .emit();
            return;
        };
        let _ = self.jump_to(target(&frame));
    }

    // ---- helpers ---------------------------------------------------------

    fn take(&mut self, id: NodeId) -> Emit<ExprNode> {
        self.nodes.take(id).map_err(|stale| {
            self.stale.get_or_insert(stale);
            Abort
        })
    }

    fn emit(&mut self, instr: Instruction) -> Emit<u32> {
        match self.code.push(instr) {
            Ok(offset) => Ok(offset),
            Err(CodeError::Overflow { capacity }) => {
                if !self.code_full {
                    self.code_full = true;
                    let end = rowan::TextSize::from(0);
                    self.diagnostics
                        .report(DiagnosticKind::CodeSizeExceeded, TextRange::empty(end))
                        .message(format!("more than {capacity} bytes"))
                        .emit();
                }
                Err(Abort)
            }
            Err(_) => Err(Abort),
        }
    }

    fn alloc(&mut self, span: TextRange) -> Emit<Reg> {
        self.regs.alloc().ok_or_else(|| {
            self.diagnostics
                .report(DiagnosticKind::RegisterExhausted, span)
                .emit();
            Abort
        })
    }

    /// Bring a value into a register the caller then owns.
    fn load(&mut self, node: &ExprNode) -> Emit<Reg> {
        match node.operand {
            Operand::Register(reg) => Ok(reg),
            Operand::Constant(c) => {
                let dst = self.alloc(node.span)?;
                self.emit(Instruction::Mov(Move::RegImm {
                    dst,
                    imm: c.to_word(),
                }))?;
                Ok(dst)
            }
            Operand::Addressed { offset, .. } => {
                let dst = self.alloc(node.span)?;
                self.emit(Instruction::Mov(Move::RegMem { dst, offset }))?;
                Ok(dst)
            }
        }
    }

    /// Collapse a register to 0/1.
    fn normalize(&mut self, reg: Reg) -> Emit<()> {
        self.emit(Instruction::Binary {
            op: BinaryOp::SetNe,
            dst: reg,
            src: Source::Imm(0),
        })?;
        Ok(())
    }

    fn fold_error(&mut self, err: FoldError, span: TextRange) -> Abort {
        match err {
            FoldError::DivisionByZero => self
                .diagnostics
                .report(DiagnosticKind::DivisionByZero, span)
                .emit(),
            other => self
                .diagnostics
                .report(DiagnosticKind::TypeMismatch, span)
                .message(other.to_string())
                .emit(),
        }
        Abort
    }

    fn type_mismatch(&mut self, expected: ValueType, found: ValueType, span: TextRange) {
        self.diagnostics
            .report(DiagnosticKind::TypeMismatch, span)
            .message(format!("expected {expected}, found {found}"))
            .emit();
    }

    pub fn symbol_name(&self, sym: Symbol) -> &str {
        self.interner.resolve(sym)
    }
}
