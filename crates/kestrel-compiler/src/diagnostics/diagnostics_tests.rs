use rowan::{TextRange, TextSize};

use super::*;

fn range(start: u32, end: u32) -> TextRange {
    TextRange::new(TextSize::from(start), TextSize::from(end))
}

#[test]
fn counts_by_severity() {
    let mut d = Diagnostics::new();
    d.report(DiagnosticKind::UnknownSymbol, range(0, 1))
        .message("x")
        .emit();
    d.report(DiagnosticKind::UninitializedRead, range(4, 5))
        .message("y")
        .emit();

    assert_eq!(d.len(), 2);
    assert_eq!(d.error_count(), 1);
    assert_eq!(d.warning_count(), 1);
    assert!(d.has_errors());
    assert!(d.has_warnings());
}

#[test]
fn templated_messages() {
    assert_eq!(
        DiagnosticKind::DuplicateSymbol.message(Some("n")),
        "`n` is already declared in this scope"
    );
    assert_eq!(
        DiagnosticKind::TypeMismatch.message(Some("expected int, found float")),
        "type mismatch: expected int, found float"
    );
    assert_eq!(DiagnosticKind::DivisionByZero.message(None), "division by zero");
}

#[test]
fn higher_priority_suppresses_same_start() {
    let mut d = Diagnostics::new();
    d.report(DiagnosticKind::UnknownSymbol, range(6, 7))
        .message("y")
        .emit();
    d.report(DiagnosticKind::ExpectedExpression, range(6, 7)).emit();
    d.report(DiagnosticKind::DivisionByZero, range(2, 3)).emit();

    insta::assert_snapshot!(d.printer().render(), @r"
    error at 2..3: division by zero
    error at 6..7: expected an expression
    ");
}

#[test]
fn duplicates_collapse() {
    let mut d = Diagnostics::new();
    for _ in 0..3 {
        d.report(DiagnosticKind::BreakOutsideLoop, range(0, 5))
            .message("break")
            .emit();
    }
    assert_eq!(d.filtered().len(), 1);
}

#[test]
fn snippet_rendering() {
    let source = "print y;";
    let mut d = Diagnostics::new();
    d.report(DiagnosticKind::UnknownSymbol, range(6, 7))
        .message("y")
        .emit();

    let out = d.printer().source(source).path("main.ks").render();
    assert!(out.contains("error"));
    assert!(out.contains("`y` is not declared"));
    assert!(out.contains("main.ks"));
    assert!(out.contains("print y;"));
}

#[test]
fn related_span_is_rendered() {
    let source = "int a; int a;";
    let mut d = Diagnostics::new();
    d.report(DiagnosticKind::DuplicateSymbol, range(11, 12))
        .message("a")
        .related_to("previously declared here", range(4, 5))
        .emit();

    let out = d.render(source);
    assert!(out.contains("previously declared here"));
}

#[test]
fn empty_span_at_end_of_source() {
    let source = "print 1";
    let mut d = Diagnostics::new();
    d.report(DiagnosticKind::ExpectedSemicolon, range(7, 7)).emit();

    let out = d.render(source);
    assert!(out.contains("expected `;`"));
}
