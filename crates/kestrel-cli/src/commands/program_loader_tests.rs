use kestrel_lib::Interpreter;

use super::program_loader::{ProgramInput, classify, load_program};

#[test]
fn eval_text_wins() {
    let input = load_program(None, Some("print 1;")).unwrap();
    assert_eq!(input.as_source(), Some(("<eval>", "print 1;")));
}

#[test]
fn missing_program() {
    let Err(msg) = load_program(None, None) else {
        panic!("expected an error");
    };
    insta::assert_snapshot!(msg, @"program is required: use a positional path or -e/--eval");
}

#[test]
fn unreadable_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nope.kst");
    let Err(msg) = load_program(Some(&path), None) else {
        panic!("expected an error");
    };
    assert!(msg.starts_with("failed to read '"));
}

#[test]
fn source_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prog.kst");
    std::fs::write(&path, "print 2;").unwrap();

    let input = load_program(Some(&path), None).unwrap();
    let (_, text) = input.as_source().unwrap();
    assert_eq!(text, "print 2;");
}

#[test]
fn image_file_is_detected_by_magic() {
    let mut interp = Interpreter::new();
    interp.compile("print 3;").unwrap();
    let bytes = interp.link().unwrap().to_bytes();

    let input = classify("prog.bin".to_owned(), bytes).unwrap();
    assert!(matches!(input, ProgramInput::Image(_)));
    assert!(input.as_source().is_none());
}

#[test]
fn corrupt_image() {
    let mut interp = Interpreter::new();
    interp.compile("print 3;").unwrap();
    let mut bytes = interp.link().unwrap().to_bytes();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xff;

    let Err(msg) = classify("prog.kbc".to_owned(), bytes) else {
        panic!("expected an error");
    };
    assert!(msg.starts_with("prog.kbc: checksum mismatch"));
}

#[test]
fn invalid_utf8() {
    let Err(msg) = classify("bin".to_owned(), vec![0xff, 0xfe]) else {
        panic!("expected an error");
    };
    insta::assert_snapshot!(msg, @"bin: not valid UTF-8");
}
