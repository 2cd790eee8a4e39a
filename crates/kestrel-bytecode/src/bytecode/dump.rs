//! Human-readable listing of a code stream.

use std::fmt::Write as _;

use kestrel_core::Colors;

use super::code::decode_all;
use super::format::{format_instruction, format_target};
use super::image::Image;

/// Dump a linked image from its entry address to its end.
pub fn dump(image: &Image, colors: Colors) -> String {
    let c = &colors;
    let mut out = String::new();

    writeln!(out, "{}[header]{}", c.blue, c.reset).unwrap();
    writeln!(out, "entry  {}", format_target(image.entry() as i32)).unwrap();
    writeln!(out, "end    {}", format_target(image.end() as i32)).unwrap();
    writeln!(
        out,
        "crc32  {}{:08x}{}",
        c.dim,
        image.header().checksum,
        c.reset
    )
    .unwrap();
    out.push('\n');

    let from = image.entry() as usize;
    let code = image.code().get(from..).unwrap_or_default();
    write_code(&mut out, code, from as u32, colors);
    out
}

/// Dump raw code, resolved or not. Unresolved targets show as `????`.
pub fn dump_code(code: &[u8], colors: Colors) -> String {
    let mut out = String::new();
    write_code(&mut out, code, 0, colors);
    out
}

fn write_code(out: &mut String, code: &[u8], base: u32, colors: Colors) {
    let c = &colors;
    writeln!(out, "{}[code]{}", c.blue, c.reset).unwrap();
    for (offset, decoded) in decode_all(code) {
        let addr = base + offset;
        match decoded {
            Ok(instr) => {
                writeln!(out, "{}{addr:04x}{}  {}", c.dim, c.reset, format_instruction(&instr))
                    .unwrap()
            }
            Err(e) => writeln!(out, "{}{addr:04x}{}  {}<{e}>{}", c.dim, c.reset, c.red, c.reset)
                .unwrap(),
        }
    }
    if code.is_empty() {
        writeln!(out, "{}; empty{}", c.dim, c.reset).unwrap();
    }
}
