use super::*;

fn sample() -> Image {
    let mut code = CodeBuffer::new();
    code.push(Instruction::Mov(Move::RegImm {
        dst: Reg::Eax,
        imm: 7,
    }))
    .unwrap();
    code.push(Instruction::Special(Special::Print {
        reg: Reg::Eax,
        format: PrintFormat::Int,
    }))
    .unwrap();
    Image::new(code.into_bytes(), 0).unwrap()
}

#[test]
fn bytes_roundtrip() {
    let image = sample();
    let bytes = image.to_bytes();

    assert_eq!(bytes.len(), IMAGE_HEADER_SIZE + 18);
    assert_eq!(&bytes[0..4], b"KSTL");
    assert_eq!(Image::from_bytes(&bytes).unwrap(), image);
}

#[test]
fn header_records_layout() {
    let image = sample();
    let header = image.header();

    assert_eq!(header.version, VERSION);
    assert_eq!(header.entry, 0);
    assert_eq!(header.code_len, 18);
    assert_eq!(header.checksum, crc32fast::hash(image.code()));
    assert_eq!(image.end(), 18);
}

#[test]
fn rejects_short_file() {
    let err = Image::from_bytes(b"KSTL").unwrap_err();
    assert!(matches!(err, ImageError::FileTooSmall(4)));
}

#[test]
fn rejects_bad_magic() {
    let mut bytes = sample().to_bytes();
    bytes[0] = b'X';
    assert!(matches!(
        Image::from_bytes(&bytes).unwrap_err(),
        ImageError::InvalidMagic
    ));
}

#[test]
fn rejects_corrupted_code() {
    let mut bytes = sample().to_bytes();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xff;

    assert!(matches!(
        Image::from_bytes(&bytes).unwrap_err(),
        ImageError::ChecksumMismatch { .. }
    ));
}

#[test]
fn rejects_unresolved_jump() {
    let code = Instruction::Jump {
        target: UNKNOWN_ADDR,
    }
    .encode()
    .to_vec();
    let bytes = Image::new(code, 0).unwrap().to_bytes();

    assert!(matches!(
        Image::from_bytes(&bytes).unwrap_err(),
        ImageError::Unresolved { addr: 0 }
    ));
}

#[test]
fn rejects_misaligned_entry() {
    // The checksum covers the code only, so a patched entry still hashes clean.
    let mut bytes = sample().to_bytes();
    bytes[12..16].copy_from_slice(&4u32.to_le_bytes());

    assert!(matches!(
        Image::from_bytes(&bytes).unwrap_err(),
        ImageError::InvalidEntry { entry: 4 }
    ));
}

#[test]
fn rejects_oversized_code() {
    let len = CODE_SIZE + ENTRY_SIZE;
    let header = Header {
        code_len: len as u32,
        ..Header::default()
    };
    let mut bytes = header.to_bytes().to_vec();
    bytes.resize(IMAGE_HEADER_SIZE + len, 0);

    assert!(matches!(
        Image::from_bytes(&bytes).unwrap_err(),
        ImageError::CodeTooLarge(n) if n == len
    ));
}

#[test]
fn new_checks_entry() {
    let code = sample().code().to_vec();

    assert!(matches!(
        Image::new(code.clone(), 27).unwrap_err(),
        ImageError::InvalidEntry { entry: 27 }
    ));
    assert!(matches!(
        Image::new(code.clone(), 4).unwrap_err(),
        ImageError::InvalidEntry { entry: 4 }
    ));
    assert!(matches!(
        Image::new(vec![], 18).unwrap_err(),
        ImageError::InvalidEntry { entry: 18 }
    ));
    assert_eq!(Image::new(code, 18).unwrap().entry(), 18);
}

#[test]
fn new_checks_size() {
    assert!(matches!(
        Image::new(vec![0; 10], 0).unwrap_err(),
        ImageError::PartialInstruction(10)
    ));
    assert!(matches!(
        Image::new(vec![0; CODE_SIZE + ENTRY_SIZE], 0).unwrap_err(),
        ImageError::CodeTooLarge(_)
    ));
}

#[test]
fn save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("program.kbc");
    let image = sample();

    image.save(&path).unwrap();

    assert_eq!(Image::from_path(&path).unwrap(), image);
}

#[test]
fn decode_at_past_end_is_truncated() {
    let image = sample();
    assert_eq!(
        image.decode_at(18),
        Err(DecodeError::Truncated { len: 0 })
    );
}
