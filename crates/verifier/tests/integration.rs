//! Integration tests for verifier
//!
//! Tests the full pipeline: object file → code section → decode → verify.

use object::{
    Architecture, BinaryFormat, Endianness, SectionKind,
    write::{Object, StandardSection},
};
use tempfile::TempDir;
use verifier::{
    CpuFeature, DecodeError, FeaturePolicy, LoadError, MicroarchLevel, Validator,
    VerificationError, code_section, decode_instructions,
};

/// A small function using SSE2, POPCNT, LZCNT and CMPXCHG16B.
const FUNCTION: &[u8] = &[
    0x55, // push rbp
    0x48, 0x89, 0xe5, // mov rbp, rsp
    0xf2, 0x0f, 0x58, 0xc1, // addsd xmm0, xmm1
    0xf3, 0x48, 0x0f, 0xb8, 0xc7, // popcnt rax, rdi
    0xf3, 0x0f, 0xbd, 0xc8, // lzcnt ecx, eax
    0xf3, 0x48, 0x0f, 0xb8, 0xd6, // popcnt rdx, rsi
    0xf0, 0x48, 0x0f, 0xc7, 0x0e, // lock cmpxchg16b [rsi]
    0x5d, // pop rbp
    0xc3, // ret
];

/// Writes an x86-64 ELF relocatable with `code` as its text section and reads
/// it back from disk.
fn write_object(code: &[u8]) -> Vec<u8> {
    let mut object = Object::new(BinaryFormat::Elf, Architecture::X86_64, Endianness::Little);
    let text = object.section_id(StandardSection::Text);
    object.append_section_data(text, code, 16);
    let bytes = object.write().expect("failed to write object");

    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let path = temp_dir.path().join("test.o");
    std::fs::write(&path, bytes).expect("failed to write object file");
    std::fs::read(&path).expect("failed to read object file")
}

fn unsupported(errors: &[VerificationError]) -> Vec<(usize, CpuFeature)> {
    errors
        .iter()
        .map(|e| match e {
            VerificationError::UnsupportedCpuFeature {
                offset, feature, ..
            } => (*offset, *feature),
        })
        .collect()
}

#[test]
fn test_load_text_section() {
    let data = write_object(FUNCTION);
    let code = code_section(&data).expect("no code section");

    assert_eq!(code, FUNCTION);
}

#[test]
fn test_missing_code_section() {
    let mut object = Object::new(BinaryFormat::Elf, Architecture::X86_64, Endianness::Little);
    let data_section = object.add_section(Vec::new(), b".data".to_vec(), SectionKind::Data);
    object.append_section_data(data_section, &[1, 2, 3, 4], 4);
    let data = object.write().expect("failed to write object");

    assert!(matches!(
        code_section(&data),
        Err(LoadError::MissingCodeSection)
    ));
}

#[test]
fn test_baseline_rejects_each_feature_once() {
    let data = write_object(FUNCTION);
    let code = code_section(&data).unwrap();
    let policy = FeaturePolicy::for_level(MicroarchLevel::Baseline);

    let result = Validator::verify_code(code, &policy).unwrap();

    assert!(!result.is_ok());
    assert_eq!(
        unsupported(result.errors()),
        vec![
            (8, CpuFeature::Popcnt),
            (13, CpuFeature::Lzcnt),
            (22, CpuFeature::Cx16),
        ]
    );
}

#[test]
fn test_v2_rejects_lzcnt_only() {
    let policy = FeaturePolicy::for_level(MicroarchLevel::V2);
    let result = Validator::verify_code(FUNCTION, &policy).unwrap();

    assert_eq!(unsupported(result.errors()), vec![(13, CpuFeature::Lzcnt)]);
}

#[test]
fn test_v3_accepts() {
    let instructions = decode_instructions(FUNCTION).expect("decode failed");
    let policy = FeaturePolicy::for_level(MicroarchLevel::V3);
    let result = Validator::new(&instructions, &policy).verify();

    assert!(result.is_ok(), "unexpected errors: {:?}", result.errors());
    assert_eq!(
        result.required_features().to_string(),
        "cx16,lm,popcnt,lzcnt,sse2"
    );
}

#[test]
fn test_policy_string_adjustments() {
    let policy: FeaturePolicy = "x86-64-v3,-lzcnt".parse().unwrap();
    let result = Validator::verify_code(FUNCTION, &policy).unwrap();

    assert_eq!(unsupported(result.errors()), vec![(13, CpuFeature::Lzcnt)]);
}

#[test]
fn test_diagnostic_message() {
    let policy = FeaturePolicy::for_level(MicroarchLevel::V2);
    let result = Validator::verify_code(FUNCTION, &policy).unwrap();

    assert_eq!(
        result.errors()[0].to_string(),
        "unsupported cpu feature at 0xd: lzcnt requires lzcnt"
    );
}

#[test]
fn test_truncated_code_fails_decode() {
    let truncated = &FUNCTION[..FUNCTION.len() - 3];
    let policy = FeaturePolicy::default();

    assert!(matches!(
        Validator::verify_code(truncated, &policy),
        Err(DecodeError::InvalidInstruction { offset: 22, .. })
    ));
}
