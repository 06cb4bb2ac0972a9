//! # Account Pipeline
//!
//! Compile, decode, build, verify, and disclose over the 47-byte account
//! layout, end to end through the public crate APIs.

use std::io::{Seek, SeekFrom, Write};

use pop_core::{FieldValue, ScaledDecimal};
use pop_crypto::CommitmentKey;
use pop_decode::{decode, DecodeErrorKind, DecodeOptions, Mode};
use pop_manifest::{
    build_manifest, verify, verify_disclosure, CryptoOptions, Disclosure, DisclosureContext, DisclosureError,
    Manifest, ManifestBuilder, MockAnchorSink, VerificationFailure,
};
use pop_schema::{compile_schema, RecordLayout, SchemaOptions};

const ACCOUNT: &str = "
       01  ACCOUNT-REC.
           05  ACCT-ID        PIC X(12).
           05  ACCT-NAME      PIC X(20).
           05  BALANCE        PIC S9(7)V99 COMP-3.
           05  OPEN-YEAR      PIC 9(4).
           05  BRANCH         PIC S9(4) COMP.
           05  FILLER         PIC X(4).
";

fn record(id: &str, name: &str, balance: [u8; 5], year: &str, branch: i16) -> Vec<u8> {
    let mut out = Vec::with_capacity(47);
    out.extend_from_slice(format!("{id:<12}").as_bytes());
    out.extend_from_slice(format!("{name:<20}").as_bytes());
    out.extend_from_slice(&balance);
    out.extend_from_slice(year.as_bytes());
    out.extend_from_slice(&branch.to_be_bytes());
    out.extend_from_slice(b"    ");
    assert_eq!(out.len(), 47);
    out
}

fn two_accounts() -> Vec<u8> {
    let mut data = record("ACCT00000001", "JANE DOE", [0x00, 0x01, 0x23, 0x45, 0x6C], "1999", 42);
    data.extend(record("ACCT00000002", "JOHN ROE", [0x00, 0x00, 0x05, 0x00, 0x0D], "2005", -2));
    data
}

fn layout() -> RecordLayout {
    compile_schema(ACCOUNT, &SchemaOptions::default()).unwrap()
}

fn committed() -> CryptoOptions {
    CryptoOptions {
        commit_fields: vec!["ACCT-ID".into(), "BALANCE".into()],
        ..CryptoOptions::default()
    }
}

fn manifest(data: &[u8], key: &CommitmentKey) -> Manifest {
    let layout = layout();
    build_manifest(decode(&layout, data, DecodeOptions::default()), &committed(), Some(key)).unwrap()
}

#[test]
fn decodes_two_account_records() {
    let layout = layout();
    assert_eq!(layout.length, 47);
    let data = two_accounts();
    let records: Vec<_> = decode(&layout, &data[..], DecodeOptions::default())
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(records.len(), 2);

    let first = &records[0];
    assert_eq!(first.get("ACCT-ID"), Some(&FieldValue::Text("ACCT00000001".into())));
    assert_eq!(
        first.get("BALANCE"),
        Some(&FieldValue::Decimal(ScaledDecimal::new(123_456, 2)))
    );
    assert_eq!(first.get("OPEN-YEAR"), Some(&FieldValue::Integer(1999)));
    assert_eq!(first.get("BRANCH"), Some(&FieldValue::Integer(42)));

    let second = &records[1];
    assert_eq!(second.index, 1);
    assert_eq!(
        second.get("BALANCE"),
        Some(&FieldValue::Decimal(ScaledDecimal::new(-5_000, 2)))
    );
    assert_eq!(second.get("BRANCH"), Some(&FieldValue::Integer(-2)));
}

#[test]
fn build_then_verify_round_trip() {
    let key = CommitmentKey::from_bytes([7; 32]);
    let data = two_accounts();
    let m = manifest(&data, &key);

    assert_eq!(m.record_count, 2);
    assert_eq!(m.record_length, 47);
    assert_eq!(m.commitments.len(), 4);
    let balance = &m.metrics["BALANCE"];
    assert_eq!(balance.count, 2);
    assert_eq!(balance.sum, ScaledDecimal::new(118_456, 2));
    assert_eq!(balance.min, ScaledDecimal::new(-5_000, 2));
    assert_eq!(balance.max, ScaledDecimal::new(123_456, 2));

    let report = verify(&m, ACCOUNT, &data[..], &SchemaOptions::default()).unwrap();
    assert_eq!(report.record_count, 2);
    assert_eq!(report.merkle_root, m.merkle_root);
}

#[test]
fn manifest_survives_json_and_anchors() {
    let key = CommitmentKey::from_bytes([7; 32]);
    let data = two_accounts();
    let m = manifest(&data, &key);

    let json = serde_json::to_string(&m).unwrap();
    let parsed = Manifest::from_json(&json).unwrap();
    assert_eq!(parsed, m);
    assert_eq!(parsed.digest().unwrap(), m.digest().unwrap());
    assert!(verify(&parsed, ACCOUNT, &data[..], &SchemaOptions::default()).is_ok());

    let receipt = parsed.anchor(&MockAnchorSink::new("ledger")).unwrap();
    assert_eq!(receipt.root, m.merkle_root);
    assert!(receipt.receipt.starts_with("mock-1-"));
}

#[test]
fn tampered_name_fails_on_root() {
    let key = CommitmentKey::from_bytes([7; 32]);
    let data = two_accounts();
    let m = manifest(&data, &key);
    let mut tampered = data.clone();
    tampered[47 + 12] = b'X';
    let failure = verify(&m, ACCOUNT, &tampered[..], &SchemaOptions::default()).unwrap_err();
    assert!(matches!(failure, VerificationFailure::MerkleRoot { .. }));
}

#[test]
fn truncated_final_record_is_reported() {
    let layout = layout();
    let mut data = two_accounts();
    data.extend_from_slice(b"ACCT0000");
    let items: Vec<_> = decode(&layout, &data[..], DecodeOptions::default()).collect();
    assert_eq!(items.len(), 3);
    assert!(items[0].is_ok() && items[1].is_ok());
    let err = items[2].as_ref().unwrap_err();
    assert_eq!(err.record_index, 2);
    assert!(matches!(
        err.kind,
        DecodeErrorKind::TruncatedRecord { expected: 47, actual: 8 }
    ));
}

#[test]
fn disclosure_from_file_with_right_and_wrong_keys() {
    let key = CommitmentKey::from_bytes([7; 32]);
    let data = two_accounts();
    let m = manifest(&data, &key);

    let mut file = tempfile::tempfile().unwrap();
    file.write_all(&data).unwrap();
    file.seek(SeekFrom::Start(0)).unwrap();

    let mut ctx = DisclosureContext::new(layout(), m.clone(), key, file).unwrap();
    let disclosures = ctx.disclose(&[1], &["ACCT-ID", "BALANCE"]).unwrap();
    assert_eq!(disclosures.len(), 2);
    assert_eq!(disclosures[0].value, FieldValue::Text("ACCT00000002".into()));
    for d in &disclosures {
        verify_disclosure(d, &m).unwrap();
    }

    let other = CommitmentKey::from_bytes([8; 32]);
    let mut forged = disclosures[1].clone();
    forged.field_key = other.field_key(1, "BALANCE").unwrap();
    assert!(matches!(
        verify_disclosure(&forged, &m),
        Err(DisclosureError::CommitmentMismatch { .. })
    ));

    let mut wrong_ctx = DisclosureContext::new(layout(), m, other, std::io::Cursor::new(data)).unwrap();
    assert!(matches!(
        wrong_ctx.disclose(&[0], &["BALANCE"]),
        Err(DisclosureError::CommitmentMismatch { .. })
    ));
}

#[test]
fn uncommitted_field_cannot_be_disclosed() {
    let key = CommitmentKey::from_bytes([7; 32]);
    let data = two_accounts();
    let m = manifest(&data, &key);
    let mut ctx = DisclosureContext::new(layout(), m, key, std::io::Cursor::new(data)).unwrap();
    assert!(matches!(
        ctx.disclose(&[0], &["ACCT-NAME"]),
        Err(DisclosureError::NotCommitted { .. })
    ));
}

#[test]
fn rejected_middle_record_keeps_later_proofs_valid() {
    let key = CommitmentKey::from_bytes([7; 32]);
    let layout = layout();
    let mut data = two_accounts();
    let rest = data.split_off(47);
    data.extend(record("ACCT00000009", "BAD SIGN", [0x00, 0x00, 0x00, 0x01, 0x3A], "2001", 1));
    data.extend(rest);

    let lenient = DecodeOptions {
        mode: Mode::Lenient,
        ..DecodeOptions::default()
    };
    let mut builder = ManifestBuilder::new(&layout, lenient.clone(), &committed(), Some(&key)).unwrap();
    for item in decode(&layout, &data[..], lenient) {
        builder.push(item).unwrap();
    }
    let (m, proofs) = builder.finish_with_proofs().unwrap();
    assert_eq!((m.record_count, m.rejected_records.clone()), (2, vec![1]));
    assert_eq!(m.leaf_position(2), Some(1));

    let mut ctx =
        DisclosureContext::with_proofs(layout.clone(), m.clone(), proofs, key.clone(), std::io::Cursor::new(data.clone()))
            .unwrap();
    let built = ctx.disclose(&[2], &["BALANCE"]).unwrap().remove(0);
    assert_eq!(built.inclusion.leaf_index, 1);
    assert_eq!(built.value, FieldValue::Decimal(ScaledDecimal::new(-5_000, 2)));

    let json = serde_json::to_string(&built).unwrap();
    let received: Disclosure = serde_json::from_str(&json).unwrap();
    verify_disclosure(&received, &m).unwrap();

    let mut rebuilt = DisclosureContext::new(layout, m.clone(), key, std::io::Cursor::new(data)).unwrap();
    assert_eq!(rebuilt.disclose(&[2], &["BALANCE"]).unwrap()[0], built);
    assert!(matches!(rebuilt.disclose(&[1], &["BALANCE"]), Err(DisclosureError::RejectedRecord(1))));

    let mut forged = received;
    forged.inclusion = rebuilt.disclose(&[0], &["BALANCE"]).unwrap().remove(0).inclusion;
    assert!(matches!(verify_disclosure(&forged, &m), Err(DisclosureError::InclusionProof(2))));
}
