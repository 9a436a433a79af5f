//! End-to-end tests for the apl-transaction crate.
//!
//! Covers the build, sign, parse cycle for payments and child-account
//! transactions, attachments, multi-signature assembly, and the one-step
//! `generate_transaction_bytes` entry point.

use apl_primitives::ec::SecretPhrase;

use crate::appendix::{AddressScope, Appendix, Attachment};
use crate::params::{TransactionKind, TransactionParams};
use crate::signing::{generate_transaction_bytes, sign_multi, sign_single, verify_multi, verify_single};
use crate::transaction::{build_unsigned, parse, HEADER_LEN, MESSAGE_FLAG};
use crate::TransactionError;

// -----------------------------------------------------------------------
// Fixtures
// -----------------------------------------------------------------------

const PHRASE_A: &str = "Red fox jumps over the Lazy dog";
const PHRASE_B: &str = "Red dog jumps over the Lazy fox";

const RECIPIENT_RS: &str = "APL-NZKH-MZRE-2CTT-98NPZ";
const RECIPIENT_ID: u64 = 9211698109297098287;

/// RS address of PHRASE_A's account.
const SENDER_RS: &str = "APL-JTXK-TPXG-LYLT-F646A";

fn chain_state(params: TransactionParams) -> TransactionParams {
    params.with_chain_state(150_000_000, 1_234_567, 0x0fed_cba9_8765_4321)
}

// -----------------------------------------------------------------------
// Payments
// -----------------------------------------------------------------------

/// Build, sign and parse a payment; the recipient and amounts survive.
#[test]
fn test_payment_build_sign_parse() {
    let secret = SecretPhrase::new(PHRASE_A);
    let params = chain_state(
        TransactionParams::payment(RECIPIENT_RS, 250_000_000, 100_000_000)
            .with_sender_secret(secret.clone())
            .with_deadline(720),
    );

    let unsigned = build_unsigned(&params).expect("should build");
    let signed = sign_single(&unsigned, &secret).expect("should sign");
    let fields = parse(signed.as_bytes()).expect("should parse");

    assert_eq!(fields.kind, TransactionKind::Payment);
    assert_eq!(fields.recipient_rs, RECIPIENT_RS);
    assert_eq!(fields.recipient_id, RECIPIENT_ID);
    assert_eq!(fields.amount, 250_000_000);
    assert_eq!(fields.fee, 100_000_000);
    assert_eq!(fields.deadline, 720);
    assert_eq!(fields.timestamp, 150_000_000);
    assert_eq!(fields.ec_block_height, 1_234_567);
    assert_eq!(fields.ec_block_id, 0x0fed_cba9_8765_4321);
    assert_eq!(fields.sender_rs, SENDER_RS);
    assert_eq!(fields.sender_public_key, secret.public_key());
    assert!(fields.signature.is_some());
    assert!(verify_single(signed.as_bytes()).unwrap());
}

/// Signing is deterministic, so the same params give the same bytes.
#[test]
fn test_payment_signing_is_deterministic() {
    let params = chain_state(
        TransactionParams::payment(RECIPIENT_RS, 1, 1).with_sender_secret(SecretPhrase::new(PHRASE_A)),
    );
    let first = generate_transaction_bytes(&params).unwrap();
    let second = generate_transaction_bytes(&params).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.as_bytes().len(), HEADER_LEN);
}

#[test]
fn test_text_attachment_sets_flag() {
    let text = "{\"text\":\"Text in attachment\"}";
    let params = chain_state(
        TransactionParams::payment(RECIPIENT_RS, 1, 1)
            .with_sender_secret(SecretPhrase::new(PHRASE_A))
            .with_attachment(Attachment::Text(text.to_string())),
    );
    let signed = generate_transaction_bytes(&params).unwrap();
    let bytes = signed.as_bytes();

    assert_eq!(bytes.len(), HEADER_LEN + 5 + text.len());
    assert_eq!(&bytes[160..164], &MESSAGE_FLAG.to_le_bytes());
    assert_eq!(bytes[HEADER_LEN], 1);

    let fields = parse(bytes).unwrap();
    assert_eq!(fields.appendix, Some(Appendix::Message(Attachment::Text(text.to_string()))));
    assert!(verify_single(bytes).unwrap());
}

#[test]
fn test_binary_attachment_round_trip() {
    let params = chain_state(
        TransactionParams::payment(RECIPIENT_RS, 1, 1)
            .with_sender_secret(SecretPhrase::new(PHRASE_A))
            .with_attachment(Attachment::Binary(vec![0u8, 1, 2, 0xff])),
    );
    let fields = parse(generate_transaction_bytes(&params).unwrap().as_bytes()).unwrap();
    assert_eq!(fields.appendix, Some(Appendix::Message(Attachment::Binary(vec![0u8, 1, 2, 0xff]))));
    assert_eq!(fields.flags, MESSAGE_FLAG);
}

/// The referenced hash is copied verbatim into bytes 64..96.
#[test]
fn test_referenced_hash() {
    let params = chain_state(
        TransactionParams::payment(RECIPIENT_RS, 1, 1)
            .with_sender_secret(SecretPhrase::new(PHRASE_A))
            .with_referenced_hash([0xab; 32]),
    );
    let unsigned = build_unsigned(&params).unwrap();
    assert_eq!(&unsigned.as_bytes()[64..96], &[0xab; 32]);
    assert_eq!(parse(unsigned.as_bytes()).unwrap().referenced_hash, [0xab; 32]);
}

// -----------------------------------------------------------------------
// Multi-signature
// -----------------------------------------------------------------------

/// Distinct sender and parent secrets produce a version-2 transaction with
/// a trailer signed by the sender first.
#[test]
fn test_generate_multisig() {
    let sender = SecretPhrase::new(PHRASE_A);
    let parent = SecretPhrase::new(PHRASE_B);
    let params = chain_state(
        TransactionParams::payment(RECIPIENT_RS, 10, 1)
            .with_sender_secret(sender.clone())
            .with_parent_secret(parent.clone()),
    );

    let signed = generate_transaction_bytes(&params).unwrap();
    let fields = parse(signed.as_bytes()).unwrap();

    assert_eq!(fields.version, 2);
    assert_eq!(signed.as_bytes()[1], 0x20);
    assert_eq!(fields.signature, None);
    assert_eq!(fields.multisig.len(), 2);
    assert_eq!(fields.multisig[0].key_id, sender.public_key().key_id());
    assert_eq!(fields.multisig[1].key_id, parent.public_key().key_id());
    assert_eq!(fields.body_len, HEADER_LEN);

    assert!(verify_multi(signed.as_bytes(), &[parent.public_key()]).unwrap());
    assert!(!verify_single(signed.as_bytes()).unwrap());
}

/// Explicit signer lists keep their order.
#[test]
fn test_sign_multi_matches_generate() {
    let sender = SecretPhrase::new(PHRASE_A);
    let parent = SecretPhrase::new(PHRASE_B);
    let params = chain_state(
        TransactionParams::payment(RECIPIENT_RS, 10, 1)
            .with_sender_secret(sender.clone())
            .with_parent_secret(parent.clone()),
    );
    let unsigned = build_unsigned(&params).unwrap();
    assert_eq!(
        sign_multi(&unsigned, &[sender, parent]).unwrap(),
        generate_transaction_bytes(&params).unwrap()
    );
}

/// Identical sender and parent secrets sign once.
#[test]
fn test_same_secrets_sign_single() {
    let params = chain_state(
        TransactionParams::payment(RECIPIENT_RS, 10, 1)
            .with_sender_secret(SecretPhrase::new(PHRASE_A))
            .with_parent_secret(SecretPhrase::new(PHRASE_A)),
    );
    let signed = generate_transaction_bytes(&params).unwrap();
    assert_eq!(signed.as_bytes().len(), HEADER_LEN);
    assert_eq!(signed.as_bytes()[1], 0x10);
    assert!(verify_single(signed.as_bytes()).unwrap());
}

/// A trailer entry whose signature was altered fails verification.
#[test]
fn test_multisig_tampered_entry() {
    let params = chain_state(
        TransactionParams::payment(RECIPIENT_RS, 10, 1)
            .with_sender_secret(SecretPhrase::new(PHRASE_A))
            .with_parent_secret(SecretPhrase::new(PHRASE_B)),
    );
    let mut bytes = generate_transaction_bytes(&params).unwrap().into_bytes();
    let last = bytes.len() - 1;
    bytes[last] ^= 0x80;
    let parent = SecretPhrase::new(PHRASE_B).public_key();
    assert!(!verify_multi(&bytes, &[parent]).unwrap());
}

/// A trailer whose count overstates the entries is malformed.
#[test]
fn test_truncated_trailer() {
    let params = chain_state(
        TransactionParams::payment(RECIPIENT_RS, 10, 1)
            .with_sender_secret(SecretPhrase::new(PHRASE_A))
            .with_parent_secret(SecretPhrase::new(PHRASE_B)),
    );
    let mut bytes = generate_transaction_bytes(&params).unwrap().into_bytes();
    bytes.truncate(bytes.len() - 10);
    assert!(matches!(parse(&bytes), Err(TransactionError::Malformed(_))));
}

// -----------------------------------------------------------------------
// Child accounts
// -----------------------------------------------------------------------

/// A parent registers two children; the parent is both signer and recipient.
#[test]
fn test_child_account_transaction() {
    let parent = SecretPhrase::new(PHRASE_A);
    let children = vec![
        SecretPhrase::new("child one").public_key(),
        SecretPhrase::new("child two").public_key(),
    ];
    let params = chain_state(
        TransactionParams::child_account(SENDER_RS, children.clone(), 100_000_000)
            .with_parent_secret(parent.clone())
            .with_address_scope(AddressScope::Custom),
    );

    let signed = generate_transaction_bytes(&params).unwrap();
    let bytes = signed.as_bytes();
    assert_eq!(bytes[0], 10);
    assert_eq!(bytes[1], 0x10);
    assert_eq!(bytes.len(), HEADER_LEN + 4 + 64);
    assert_eq!(&bytes[160..164], &[0, 0, 0, 0]);

    let fields = parse(bytes).unwrap();
    assert_eq!(fields.kind, TransactionKind::ChildAccount);
    assert_eq!(fields.recipient_rs, SENDER_RS);
    assert_eq!(fields.sender_public_key, parent.public_key());
    assert_eq!(
        fields.appendix,
        Some(Appendix::ChildAccount { scope: AddressScope::Custom, public_keys: children })
    );
    assert!(verify_single(bytes).unwrap());
}

/// Distinct sender and parent secrets still give a single sender signature.
#[test]
fn test_child_account_with_sender_and_parent_signs_once() {
    let sender = SecretPhrase::new(PHRASE_B);
    let params = chain_state(
        TransactionParams::child_account(SENDER_RS, vec![SecretPhrase::new("child").public_key()], 1)
            .with_sender_secret(sender.clone())
            .with_parent_secret(SecretPhrase::new(PHRASE_A)),
    );

    let signed = generate_transaction_bytes(&params).unwrap();
    let bytes = signed.as_bytes();
    assert_eq!(bytes[1], 0x10);
    assert_eq!(bytes.len(), HEADER_LEN + 4 + 32);

    let fields = parse(bytes).unwrap();
    assert!(fields.multisig.is_empty());
    assert_eq!(fields.sender_public_key, sender.public_key());
    assert!(verify_single(bytes).unwrap());
}

#[test]
fn test_child_account_without_children() {
    let params = chain_state(
        TransactionParams::child_account(SENDER_RS, Vec::new(), 1)
            .with_parent_secret(SecretPhrase::new(PHRASE_A)),
    );
    assert!(matches!(build_unsigned(&params), Err(TransactionError::Validation(_))));
}
