use proptest::prelude::*;

use apl_primitives::ec::SecretPhrase;
use apl_primitives::reed_solomon;
use apl_transaction::{
    build_unsigned, generate_transaction_bytes, parse, verify_single, Appendix, Attachment,
    TransactionParams,
};

/// Strategy for an optional attachment of either kind.
fn arb_attachment() -> impl Strategy<Value = Option<Attachment>> {
    prop_oneof![
        Just(None),
        "[ -~]{0,200}".prop_map(|s| Some(Attachment::Text(s))),
        prop::collection::vec(any::<u8>(), 0..200).prop_map(|b| Some(Attachment::Binary(b))),
    ]
}

/// Strategy for a fully populated single-signer payment.
fn arb_payment() -> impl Strategy<Value = TransactionParams> {
    (
        any::<u64>(),  // recipient id
        any::<u64>(),  // amount
        any::<u64>(),  // fee
        any::<u16>(),  // deadline
        any::<u32>(),  // timestamp
        any::<u32>(),  // ecBlock height
        any::<u64>(),  // ecBlock id
        arb_attachment(),
    )
        .prop_map(|(recipient, amount, fee, deadline, timestamp, height, block_id, attachment)| {
            let mut params = TransactionParams::payment(reed_solomon::encode(recipient), amount, fee)
                .with_deadline(deadline)
                .with_chain_state(timestamp, height, block_id);
            params.attachment = attachment;
            params
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn unsigned_layout_parses_back(params in arb_payment()) {
        let params = params.with_sender_public_key(SecretPhrase::new("observer").public_key());
        let unsigned = build_unsigned(&params).unwrap();
        let fields = parse(unsigned.as_bytes()).unwrap();

        prop_assert_eq!(Some(fields.recipient_rs.clone()), params.recipient.clone());
        prop_assert_eq!(fields.amount, params.amount);
        prop_assert_eq!(Some(fields.fee), params.fee);
        prop_assert_eq!(Some(fields.deadline), params.deadline);
        prop_assert_eq!(Some(fields.timestamp), params.timestamp);
        prop_assert_eq!(Some(fields.ec_block_height), params.ec_block_height);
        prop_assert_eq!(Some(fields.ec_block_id), params.ec_block_id);
        prop_assert_eq!(fields.appendix, params.attachment.clone().map(Appendix::Message));
        prop_assert_eq!(fields.body_len, unsigned.as_bytes().len());
        prop_assert!(fields.signature.is_none());
    }

    #[test]
    fn signed_payment_verifies(params in arb_payment(), phrase in "[a-z ]{1,24}") {
        let params = params.with_sender_secret(SecretPhrase::new(&phrase));
        let signed = generate_transaction_bytes(&params).unwrap();
        prop_assert!(verify_single(signed.as_bytes()).unwrap());

        let fields = parse(signed.as_bytes()).unwrap();
        prop_assert_eq!(fields.sender_public_key, SecretPhrase::new(&phrase).public_key());
    }

    #[test]
    fn header_tampering_breaks_signature(
        params in arb_payment(),
        offset in 2usize..96,
        bit in 0u8..8
    ) {
        let params = params.with_sender_secret(SecretPhrase::new("tamper test"));
        let mut bytes = generate_transaction_bytes(&params).unwrap().into_bytes();
        bytes[offset] ^= 1 << bit;
        prop_assert!(!verify_single(&bytes).unwrap());
    }
}
