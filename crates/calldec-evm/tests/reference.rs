//! Cross-checks against alloy's ABI implementation.
//!
//! `alloy-dyn-abi` and `alloy-json-abi` serve as an independent reference:
//! payloads they encode must decode here, our encoder must produce their
//! exact bytes, and selectors must agree.

use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_json_abi::JsonAbi;
use alloy_primitives::{Address, B256, I256, U256};
use calldec_core::{config::DecoderConfig, types::DecodedValue};
use calldec_evm::{encode_params, CallDecoder, SelectorIndex};

const CTOR_ABI: &str = r#"[{"type":"constructor","inputs":[
    {"name":"owner","type":"address"},
    {"name":"amounts","type":"uint256[]"},
    {"name":"label","type":"string"},
    {"name":"legs","type":"tuple[]","components":[
        {"name":"active","type":"bool"},
        {"name":"payload","type":"bytes"}
    ]},
    {"name":"salt","type":"bytes32"},
    {"name":"delta","type":"int64"},
    {"name":"pair","type":"uint8[2]"}
]}]"#;

fn owner() -> Address {
    "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045".parse().unwrap()
}

fn reference_payload() -> Vec<u8> {
    DynSolValue::Tuple(vec![
        DynSolValue::Address(owner()),
        DynSolValue::Array(vec![
            DynSolValue::Uint(U256::from(1u8), 256),
            DynSolValue::Uint(U256::MAX, 256),
        ]),
        DynSolValue::String("hello".into()),
        DynSolValue::Array(vec![
            DynSolValue::Tuple(vec![DynSolValue::Bool(true), DynSolValue::Bytes(vec![0xde, 0xad])]),
            DynSolValue::Tuple(vec![DynSolValue::Bool(false), DynSolValue::Bytes(vec![])]),
        ]),
        DynSolValue::FixedBytes(B256::repeat_byte(0x11), 32),
        DynSolValue::Int(I256::try_from(-42i64).unwrap(), 64),
        DynSolValue::FixedArray(vec![
            DynSolValue::Uint(U256::from(7u8), 8),
            DynSolValue::Uint(U256::from(9u8), 8),
        ]),
    ])
    .abi_encode_params()
}

#[test]
fn decodes_reference_encoding() {
    let decoder = CallDecoder::from_abi_json(CTOR_ABI, DecoderConfig::default()).unwrap();
    let ctor = decoder.decode_constructor_bytes(&reference_payload()).unwrap();

    assert_eq!(ctor.arg("owner").and_then(DecodedValue::as_address), Some(owner()));

    let amounts = ctor.arg("amounts").and_then(DecodedValue::as_array).unwrap();
    assert_eq!(amounts[0].as_u256(), Some(U256::from(1u8)));
    assert_eq!(amounts[1].as_u256(), Some(U256::MAX));

    assert_eq!(ctor.arg("label").and_then(DecodedValue::as_str), Some("hello"));

    let legs = ctor.arg("legs").and_then(DecodedValue::as_array).unwrap();
    assert_eq!(legs.len(), 2);
    assert_eq!(legs[0].field("active").and_then(DecodedValue::as_bool), Some(true));
    assert_eq!(
        legs[0].field("payload").and_then(DecodedValue::as_bytes),
        Some(&[0xde, 0xad][..])
    );
    assert_eq!(legs[1].field("payload").and_then(DecodedValue::as_bytes), Some(&[][..]));

    assert_eq!(
        ctor.arg("salt"),
        Some(&DecodedValue::FixedBytes(vec![0x11; 32]))
    );
    assert_eq!(
        ctor.arg("delta").and_then(DecodedValue::as_i256),
        Some(I256::try_from(-42i64).unwrap())
    );
    assert_eq!(
        ctor.arg("pair"),
        Some(&DecodedValue::Array(vec![
            DecodedValue::Uint { bits: 8, value: U256::from(7u8) },
            DecodedValue::Uint { bits: 8, value: U256::from(9u8) },
        ]))
    );
}

#[test]
fn encoder_matches_reference_bytes() {
    let index = SelectorIndex::from_abi_json(CTOR_ABI).unwrap();
    let decoder = CallDecoder::new(index.clone(), DecoderConfig::default());
    let payload = reference_payload();
    let ctor = decoder.decode_constructor_bytes(&payload).unwrap();

    let types = index.constructor().unwrap().types();
    let values: Vec<_> = ctor.args.into_iter().map(|a| a.value).collect();
    assert_eq!(encode_params(&types, &values).unwrap(), payload);
}

#[test]
fn reference_decodes_our_encoding() {
    let index = SelectorIndex::from_abi_json(CTOR_ABI).unwrap();
    let types = index.constructor().unwrap().types();
    let values = vec![
        DecodedValue::Address(owner()),
        DecodedValue::Array(vec![]),
        DecodedValue::String(String::new()),
        DecodedValue::Array(vec![DecodedValue::Tuple(vec![
            ("active".into(), DecodedValue::Bool(true)),
            ("payload".into(), DecodedValue::Bytes(vec![0xab; 40])),
        ])]),
        DecodedValue::FixedBytes(vec![0; 32]),
        DecodedValue::Int { bits: 64, value: I256::MINUS_ONE },
        DecodedValue::Array(vec![
            DecodedValue::Uint { bits: 8, value: U256::from(255u8) },
            DecodedValue::Uint { bits: 8, value: U256::ZERO },
        ]),
    ];
    let encoded = encode_params(&types, &values).unwrap();

    let sig: Vec<String> = types.iter().map(|t| t.to_string()).collect();
    let ty = DynSolType::parse(&format!("({})", sig.join(","))).unwrap();
    let decoded = ty.abi_decode_params(&encoded).unwrap();
    let DynSolValue::Tuple(items) = decoded else {
        panic!("expected a tuple, got {decoded:?}");
    };
    assert_eq!(items.len(), 7);
    assert_eq!(items[0], DynSolValue::Address(owner()));
    assert_eq!(items[1], DynSolValue::Array(vec![]));
    assert_eq!(items[2], DynSolValue::String(String::new()));
    assert_eq!(items[5], DynSolValue::Int(I256::MINUS_ONE, 64));
}

#[test]
fn selectors_match_json_abi() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../fixtures/abi/exchange_v2.json");
    let json = std::fs::read_to_string(path).expect("fixture not found");

    let reference = JsonAbi::from_json_str(&json).unwrap();
    let index = SelectorIndex::from_abi_json(&json).unwrap();

    let mut count = 0;
    for function in reference.functions() {
        let resolved = index
            .get(function.selector().0)
            .unwrap_or_else(|| panic!("{} missing from index", function.signature()));
        assert_eq!(resolved.signature, function.signature());
        count += 1;
    }
    assert_eq!(count, index.len());
    assert!(index.constructor().is_some());
}
