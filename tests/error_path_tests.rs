//! Caller errors and invariant violations

use relay_policy::script::opcodes::*;
use relay_policy::*;

fn p2wpkh_script() -> Vec<u8> {
    let mut script = vec![OP_0, 0x14];
    script.extend_from_slice(&[0x5a; 20]);
    script
}

fn spending_tx(prevout: OutPoint) -> Transaction {
    Transaction {
        version: 2,
        inputs: vec![TransactionInput {
            prevout,
            script_sig: vec![],
            sequence: 0xffffffff,
            witness: vec![vec![0x30; 72], vec![0x03; 33]],
        }],
        outputs: vec![TransactionOutput { value: 10_000, script_pubkey: p2wpkh_script() }],
        lock_time: 0,
    }
}

#[test]
fn test_missing_coin_reported_by_every_lookup() {
    let policy = RelayPolicy::default();
    let prevout = OutPoint { hash: [0xab; 32], index: 7 };
    let tx = spending_tx(prevout.clone());
    let empty = UtxoSet::new();
    let ignore = IgnoreRejects::none();

    let err = policy.are_inputs_standard(&tx, &empty, &ignore).unwrap_err();
    assert!(matches!(&err, PolicyError::MissingCoin(op) if *op == prevout));
    assert!(err.to_string().ends_with(":7"));

    assert!(matches!(
        policy.is_witness_standard(&tx, &empty, &ignore),
        Err(PolicyError::MissingCoin(_))
    ));
    assert!(matches!(
        policy.accurate_sigop_cost(&tx, &empty, SCRIPT_VERIFY_WITNESS),
        Err(PolicyError::MissingCoin(_))
    ));
}

#[test]
fn test_missing_coin_not_needed_without_flags() {
    let policy = RelayPolicy::default();
    let tx = spending_tx(OutPoint { hash: [0xab; 32], index: 7 });
    assert_eq!(policy.accurate_sigop_cost(&tx, &UtxoSet::new(), SCRIPT_VERIFY_NONE).unwrap(), 0);
}

#[test]
#[should_panic(expected = "sigop accounting on spent coin")]
fn test_spent_coin_in_sigop_accounting_panics() {
    let policy = RelayPolicy::default();
    let prevout = OutPoint { hash: [0xcd; 32], index: 0 };
    let tx = spending_tx(prevout.clone());

    let mut coin = Coin::new(TransactionOutput { value: 20_000, script_pubkey: p2wpkh_script() }, 1);
    coin.spent = true;
    let mut coins = UtxoSet::new();
    coins.insert(prevout, coin);

    let _ = policy.accurate_sigop_cost(&tx, &coins, SCRIPT_VERIFY_P2SH | SCRIPT_VERIFY_WITNESS);
}

#[test]
fn test_invalid_config_rejected() {
    assert!(matches!(
        PolicyConfig::from_json_str(r#"{"incremental_relay_fee": -5}"#),
        Err(PolicyError::Config(_))
    ));
    assert!(matches!(
        PolicyConfig::from_json_str(r#"{"bytes_per_sigop_strict": 0}"#),
        Err(PolicyError::Config(_))
    ));
    assert!(matches!(
        PolicyConfig::from_json_str(r#"{"accept_datacarrier": "yes"}"#),
        Err(PolicyError::Serialization(_))
    ));
}

#[test]
fn test_unknown_ignore_identifier() {
    let err = "dust,tx-weight".parse::<IgnoreRejects>().unwrap_err();
    assert_eq!(err.to_string(), "unknown rejection reason: tx-weight");
    assert!(serde_json::from_str::<IgnoreRejects>(r#"["dust", "nope"]"#).is_err());
}

#[test]
fn test_malformed_scripts_never_panic() {
    let policy = RelayPolicy::default();
    let malformed: Vec<Vec<u8>> = vec![
        vec![OP_PUSHDATA4, 0xff, 0xff, 0xff, 0xff],
        vec![OP_PUSHDATA2, 0x01],
        vec![0x4b],
        vec![OP_0, 0x21, 0x02],
        vec![OP_RETURN, OP_PUSHDATA1],
    ];
    for script in malformed {
        let (kind, standard) = policy.classify(&script, true);
        assert_eq!(kind, TxOutType::NonStandard);
        assert!(!standard);
        let _ = policy.dust_threshold(&TransactionOutput { value: 1, script_pubkey: script.clone() });
        assert_eq!(script::sig_op_count(&script, true), 0);
    }
}
