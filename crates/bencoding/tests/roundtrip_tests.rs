use bencoding::{decode, decode_canonical, encode, Value};

/// Assert that decode → encode reproduces canonical input byte for byte.
fn assert_roundtrip(input: &[u8]) {
    let value = decode(input).expect("decode failed");
    let encoded = encode(&value);
    assert_eq!(
        encoded,
        input,
        "Roundtrip failed:\n  input:  {}\n  output: {}",
        String::from_utf8_lossy(input),
        String::from_utf8_lossy(&encoded)
    );
}

/// Assert that non-canonical input decodes and re-encodes to `expected`.
fn assert_canonicalizes(input: &[u8], expected: &[u8]) {
    let value = decode(input).expect("decode failed");
    assert_eq!(
        encode(&value),
        expected,
        "Canonicalization mismatch for {}",
        String::from_utf8_lossy(input)
    );
}

// ============================================================================
// Primitive Roundtrips
// ============================================================================

#[test]
fn roundtrip_bytestring() {
    assert_roundtrip(b"4:spam");
}

#[test]
fn roundtrip_empty_bytestring() {
    assert_roundtrip(b"0:");
}

#[test]
fn roundtrip_integers() {
    assert_roundtrip(b"i0e");
    assert_roundtrip(b"i3e");
    assert_roundtrip(b"i-3e");
    assert_roundtrip(b"i9223372036854775808e");
    assert_roundtrip(b"i-340282366920938463463374607431768211456e");
}

// ============================================================================
// Container Roundtrips
// ============================================================================

#[test]
fn roundtrip_list() {
    assert_roundtrip(b"l4:spam4:eggse");
}

#[test]
fn roundtrip_dict() {
    assert_roundtrip(b"d3:cow3:moo4:spam4:eggse");
}

#[test]
fn roundtrip_nested_structures() {
    assert_roundtrip(b"d4:listl4:spami42eee");
    assert_roundtrip(b"lld1:ale1:bd1:cleeeee");
}

#[test]
fn roundtrip_empty_containers() {
    assert_roundtrip(b"le");
    assert_roundtrip(b"de");
    assert_roundtrip(b"d0:dee");
}

// ============================================================================
// Realistic Payloads
// ============================================================================

#[test]
fn roundtrip_single_file_torrent() {
    let mut torrent = b"d8:announce35:http://tracker.example.com/announce".to_vec();
    torrent.extend_from_slice(b"4:infod6:lengthi1048576e4:name11:example.iso");
    torrent.extend_from_slice(b"12:piece lengthi262144e6:pieces20:");
    torrent.extend_from_slice(&[0xab; 20]);
    torrent.extend_from_slice(b"ee");
    assert_roundtrip(&torrent);

    let value = decode(&torrent).unwrap();
    let info = value.get(b"info").unwrap();
    assert_eq!(info.get(b"pieces").and_then(Value::as_bytes).map(|b| b.len()), Some(20));
    assert_eq!(info.get(b"piece length").and_then(Value::as_i64), Some(262_144));
}

#[test]
fn roundtrip_multi_file_torrent() {
    assert_roundtrip(
        b"d4:infod5:filesld6:lengthi10e4:pathl1:a5:b.txteed6:lengthi20e4:pathl5:c.txteee\
          4:name3:dir12:piece lengthi16384eee",
    );
}

#[test]
fn roundtrip_tracker_response() {
    let mut resp = b"d8:completei5e10:incompletei2e8:intervali1800e5:peers12:".to_vec();
    resp.extend_from_slice(&[127, 0, 0, 1, 0x1a, 0xe1, 10, 0, 0, 2, 0x1a, 0xe2]);
    resp.push(b'e');
    assert_roundtrip(&resp);
}

#[test]
fn roundtrip_dht_ping() {
    assert_roundtrip(b"d1:ad2:id20:abcdefghij0123456789e1:q4:ping1:t2:aa1:y1:qe");
}

// ============================================================================
// Canonicalization
// ============================================================================

#[test]
fn unsorted_keys_are_sorted_on_encode() {
    assert_canonicalizes(b"d4:spami1e3:cowi2ee", b"d3:cowi2e4:spami1ee");
}

#[test]
fn nested_unsorted_keys_are_sorted_on_encode() {
    assert_canonicalizes(
        b"d1:bd1:zi1e1:yi2ee1:ai0ee",
        b"d1:ai0e1:bd1:yi2e1:zi1eee",
    );
}

#[test]
fn padded_lengths_are_normalized() {
    assert_canonicalizes(b"l004:spame", b"l4:spame");
}

#[test]
fn canonical_payloads_pass_strict_check() {
    for input in [
        &b"d3:cow3:moo4:spam4:eggse"[..],
        b"l4:spam4:eggse",
        b"i-3e",
        b"0:",
    ] {
        assert!(decode_canonical(input).is_ok(), "{}", String::from_utf8_lossy(input));
    }
}
