use base64::{engine::general_purpose::URL_SAFE, Engine};
use devlic_crypto::{
    Codec, CodecFormat, CryptoError, EncryptedData, IV_SIZE, KeyContext, NONCE_SIZE,
    SEALED_PREFIX,
};

fn legacy_codec() -> Codec {
    Codec::new(KeyContext::default_random())
}

fn sealed_codec() -> Codec {
    Codec::new(KeyContext::default_random()).with_format(CodecFormat::Sealed)
}

// ── Legacy format ────────────────────────────────────────────────

#[test]
fn legacy_roundtrip_all_key_sizes() {
    for len in [16, 24, 32] {
        let codec = Codec::new(KeyContext::random(len).unwrap());
        let encoded = codec.encode(b"Hello, World!").unwrap();
        assert_eq!(codec.decode(&encoded).unwrap(), b"Hello, World!");
    }
}

#[test]
fn legacy_is_default_format() {
    let codec = legacy_codec();
    assert_eq!(codec.format(), CodecFormat::Legacy);
    let encoded = codec.encode(b"x").unwrap();
    assert!(!encoded.starts_with(SEALED_PREFIX));
    assert_eq!(CodecFormat::detect(&encoded), CodecFormat::Legacy);
}

#[test]
fn legacy_layout_is_iv_then_whole_blocks() {
    let codec = legacy_codec();
    let encoded = codec.encode(b"exactly sixteen!").unwrap();
    let raw = URL_SAFE.decode(&encoded).unwrap();
    // 16-byte plaintext gains a full padding block
    assert_eq!(raw.len(), IV_SIZE + 32);
}

#[test]
fn legacy_output_is_url_safe() {
    let codec = legacy_codec();
    for _ in 0..32 {
        let encoded = codec.encode(&[0xFBu8; 47]).unwrap();
        assert!(!encoded.contains('+'));
        assert!(!encoded.contains('/'));
    }
}

#[test]
fn legacy_decode_accepts_missing_padding() {
    let codec = legacy_codec();
    let encoded = codec.encode(b"payload").unwrap();
    let stripped = encoded.trim_end_matches('=');
    assert_eq!(codec.decode(stripped).unwrap(), b"payload");
}

#[test]
fn empty_plaintext_roundtrip() {
    let codec = legacy_codec();
    let encoded = codec.encode(b"").unwrap();
    assert_eq!(codec.decode(&encoded).unwrap(), b"");
}

#[test]
fn same_plaintext_produces_different_text() {
    let codec = legacy_codec();
    let a = codec.encode(b"Same").unwrap();
    let b = codec.encode(b"Same").unwrap();
    assert_ne!(a, b);
    assert_eq!(codec.decode(&a).unwrap(), codec.decode(&b).unwrap());
}

#[test]
fn invalid_base64_is_decode_error() {
    let codec = legacy_codec();
    assert!(matches!(codec.decode("%%%not base64%%%"), Err(CryptoError::Decode(_))));
}

#[test]
fn short_input_is_decode_error() {
    let codec = legacy_codec();
    let text = URL_SAFE.encode([0u8; 20]);
    assert!(matches!(codec.decode(&text), Err(CryptoError::Decode(_))));
}

#[test]
fn misaligned_ciphertext_is_decode_error() {
    let codec = legacy_codec();
    let encoded = codec.encode(b"some payload").unwrap();
    let mut raw = URL_SAFE.decode(&encoded).unwrap();
    raw.push(0);
    let err = codec.decode(&URL_SAFE.encode(&raw)).unwrap_err();
    assert!(format!("{err}").contains("multiple"));
}

#[test]
fn legacy_wrong_key_usually_fails_padding() {
    let key_a = Codec::new(KeyContext::default_random());
    let key_b = Codec::new(KeyContext::default_random());
    let encoded = key_a.encode(br#"{"device_fingerprint":"abc"}"#).unwrap();
    // Either padding fails or the output is garbage; it is never the plaintext.
    match key_b.decode(&encoded) {
        Err(CryptoError::Decode(_)) => {}
        Ok(bytes) => assert_ne!(bytes, br#"{"device_fingerprint":"abc"}"#),
        Err(other) => panic!("unexpected error: {other}"),
    }
}

#[test]
fn legacy_iv_tampering_goes_undetected() {
    let codec = legacy_codec();
    let plaintext = b"first block data|second block data";
    let encoded = codec.encode(plaintext).unwrap();

    let mut raw = URL_SAFE.decode(&encoded).unwrap();
    raw[0] ^= 0x01;
    let decoded = codec.decode(&URL_SAFE.encode(&raw)).unwrap();

    assert_ne!(decoded, plaintext);
    assert_eq!(decoded[0], plaintext[0] ^ 0x01);
    assert_eq!(&decoded[1..], &plaintext[1..]);
}

// ── Sealed format ────────────────────────────────────────────────

#[test]
fn sealed_roundtrip_all_key_sizes() {
    for len in [16, 24, 32] {
        let codec = Codec::new(KeyContext::random(len).unwrap()).with_format(CodecFormat::Sealed);
        let encoded = codec.encode(b"Hello, World!").unwrap();
        assert!(encoded.starts_with(SEALED_PREFIX));
        assert_eq!(codec.decode(&encoded).unwrap(), b"Hello, World!");
    }
}

#[test]
fn sealed_wrong_key_fails() {
    let codec = sealed_codec();
    let other = sealed_codec();
    let encoded = codec.encode(b"Secret").unwrap();
    assert!(matches!(other.decode(&encoded), Err(CryptoError::Decode(_))));
}

#[test]
fn sealed_tampering_detected() {
    let codec = sealed_codec();
    let encoded = codec.encode(b"Secret payload").unwrap();
    let body = encoded.strip_prefix(SEALED_PREFIX).unwrap();
    let mut raw = base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(body).unwrap();
    let last = raw.len() - 1;
    raw[last] ^= 0xFF;
    let tampered = format!(
        "{SEALED_PREFIX}{}",
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(&raw)
    );
    assert!(matches!(codec.decode(&tampered), Err(CryptoError::Decode(_))));
}

#[test]
fn any_codec_decodes_both_formats() {
    let key = KeyContext::default_random();
    let legacy = Codec::new(key.clone());
    let sealed = Codec::new(key).with_format(CodecFormat::Sealed);

    let from_legacy = legacy.encode(b"one").unwrap();
    let from_sealed = sealed.encode(b"two").unwrap();

    assert_eq!(sealed.decode(&from_legacy).unwrap(), b"one");
    assert_eq!(legacy.decode(&from_sealed).unwrap(), b"two");
}

#[test]
fn surrounding_whitespace_ignored() {
    let codec = sealed_codec();
    let encoded = codec.encode(b"trim me").unwrap();
    assert_eq!(codec.decode(&format!("  {encoded}\n")).unwrap(), b"trim me");
}

#[test]
fn detect_picks_format_by_prefix() {
    let sealed = sealed_codec().encode(b"x").unwrap();
    let legacy = legacy_codec().encode(b"x").unwrap();
    assert_eq!(CodecFormat::detect(&sealed), CodecFormat::Sealed);
    assert_eq!(CodecFormat::detect(&format!("\n{sealed}")), CodecFormat::Sealed);
    assert_eq!(CodecFormat::detect(&legacy), CodecFormat::Legacy);
}

#[test]
fn sealed_prefix_with_bad_body_is_not_tried_as_legacy() {
    let err = legacy_codec().decode("v2.AAAA").unwrap_err();
    assert!(matches!(err, CryptoError::Decode(ref m) if m.contains("too short")));
}

// ── EncryptedData ────────────────────────────────────────────────

#[test]
fn encrypted_data_bytes_roundtrip() {
    let ed = EncryptedData {
        nonce: [9u8; NONCE_SIZE],
        ciphertext: vec![1u8; 20],
    };
    assert_eq!(ed.to_bytes().len(), NONCE_SIZE + 20);
    let parsed = EncryptedData::from_bytes(&ed.to_bytes()).unwrap();
    assert_eq!(parsed, ed);
}

#[test]
fn encrypted_data_too_short() {
    assert!(EncryptedData::from_bytes(&[0u8; NONCE_SIZE + 3]).is_err());
}

// ── Concurrency ──────────────────────────────────────────────────

#[test]
fn shared_codec_across_threads() {
    let codec = legacy_codec();
    std::thread::scope(|s| {
        for i in 0..4u8 {
            let codec = &codec;
            s.spawn(move || {
                let encoded = codec.encode(&[i; 40]).unwrap();
                assert_eq!(codec.decode(&encoded).unwrap(), vec![i; 40]);
            });
        }
    });
}
