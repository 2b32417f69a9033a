//! Integration tests for the kdbxcore crypto module.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use kdbxcore::crypto::backend::{create, AesCbcKey, BackendKind, CryptoBackend};
use kdbxcore::crypto::fallback::FallbackBackend;
use kdbxcore::crypto::{
    Argon2Params, CryptoEngine, HashAlgorithm, ProtectedValue, RustArgon2, SaltGenerator,
    EMPTY_SHA256, EMPTY_SHA512,
};
use kdbxcore::errors::{ErrorCode, KdbxError};

fn hex(s: &str) -> Vec<u8> {
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
        .collect()
}

/// Every backend compiled into this build.
fn engines() -> Vec<CryptoEngine> {
    let mut kinds = vec![BackendKind::Fallback];
    if cfg!(feature = "native") {
        kinds.push(BackendKind::Native);
    }
    kinds
        .into_iter()
        .map(|kind| CryptoEngine::with_backend(create(kind).unwrap()))
        .collect()
}

// ---------------------------------------------------------------------------
// Known-answer tests
// ---------------------------------------------------------------------------

#[test]
fn sha2_known_answers() {
    for engine in engines() {
        assert_eq!(engine.sha256(b""), EMPTY_SHA256);
        assert_eq!(engine.sha512(b""), EMPTY_SHA512);
        assert_eq!(
            engine.sha256(b"abc"),
            hex("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
        );
        assert_eq!(
            engine.hash(HashAlgorithm::Sha512, b"abc"),
            hex(concat!(
                "ddaf35a193617abacc417349ae20413112e6fa4e89a97ea20a9eeee64b55d39a",
                "2192992a274fc1a836ba3c23a3feebbd454d4423643ce80e2a9ac94fa54ca49f"
            ))
        );
    }
}

#[test]
fn hmac_sha256_rfc4231_case_2() {
    for engine in engines() {
        let mac = engine
            .keyed_hash(b"Jefe", b"what do ya want for nothing?")
            .unwrap();
        assert_eq!(
            mac,
            hex("5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843")
        );
    }
}

#[test]
fn aes256_cbc_nist_first_block() {
    // NIST SP 800-38A F.2.5; the first ciphertext block is independent of padding.
    let key = hex("603deb1015ca71be2b73aef0857d77811f352c073b6108d72d9810a30914dff4");
    let iv = hex("000102030405060708090a0b0c0d0e0f");
    let plaintext = hex("6bc1bee22e409f96e93d7e117393172a");

    for engine in engines() {
        let mut cipher = engine.aes_cbc();
        cipher.import_key(&key).unwrap();
        let ct = cipher.encrypt(&plaintext, &iv).unwrap();
        assert_eq!(ct.len(), 32, "one block plus a full padding block");
        assert_eq!(ct[..16], hex("f58c4c04d6e5f1ba779eabfb5f7bfbd6")[..]);
    }
}

#[test]
fn chacha20_zero_key_keystream() {
    // RFC 8439 A.1 test vector #1: all-zero key and nonce, counter 0.
    let engine = CryptoEngine::new();
    let out = engine.chacha20(&[0u8; 64], &[0u8; 32], &[0u8; 12]).unwrap();
    assert_eq!(
        out,
        hex(concat!(
            "76b8e0ada0f13d90405d6ae55386bd28bdd219b8a08ded1aa836efcc8b770dc7",
            "da41597c5157488d7724e03fb8d84a376a43b8f41518a11cc387b669b2ee6586"
        ))
    );
}

#[test]
fn chacha20_rfc8439_sunscreen() {
    // RFC 8439 2.4.2 starts at block counter 1; skip block 0 with a zero prefix.
    let key: Vec<u8> = (0u8..32).collect();
    let nonce = hex("000000000000004a00000000");
    let plaintext = b"Ladies and Gentlemen of the class of '99: If I could offer you \
only one tip for the future, sunscreen would be it.";

    let mut input = vec![0u8; 64];
    input.extend_from_slice(plaintext);

    let engine = CryptoEngine::new();
    let out = engine.chacha20(&input, &key, &nonce).unwrap();
    let ct = &out[64..];
    assert_eq!(ct.len(), plaintext.len());
    assert_eq!(ct[..16], hex("6e2e359a2568f98041ba0728dd0d6981")[..]);

    // Self-inverse.
    let back = engine.chacha20(&out, &key, &nonce).unwrap();
    assert_eq!(&back[64..], &plaintext[..]);
}

// ---------------------------------------------------------------------------
// Backend agreement
// ---------------------------------------------------------------------------

#[test]
fn aes_cbc_round_trips_across_backends() {
    let key = [0x42u8; 32];
    let iv = [0x24u8; 16];
    let messages: [&[u8]; 4] = [b"", b"short", &[7u8; 16], &[9u8; 1000]];

    for enc_engine in engines() {
        for dec_engine in engines() {
            let mut enc = enc_engine.aes_cbc();
            enc.import_key(&key).unwrap();
            let mut dec = dec_engine.aes_cbc();
            dec.import_key(&key).unwrap();

            for msg in messages {
                let ct = enc.encrypt(msg, &iv).unwrap();
                assert_eq!(ct.len() % 16, 0);
                assert_eq!(
                    dec.decrypt(&ct, &iv).unwrap(),
                    msg,
                    "{} -> {}",
                    enc_engine.backend_kind(),
                    dec_engine.backend_kind()
                );
            }
        }
    }
}

#[test]
fn backends_agree_on_digests_and_macs() {
    let data = vec![0x5au8; 4097];
    let all = engines();
    for pair in all.windows(2) {
        assert_eq!(pair[0].sha256(&data), pair[1].sha256(&data));
        assert_eq!(pair[0].sha512(&data), pair[1].sha512(&data));
        assert_eq!(
            pair[0].keyed_hash(b"k", &data).unwrap(),
            pair[1].keyed_hash(b"k", &data).unwrap()
        );
    }
}

// ---------------------------------------------------------------------------
// Failure semantics
// ---------------------------------------------------------------------------

#[test]
fn decrypt_with_wrong_key_is_invalid_key() {
    let iv = [0u8; 16];
    for engine in engines() {
        let mut good = engine.aes_cbc();
        good.import_key(&[0x11u8; 32]).unwrap();
        let ct = good.encrypt(b"TOP_SECRET=42 and some more text", &iv).unwrap();

        let mut wrong = engine.aes_cbc();
        wrong.import_key(&[0x22u8; 32]).unwrap();
        // A wrong key almost always breaks the padding; when it does not,
        // the plaintext still differs.
        match wrong.decrypt(&ct, &iv) {
            Err(e) => assert_eq!(e.code(), ErrorCode::InvalidKey),
            Ok(pt) => assert_ne!(pt, b"TOP_SECRET=42 and some more text"),
        }
    }
}

#[test]
fn truncated_ciphertext_is_invalid_key() {
    for engine in engines() {
        let mut cipher = engine.aes_cbc();
        cipher.import_key(&[0u8; 32]).unwrap();
        assert!(matches!(
            cipher.decrypt(&[0u8; 15], &[0u8; 16]),
            Err(KdbxError::InvalidKey)
        ));
    }
}

#[test]
fn bad_key_and_iv_lengths_are_invalid_key() {
    for engine in engines() {
        let mut cipher = engine.aes_cbc();
        assert!(matches!(cipher.import_key(&[0u8; 16]), Err(KdbxError::InvalidKey)));
        cipher.import_key(&[0u8; 32]).unwrap();
        assert!(matches!(
            cipher.encrypt(b"x", &[0u8; 8]),
            Err(KdbxError::InvalidKey)
        ));
    }
}

#[test]
fn cipher_before_import_is_invalid_state() {
    let cipher = CryptoEngine::new().aes_cbc();
    assert!(matches!(
        cipher.encrypt(b"x", &[0u8; 16]),
        Err(KdbxError::InvalidState(_))
    ));
}

// ---------------------------------------------------------------------------
// Randomness and KDF
// ---------------------------------------------------------------------------

#[test]
fn secure_random_returns_exact_lengths() {
    for engine in engines() {
        for n in [1usize, 65_535, 65_536, 65_537, 200_000] {
            assert_eq!(engine.secure_random(n).unwrap().len(), n);
        }
    }
}

#[test]
fn kdf_requires_registration() {
    let engine = CryptoEngine::new();
    let params = Argon2Params {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
        ..Argon2Params::default()
    };
    assert!(matches!(
        engine.argon2(b"pw", b"saltsaltsalt", &params),
        Err(KdbxError::NotImplemented(_))
    ));

    engine.register_kdf(Arc::new(RustArgon2)).unwrap();
    let key = engine.argon2(b"pw", b"saltsaltsalt", &params).unwrap();
    assert_eq!(key.len(), 32);

    assert!(matches!(
        engine.register_kdf(Arc::new(RustArgon2)),
        Err(KdbxError::InvalidState(_))
    ));
}

// ---------------------------------------------------------------------------
// Protected values and salt
// ---------------------------------------------------------------------------

#[test]
fn protected_value_round_trips_text() {
    let engine = CryptoEngine::new();
    for s in ["", "a", "pässwörd", "correct horse battery staple"] {
        let pv = ProtectedValue::from_plain_text(s, &engine).unwrap();
        assert_eq!(pv.text(), s);
    }
}

#[test]
fn set_salt_keeps_plaintext() {
    let engine = CryptoEngine::new();
    let mut pv = ProtectedValue::from_plain_text("hunter2", &engine).unwrap();
    let before = pv.to_base64();
    pv.set_salt(engine.secure_random(7).unwrap()).unwrap();
    assert_eq!(pv.text(), "hunter2");
    assert_ne!(pv.to_base64(), before);
    assert!(matches!(
        pv.set_salt(vec![0u8; 3]),
        Err(KdbxError::InvalidState(_))
    ));
}

#[test]
fn consecutive_salts_do_not_overlap() {
    let engine = CryptoEngine::new();
    let key = [3u8; 64];
    let mut a = SaltGenerator::from_stream_key(&engine, &key).unwrap();
    let first = a.get_salt(10).unwrap();
    let second = a.get_salt(10).unwrap();

    let mut b = SaltGenerator::from_stream_key(&engine, &key).unwrap();
    let both = b.get_salt(20).unwrap();
    assert_eq!(&both[..10], &first[..]);
    assert_eq!(&both[10..], &second[..]);
}

/// Backend whose "random" output is a running byte counter, so pool
/// reuse or skipped bytes show up as a broken sequence.
#[derive(Default)]
struct CountingBackend {
    next: AtomicUsize,
    fills: AtomicUsize,
}

impl CryptoBackend for CountingBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Fallback
    }

    fn sha256(&self, data: &[u8]) -> Vec<u8> {
        FallbackBackend::new().sha256(data)
    }

    fn sha512(&self, data: &[u8]) -> Vec<u8> {
        FallbackBackend::new().sha512(data)
    }

    fn hmac_sha256(&self, key: &[u8], data: &[u8]) -> kdbxcore::errors::Result<Vec<u8>> {
        FallbackBackend::new().hmac_sha256(key, data)
    }

    fn fill_random(&self, buf: &mut [u8]) -> kdbxcore::errors::Result<()> {
        self.fills.fetch_add(1, Ordering::SeqCst);
        for b in buf.iter_mut() {
            *b = self.next.fetch_add(1, Ordering::SeqCst) as u8;
        }
        Ok(())
    }

    fn aes_cbc_key(&self, key: &[u8]) -> kdbxcore::errors::Result<Box<dyn AesCbcKey>> {
        FallbackBackend::new().aes_cbc_key(key)
    }
}

#[test]
fn pooled_salts_span_refills_without_reuse() {
    let backend = Arc::new(CountingBackend::default());
    let engine = CryptoEngine::with_backend(backend.clone());
    let mut salt = SaltGenerator::random_with_refill(&engine, 64);

    let first = salt.get_salt(40).unwrap();
    // 24 bytes left in the pool; this request needs two more refills.
    let second = salt.get_salt(100).unwrap();

    let joined: Vec<u8> = first.into_iter().chain(second).collect();
    let expected: Vec<u8> = (0..140usize).map(|i| i as u8).collect();
    assert_eq!(joined, expected);
    assert_eq!(backend.fills.load(Ordering::SeqCst), 3);
    assert_eq!(salt.bytes_issued(), 140);
}
