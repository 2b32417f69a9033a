//! Native backend: ring for digests, HMAC and randomness, the `cbc`
//! mode crate for AES-256-CBC.

use aes::Aes256;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use ring::digest;
use ring::hmac;
use ring::rand::{SecureRandom, SystemRandom};
use zeroize::Zeroizing;

use super::backend::{AesCbcKey, BackendKind, CryptoBackend};
use crate::errors::{KdbxError, Result};

/// AES-256 key length in bytes.
const KEY_LEN: usize = 32;

pub struct NativeBackend {
    rng: SystemRandom,
}

impl NativeBackend {
    /// Returns `None` when the system RNG cannot produce bytes.
    pub fn probe() -> Option<Self> {
        let rng = SystemRandom::new();
        let mut probe = [0u8; 1];
        rng.fill(&mut probe).ok()?;
        Some(Self { rng })
    }
}

impl CryptoBackend for NativeBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Native
    }

    fn sha256(&self, data: &[u8]) -> Vec<u8> {
        digest::digest(&digest::SHA256, data).as_ref().to_vec()
    }

    fn sha512(&self, data: &[u8]) -> Vec<u8> {
        digest::digest(&digest::SHA512, data).as_ref().to_vec()
    }

    fn hmac_sha256(&self, key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
        let key = hmac::Key::new(hmac::HMAC_SHA256, key);
        Ok(hmac::sign(&key, data).as_ref().to_vec())
    }

    fn fill_random(&self, buf: &mut [u8]) -> Result<()> {
        self.rng
            .fill(buf)
            .map_err(|_| KdbxError::InvalidState("system random generator unavailable".into()))
    }

    fn aes_cbc_key(&self, key: &[u8]) -> Result<Box<dyn AesCbcKey>> {
        let key: [u8; KEY_LEN] = key.try_into().map_err(|_| KdbxError::InvalidKey)?;
        Ok(Box::new(NativeAesCbc {
            key: Zeroizing::new(key),
        }))
    }
}

struct NativeAesCbc {
    key: Zeroizing<[u8; KEY_LEN]>,
}

impl AesCbcKey for NativeAesCbc {
    fn encrypt(&self, data: &[u8], iv: &[u8]) -> Result<Vec<u8>> {
        let encryptor = cbc::Encryptor::<Aes256>::new_from_slices(self.key.as_slice(), iv)
            .map_err(|_| KdbxError::InvalidKey)?;
        Ok(encryptor.encrypt_padded_vec_mut::<Pkcs7>(data))
    }

    fn decrypt(&self, data: &[u8], iv: &[u8]) -> Result<Vec<u8>> {
        let decryptor = cbc::Decryptor::<Aes256>::new_from_slices(self.key.as_slice(), iv)
            .map_err(|_| KdbxError::InvalidKey)?;
        decryptor
            .decrypt_padded_vec_mut::<Pkcs7>(data)
            .map_err(|_| KdbxError::InvalidKey)
    }
}
