//! Pure-Rust fallback backend.
//!
//! AES-CBC is chained by hand over the `aes` block primitive so this
//! backend has no dependency on a mode-of-operation crate.

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes::Aes256;
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::TryRngCore;
use sha2::{Digest, Sha256, Sha512};

use super::backend::{AesCbcKey, BackendKind, CryptoBackend};
use crate::errors::{KdbxError, Result};

/// AES block size in bytes.
const BLOCK_LEN: usize = 16;

#[derive(Debug, Default)]
pub struct FallbackBackend;

impl FallbackBackend {
    pub fn new() -> Self {
        Self
    }
}

impl CryptoBackend for FallbackBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Fallback
    }

    fn sha256(&self, data: &[u8]) -> Vec<u8> {
        Sha256::digest(data).to_vec()
    }

    fn sha512(&self, data: &[u8]) -> Vec<u8> {
        Sha512::digest(data).to_vec()
    }

    fn hmac_sha256(&self, key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
        let mut mac =
            <Hmac<Sha256> as Mac>::new_from_slice(key).map_err(|_| KdbxError::InvalidKey)?;
        mac.update(data);
        Ok(mac.finalize().into_bytes().to_vec())
    }

    fn fill_random(&self, buf: &mut [u8]) -> Result<()> {
        OsRng
            .try_fill_bytes(buf)
            .map_err(|e| KdbxError::InvalidState(format!("OS random generator unavailable: {e}")))
    }

    fn aes_cbc_key(&self, key: &[u8]) -> Result<Box<dyn AesCbcKey>> {
        let cipher = Aes256::new_from_slice(key).map_err(|_| KdbxError::InvalidKey)?;
        Ok(Box::new(SoftAesCbc { cipher }))
    }
}

struct SoftAesCbc {
    cipher: Aes256,
}

fn read_iv(iv: &[u8]) -> Result<[u8; BLOCK_LEN]> {
    iv.try_into().map_err(|_| KdbxError::InvalidKey)
}

impl AesCbcKey for SoftAesCbc {
    fn encrypt(&self, data: &[u8], iv: &[u8]) -> Result<Vec<u8>> {
        let mut prev = read_iv(iv)?;

        // PKCS#7: always pad, a full block when already aligned.
        let pad = BLOCK_LEN - data.len() % BLOCK_LEN;
        let mut buf = Vec::with_capacity(data.len() + pad);
        buf.extend_from_slice(data);
        buf.resize(data.len() + pad, pad as u8);

        for block in buf.chunks_exact_mut(BLOCK_LEN) {
            for (b, p) in block.iter_mut().zip(prev.iter()) {
                *b ^= p;
            }
            self.cipher.encrypt_block(GenericArray::from_mut_slice(block));
            prev.copy_from_slice(block);
        }
        Ok(buf)
    }

    fn decrypt(&self, data: &[u8], iv: &[u8]) -> Result<Vec<u8>> {
        let mut prev = read_iv(iv)?;
        if data.is_empty() || data.len() % BLOCK_LEN != 0 {
            return Err(KdbxError::InvalidKey);
        }

        let mut buf = data.to_vec();
        for block in buf.chunks_exact_mut(BLOCK_LEN) {
            let mut saved = [0u8; BLOCK_LEN];
            saved.copy_from_slice(block);
            self.cipher.decrypt_block(GenericArray::from_mut_slice(block));
            for (b, p) in block.iter_mut().zip(prev.iter()) {
                *b ^= p;
            }
            prev = saved;
        }

        let pad = usize::from(buf[buf.len() - 1]);
        if pad == 0 || pad > BLOCK_LEN {
            return Err(KdbxError::InvalidKey);
        }
        let body_len = buf.len() - pad;
        if buf[body_len..].iter().any(|&b| usize::from(b) != pad) {
            return Err(KdbxError::InvalidKey);
        }
        buf.truncate(body_len);
        Ok(buf)
    }
}
