//! Password-based AEAD encryption (C4, encryption half).
//!
//! A distinct, orthogonal layer applied after compression (spec §4.4):
//! AES-256-GCM with an scrypt-derived key, or ChaCha20-Poly1305 with an
//! Argon2id-derived key. Key material lives in `zeroize::Zeroizing` end to
//! end, matching `calimero-store-encryption`'s dependency discipline
//! (`aes-gcm` + `zeroize`), extended here with `chacha20poly1305` +
//! `argon2` the way `Dicklesworthstone-frankensqlite`'s manifest pairs them
//! and `scrypt` from the same crate family used for AES-GCM's KDF.
//!
//! Output layout: `salt || nonce || ciphertext_with_tag`.

use aes_gcm::aead::{Aead as AesGcmAeadTrait, KeyInit as AesGcmKeyInit};
use aes_gcm::Aes256Gcm;
use chacha20poly1305::aead::Aead as ChaChaAeadTrait;
use chacha20poly1305::ChaCha20Poly1305;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::errors::{CodecError, CodecResult};

const NONCE_LEN: usize = 12;
pub const AES_GCM_SALT_LEN: usize = 32;
pub const CHACHA_SALT_LEN: usize = 16;

/// One canonical trait for every AEAD strategy (Design Note: "model as sum
/// types with one canonical trait... and a registry keyed by algorithm
/// name").
pub trait Aead {
    fn algorithm_name(&self) -> &'static str;
    fn salt_len(&self) -> usize;

    /// Derive a 32-byte key from `password` and `salt`.
    fn derive_key(&self, password: &[u8], salt: &[u8]) -> CodecResult<Zeroizing<[u8; 32]>>;

    /// Seal `plaintext`, returning `salt || nonce || ciphertext_with_tag`.
    fn seal(&self, plaintext: &[u8], password: &[u8]) -> CodecResult<Vec<u8>> {
        let mut salt = vec![0u8; self.salt_len()];
        rand::rngs::OsRng.fill_bytes(&mut salt);
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
        let key = self.derive_key(password, &salt)?;
        let ciphertext = self.encrypt_with_key(&key, &nonce_bytes, plaintext)?;

        let mut out = Vec::with_capacity(salt.len() + NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&salt);
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    /// Open a `salt || nonce || ciphertext_with_tag` blob produced by
    /// [`Aead::seal`].
    fn open(&self, sealed: &[u8], password: &[u8]) -> CodecResult<Vec<u8>> {
        let salt_len = self.salt_len();
        if sealed.len() < salt_len + NONCE_LEN {
            return Err(CodecError::Encryption("sealed payload too short".to_string()));
        }
        let (salt, rest) = sealed.split_at(salt_len);
        let (nonce_bytes, ciphertext) = rest.split_at(NONCE_LEN);
        let key = self.derive_key(password, salt)?;
        self.decrypt_with_key(&key, nonce_bytes, ciphertext)
    }

    fn encrypt_with_key(&self, key: &[u8; 32], nonce: &[u8], plaintext: &[u8]) -> CodecResult<Vec<u8>>;
    fn decrypt_with_key(&self, key: &[u8; 32], nonce: &[u8], ciphertext: &[u8]) -> CodecResult<Vec<u8>>;
}

/// AES-256-GCM, key derived via scrypt (N=32768, r=8, p=1).
#[derive(Debug, Default, Clone, Copy)]
pub struct AesGcm256;

impl Aead for AesGcm256 {
    fn algorithm_name(&self) -> &'static str {
        "aes-256-gcm"
    }

    fn salt_len(&self) -> usize {
        AES_GCM_SALT_LEN
    }

    fn derive_key(&self, password: &[u8], salt: &[u8]) -> CodecResult<Zeroizing<[u8; 32]>> {
        let params = scrypt::Params::new(15, 8, 1, 32)
            .map_err(|e| CodecError::Encryption(format!("scrypt params: {e}")))?;
        let mut output = Zeroizing::new([0u8; 32]);
        scrypt::scrypt(password, salt, &params, output.as_mut())
            .map_err(|e| CodecError::Encryption(format!("scrypt derive: {e}")))?;
        Ok(output)
    }

    fn encrypt_with_key(&self, key: &[u8; 32], nonce: &[u8], plaintext: &[u8]) -> CodecResult<Vec<u8>> {
        let cipher = Aes256Gcm::new(key.into());
        cipher
            .encrypt(nonce.into(), plaintext)
            .map_err(|_| CodecError::Encryption("aes-gcm seal failed".to_string()))
    }

    fn decrypt_with_key(&self, key: &[u8; 32], nonce: &[u8], ciphertext: &[u8]) -> CodecResult<Vec<u8>> {
        let cipher = Aes256Gcm::new(key.into());
        cipher
            .decrypt(nonce.into(), ciphertext)
            .map_err(|_| CodecError::AuthFailed)
    }
}

/// ChaCha20-Poly1305, key derived via Argon2id (t=1, m=64MiB, p=4).
#[derive(Debug, Default, Clone, Copy)]
pub struct ChaCha20Poly1305Aead;

impl Aead for ChaCha20Poly1305Aead {
    fn algorithm_name(&self) -> &'static str {
        "chacha20-poly1305"
    }

    fn salt_len(&self) -> usize {
        CHACHA_SALT_LEN
    }

    fn derive_key(&self, password: &[u8], salt: &[u8]) -> CodecResult<Zeroizing<[u8; 32]>> {
        let params = argon2::Params::new(64 * 1024, 1, 4, Some(32))
            .map_err(|e| CodecError::Encryption(format!("argon2 params: {e}")))?;
        let argon2 = argon2::Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);
        let mut output = Zeroizing::new([0u8; 32]);
        argon2
            .hash_password_into(password, salt, output.as_mut())
            .map_err(|e| CodecError::Encryption(format!("argon2id derive: {e}")))?;
        Ok(output)
    }

    fn encrypt_with_key(&self, key: &[u8; 32], nonce: &[u8], plaintext: &[u8]) -> CodecResult<Vec<u8>> {
        let cipher = ChaCha20Poly1305::new(key.into());
        cipher
            .encrypt(nonce.into(), plaintext)
            .map_err(|_| CodecError::Encryption("chacha20poly1305 seal failed".to_string()))
    }

    fn decrypt_with_key(&self, key: &[u8; 32], nonce: &[u8], ciphertext: &[u8]) -> CodecResult<Vec<u8>> {
        let cipher = ChaCha20Poly1305::new(key.into());
        cipher
            .decrypt(nonce.into(), ciphertext)
            .map_err(|_| CodecError::AuthFailed)
    }
}

/// Which AEAD algorithm a manifest/header declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AeadKind {
    AesGcm256,
    ChaCha20Poly1305,
}

impl AeadKind {
    pub fn parse(s: &str) -> CodecResult<Self> {
        match s {
            "aes-256-gcm" => Ok(Self::AesGcm256),
            "chacha20-poly1305" => Ok(Self::ChaCha20Poly1305),
            other => Err(CodecError::Encryption(format!(
                "unsupported AEAD algorithm: {other}"
            ))),
        }
    }
}

pub fn aead_for(kind: AeadKind) -> Box<dyn Aead> {
    match kind {
        AeadKind::AesGcm256 => Box::new(AesGcm256),
        AeadKind::ChaCha20Poly1305 => Box::new(ChaCha20Poly1305Aead),
    }
}
