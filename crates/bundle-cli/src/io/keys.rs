use std::fs;
use std::path::Path;

use anyhow::{Context as _, Result};
use ed25519_dalek::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use ed25519_dalek::{SigningKey, VerifyingKey};

pub fn load_signing_key(path: &Path) -> Result<SigningKey> {
    let pem = fs::read_to_string(path).with_context(|| format!("reading signing key {path:?}"))?;
    SigningKey::from_pkcs8_pem(&pem).with_context(|| format!("parsing signing key {path:?}"))
}

pub fn save_signing_key(path: &Path, key: &SigningKey) -> Result<()> {
    let pem = key.to_pkcs8_pem(LineEnding::LF)?;
    fs::write(path, pem.as_bytes()).with_context(|| format!("writing signing key {path:?}"))
}

pub fn load_public_key(path: &Path) -> Result<VerifyingKey> {
    let pem = fs::read_to_string(path).with_context(|| format!("reading public key {path:?}"))?;
    VerifyingKey::from_public_key_pem(&pem).with_context(|| format!("parsing public key {path:?}"))
}

pub fn save_public_key(path: &Path, key: &VerifyingKey) -> Result<()> {
    let pem = key.to_public_key_pem(LineEnding::LF)?;
    fs::write(path, pem).with_context(|| format!("writing public key {path:?}"))
}
