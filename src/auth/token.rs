// src/auth/token.rs
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

pub const DEFAULT_TOKEN_BYTES: usize = 32;

/// A freshly minted credential. Only `hash` is ever stored.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub raw: String,
    pub hash: [u8; 32],
}

/// Mint a token from the OS RNG. This is what the web app should call.
pub fn issue() -> IssuedToken {
    issue_with(&mut OsRng, DEFAULT_TOKEN_BYTES)
}

pub fn issue_with<R: RngCore>(rng: &mut R, nbytes: usize) -> IssuedToken {
    let raw = generate_token(rng, nbytes);
    let hash = hash_token(&raw);
    IssuedToken { raw, hash }
}

/// Generate a URL-safe token from random bytes.
/// - Uses Base64 URL-safe, no padding.
/// - Typically 32 bytes -> ~43 char token.
pub fn generate_token<R: RngCore>(rng: &mut R, nbytes: usize) -> String {
    let mut buf = vec![0u8; nbytes];
    rng.fill_bytes(&mut buf);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(&buf)
}

/// SHA-256 of the raw token; stored as a BLOB and used for lookups.
pub fn hash_token(token: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(token.trim().as_bytes());
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}
