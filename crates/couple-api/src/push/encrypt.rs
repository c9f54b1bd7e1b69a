//! `aes128gcm` message encryption for Web Push (RFC 8291 over RFC 8188).
//!
//! The payload goes out as a single record. The body is the content-coding
//! header (salt, record size, our ephemeral public key) followed by the
//! AES-128-GCM ciphertext.

use aes_gcm::{Aes128Gcm, KeyInit, Nonce, aead::Aead};
use anyhow::{Context, Result, anyhow, bail};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hkdf::Hkdf;
use p256::ecdh::diffie_hellman;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::{PublicKey, SecretKey};
use rand_core::{OsRng, RngCore};
use sha2::Sha256;

const RECORD_SIZE: u32 = 4096;
const SALT_LEN: usize = 16;
const AUTH_LEN: usize = 16;
const POINT_LEN: usize = 65;
const TAG_LEN: usize = 16;
const HEADER_LEN: usize = SALT_LEN + 4 + 1 + POINT_LEN;
const LAST_RECORD: u8 = 0x02;

/// Push services refuse bodies over 4096 bytes.
pub const MAX_PAYLOAD: usize = RECORD_SIZE as usize - HEADER_LEN - TAG_LEN - 1;

const KEY_INFO: &[u8] = b"WebPush: info\0";
const CEK_INFO: &[u8] = b"Content-Encoding: aes128gcm\0";
const NONCE_INFO: &[u8] = b"Content-Encoding: nonce\0";

/// The browser's half of a subscription: its ECDH public key and auth secret.
pub struct ClientKeys {
    public: PublicKey,
    auth: [u8; AUTH_LEN],
}

impl ClientKeys {
    /// Decode the base64url `p256dh` and `auth` values a browser hands out.
    pub fn decode(p256dh: &str, auth: &str) -> Result<Self> {
        let point = decode_b64(p256dh).context("decoding p256dh")?;
        let public = PublicKey::from_sec1_bytes(&point)
            .map_err(|_| anyhow!("p256dh is not a P-256 public key"))?;

        let secret = decode_b64(auth).context("decoding auth secret")?;
        let auth: [u8; AUTH_LEN] = secret
            .as_slice()
            .try_into()
            .map_err(|_| anyhow!("auth secret must be {} bytes, got {}", AUTH_LEN, secret.len()))?;

        Ok(Self { public, auth })
    }
}

/// Encrypt `payload` for one subscriber with a fresh ephemeral key and salt.
pub fn encrypt(keys: &ClientKeys, payload: &[u8]) -> Result<Vec<u8>> {
    let server = SecretKey::random(&mut OsRng);
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    seal(keys, &server, &salt, payload)
}

fn seal(keys: &ClientKeys, server: &SecretKey, salt: &[u8; SALT_LEN], payload: &[u8]) -> Result<Vec<u8>> {
    if payload.len() > MAX_PAYLOAD {
        bail!("push payload is {} bytes, limit is {}", payload.len(), MAX_PAYLOAD);
    }

    let client_point = keys.public.to_encoded_point(false);
    let server_point = server.public_key().to_encoded_point(false);
    let shared = diffie_hellman(server.to_nonzero_scalar(), keys.public.as_affine());

    let ikm: [u8; 32] = expand(
        &keys.auth,
        shared.raw_secret_bytes().as_slice(),
        &key_info(client_point.as_bytes(), server_point.as_bytes()),
    )?;
    let cek: [u8; 16] = expand(salt, &ikm, CEK_INFO)?;
    let nonce: [u8; 12] = expand(salt, &ikm, NONCE_INFO)?;

    let mut record = Vec::with_capacity(payload.len() + 1);
    record.extend_from_slice(payload);
    record.push(LAST_RECORD);

    let cipher = Aes128Gcm::new_from_slice(&cek).map_err(|e| anyhow!("Bad content key: {}", e))?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), record.as_slice())
        .map_err(|e| anyhow!("Encryption failed: {}", e))?;

    let mut body = Vec::with_capacity(HEADER_LEN + ciphertext.len());
    body.extend_from_slice(salt);
    body.extend_from_slice(&RECORD_SIZE.to_be_bytes());
    body.push(POINT_LEN as u8);
    body.extend_from_slice(server_point.as_bytes());
    body.extend_from_slice(&ciphertext);
    Ok(body)
}

fn key_info(client_point: &[u8], server_point: &[u8]) -> Vec<u8> {
    let mut info = Vec::with_capacity(KEY_INFO.len() + 2 * POINT_LEN);
    info.extend_from_slice(KEY_INFO);
    info.extend_from_slice(client_point);
    info.extend_from_slice(server_point);
    info
}

fn expand<const N: usize>(salt: &[u8], ikm: &[u8], info: &[u8]) -> Result<[u8; N]> {
    let mut okm = [0u8; N];
    Hkdf::<Sha256>::new(Some(salt), ikm)
        .expand(info, &mut okm)
        .map_err(|e| anyhow!("HKDF expand failed: {}", e))?;
    Ok(okm)
}

fn decode_b64(raw: &str) -> Result<Vec<u8>> {
    Ok(URL_SAFE_NO_PAD.decode(raw.trim().trim_end_matches('='))?)
}
