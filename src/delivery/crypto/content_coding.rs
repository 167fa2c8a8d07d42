//! `aes128gcm` content coding for push message payloads.
//!
//! Implements message encryption for Web Push (RFC 8291) framed as a single
//! RFC 8188 record. Every call to [`encrypt`] uses a fresh ephemeral key
//! pair and a fresh salt, so encrypting the same plaintext twice never
//! produces the same body.
//!
//! Body layout:
//!
//! ```text
//! salt (16) | rs (4, big-endian) | idlen (1) | keyid (65) | ciphertext
//! ```

use super::{CryptoError, CryptoResult};
use crate::subscription::domain::{AuthSecret, ClientPublicKey};
use aes_gcm::{
    Aes128Gcm, Key, Nonce,
    aead::{Aead, KeyInit},
};
use hkdf::Hkdf;
use p256::elliptic_curve::rand_core::{OsRng, RngCore};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::{PublicKey, SecretKey, ecdh::diffie_hellman};
use sha2::Sha256;

/// Record size advertised in the header.
pub const RECORD_SIZE: usize = 4096;

const SALT_LENGTH: usize = 16;
const RECORD_SIZE_FIELD_LENGTH: usize = 4;
const KEY_ID_LENGTH: u8 = 65;
const PUBLIC_KEY_LENGTH: usize = 65;
const TAG_LENGTH: usize = 16;
const HEADER_LENGTH: usize = SALT_LENGTH + RECORD_SIZE_FIELD_LENGTH + 1 + PUBLIC_KEY_LENGTH;
const PADDING_DELIMITER: u8 = 0x02;

/// Largest plaintext that fits one record (3993 bytes).
pub const MAX_PLAINTEXT_LENGTH: usize = RECORD_SIZE - HEADER_LENGTH - TAG_LENGTH - 1;

const KEY_INFO: &[u8] = b"WebPush: info\0";
const CEK_INFO: &[u8] = b"Content-Encoding: aes128gcm\0";
const NONCE_INFO: &[u8] = b"Content-Encoding: nonce\0";

#[expect(
    clippy::big_endian_bytes,
    reason = "the aes128gcm header carries the record size in network byte order"
)]
const RECORD_SIZE_FIELD: [u8; RECORD_SIZE_FIELD_LENGTH] = 4096_u32.to_be_bytes();

/// Encrypts a push message for one subscription.
///
/// # Errors
///
/// Returns [`CryptoError::PayloadTooLarge`] when `plaintext` exceeds
/// [`MAX_PLAINTEXT_LENGTH`], or [`CryptoError::InvalidKey`],
/// [`CryptoError::KeyDerivation`] or [`CryptoError::Encryption`] when the
/// cryptographic steps fail.
pub fn encrypt(
    plaintext: &[u8],
    client_public_key: &ClientPublicKey,
    auth_secret: &AuthSecret,
) -> CryptoResult<Vec<u8>> {
    let ephemeral = SecretKey::random(&mut OsRng);
    let mut salt = [0_u8; SALT_LENGTH];
    OsRng.fill_bytes(&mut salt);
    encrypt_with(plaintext, client_public_key, auth_secret, &ephemeral, &salt)
}

/// Encrypts with a caller-chosen ephemeral key and salt.
pub(crate) fn encrypt_with(
    plaintext: &[u8],
    client_public_key: &ClientPublicKey,
    auth_secret: &AuthSecret,
    ephemeral: &SecretKey,
    salt: &[u8; SALT_LENGTH],
) -> CryptoResult<Vec<u8>> {
    if plaintext.len() > MAX_PLAINTEXT_LENGTH {
        return Err(CryptoError::PayloadTooLarge {
            size: plaintext.len(),
            max: MAX_PLAINTEXT_LENGTH,
        });
    }

    let ua_public = PublicKey::from_sec1_bytes(client_public_key.as_bytes())
        .map_err(|_| CryptoError::InvalidKey("client public key is not on P-256".to_owned()))?;
    let as_public = ephemeral.public_key().to_encoded_point(false);
    let shared = diffie_hellman(ephemeral.to_nonzero_scalar(), ua_public.as_affine());
    let keys = ContentKeys::derive(&KeyAgreement {
        shared_secret: shared.raw_secret_bytes(),
        auth_secret,
        ua_public: client_public_key.as_bytes(),
        as_public: as_public.as_bytes(),
        salt,
    })?;

    let mut record = Vec::with_capacity(plaintext.len() + 1);
    record.extend_from_slice(plaintext);
    record.push(PADDING_DELIMITER);
    let ciphertext = keys
        .cipher()
        .encrypt(Nonce::from_slice(&keys.nonce), record.as_slice())
        .map_err(|_| CryptoError::Encryption)?;

    let mut body = Vec::with_capacity(HEADER_LENGTH + ciphertext.len());
    body.extend_from_slice(salt);
    body.extend_from_slice(&RECORD_SIZE_FIELD);
    body.push(KEY_ID_LENGTH);
    body.extend_from_slice(as_public.as_bytes());
    body.extend_from_slice(&ciphertext);
    Ok(body)
}

/// Decrypts a push message body with the subscription's private key.
///
/// This is the user agent side of the exchange; servers use it to verify
/// what they send.
///
/// # Errors
///
/// Returns [`CryptoError::MalformedBody`] when the header or padding is
/// invalid, [`CryptoError::InvalidKey`] when the key id is not a P-256
/// point, or [`CryptoError::Decryption`] when authentication fails.
pub fn decrypt(
    body: &[u8],
    client_secret: &SecretKey,
    auth_secret: &AuthSecret,
) -> CryptoResult<Vec<u8>> {
    let header = Header::parse(body)?;
    let as_public = PublicKey::from_sec1_bytes(header.key_id)
        .map_err(|_| CryptoError::InvalidKey("sender key id is not on P-256".to_owned()))?;
    let ua_public = client_secret.public_key().to_encoded_point(false);
    let shared = diffie_hellman(client_secret.to_nonzero_scalar(), as_public.as_affine());
    let keys = ContentKeys::derive(&KeyAgreement {
        shared_secret: shared.raw_secret_bytes(),
        auth_secret,
        ua_public: ua_public.as_bytes(),
        as_public: header.key_id,
        salt: header.salt,
    })?;

    let mut record = keys
        .cipher()
        .decrypt(Nonce::from_slice(&keys.nonce), header.ciphertext)
        .map_err(|_| CryptoError::Decryption)?;
    let delimiter_at = record
        .iter()
        .rposition(|&byte| byte != 0)
        .ok_or(CryptoError::MalformedBody("record has no padding delimiter"))?;
    if record.get(delimiter_at) != Some(&PADDING_DELIMITER) {
        return Err(CryptoError::MalformedBody(
            "record is not marked as the final record",
        ));
    }
    record.truncate(delimiter_at);
    Ok(record)
}

struct Header<'a> {
    salt: &'a [u8],
    key_id: &'a [u8],
    ciphertext: &'a [u8],
}

impl<'a> Header<'a> {
    fn parse(body: &'a [u8]) -> CryptoResult<Self> {
        let (salt, after_salt) = body
            .split_at_checked(SALT_LENGTH)
            .ok_or(CryptoError::MalformedBody("truncated salt"))?;
        let (record_size_field, after_record_size) = after_salt
            .split_first_chunk::<RECORD_SIZE_FIELD_LENGTH>()
            .ok_or(CryptoError::MalformedBody("truncated record size"))?;
        let (&key_id_length, after_key_id_length) = after_record_size
            .split_first()
            .ok_or(CryptoError::MalformedBody("truncated key id length"))?;
        if key_id_length != KEY_ID_LENGTH {
            return Err(CryptoError::MalformedBody(
                "key id is not an uncompressed P-256 point",
            ));
        }
        let (key_id, ciphertext) = after_key_id_length
            .split_at_checked(PUBLIC_KEY_LENGTH)
            .ok_or(CryptoError::MalformedBody("truncated key id"))?;

        let record_size = usize::try_from(decode_record_size(*record_size_field))
            .map_err(|_| CryptoError::MalformedBody("record size out of range"))?;
        if record_size <= TAG_LENGTH + 1 {
            return Err(CryptoError::MalformedBody("record size too small"));
        }
        if ciphertext.len() <= TAG_LENGTH {
            return Err(CryptoError::MalformedBody("truncated ciphertext"));
        }
        if ciphertext.len() > record_size {
            return Err(CryptoError::MalformedBody(
                "multi-record bodies are not supported",
            ));
        }

        Ok(Self {
            salt,
            key_id,
            ciphertext,
        })
    }
}

#[expect(
    clippy::big_endian_bytes,
    reason = "the aes128gcm header carries the record size in network byte order"
)]
const fn decode_record_size(field: [u8; RECORD_SIZE_FIELD_LENGTH]) -> u32 {
    u32::from_be_bytes(field)
}

struct KeyAgreement<'a> {
    shared_secret: &'a [u8],
    auth_secret: &'a AuthSecret,
    ua_public: &'a [u8],
    as_public: &'a [u8],
    salt: &'a [u8],
}

struct ContentKeys {
    cek: [u8; 16],
    nonce: [u8; 12],
}

impl ContentKeys {
    fn derive(agreement: &KeyAgreement<'_>) -> CryptoResult<Self> {
        let info_length =
            KEY_INFO.len() + agreement.ua_public.len() + agreement.as_public.len();
        let mut key_info = Vec::with_capacity(info_length);
        key_info.extend_from_slice(KEY_INFO);
        key_info.extend_from_slice(agreement.ua_public);
        key_info.extend_from_slice(agreement.as_public);

        let mut ikm = [0_u8; 32];
        Hkdf::<Sha256>::new(
            Some(agreement.auth_secret.as_bytes().as_slice()),
            agreement.shared_secret,
        )
        .expand(&key_info, &mut ikm)
        .map_err(|_| CryptoError::KeyDerivation)?;

        let prk = Hkdf::<Sha256>::new(Some(agreement.salt), &ikm);
        let mut cek = [0_u8; 16];
        prk.expand(CEK_INFO, &mut cek)
            .map_err(|_| CryptoError::KeyDerivation)?;
        let mut nonce = [0_u8; 12];
        prk.expand(NONCE_INFO, &mut nonce)
            .map_err(|_| CryptoError::KeyDerivation)?;

        Ok(Self { cek, nonce })
    }

    fn cipher(&self) -> Aes128Gcm {
        Aes128Gcm::new(Key::<Aes128Gcm>::from_slice(&self.cek))
    }
}
