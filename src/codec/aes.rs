//! AES-ECB payload confidentiality for providers that require an encrypted
//! request blob. PKCS#7 padding (pad byte = number of padding bytes), key
//! variant selected by key length, ciphertext base64-encoded.

use crate::domain::error::PaymentError;
use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyInit};
use aes::{Aes128, Aes192, Aes256};
use base64::{engine::general_purpose, Engine};

const AES_128_KEY_LENGTH: usize = 16;
const AES_192_KEY_LENGTH: usize = 24;
const AES_256_KEY_LENGTH: usize = 32;

pub fn encrypt(key: &[u8], plaintext: &str) -> Result<String, PaymentError> {
    let data = plaintext.as_bytes();
    let ciphertext = match key.len() {
        AES_128_KEY_LENGTH => ecb::Encryptor::<Aes128>::new_from_slice(key)
            .map_err(|_| bad_key())?
            .encrypt_padded_vec_mut::<Pkcs7>(data),
        AES_192_KEY_LENGTH => ecb::Encryptor::<Aes192>::new_from_slice(key)
            .map_err(|_| bad_key())?
            .encrypt_padded_vec_mut::<Pkcs7>(data),
        AES_256_KEY_LENGTH => ecb::Encryptor::<Aes256>::new_from_slice(key)
            .map_err(|_| bad_key())?
            .encrypt_padded_vec_mut::<Pkcs7>(data),
        _ => return Err(bad_key()),
    };

    Ok(general_purpose::STANDARD.encode(ciphertext))
}

pub fn decrypt(key: &[u8], encoded: &str) -> Result<String, PaymentError> {
    let ciphertext = general_purpose::STANDARD
        .decode(encoded)
        .map_err(|_| PaymentError::MalformedResponse)?;

    let plaintext = match key.len() {
        AES_128_KEY_LENGTH => ecb::Decryptor::<Aes128>::new_from_slice(key)
            .map_err(|_| bad_key())?
            .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
            .map_err(|_| PaymentError::MalformedResponse)?,
        AES_192_KEY_LENGTH => ecb::Decryptor::<Aes192>::new_from_slice(key)
            .map_err(|_| bad_key())?
            .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
            .map_err(|_| PaymentError::MalformedResponse)?,
        AES_256_KEY_LENGTH => ecb::Decryptor::<Aes256>::new_from_slice(key)
            .map_err(|_| bad_key())?
            .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
            .map_err(|_| PaymentError::MalformedResponse)?,
        _ => return Err(bad_key()),
    };

    String::from_utf8(plaintext).map_err(|_| PaymentError::MalformedResponse)
}

fn bad_key() -> PaymentError {
    PaymentError::Configuration("hash_key must be 16, 24 or 32 bytes".to_string())
}
