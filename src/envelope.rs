use log::trace;
use crate::error::{Error, Result};
use crate::hash::KeyedHash;
use crate::symmetric::{roundup_bits_to_bytes, SymmetricCipher};

/// Sign, encrypt, then sign again.
///
/// ```text
/// signed     = payload || tag(payload)
/// iv         = derive_iv(signed, key length)
/// ciphertext = encrypt(iv || signed)
/// output     = ciphertext || tag(ciphertext)
/// ```
///
/// The outer tag lets tampered ciphertext be rejected before decrypting, the inner one catches a
/// plaintext that decrypted into something else.
pub struct Envelope{
    hasher: Box<dyn KeyedHash>,
    cipher: SymmetricCipher,
}

impl Envelope{
    pub fn new(hasher: Box<dyn KeyedHash>, cipher: SymmetricCipher) -> Self{
        Self{
            hasher,
            cipher
        }
    }

    pub fn hasher(&self) -> &dyn KeyedHash{
        self.hasher.as_ref()
    }

    pub fn cipher(&self) -> &SymmetricCipher{
        &self.cipher
    }

    /// Length of the IV region carried at the front of the encrypted data.
    pub fn iv_len(&self) -> usize{
        roundup_bits_to_bytes(self.cipher.key_size())
    }

    /// Appends the tag of `data` to it.
    pub fn sign(&self, mut data: Vec<u8>) -> Vec<u8>{
        let tag = self.hasher.tag(&data);
        data.extend_from_slice(&tag);

        data
    }

    /// Encrypts `signed_payload` with its derived IV in front.
    pub fn encrypt(&self, signed_payload: &[u8]) -> Result<Vec<u8>>{
        let iv_len = self.iv_len();

        let mut plaintext = self.hasher.derive_iv(signed_payload, iv_len);
        plaintext.extend_from_slice(signed_payload);

        self.cipher.encrypt(&plaintext)
    }

    /// Inverse of [`Self::encrypt`]. The IV region is dropped without looking at it.
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>>{
        let mut decrypted = self.cipher.decrypt(ciphertext)?;
        let iv_len = self.iv_len();

        if decrypted.len() < iv_len{
            return Err(Error::Crypto);
        }

        decrypted.drain(..iv_len);

        Ok(decrypted)
    }

    pub fn seal(&self, payload: Vec<u8>) -> Result<Vec<u8>>{
        let signed_payload = self.sign(payload);
        trace!("signed payload is {} bytes", signed_payload.len());

        let ciphertext = self.encrypt(&signed_payload)?;
        trace!("ciphertext is {} bytes", ciphertext.len());

        Ok(self.sign(ciphertext))
    }

    /// Checks the outer tag, decrypts, and returns the decrypted data that still carries the
    /// inner tag together with the payload length it covers.
    ///
    /// Handing back the whole buffer lets the parser verify that the payload ends exactly where
    /// the inner tag starts.
    pub fn open_signed(&self, sealed: &[u8]) -> Result<(Vec<u8>, usize)>{
        let ciphertext = self.hasher.verify_and_strip(sealed)?;
        let signed_payload = self.decrypt(ciphertext)?;

        let payload_len = self.hasher.verify_and_strip(&signed_payload)?.len();

        Ok((signed_payload, payload_len))
    }

    pub fn open(&self, sealed: &[u8]) -> Result<Vec<u8>>{
        let (mut signed_payload, payload_len) = self.open_signed(sealed)?;
        signed_payload.truncate(payload_len);

        Ok(signed_payload)
    }
}
