use std::fmt;
use std::str::FromStr;
use aes::{Aes128, Aes192, Aes256};
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockCipher, BlockDecryptMut, BlockEncryptMut, KeyInit, KeyIvInit};
use des::{TdesEde2, TdesEde3};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncryptionMethod{
    #[default]
    TripleDes,
    Aes,
}

impl EncryptionMethod{
    pub fn create(self, decryption_key: &[u8]) -> Result<SymmetricCipher>{
        SymmetricCipher::new(self, decryption_key)
    }
}

impl FromStr for EncryptionMethod{
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str(){
            "3DES" | "TRIPLEDES" | "DES3" => Ok(Self::TripleDes),
            "AES" => Ok(Self::Aes),
            _ => Err(Error::Configuration(format!("unknown decryption method: {}", s)))
        }
    }
}

impl fmt::Display for EncryptionMethod{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self{
            Self::TripleDes => "3DES",
            Self::Aes => "AES",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Algorithm{
    TdesEde2,
    TdesEde3,
    Aes128,
    Aes192,
    Aes256,
}

/// Number of whole bytes needed to hold `num_bits`.
pub fn roundup_bits_to_bytes(num_bits: usize) -> usize{
    num_bits.div_ceil(8)
}

/// A block cipher bound to a fixed key, running in CBC mode with PKCS#7 padding.
///
/// The chaining value is all zero. Tickets carry their IV as the first plaintext block(s) instead,
/// and the decoder throws those bytes away, so the chaining value only has to be stable.
#[derive(Clone)]
pub struct SymmetricCipher{
    method: EncryptionMethod,
    algorithm: Algorithm,
    key: Box<[u8]>,
}

impl fmt::Debug for SymmetricCipher{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymmetricCipher")
            .field("method", &self.method)
            .field("key_size", &self.key_size())
            .finish_non_exhaustive()
    }
}

impl SymmetricCipher{
    pub fn new(method: EncryptionMethod, key: &[u8]) -> Result<Self>{
        let algorithm = match (method, key.len()){
            (EncryptionMethod::TripleDes, 16) => Algorithm::TdesEde2,
            (EncryptionMethod::TripleDes, 24) => Algorithm::TdesEde3,
            (EncryptionMethod::Aes, 16) => Algorithm::Aes128,
            (EncryptionMethod::Aes, 24) => Algorithm::Aes192,
            (EncryptionMethod::Aes, 32) => Algorithm::Aes256,
            (method, len) => return Err(Error::Configuration(
                format!("a {} byte decryption key is not valid for {}", len, method)
            ))
        };

        Ok(Self{
            method,
            algorithm,
            key: key.into()
        })
    }

    pub fn method(&self) -> EncryptionMethod{
        self.method
    }

    /// Key size in bits.
    pub fn key_size(&self) -> usize{
        self.key.len() * 8
    }

    pub fn block_size(&self) -> usize{
        match self.algorithm{
            Algorithm::TdesEde2 | Algorithm::TdesEde3 => 8,
            Algorithm::Aes128 | Algorithm::Aes192 | Algorithm::Aes256 => 16,
        }
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>>{
        match self.algorithm{
            Algorithm::TdesEde2 => cbc_encrypt::<TdesEde2>(&self.key, plaintext),
            Algorithm::TdesEde3 => cbc_encrypt::<TdesEde3>(&self.key, plaintext),
            Algorithm::Aes128 => cbc_encrypt::<Aes128>(&self.key, plaintext),
            Algorithm::Aes192 => cbc_encrypt::<Aes192>(&self.key, plaintext),
            Algorithm::Aes256 => cbc_encrypt::<Aes256>(&self.key, plaintext),
        }
    }

    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>>{
        if ciphertext.is_empty() || ciphertext.len() % self.block_size() != 0{
            return Err(Error::Crypto);
        }

        match self.algorithm{
            Algorithm::TdesEde2 => cbc_decrypt::<TdesEde2>(&self.key, ciphertext),
            Algorithm::TdesEde3 => cbc_decrypt::<TdesEde3>(&self.key, ciphertext),
            Algorithm::Aes128 => cbc_decrypt::<Aes128>(&self.key, ciphertext),
            Algorithm::Aes192 => cbc_decrypt::<Aes192>(&self.key, ciphertext),
            Algorithm::Aes256 => cbc_decrypt::<Aes256>(&self.key, ciphertext),
        }
    }
}

fn cbc_encrypt<C>(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>>
where
    C: BlockEncryptMut + BlockCipher + KeyInit,
{
    let iv = vec![0u8; C::block_size()];
    let encryptor = cbc::Encryptor::<C>::new_from_slices(key, &iv)
        .map_err(|_| Error::Crypto)?;

    Ok(encryptor.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

fn cbc_decrypt<C>(key: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>>
where
    C: BlockDecryptMut + BlockCipher + KeyInit,
{
    let iv = vec![0u8; C::block_size()];
    let decryptor = cbc::Decryptor::<C>::new_from_slices(key, &iv)
        .map_err(|_| Error::Crypto)?;

    decryptor.decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| Error::Crypto)
}
