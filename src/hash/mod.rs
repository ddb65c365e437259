use std::fmt;
use std::str::FromStr;
use hmac::{Hmac, Mac};
use hmac::digest::KeyInit;
use md5::Md5;
use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};
use crate::error::{Error, Result};

type HmacMd5 = Hmac<Md5>;
type HmacSha1 = Hmac<Sha1>;
type HmacSha256 = Hmac<Sha256>;
type HmacSha384 = Hmac<Sha384>;
type HmacSha512 = Hmac<Sha512>;

/// Keyed hash used for both integrity tags and IV derivation.
pub trait KeyedHash: Send + Sync{
    /// Size of a tag in bytes.
    fn hash_size(&self) -> usize;

    /// Block size of the underlying hash function.
    fn block_size(&self) -> usize;

    fn tag(&self, data: &[u8]) -> Vec<u8>;

    /// Constant time comparison of `tag` against the tag of `data`.
    fn verify(&self, data: &[u8], tag: &[u8]) -> bool;

    /// Deterministic pseudo IV. The first block is the tag of `data`, every following block is
    /// the tag of the previous one, and the concatenation is cut to `length` bytes.
    ///
    /// This is not a random IV and must stay that way, tickets issued by the legacy platform are
    /// produced with exactly this construction.
    fn derive_iv(&self, data: &[u8], length: usize) -> Vec<u8>{
        let mut iv = Vec::with_capacity(length);
        let mut hash = data.to_vec();

        while iv.len() < length{
            hash = self.tag(&hash);

            let to_copy = (length - iv.len()).min(hash.len());
            iv.extend_from_slice(&hash[..to_copy]);
        }

        iv
    }

    /// Checks the trailing tag of `buffer` and returns everything before it.
    fn verify_and_strip<'a>(&self, buffer: &'a [u8]) -> Result<&'a [u8]>{
        let Some(data_len) = buffer.len().checked_sub(self.hash_size()) else {
            return Err(Error::Integrity);
        };

        let (data, tag) = buffer.split_at(data_len);

        if !self.verify(data, tag){
            return Err(Error::Integrity);
        }

        Ok(data)
    }
}

/// HMAC over any of the supported digests. The keyed state is set up once and cloned for every
/// call, so concurrent callers never share an in-flight context.
#[derive(Clone)]
pub struct HmacProvider<M>{
    keyed: M,
    block_size: usize,
}

impl<M: Mac + KeyInit + Clone> HmacProvider<M>{
    pub fn new(key: &[u8], block_size: usize) -> Result<Self>{
        if key.is_empty(){
            return Err(Error::Configuration("validation key is empty".to_owned()));
        }

        let keyed = <M as KeyInit>::new_from_slice(key)
            .map_err(|_| Error::Configuration("validation key has an invalid length".to_owned()))?;

        Ok(Self{
            keyed,
            block_size
        })
    }
}

impl<M: Mac + KeyInit + Clone + Send + Sync> KeyedHash for HmacProvider<M>{
    fn hash_size(&self) -> usize {
        <M as hmac::digest::OutputSizeUser>::output_size()
    }

    fn block_size(&self) -> usize {
        self.block_size
    }

    fn tag(&self, data: &[u8]) -> Vec<u8> {
        let mut mac = self.keyed.clone();
        mac.update(data);

        mac.finalize().into_bytes().to_vec()
    }

    fn verify(&self, data: &[u8], tag: &[u8]) -> bool {
        let mut mac = self.keyed.clone();
        mac.update(data);

        mac.verify_slice(tag).is_ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMethod{
    Md5,
    #[default]
    Sha1,
    HmacSha256,
    HmacSha384,
    HmacSha512,
}

impl ValidationMethod{
    pub fn hash_size(self) -> usize{
        match self{
            Self::Md5 => 16,
            Self::Sha1 => 20,
            Self::HmacSha256 => 32,
            Self::HmacSha384 => 48,
            Self::HmacSha512 => 64,
        }
    }

    pub fn block_size(self) -> usize{
        match self{
            Self::Md5 | Self::Sha1 | Self::HmacSha256 => 64,
            Self::HmacSha384 | Self::HmacSha512 => 128,
        }
    }

    pub fn create(self, validation_key: &[u8]) -> Result<Box<dyn KeyedHash>>{
        let block_size = self.block_size();

        Ok(match self{
            Self::Md5 => Box::new(HmacProvider::<HmacMd5>::new(validation_key, block_size)?),
            Self::Sha1 => Box::new(HmacProvider::<HmacSha1>::new(validation_key, block_size)?),
            Self::HmacSha256 => Box::new(HmacProvider::<HmacSha256>::new(validation_key, block_size)?),
            Self::HmacSha384 => Box::new(HmacProvider::<HmacSha384>::new(validation_key, block_size)?),
            Self::HmacSha512 => Box::new(HmacProvider::<HmacSha512>::new(validation_key, block_size)?),
        })
    }
}

impl FromStr for ValidationMethod{
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str(){
            "MD5" | "HMACMD5" => Ok(Self::Md5),
            "SHA1" | "HMACSHA1" => Ok(Self::Sha1),
            "SHA256" | "HMACSHA256" => Ok(Self::HmacSha256),
            "SHA384" | "HMACSHA384" => Ok(Self::HmacSha384),
            "SHA512" | "HMACSHA512" => Ok(Self::HmacSha512),
            _ => Err(Error::Configuration(format!("unknown validation method: {}", s)))
        }
    }
}

impl fmt::Display for ValidationMethod{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self{
            Self::Md5 => "MD5",
            Self::Sha1 => "SHA1",
            Self::HmacSha256 => "HMACSHA256",
            Self::HmacSha384 => "HMACSHA384",
            Self::HmacSha512 => "HMACSHA512",
        })
    }
}
