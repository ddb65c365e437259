use std::env;
use crate::error::{Error, Result};
use crate::hash::ValidationMethod;
use crate::symmetric::EncryptionMethod;

pub const DECRYPTION_KEY_VAR: &str = "MACHINE_DECRYPTION_KEY";
pub const VALIDATION_KEY_VAR: &str = "MACHINE_VALIDATION_KEY";
pub const DECRYPTION_VAR: &str = "MACHINE_DECRYPTION";
pub const VALIDATION_VAR: &str = "MACHINE_VALIDATION";

/// Key material and algorithm choice for a codec. Keys are hex, as they appear in machine key
/// configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct MachineKeyConfig{
    pub decryption_key: String,
    pub validation_key: String,
    pub decryption: EncryptionMethod,
    pub validation: ValidationMethod,
}

impl std::fmt::Debug for MachineKeyConfig{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // keys stay out of logs
        f.debug_struct("MachineKeyConfig")
            .field("decryption", &self.decryption)
            .field("validation", &self.validation)
            .finish_non_exhaustive()
    }
}

impl MachineKeyConfig{
    pub fn new(decryption_key: impl Into<String>, validation_key: impl Into<String>) -> Self{
        Self{
            decryption_key: decryption_key.into(),
            validation_key: validation_key.into(),
            decryption: EncryptionMethod::default(),
            validation: ValidationMethod::default(),
        }
    }

    pub fn with_decryption(mut self, decryption: EncryptionMethod) -> Self{
        self.decryption = decryption;
        self
    }

    pub fn with_validation(mut self, validation: ValidationMethod) -> Self{
        self.validation = validation;
        self
    }

    /// Reads the configuration from the process environment. Algorithm variables are optional.
    pub fn from_env() -> Result<Self>{
        let decryption_key = env::var(DECRYPTION_KEY_VAR)
            .map_err(|_| Error::Configuration(format!("{} is not set", DECRYPTION_KEY_VAR)))?;
        let validation_key = env::var(VALIDATION_KEY_VAR)
            .map_err(|_| Error::Configuration(format!("{} is not set", VALIDATION_KEY_VAR)))?;

        let mut config = Self::new(decryption_key, validation_key);

        if let Ok(decryption) = env::var(DECRYPTION_VAR){
            config.decryption = decryption.parse()?;
        }

        if let Ok(validation) = env::var(VALIDATION_VAR){
            config.validation = validation.parse()?;
        }

        Ok(config)
    }

    pub fn decryption_key_bytes(&self) -> Result<Vec<u8>>{
        parse_hex_key("decryption", &self.decryption_key)
    }

    pub fn validation_key_bytes(&self) -> Result<Vec<u8>>{
        parse_hex_key("validation", &self.validation_key)
    }
}

fn parse_hex_key(kind: &str, key: &str) -> Result<Vec<u8>>{
    let key = key.trim();

    if key.is_empty(){
        return Err(Error::Configuration(format!("{} key is empty", kind)));
    }

    hex::decode(key)
        .map_err(|e| Error::Configuration(format!("{} key is not valid hex: {}", kind, e)))
}
