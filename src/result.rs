use std::fmt::Display;
use log::debug;
use crate::error::Error;

pub trait ResultExtension{
    type Output;

    /// Logs the concrete failure and replaces it with [`Error::InvalidTicket`] so callers can't
    /// tell which decode stage rejected the input.
    fn or_invalid_ticket(self) -> Result<Self::Output, Error>;
}

impl<T, U: Display> ResultExtension for Result<T, U>{
    type Output = T;

    fn or_invalid_ticket(self) -> Result<Self::Output, Error> {
        match self{
            Ok(v) => Ok(v),
            Err(e) => {
                debug!("rejecting ticket: {}", e);

                Err(Error::InvalidTicket)
            }
        }
    }
}
