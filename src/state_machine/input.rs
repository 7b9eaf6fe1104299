//! Parsing of free-form driver info text

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverInfo {
    pub name: String,
    pub seats: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverInfoError {
    #[error("Wrong input format. Expected a name and a seat count, e.g. 'Ivan 3'.")]
    WrongFormat,
    #[error("Wrong seat count. Enter a positive number of seats.")]
    WrongSeatCount,
}

/// Parse "name seats": exactly two whitespace-separated tokens, the second
/// made only of ASCII digits and greater than zero.
pub fn parse_driver_info(raw_text: &str) -> Result<DriverInfo, DriverInfoError> {
    let mut tokens = raw_text.split_whitespace();
    let (Some(name), Some(seats), None) = (tokens.next(), tokens.next(), tokens.next()) else {
        return Err(DriverInfoError::WrongFormat);
    };

    if seats.is_empty() || !seats.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DriverInfoError::WrongSeatCount);
    }
    let seats: u32 = seats.parse().map_err(|_| DriverInfoError::WrongSeatCount)?;
    if seats == 0 {
        return Err(DriverInfoError::WrongSeatCount);
    }

    Ok(DriverInfo {
        name: name.to_string(),
        seats,
    })
}
