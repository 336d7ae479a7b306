use std::fmt::Display;
use std::str::FromStr;

use rand::distributions::{Distribution, Uniform};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const LENGTH: usize = 8;

/// The alphabet avoids characters that are easily confused when read aloud
/// or copied by hand (I, L, O, 0, 1).
const ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

/// A confirmation code issued to a voter when their submission completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfirmationCode(String);

impl ConfirmationCode {
    /// Generate a random code.
    pub fn random() -> Self {
        let char_dist = Uniform::from(0..ALPHABET.len());
        let mut rng = rand::thread_rng();
        Self(
            (0..LENGTH)
                .map(|_| ALPHABET[char_dist.sample(&mut rng)] as char)
                .collect(),
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ConfirmationCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ConfirmationCode {
    type Err = ParseError;

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        if string.len() != LENGTH {
            return Err(ParseError::InvalidLength(string.len()));
        }
        if let Some(c) = string.chars().find(|c| !ALPHABET.contains(&(*c as u8))) {
            return Err(ParseError::InvalidChar(c));
        }
        Ok(Self(string.to_string()))
    }
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("code must contain exactly {LENGTH} characters, found {0}")]
    InvalidLength(usize),
    #[error("code contains character '{0}' outside the code alphabet")]
    InvalidChar(char),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_codes_are_well_formed() {
        for _ in 0..100 {
            let code = ConfirmationCode::random();
            assert_eq!(code.as_str().len(), LENGTH);
            assert!(code
                .as_str()
                .bytes()
                .all(|byte| ALPHABET.contains(&byte)));
            // Round-trips through the string form.
            assert_eq!(code.as_str().parse::<ConfirmationCode>().unwrap(), code);
        }
    }

    #[test]
    fn ambiguous_characters_are_rejected() {
        assert!("ABCDEFG0".parse::<ConfirmationCode>().is_err());
        assert!("ABCDEFGI".parse::<ConfirmationCode>().is_err());
        assert!("ABC".parse::<ConfirmationCode>().is_err());
        assert!("ABCDEFGHJ".parse::<ConfirmationCode>().is_err());
    }
}
