use std::ops::{Deref, DerefMut};

use hmac::Mac;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::model::mongodb::Id;
use crate::Config;

use super::admin::hash_password;

pub type HmacSha256 = hmac::Hmac<Sha256>;

/// Core voter user data, as stored in the database.
///
/// Voters are provisioned from the membership records; registration and
/// billing live in the wider membership system, not here.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterCore {
    /// The HMAC of the member's email address, hex-encoded.
    /// We never store the address itself.
    pub email_hmac: String,
    /// The member's argon2 password hash.
    pub password_hash: String,
}

impl VoterCore {
    /// Create a new Voter.
    pub fn new(email: &str, password: &str, config: &Config) -> Result<Self, argon2::Error> {
        Ok(Self {
            email_hmac: email_hmac(email, config),
            password_hash: hash_password(password)?,
        })
    }

    /// Check whether the given password is correct.
    pub fn verify_password<T: AsRef<[u8]>>(&self, password: T) -> bool {
        // Unwrap safe because the only way to create a VoterCore is via
        // `new`, so the hash is always well-formed.
        argon2::verify_encoded(&self.password_hash, password.as_ref()).unwrap()
    }
}

/// HMAC a member email address for storage or lookup.
pub fn email_hmac(email: &str, config: &Config) -> String {
    let mut mac = HmacSha256::new_from_slice(config.hmac_secret())
        .expect("HMAC keys can be any length");
    mac.update(email.trim().to_lowercase().as_bytes());
    data_encoding::HEXLOWER.encode(&mac.finalize().into_bytes())
}

/// A voter without an ID.
pub type NewVoter = VoterCore;

/// A voter user from the database, with its unique ID.
#[derive(Debug, Serialize, Deserialize)]
pub struct Voter {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub voter: VoterCore,
}

impl Deref for Voter {
    type Target = VoterCore;

    fn deref(&self) -> &Self::Target {
        &self.voter
    }
}

impl DerefMut for Voter {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.voter
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    use crate::model::api::auth::MemberCredentials;

    impl VoterCore {
        pub fn example(config: &Config) -> Self {
            let credentials = MemberCredentials::example();
            Self::new(&credentials.email, &credentials.password, config).unwrap()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_normalisation() {
        let config = Config::example();
        // Case and surrounding whitespace must not produce distinct voters.
        assert_eq!(
            email_hmac("Member@Example.org ", &config),
            email_hmac("member@example.org", &config)
        );
        assert_ne!(
            email_hmac("member@example.org", &config),
            email_hmac("other@example.org", &config)
        );
    }
}
