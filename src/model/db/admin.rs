use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::model::{api::admin::AdminCredentials, mongodb::Id};
use crate::Config;

pub const DEFAULT_ADMIN_USERNAME: &str = "admin";

/// Hash a password for storage, with a fresh random salt.
pub fn hash_password<T: AsRef<[u8]>>(password: T) -> Result<String, argon2::Error> {
    let salt: [u8; 16] = rand::random();
    argon2::hash_encoded(password.as_ref(), &salt, &argon2::Config::default())
}

/// Core admin user data.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminCore {
    pub username: String,
    pub password_hash: String,
}

impl AdminCore {
    /// Check whether the given password is correct.
    pub fn verify_password<T: AsRef<[u8]>>(&self, password: T) -> bool {
        // Unwrap safe because the only way to create an AdminCore is via
        // TryFrom<AdminCredentials>, so the hash is always well-formed.
        argon2::verify_encoded(&self.password_hash, password.as_ref()).unwrap()
    }
}

impl TryFrom<AdminCredentials> for AdminCore {
    type Error = argon2::Error;

    fn try_from(credentials: AdminCredentials) -> Result<Self, Self::Error> {
        if credentials.username.is_empty() || credentials.password.is_empty() {
            return Err(argon2::Error::PwdTooShort);
        }
        Ok(Self {
            username: credentials.username,
            password_hash: hash_password(credentials.password)?,
        })
    }
}

/// An admin without an ID.
pub type NewAdmin = AdminCore;

/// An admin user from the database, with its unique ID.
#[derive(Serialize, Deserialize)]
pub struct Admin {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub admin: AdminCore,
}

impl Deref for Admin {
    type Target = AdminCore;

    fn deref(&self) -> &Self::Target {
        &self.admin
    }
}

impl DerefMut for Admin {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.admin
    }
}

/// Ensure at least one admin exists, creating the default one if needed.
///
/// This operation is idempotent.
pub async fn ensure_admin_exists(
    admins: &crate::model::mongodb::Coll<NewAdmin>,
    config: &Config,
) -> crate::error::Result<()> {
    let existing = admins.find_one(None, None).await?;
    if existing.is_none() {
        warn!(
            "No admin users found, creating default admin '{}'",
            DEFAULT_ADMIN_USERNAME
        );
        let admin = AdminCore {
            username: DEFAULT_ADMIN_USERNAME.to_string(),
            password_hash: hash_password(config.default_admin_password())?,
        };
        admins.insert_one(admin, None).await?;
    }
    Ok(())
}
