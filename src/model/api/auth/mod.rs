mod token;
mod user;

pub use token::{AuthToken, AUTH_TOKEN_COOKIE};
pub use user::{Rights, User};

use serde::{Deserialize, Serialize};

/// Member login credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberCredentials {
    pub email: String,
    pub password: String,
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl MemberCredentials {
        pub fn example() -> Self {
            Self {
                email: "member@example.org".to_string(),
                password: "correct horse battery staple".to_string(),
            }
        }

        pub fn example2() -> Self {
            Self {
                email: "treasurer@example.org".to_string(),
                password: "the second-best password".to_string(),
            }
        }
    }
}
