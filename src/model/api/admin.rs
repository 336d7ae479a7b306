use serde::{Deserialize, Serialize};

/// Admin login credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl AdminCredentials {
        pub fn example1() -> Self {
            Self {
                username: "coordinator".to_string(),
                password: "a very good password".to_string(),
            }
        }
    }
}
