use serde::{Deserialize, Serialize};

/// Connection settings for the chat server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSettings {
    pub id: i64,
    pub server_url: String,
    pub auth_token: Option<String>,
    pub display_name: String,
    pub created_at: String,
    pub updated_at: String,
}

impl ServerSettings {
    pub fn new(server_url: &str, auth_token: Option<String>, display_name: &str) -> Self {
        Self {
            id: 0,
            server_url: server_url.trim_end_matches('/').to_string(),
            auth_token,
            display_name: display_name.to_string(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }
}
