use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Profile of the signed-in user as the backend describes it.
///
/// The backend decides which fields exist; we keep them all and offer
/// accessors for the common ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(pub Map<String, Value>);

impl Identity {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    fn str_field(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    pub fn username(&self) -> Option<&str> {
        self.str_field("username")
    }

    pub fn email(&self) -> Option<&str> {
        self.str_field("email")
    }

    pub fn full_name(&self) -> Option<&str> {
        self.str_field("full_name")
    }

    pub fn role(&self) -> Option<&str> {
        self.str_field("role")
    }

    pub fn id(&self) -> Option<i64> {
        self.0.get("id").and_then(Value::as_i64)
    }

    /// Name to greet the user with
    pub fn display_name(&self) -> &str {
        self.full_name()
            .filter(|n| !n.is_empty())
            .or_else(|| self.username())
            .unwrap_or("Unknown user")
    }
}

/// Successful body of `POST /api/auth/login`
#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    pub access_token: String,
    #[serde(flatten)]
    pub identity: Map<String, Value>,
}

/// Body of `POST /api/auth/register`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_response_splits_token_from_identity() {
        let json = r#"{"access_token":"T","token_type":"bearer","username":"admin"}"#;
        let parsed: LoginResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.access_token, "T");
        assert!(!parsed.identity.contains_key("access_token"));
        assert_eq!(parsed.identity.get("username"), Some(&Value::from("admin")));
        assert_eq!(parsed.identity.get("token_type"), Some(&Value::from("bearer")));
    }

    #[test]
    fn test_login_response_requires_token() {
        let json = r#"{"username":"admin"}"#;
        assert!(serde_json::from_str::<LoginResponse>(json).is_err());
    }

    #[test]
    fn test_identity_accessors() {
        let identity: Identity = serde_json::from_str(
            r#"{"id":1,"username":"admin","email":"admin@shop.test","full_name":"","role":"admin"}"#,
        )
        .unwrap();
        assert_eq!(identity.id(), Some(1));
        assert_eq!(identity.username(), Some("admin"));
        assert_eq!(identity.email(), Some("admin@shop.test"));
        assert_eq!(identity.role(), Some("admin"));
        // Empty full name falls back to username
        assert_eq!(identity.display_name(), "admin");
    }

    #[test]
    fn test_register_request_omits_missing_full_name() {
        let request = RegisterRequest {
            username: "clerk".into(),
            email: "clerk@shop.test".into(),
            password: "secret".into(),
            full_name: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("full_name").is_none());
    }
}
