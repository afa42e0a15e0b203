use serde::{Deserialize, Serialize};

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: String,
}

/// Request body for obtaining an auth token.
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub email: String,
    pub password: String,
}

/// Response for a successful login.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Public part of the user returned to the client; the password hash
/// never leaves the repo layer.
#[derive(Debug, Serialize)]
pub struct UserOut {
    pub email: String,
    pub name: String,
}

/// Partial update of the caller's own profile.
#[derive(Debug, Deserialize)]
pub struct UpdateMeRequest {
    pub name: Option<String>,
    pub password: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_out_never_contains_password() {
        let out = UserOut {
            email: "a@a.com".into(),
            name: "Alice".into(),
        };
        let json = serde_json::to_string(&out).unwrap();
        assert!(json.contains("a@a.com"));
        assert!(!json.contains("password"));
    }

    #[test]
    fn create_user_name_defaults_to_empty() {
        let req: CreateUserRequest =
            serde_json::from_str(r#"{"email":"a@a.com","password":"pass1"}"#).unwrap();
        assert_eq!(req.name, "");
    }
}
