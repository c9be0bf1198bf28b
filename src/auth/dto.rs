use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// User block of the login response. `mod_poc_id` only appears for
/// non-admin logins, once the peer service has been consulted.
#[derive(Debug, Serialize)]
pub struct LoginUser {
    pub user_id: String,
    pub full_name: String,
    pub admin: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mod_poc_id: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub msg: String,
    pub token: String,
    pub user: LoginUser,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_login_user_omits_mod_poc_id() {
        let user = LoginUser {
            user_id: "u-1".into(),
            full_name: "Root".into(),
            admin: true,
            mod_poc_id: None,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("mod_poc_id").is_none());
        assert_eq!(json["admin"], true);
    }

    #[test]
    fn non_admin_login_user_carries_mod_poc_id() {
        let user = LoginUser {
            user_id: "u-2".into(),
            full_name: "Asha Rao".into(),
            admin: false,
            mod_poc_id: Some(serde_json::json!({ "mod_id": 4, "poc_id": 9 })),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["mod_poc_id"]["mod_id"], 4);
    }
}
