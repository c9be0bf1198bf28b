use tracing::{debug, warn};

use crate::auth::dto::LoginUser;
use crate::discovery::{ServiceInstance, ServiceLocator};
use crate::errors::ApiError;
use crate::users::repo::UserRecord;

/// Resolve the peer service to a single usable instance. No instance, or an
/// instance missing its address or port, fails the whole login: non-admin
/// login is defined as incomplete without the peer data.
pub async fn resolve_peer(
    locator: &dyn ServiceLocator,
    service_name: &str,
) -> Result<ServiceInstance, ApiError> {
    let instances = locator.resolve(service_name).await.map_err(|e| {
        warn!(error = %e, service = service_name, "discovery lookup failed");
        ApiError::Dependency {
            msg: format!("{service_name} service not found in Consul"),
            peer_error: None,
        }
    })?;

    let instance = instances.into_iter().next().ok_or_else(|| ApiError::Dependency {
        msg: format!("{service_name} service not found in Consul"),
        peer_error: None,
    })?;

    if instance.address.is_empty() || instance.port == 0 {
        return Err(ApiError::Dependency {
            msg: "Invalid service address from Consul".into(),
            peer_error: None,
        });
    }

    debug!(address = %instance.address, port = instance.port, "peer resolved");
    Ok(instance)
}

/// Fetch the auxiliary identifier from the resolved peer. A transport error
/// or non-2xx response fails the login, carrying through any structured
/// error payload the peer returned.
pub async fn fetch_mod_poc_id(
    http: &reqwest::Client,
    instance: &ServiceInstance,
    user_id: &str,
) -> Result<serde_json::Value, ApiError> {
    let url = format!(
        "http://{}:{}/poc/mod_id_poc_id/{}",
        instance.address, instance.port, user_id
    );

    let resp = http.get(&url).send().await.map_err(|e| {
        warn!(error = %e, %url, "peer request failed");
        ApiError::Dependency {
            msg: "Login failed".into(),
            peer_error: None,
        }
    })?;

    if !resp.status().is_success() {
        let peer_error = resp.json::<serde_json::Value>().await.ok();
        return Err(ApiError::Dependency {
            msg: "Login failed".into(),
            peer_error,
        });
    }

    resp.json::<serde_json::Value>()
        .await
        .map_err(|e| ApiError::Dependency {
            msg: "Login failed".into(),
            peer_error: Some(serde_json::json!({ "decode_error": e.to_string() })),
        })
}

/// Build the user block of the login response. Admins short-circuit with
/// their basic info and the locator is never consulted; everyone else gets
/// enriched with the peer's `mod_poc_id`.
pub async fn enrich_login_user(
    user: &UserRecord,
    locator: &dyn ServiceLocator,
    http: &reqwest::Client,
    peer_service_name: &str,
) -> Result<LoginUser, ApiError> {
    if user.admin {
        return Ok(LoginUser {
            user_id: user.user_id.clone(),
            full_name: user.full_name.clone(),
            admin: true,
            mod_poc_id: None,
        });
    }

    let instance = resolve_peer(locator, peer_service_name).await?;
    let mod_poc_id = fetch_mod_poc_id(http, &instance, &user.user_id).await?;

    Ok(LoginUser {
        user_id: user.user_id.clone(),
        full_name: user.full_name.clone(),
        admin: false,
        mod_poc_id: Some(mod_poc_id),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use uuid::Uuid;

    /// Locator that fails the test if login ever touches it.
    struct PanicLocator;
    #[async_trait]
    impl ServiceLocator for PanicLocator {
        async fn resolve(&self, _name: &str) -> anyhow::Result<Vec<ServiceInstance>> {
            panic!("locator must not be consulted for admin login");
        }
    }

    struct FixedLocator(Vec<ServiceInstance>);
    #[async_trait]
    impl ServiceLocator for FixedLocator {
        async fn resolve(&self, _name: &str) -> anyhow::Result<Vec<ServiceInstance>> {
            Ok(self.0.clone())
        }
    }

    fn make_user(admin: bool) -> UserRecord {
        UserRecord {
            id: Uuid::new_v4(),
            user_id: "u-1".into(),
            full_name: "Asha Rao".into(),
            email: "asha@example.edu".into(),
            password: "$argon2id$...".into(),
            department: "CSE".into(),
            college: "Main".into(),
            rollno: Some("21CS001".into()),
            mobile_no: None,
            status: true,
            admin,
            user_last_login: None,
        }
    }

    #[tokio::test]
    async fn admin_login_never_resolves_peer() {
        let user = make_user(true);
        let out = enrich_login_user(&user, &PanicLocator, &reqwest::Client::new(), "Express_Poc")
            .await
            .expect("admin login should succeed without discovery");
        assert!(out.admin);
        assert!(out.mod_poc_id.is_none());
    }

    #[tokio::test]
    async fn non_admin_login_fails_when_no_instance_registered() {
        let user = make_user(false);
        let err = enrich_login_user(
            &user,
            &FixedLocator(Vec::new()),
            &reqwest::Client::new(),
            "Express_Poc",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Dependency { .. }));
        assert_eq!(err.to_string(), "Express_Poc service not found in Consul");
    }

    #[tokio::test]
    async fn resolve_peer_rejects_incomplete_instance() {
        let locator = FixedLocator(vec![ServiceInstance {
            address: String::new(),
            port: 3001,
        }]);
        let err = resolve_peer(&locator, "Express_Poc").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid service address from Consul");
    }

    #[tokio::test]
    async fn resolve_peer_rejects_zero_port() {
        let locator = FixedLocator(vec![ServiceInstance {
            address: "10.0.0.5".into(),
            port: 0,
        }]);
        let err = resolve_peer(&locator, "Express_Poc").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid service address from Consul");
    }

    #[tokio::test]
    async fn resolve_peer_takes_first_instance() {
        let locator = FixedLocator(vec![
            ServiceInstance {
                address: "10.0.0.5".into(),
                port: 3001,
            },
            ServiceInstance {
                address: "10.0.0.6".into(),
                port: 3002,
            },
        ]);
        let instance = resolve_peer(&locator, "Express_Poc").await.unwrap();
        assert_eq!(instance.address, "10.0.0.5");
        assert_eq!(instance.port, 3001);
    }
}
