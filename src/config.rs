use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_hours: i64,
}

/// Consul settings: how this process registers itself and which peer
/// service login resolves for non-admin users.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryConfig {
    pub consul_url: String,
    pub service_id: String,
    pub service_name: String,
    pub service_address: String,
    pub service_port: u16,
    pub peer_service_name: String,
    pub http_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub discovery: DiscoveryConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            ttl_hours: std::env::var("JWT_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(10),
        };
        let discovery = DiscoveryConfig {
            consul_url: std::env::var("CONSUL_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8500".into()),
            service_id: std::env::var("CONSUL_SERVICE_ID")
                .unwrap_or_else(|_| "campus-users".into()),
            service_name: std::env::var("CONSUL_SERVICE_NAME")
                .unwrap_or_else(|_| "Campus_Users".into()),
            service_address: std::env::var("CONSUL_HOST").unwrap_or_else(|_| "127.0.0.1".into()),
            service_port: std::env::var("APP_PORT")
                .ok()
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(8080),
            peer_service_name: std::env::var("PEER_SERVICE_NAME")
                .unwrap_or_else(|_| "Express_Poc".into()),
            http_timeout_secs: std::env::var("HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(10),
        };
        Ok(Self {
            database_url,
            jwt,
            discovery,
        })
    }
}
