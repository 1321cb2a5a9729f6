use std::env;

use log::*;
use psg_common::{parse_boolean_flag, Secret};
use rand::RngCore;
use shop_payment_engine::vnpay::VnPayConfig;

const DEFAULT_PSG_HOST: &str = "127.0.0.1";
const DEFAULT_PSG_PORT: u16 = 8360;
const DEFAULT_CATALOG_TIMEOUT_SECS: u64 = 5;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    pub vnpay: VnPayConfig,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address,
    /// rather than the connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address, rather
    /// than the connection's remote address.
    pub use_forwarded: bool,
    /// The maximum time to wait for a single catalog price lookup before abandoning order
    /// creation.
    pub catalog_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_PSG_HOST.to_string(),
            port: DEFAULT_PSG_PORT,
            database_url: String::default(),
            auth: AuthConfig::default(),
            vnpay: VnPayConfig::default(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            catalog_timeout_secs: DEFAULT_CATALOG_TIMEOUT_SECS,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("PSG_HOST").ok().unwrap_or_else(|| DEFAULT_PSG_HOST.into());
        let port = env::var("PSG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for PSG_PORT. {e} Using the default, {DEFAULT_PSG_PORT}, instead."
                    );
                    DEFAULT_PSG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_PSG_PORT);
        let database_url = env::var("PSG_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ PSG_DATABASE_URL is not set. Please set it to the URL for the orders database.");
            String::default()
        });
        let auth = AuthConfig::try_from_env().unwrap_or_else(|| {
            warn!(
                "🪛️ PSG_JWT_SECRET is not set. A random secret will be used for this session. Access tokens will not \
                 survive a server restart."
            );
            AuthConfig::default()
        });
        let vnpay = VnPayConfig::from_env_or_default();
        let use_x_forwarded_for = parse_boolean_flag(env::var("PSG_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("PSG_USE_FORWARDED").ok(), false);
        let catalog_timeout_secs = env::var("PSG_CATALOG_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_CATALOG_TIMEOUT_SECS);
        Self { host, port, database_url, auth, vnpay, use_x_forwarded_for, use_forwarded, catalog_timeout_secs }
    }
}

/// The subset of the configuration the request handlers need to determine the client's IP address
/// behind a reverse proxy.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProxyConfig {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The HMAC secret used to sign and verify JWT access tokens.
    pub jwt_secret: Secret<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        let secret = bytes.iter().map(|b| format!("{b:02x}")).collect::<String>();
        Self { jwt_secret: Secret::new(secret) }
    }
}

impl AuthConfig {
    pub fn try_from_env() -> Option<Self> {
        let secret = env::var("PSG_JWT_SECRET").ok().filter(|s| !s.is_empty())?;
        Some(Self { jwt_secret: Secret::new(secret) })
    }
}
