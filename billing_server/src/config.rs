use std::env;

use billing_common::Secret;
use log::*;
use rand::{distributions::Alphanumeric, thread_rng, Rng};

const DEFAULT_BILLING_HOST: &str = "127.0.0.1";
const DEFAULT_BILLING_PORT: u16 = 8480;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/billing_store.db";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_BILLING_HOST.to_string(),
            port: DEFAULT_BILLING_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            auth: AuthConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("BILLING_HOST").ok().unwrap_or_else(|| DEFAULT_BILLING_HOST.into());
        let port = env::var("BILLING_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for BILLING_PORT. {e} Using the default, \
                         {DEFAULT_BILLING_PORT}, instead."
                    );
                    DEFAULT_BILLING_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_BILLING_PORT);
        let database_url = env::var("BILLING_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ BILLING_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let auth = AuthConfig::try_from_env().unwrap_or_default();
        Self { host, port, database_url, auth }
    }
}

/// The shared secret used to verify (and, for tooling, to mint) the HS256 JWTs that the identity
/// provider issues.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: Secret<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🚨️ BILLING_JWT_SECRET is not set. A random secret has been generated for this run. \
             Tokens will not survive a restart, and the identity provider cannot mint tokens this \
             server will accept. Do NOT use this in production."
        );
        let secret: String = thread_rng().sample_iter(&Alphanumeric).take(64).map(char::from).collect();
        Self { jwt_secret: Secret::new(secret) }
    }
}

impl AuthConfig {
    pub fn new<S: Into<String>>(secret: S) -> Self {
        Self { jwt_secret: Secret::new(secret.into()) }
    }

    pub fn try_from_env() -> Result<Self, env::VarError> {
        let secret = env::var("BILLING_JWT_SECRET")?;
        if secret.len() < 32 {
            warn!("🪛️ BILLING_JWT_SECRET is shorter than 32 characters. Consider using a longer secret.");
        }
        Ok(Self { jwt_secret: Secret::new(secret) })
    }
}
