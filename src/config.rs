use clap::{Args, Parser, Subcommand};
use std::env;
use std::path::PathBuf;
use thiserror::Error;

use crate::provisioner::ProvisionerConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("flag missing: {0}")]
    MissingFlag(&'static str),

    #[error("unspecified required --https-cert-path, --https-key-path")]
    MissingTlsPaths,

    #[error("can't read '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("can't parse provisioner configuration '{path}': {source}")]
    ParseProvisionerConfig {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Command line of the clusters service.
#[derive(Parser, Debug)]
#[command(name = "clusters-service")]
#[command(version, about = "Clusters management service")]
pub struct ClustersCli {
    #[command(subcommand)]
    pub command: ClustersCommand,
}

#[derive(Subcommand, Debug)]
pub enum ClustersCommand {
    /// Serve the clusters service
    Serve(ClustersServeArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ClustersServeArgs {
    /// Path to a Kubernetes client configuration file. Only required when
    /// running outside of a cluster.
    #[arg(long)]
    pub kubeconfig: Option<PathBuf>,

    /// The address of the Kubernetes API server. Overrides any value in the
    /// Kubernetes configuration file.
    #[arg(long)]
    pub master: Option<String>,

    /// The IP address or host name of the server.
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// The port number of the server.
    #[arg(long, default_value_t = 8000)]
    pub port: u16,

    /// JSON file overriding the infrastructure settings of provisioned clusters.
    #[arg(long)]
    pub provisioner_config: Option<PathBuf>,
}

/// Command line of the customers service.
#[derive(Parser, Debug)]
#[command(name = "customers-service")]
#[command(version, about = "Customers management service")]
pub struct CustomersCli {
    #[command(subcommand)]
    pub command: CustomersCommand,
}

#[derive(Subcommand, Debug)]
pub enum CustomersCommand {
    /// Serve the customers service
    Serve(CustomersServeArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CustomersServeArgs {
    /// The IP address or host name of the server.
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// The port number of the server.
    #[arg(long, default_value_t = 8000)]
    pub port: u16,

    /// The database connection url.
    #[arg(long)]
    pub db_url: Option<String>,

    /// The url endpoint for the JWK certs.
    #[arg(long)]
    pub jwk_certs_url: Option<String>,

    /// Run in demo mode (no token needed, return demo data).
    #[arg(
        long,
        default_value_t = false,
        num_args = 0..=1,
        default_missing_value = "true",
        action = clap::ArgAction::Set
    )]
    pub demo_mode: bool,

    /// Serve without using tls.
    #[arg(long)]
    pub no_https: bool,

    /// The path to the tls.crt file.
    #[arg(long)]
    pub https_cert_path: Option<PathBuf>,

    /// The path to the tls.key file.
    #[arg(long)]
    pub https_key_path: Option<PathBuf>,
}

/// Certificate and key used to serve HTTPS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsConfig {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomersBackend {
    Demo,
    Sql { db_url: String },
}

#[derive(Debug, Clone)]
pub struct CustomersConfig {
    pub server_address: String,
    pub backend: CustomersBackend,
    /// `None` disables token validation (demo mode).
    pub jwk_certs_url: Option<String>,
    /// `None` serves plain HTTP.
    pub tls: Option<TlsConfig>,
}

impl TryFrom<CustomersServeArgs> for CustomersConfig {
    type Error = ConfigError;

    fn try_from(args: CustomersServeArgs) -> Result<Self, Self::Error> {
        let (backend, jwk_certs_url) = if args.demo_mode {
            (CustomersBackend::Demo, None)
        } else {
            let db_url = args
                .db_url
                .filter(|url| !url.is_empty())
                .ok_or(ConfigError::MissingFlag("--db-url"))?;
            let jwk_certs_url = args
                .jwk_certs_url
                .filter(|url| !url.is_empty())
                .ok_or(ConfigError::MissingFlag("--jwk-certs-url"))?;
            (CustomersBackend::Sql { db_url }, Some(jwk_certs_url))
        };

        let tls = if args.no_https {
            None
        } else {
            match (args.https_cert_path, args.https_key_path) {
                (Some(cert_path), Some(key_path)) => Some(TlsConfig {
                    cert_path,
                    key_path,
                }),
                _ => return Err(ConfigError::MissingTlsPaths),
            }
        };

        Ok(CustomersConfig {
            server_address: format!("{}:{}", args.host, args.port),
            backend,
            jwk_certs_url,
            tls,
        })
    }
}

/// PostgreSQL settings of the clusters service, read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgresEnv {
    pub user: String,
    pub password: String,
    pub database: String,
    pub host: String,
    pub port: u16,
}

impl PostgresEnv {
    pub fn load() -> Self {
        // Only read .env when explicitly asked to
        if env::var("USE_DOTENV").ok().as_deref() == Some("true") {
            dotenv::dotenv().ok();
        }

        PostgresEnv {
            user: env::var("POSTGRESQL_USER").unwrap_or_default(),
            password: env::var("POSTGRESQL_PASSWORD").unwrap_or_default(),
            database: env::var("POSTGRESQL_DATABASE").unwrap_or_default(),
            host: env::var("POSTGRESQL_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: env::var("POSTGRESQL_PORT")
                .ok()
                .and_then(|port| port.parse().ok())
                .unwrap_or(5432),
        }
    }

    pub fn connection_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}?sslmode=disable",
            self.user, self.password, self.host, self.port, self.database
        )
    }
}

#[derive(Debug, Clone)]
pub struct ClustersConfig {
    pub server_address: String,
    pub kubeconfig: Option<PathBuf>,
    pub master: Option<String>,
    pub database_url: String,
    pub provisioner: ProvisionerConfig,
}

impl ClustersConfig {
    pub fn load(args: ClustersServeArgs, postgres: &PostgresEnv) -> Result<Self, ConfigError> {
        let provisioner = ProvisionerConfig::load(args.provisioner_config.as_deref())?;

        Ok(ClustersConfig {
            server_address: format!("{}:{}", args.host, args.port),
            kubeconfig: args.kubeconfig,
            master: args.master.filter(|master| !master.is_empty()),
            database_url: postgres.connection_url(),
            provisioner,
        })
    }
}
