// src/config.rs
use crate::api::DatabaseIds;
use crate::constants::{
    DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL_SECS, DEFAULT_EVENTS_INTERVAL_SECS, DEFAULT_PORT,
    DEFAULT_RATE_LIMIT_PER_MINUTE, NOTION_API_BASE_URL, NOTION_REQUEST_TIMEOUT_SECS,
};
use crate::error::AppError;
use crate::server::CorsPolicy;
use crate::types::{ApiKey, RecordId, ValidatedUrl};
use clap::{Args, Parser, Subcommand};
use std::time::Duration;

/// Parsed command-line input.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CommandLineInput {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the REST API server
    Serve(ServeArgs),
    /// Print every estado change of one parte
    Watch(WatchArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Address to bind
    #[arg(long, env = "BIND", default_value = "0.0.0.0")]
    pub bind: String,

    /// Notion integration token. Without one the server runs on sample data.
    #[arg(long, env = "NOTION_TOKEN", hide_env_values = true)]
    pub notion_token: Option<String>,

    /// Serve sample data even if a token is configured
    #[arg(long, default_value_t = false)]
    pub mock: bool,

    /// Notion API base URL
    #[arg(long, env = "NOTION_API_URL", default_value = NOTION_API_BASE_URL)]
    pub notion_api_url: String,

    /// Obras database ID
    #[arg(long, env = "NOTION_DB_OBRAS")]
    pub db_obras: Option<String>,

    /// Jefes de obra database ID
    #[arg(long, env = "NOTION_DB_JEFES_OBRA")]
    pub db_jefes_obra: Option<String>,

    /// Empleados database ID
    #[arg(long, env = "NOTION_DB_EMPLEADOS")]
    pub db_empleados: Option<String>,

    /// Partes de trabajo database ID
    #[arg(long, env = "NOTION_DB_PARTES")]
    pub db_partes: Option<String>,

    /// Detalles de horas database ID
    #[arg(long, env = "NOTION_DB_DETALLES")]
    pub db_detalles: Option<String>,

    /// Seconds a cached listing stays valid (0 disables the cache)
    #[arg(long, env = "CACHE_TTL", default_value_t = DEFAULT_CACHE_TTL_SECS)]
    pub cache_ttl: u64,

    /// Distinct listings kept in the cache
    #[arg(long, env = "CACHE_CAPACITY", default_value_t = DEFAULT_CACHE_CAPACITY)]
    pub cache_capacity: usize,

    /// Requests per minute per client (0 disables rate limiting)
    #[arg(long, env = "RATE_LIMIT_PER_MINUTE", default_value_t = DEFAULT_RATE_LIMIT_PER_MINUTE)]
    pub rate_limit: u32,

    /// Timeout in seconds for each Notion request
    #[arg(long, env = "NOTION_TIMEOUT", default_value_t = NOTION_REQUEST_TIMEOUT_SECS)]
    pub notion_timeout: u64,

    /// Seconds between estado checks on the SSE stream
    #[arg(long, env = "EVENTS_INTERVAL", default_value_t = DEFAULT_EVENTS_INTERVAL_SECS)]
    pub events_interval: u64,

    /// Allowed CORS origins, comma separated (default: any)
    #[arg(long, env = "CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Vec<String>,

    /// Base URL of the signing page linked from each parte
    #[arg(long, env = "SIGNING_BASE_URL")]
    pub signing_base_url: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct WatchArgs {
    /// ID of the parte to follow
    pub parte_id: String,

    /// Base URL of a running server
    #[arg(long, env = "OBRA_PARTES_SERVER", default_value = "http://localhost:3001")]
    pub server: String,

    /// Keep watching after the parte is signed or sent
    #[arg(long, default_value_t = false)]
    pub follow_final: bool,
}

/// Where partes are stored.
#[derive(Debug, Clone)]
pub enum Backend {
    Mock,
    Notion {
        api_key: ApiKey,
        api_url: ValidatedUrl,
        databases: DatabaseIds,
        timeout: Duration,
    },
}

/// Resolved server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    pub backend: Backend,
    pub cache_ttl: Duration,
    pub cache_capacity: usize,
    pub rate_limit_per_minute: u32,
    pub events_interval: Duration,
    pub cors: CorsPolicy,
    pub signing_base: Option<ValidatedUrl>,
}

impl ServerConfig {
    pub fn resolve(args: ServeArgs) -> Result<Self, AppError> {
        let token = args
            .notion_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty());

        let backend = match token {
            Some(_) if args.mock => {
                log::info!("--mock given, ignoring the configured Notion token");
                Backend::Mock
            }
            None => Backend::Mock,
            Some(token) => {
                let defaults = DatabaseIds::default();
                let pick = |value: Option<String>, fallback: String| {
                    value
                        .map(|v| v.trim().to_string())
                        .filter(|v| !v.is_empty())
                        .unwrap_or(fallback)
                };
                Backend::Notion {
                    api_key: ApiKey::new(token)?,
                    api_url: ValidatedUrl::parse(&args.notion_api_url)?,
                    databases: DatabaseIds {
                        sites: pick(args.db_obras, defaults.sites),
                        supervisors: pick(args.db_jefes_obra, defaults.supervisors),
                        employees: pick(args.db_empleados, defaults.employees),
                        work_orders: pick(args.db_partes, defaults.work_orders),
                        hours: pick(args.db_detalles, defaults.hours),
                    },
                    timeout: Duration::from_secs(args.notion_timeout.max(1)),
                }
            }
        };

        let signing_base = args
            .signing_base_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(ValidatedUrl::parse)
            .transpose()?;

        Ok(ServerConfig {
            bind: args.bind,
            port: args.port,
            backend,
            cache_ttl: Duration::from_secs(args.cache_ttl),
            cache_capacity: args.cache_capacity,
            rate_limit_per_minute: args.rate_limit,
            events_interval: Duration::from_secs(args.events_interval.max(1)),
            cors: CorsPolicy::from_origins(args.cors_origins),
            signing_base,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    pub fn is_mock(&self) -> bool {
        matches!(self.backend, Backend::Mock)
    }
}

/// Resolved `watch` configuration.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    pub parte_id: RecordId,
    pub server: ValidatedUrl,
    pub stop_when_final: bool,
}

impl WatchConfig {
    pub fn resolve(args: WatchArgs) -> Result<Self, AppError> {
        Ok(WatchConfig {
            parte_id: RecordId::parse(&args.parte_id)?,
            server: ValidatedUrl::parse(&args.server)?,
            stop_when_final: !args.follow_final,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn serve_args(extra: &[&str]) -> ServeArgs {
        let argv = ["obra-partes", "serve"].iter().chain(extra.iter());
        match CommandLineInput::try_parse_from(argv).unwrap().command {
            Command::Serve(args) => args,
            other => panic!("expected serve, got {other:?}"),
        }
    }

    #[test]
    fn no_token_means_mock() {
        let mut args = serve_args(&["--port", "4000"]);
        args.notion_token = None;
        let config = ServerConfig::resolve(args).unwrap();
        assert!(config.is_mock());
        assert_eq!(config.port, 4000);
        assert_eq!(config.cors, CorsPolicy::Any);
    }

    #[test]
    fn mock_flag_wins_over_a_token() {
        let args = serve_args(&["--notion-token", "secret_abcdefghijklmnopqrstuvwxyz", "--mock"]);
        assert!(ServerConfig::resolve(args).unwrap().is_mock());
    }

    #[test]
    fn token_selects_notion_with_database_overrides() {
        let args = serve_args(&[
            "--notion-token",
            "ntn_abcdefghijklmnopqrstuvwxyz",
            "--notion-api-url",
            "http://127.0.0.1:9999/v1",
            "--db-partes",
            "partes-db",
            "--cors-origins",
            "http://a.test,http://b.test",
        ]);
        let config = ServerConfig::resolve(args).unwrap();
        match &config.backend {
            Backend::Notion {
                api_url, databases, ..
            } => {
                assert_eq!(api_url.trimmed(), "http://127.0.0.1:9999/v1");
                assert_eq!(databases.work_orders, "partes-db");
                assert_eq!(databases.sites, DatabaseIds::default().sites);
            }
            Backend::Mock => panic!("expected the Notion backend"),
        }
        assert_eq!(
            config.cors,
            CorsPolicy::AllowList(vec!["http://a.test".into(), "http://b.test".into()])
        );
    }

    #[test]
    fn invalid_token_is_rejected() {
        let args = serve_args(&["--notion-token", "not-a-token"]);
        assert!(ServerConfig::resolve(args).is_err());
    }

    #[test]
    fn watch_defaults_to_stopping_on_final_states() {
        let cli =
            CommandLineInput::try_parse_from(["obra-partes", "-v", "watch", "parte-1"]).unwrap();
        assert!(cli.verbose);
        let Command::Watch(args) = cli.command else {
            panic!("expected watch");
        };
        let config = WatchConfig::resolve(args).unwrap();
        assert_eq!(config.parte_id.as_str(), "parte-1");
        assert!(config.stop_when_final);
    }
}
