use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use clap::Args;

use registry_core::Database;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_SEARCH_LIMIT: usize = 200;

/// Where the store lives. Shared by every subcommand that opens it.
#[derive(Args, Debug, Clone, Default)]
pub struct DatabaseArgs {
    /// Path to the SQLite database (defaults to the per-user data directory)
    #[arg(long, env = "RREG_DATABASE")]
    pub database: Option<PathBuf>,
}

impl DatabaseArgs {
    /// Opens the store and runs migrations.
    pub fn open(&self) -> registry_core::Result<Database> {
        let db = match &self.database {
            Some(path) => Database::open(path)?,
            None => Database::open_default()?,
        };
        db.migrate()?;
        Ok(db)
    }
}

#[derive(Args, Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the HTTP API to
    #[arg(long, env = "RREG_HOST", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub host: IpAddr,

    /// Port for HTTP API
    #[arg(short, long, env = "RREG_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Maximum researchers returned by a name search (0 = unbounded)
    #[arg(long, env = "RREG_SEARCH_LIMIT", default_value_t = DEFAULT_SEARCH_LIMIT)]
    pub search_limit: usize,

    #[command(flatten)]
    pub db: DatabaseArgs,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
            search_limit: DEFAULT_SEARCH_LIMIT,
            db: DatabaseArgs::default(),
        }
    }
}

#[derive(clap::Parser)]
struct EnvOnly {
    #[command(flatten)]
    config: ServerConfig,
}

impl ServerConfig {
    /// Resolves settings from `RREG_*` variables, falling back to defaults.
    pub fn from_env() -> Result<Self, clap::Error> {
        use clap::Parser;
        Ok(EnvOnly::try_parse_from(["rreg"])?.config)
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn search_limit(&self) -> Option<usize> {
        (self.search_limit > 0).then_some(self.search_limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        config: ServerConfig,
    }

    #[test]
    fn defaults_bind_localhost() {
        let cli = TestCli::try_parse_from(["rreg"]).unwrap();
        assert_eq!(cli.config.bind_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(cli.config.search_limit(), Some(DEFAULT_SEARCH_LIMIT));
    }

    #[test]
    fn zero_search_limit_is_unbounded() {
        let cli = TestCli::try_parse_from(["rreg", "--search-limit", "0", "--port", "8080"]).unwrap();
        assert_eq!(cli.config.search_limit(), None);
        assert_eq!(cli.config.port, 8080);
    }

    #[test]
    fn database_args_open_and_migrate() {
        let dir = TempDir::new().unwrap();
        let args = DatabaseArgs {
            database: Some(dir.path().join("research.db")),
        };

        let db = args.open().unwrap();

        assert_eq!(db.schema_version().unwrap(), registry_core::db::SCHEMA_VERSION);
    }
}
