use std::time::Duration;

use config::{ConfigError, Environment, File, FileFormat};

pub const DEFAULT_CONFIG_FILE: &str = "phonebook.toml";

#[derive(Debug, serde::Deserialize)]
pub struct Config {
    pub database_url: String,
    #[serde(default = "default_server_address")]
    pub server_address: String,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_server_address() -> String {
    "0.0.0.0:3001".into()
}

fn default_static_dir() -> String {
    "dist".into()
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_max_connections() -> u32 {
    10
}

impl Config {
    /// Reads the optional TOML file at `path`, then lets environment
    /// variables (`DATABASE_URL`, `SERVER_ADDRESS`, ...) override it.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        Self::from_sources(path, Environment::default())
    }

    fn from_sources(path: &str, env: Environment) -> Result<Self, ConfigError> {
        let config: Self = ::config::Config::builder()
            .add_source(File::new(path, FileFormat::Toml).required(false))
            .add_source(env)
            .build()?
            .try_deserialize()?;

        if config.database_url.trim().is_empty() {
            return Err(ConfigError::Message("database_url must not be empty".into()));
        }

        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn isolated_env() -> Environment {
        Environment::with_prefix("PHONEBOOK_CONFIG_TEST_UNSET")
    }

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn fills_in_defaults() {
        let file = write_config("database_url = \"postgres://localhost/phonebook\"\n");

        let config = Config::from_sources(file.path().to_str().unwrap(), isolated_env()).unwrap();
        assert_eq!(config.database_url, "postgres://localhost/phonebook");
        assert_eq!(config.server_address, "0.0.0.0:3001");
        assert_eq!(config.static_dir, "dist");
        assert_eq!(config.request_timeout(), Duration::from_secs(15));
        assert_eq!(config.max_connections, 10);
    }

    #[test]
    fn reads_every_key_from_file() {
        let file = write_config(
            r#"
database_url = "postgres://db/phonebook"
server_address = "127.0.0.1:8080"
static_dir = "/srv/phonebook"
request_timeout_secs = 3
max_connections = 2
"#,
        );

        let config = Config::from_sources(file.path().to_str().unwrap(), isolated_env()).unwrap();
        assert_eq!(config.server_address, "127.0.0.1:8080");
        assert_eq!(config.static_dir, "/srv/phonebook");
        assert_eq!(config.request_timeout(), Duration::from_secs(3));
        assert_eq!(config.max_connections, 2);
    }

    #[test]
    fn database_url_is_required() {
        let file = write_config("server_address = \"127.0.0.1:8080\"\n");
        assert!(Config::from_sources(file.path().to_str().unwrap(), isolated_env()).is_err());

        let file = write_config("database_url = \"  \"\n");
        assert!(Config::from_sources(file.path().to_str().unwrap(), isolated_env()).is_err());

        assert!(Config::from_sources("does/not/exist.toml", isolated_env()).is_err());
    }
}
