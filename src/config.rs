use std::path::PathBuf;
use std::time::Duration;

use ::config::{ConfigError, Environment, File};
use serde_derive::Deserialize;


const ENV_PREFIX: &str = "TABSERVE";


#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub files: FilesConfig,
    pub catalog: CatalogConfig,
    pub store: StoreConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
    /// Value of the `Server` header
    pub name: String,
    pub read_timeout_secs: u64,
    pub write_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    pub web_root: PathBuf,
    pub default_document: String,
    pub not_found_document: String,
    pub not_supported_document: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Any request path ending with this suffix is answered from the catalog
    pub route_suffix: String,
    /// JSON source, relative to the web root
    pub source: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// `mysql`, `postgresql` or `sqlite`
    pub kind: String,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Database name, or the database file path for `sqlite`
    pub database: String,
    pub connect_timeout_secs: u64,
    pub json_route: String,
    pub xml_route: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `console` or `file`
    pub kind: String,
    pub level: String,
    pub file: String,
}


impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 8080,
            workers: 8,
            name: format!("tabserve/{}", env!("CARGO_PKG_VERSION")),
            read_timeout_secs: 30,
            write_timeout_secs: 30,
        }
    }
}

impl Default for FilesConfig {
    fn default() -> Self {
        FilesConfig {
            web_root: PathBuf::from("./files"),
            default_document: "index.html".to_string(),
            not_found_document: "404.html".to_string(),
            not_supported_document: "not_supported.html".to_string(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        CatalogConfig {
            route_suffix: "/punti-vendita.xml".to_string(),
            source: PathBuf::from("myfolder/punti-vendita.json"),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            kind: "mysql".to_string(),
            host: "localhost".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: "root".to_string(),
            database: "tabserve".to_string(),
            connect_timeout_secs: 5,
            json_route: "/db/json/".to_string(),
            xml_route: "/db/xml/".to_string(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            kind: "console".to_string(),
            level: "info".to_string(),
            file: "tabserve.log".to_string(),
        }
    }
}


impl Config {
    /// Build the configuration from defaults, an optional file and `TABSERVE_*` variables,
    /// e.g. `TABSERVE_SERVER__PORT=9000`.
    pub fn load(path: Option<&str>) -> Result<Config, ConfigError> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path));
        }
        let cfg: Config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?
            .try_deserialize()?;

        cfg.normalized()
    }

    /// Request paths are lower-cased before routing, so routes are too.
    fn normalized(mut self) -> Result<Config, ConfigError> {
        self.catalog.route_suffix = self.catalog.route_suffix.to_lowercase();
        self.store.json_route = self.store.json_route.to_lowercase();
        self.store.xml_route = self.store.xml_route.to_lowercase();

        if self.server.workers == 0 {
            return Err(ConfigError::Message("server.workers must be positive".to_string()));
        }
        for route in [&self.catalog.route_suffix, &self.store.json_route, &self.store.xml_route] {
            if !route.starts_with('/') {
                return Err(ConfigError::Message(format!("route `{}` must start with `/`", route)));
            }
        }
        Ok(self)
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn catalog_source(&self) -> PathBuf {
        self.files.web_root.join(&self.catalog.source)
    }
}

impl ServerConfig {
    pub fn read_timeout(&self) -> Option<Duration> {
        timeout(self.read_timeout_secs)
    }

    pub fn write_timeout(&self) -> Option<Duration> {
        timeout(self.write_timeout_secs)
    }
}

impl StoreConfig {
    pub fn connect_timeout(&self) -> Option<Duration> {
        timeout(self.connect_timeout_secs)
    }
}

/// Zero disables the timeout
fn timeout(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}
