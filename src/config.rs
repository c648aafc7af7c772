use std::{
    collections::HashMap,
    net::{Ipv4Addr, SocketAddr},
    path::{Path, PathBuf},
};

const DEFAULT_HOSTNAME: &str = "localhost";
const DEFAULT_PORT: u16 = 3000;
const DATA_FILENAME: &str = "data.json";
const TEST_DATA_FILENAME: &str = "mockData.json";

/// Settings by parameter. Command-line flags override environment variables,
/// which override the built-in defaults.
#[derive(Debug, Default)]
pub struct Config(pub HashMap<Parameter, String>);

#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy)]
pub enum Parameter {
    Hostname,
    Port,
    Dir,
    DbFilename,
    TestMode,
    JsonLogs,
    Unknown,
}

impl Parameter {
    const ALL: [Parameter; 6] = [
        Parameter::Hostname,
        Parameter::Port,
        Parameter::Dir,
        Parameter::DbFilename,
        Parameter::TestMode,
        Parameter::JsonLogs,
    ];

    pub fn deserialize(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "hostname" => Parameter::Hostname,
            "port" => Parameter::Port,
            "dir" => Parameter::Dir,
            "dbfilename" => Parameter::DbFilename,
            "test-mode" => Parameter::TestMode,
            "json-logs" => Parameter::JsonLogs,
            _ => Parameter::Unknown,
        }
    }

    fn env_var(&self) -> Option<&'static str> {
        match self {
            Parameter::Hostname => Some("SERVER_HOSTNAME"),
            Parameter::Port => Some("SERVER_PORT"),
            Parameter::Dir => Some("DATA_DIR"),
            Parameter::DbFilename => Some("DB_FILENAME"),
            Parameter::TestMode => Some("TEST_MODE"),
            Parameter::JsonLogs => Some("JSON_LOGS"),
            Parameter::Unknown => None,
        }
    }
}

impl Config {
    /// Builds the config from `--name value` flags layered over whatever
    /// `env` returns for each parameter's variable.
    pub fn load<I, F>(args: I, env: F) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = String>,
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        for parameter in Parameter::ALL {
            if let Some(value) = parameter.env_var().and_then(&env) {
                config.0.insert(parameter, value);
            }
        }

        let mut current_key = None;
        for arg in args {
            if let Some(current_key) = current_key.take() {
                if current_key != Parameter::Unknown {
                    config.0.insert(current_key, arg);
                }
            } else if let Some(name) = arg.strip_prefix("--") {
                current_key = Some(Parameter::deserialize(name));
            } else {
                anyhow::bail!("invalid argument {:?}", arg)
            }
        }
        if let Some(parameter) = current_key {
            anyhow::bail!("missing value for {:?}", parameter)
        }

        // Fail at startup rather than on first use.
        config.port()?;
        Ok(config)
    }

    /// Reads `KEY=value` pairs from a dotenv file. A missing file yields no
    /// variables.
    pub fn read_env_file(path: impl AsRef<Path>) -> anyhow::Result<HashMap<String, String>> {
        let path = path.as_ref();
        let iter = match dotenvy::from_path_iter(path) {
            Ok(iter) => iter,
            Err(e) if e.not_found() => return Ok(HashMap::new()),
            Err(e) => return Err(anyhow::format_err!("failed to read {:?}: {}", path, e)),
        };
        iter.map(|item| item.map_err(|e| anyhow::format_err!("malformed {:?}: {}", path, e)))
            .collect()
    }

    /// Display name of the host, used in logs only.
    pub fn hostname(&self) -> &str {
        self.0
            .get(&Parameter::Hostname)
            .map(String::as_str)
            .unwrap_or(DEFAULT_HOSTNAME)
    }

    pub fn port(&self) -> anyhow::Result<u16> {
        match self.0.get(&Parameter::Port) {
            Some(port) => port
                .parse()
                .map_err(|_| anyhow::format_err!("invalid port {:?}", port)),
            None => Ok(DEFAULT_PORT),
        }
    }

    /// The listener always binds every IPv4 interface on the configured port.
    pub fn bind_address(&self) -> anyhow::Result<SocketAddr> {
        Ok(SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port()?)))
    }

    pub fn test_mode(&self) -> bool {
        self.flag(Parameter::TestMode)
    }

    pub fn json_logs(&self) -> bool {
        self.flag(Parameter::JsonLogs)
    }

    /// Location of the registry document.
    pub fn db_path(&self) -> PathBuf {
        let mut path = PathBuf::new();
        if let Some(dir) = self.0.get(&Parameter::Dir) {
            path.push(dir);
        }
        match self.0.get(&Parameter::DbFilename) {
            Some(filename) => path.push(filename),
            None if self.test_mode() => path.push(TEST_DATA_FILENAME),
            None => path.push(DATA_FILENAME),
        }
        path
    }

    fn flag(&self, parameter: Parameter) -> bool {
        matches!(
            self.0.get(&parameter).map(|v| v.to_ascii_lowercase()).as_deref(),
            Some("true" | "1" | "yes")
        )
    }
}
