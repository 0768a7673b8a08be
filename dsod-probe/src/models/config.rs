use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use getset::Getters;
use request_guard::{ClientConfig, Method, RequestDescriptor};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "probe.yaml";
const ENV_PREFIX: &str = "DSOD_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
#[get = "pub"]
pub struct Config {
    #[serde(default)]
    client: ClientConfig,
    /// How many identical copies of each request to fire at once
    #[serde(default = "default_burst")]
    burst: usize,
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default)]
    requests: Vec<ProbeRequest>,
}

fn default_burst() -> usize {
    3
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            burst: default_burst(),
            log_level: default_log_level(),
            requests: vec![],
        }
    }
}

impl Config {
    /// Defaults, overridden by the YAML file, overridden by `DSOD_*` variables
    /// (`DSOD_CLIENT__BASE_URL` sets `client.base_url`).
    pub fn load(path: &Path) -> Result<Self, figment::Error> {
        Self::figment(Yaml::file(path)).extract()
    }

    fn figment(yaml: figment::providers::Data<Yaml>) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(yaml)
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
#[get = "pub"]
pub struct ProbeRequest {
    method: Method,
    url: String,
    #[serde(default)]
    params: Option<Value>,
    #[serde(default)]
    body: Option<Value>,
    #[serde(default)]
    headers: BTreeMap<String, String>,
}

impl ProbeRequest {
    pub fn descriptor(&self) -> RequestDescriptor {
        let mut request = RequestDescriptor::new(self.method, self.url.clone());
        if let Some(params) = &self.params {
            request = request.with_params(params.clone());
        }
        if let Some(body) = &self.body {
            request = request.with_json(body.clone());
        }
        for (name, value) in &self.headers {
            request = request.with_header(name.clone(), value.clone());
        }
        request
    }
}
