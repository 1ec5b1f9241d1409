//! Configuration types shared by unit tests

use std::time::Duration;

use crate::schema::{Fields, Settings};
use crate::source::{KeyedData, MergedData};
use crate::types::Value;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub env: String,
    pub timeout: Duration,
    pub tags: Vec<String>,
    pub api_key: String,
    pub listen: String,
    pub max_conns: Option<u32>,
    pub database: Database,
    pub tls: Option<Tls>,
}

impl Settings for AppConfig {
    fn describe(f: &mut Fields<Self>) {
        f.field("Host", "required", |c| &c.host, |c| &mut c.host)
            .field("Port", "default:8080,min:1024,max:65535", |c| &c.port, |c| &mut c.port)
            .field("Env", "oneof:prod,staging,dev", |c| &c.env, |c| &mut c.env)
            .field("Timeout", "default:30s", |c| &c.timeout, |c| &mut c.timeout)
            .field("Tags", "", |c| &c.tags, |c| &mut c.tags)
            .field("ApiKey", "secret", |c| &c.api_key, |c| &mut c.api_key)
            .field("Listen", "name:http.listen", |c| &c.listen, |c| &mut c.listen)
            .field("MaxConns", "max:1000", |c| &c.max_conns, |c| &mut c.max_conns)
            .group("Database", "prefix:db", |c| &c.database, |c| &mut c.database)
            .optional_group("Tls", "", |c| &c.tls, |c| &mut c.tls);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Database {
    pub url: String,
    pub pool: u32,
    pub password: String,
}

impl Settings for Database {
    fn describe(f: &mut Fields<Self>) {
        f.field("Url", "default:postgres://localhost:5432/app", |c| &c.url, |c| &mut c.url)
            .field("Pool", "default:10,min:1", |c| &c.pool, |c| &mut c.pool)
            .field("Password", "secret", |c| &c.password, |c| &mut c.password);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tls {
    pub cert: String,
    pub key: String,
}

impl Settings for Tls {
    fn describe(f: &mut Fields<Self>) {
        f.field("Cert", "required", |c| &c.cert, |c| &mut c.cert)
            .field("Key", "required,secret", |c| &c.key, |c| &mut c.key);
    }
}

/// Two-field schema for strict-mode and reload tests
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Settings for Endpoint {
    fn describe(f: &mut Fields<Self>) {
        f.field("Host", "required", |c| &c.host, |c| &mut c.host)
            .field("Port", "min:1024,max:65535", |c| &c.port, |c| &mut c.port);
    }
}

/// Port wide enough to hold out-of-range values, so bounds are checked
/// after coercion succeeds
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Listener {
    pub port: u32,
}

impl Settings for Listener {
    fn describe(f: &mut Fields<Self>) {
        f.field("Port", "min:1024,max:65535", |c| &c.port, |c| &mut c.port);
    }
}

/// Merged data holding the entries of a JSON object, all from one source
pub fn merged(source: &str, json: serde_json::Value) -> MergedData {
    let mut data = MergedData::new();
    if let Value::Map(values) = Value::from(json) {
        data.layer(source, KeyedData::from(values));
    }
    data
}
