// src/specs/api.rs
//! JSON API source: one GET per character, experience read by JSON pointer.

use reqwest::blocking::Client;
use serde_json::Value;

use crate::config::options::JsonSource;
use crate::core::net::{self, NetError};
use crate::core::sanitize::parse_xp_number;

use super::{FetchError, Fetcher, Observation};

pub struct JsonApiFetcher {
    client: Client,
    src: JsonSource,
}

impl JsonApiFetcher {
    pub fn new(src: JsonSource) -> Result<Self, NetError> {
        Ok(Self { client: net::client()?, src })
    }

    pub fn url_for(&self, name: &str) -> String {
        self.src.url.replace("{name}", &net::path_escape(name))
    }
}

impl Fetcher for JsonApiFetcher {
    fn fetch(&self, name: &str) -> Result<Observation, FetchError> {
        let body = match net::http_get(&self.client, &self.url_for(name)) {
            Ok(b) => b,
            Err(e) if e.status() == Some(404) => return Err(FetchError::NotFound),
            Err(e) => return Err(e.into()),
        };
        parse_observation(&body, &self.src)
    }
}

pub fn parse_observation(body: &str, src: &JsonSource) -> Result<Observation, FetchError> {
    let doc: Value = serde_json::from_str(body).map_err(|e| FetchError::Parse(e.to_string()))?;

    let xp = doc.pointer(&src.xp_pointer).ok_or(FetchError::NotFound)?;
    let experience = xp_value(xp)
        .ok_or_else(|| FetchError::Parse(format!("{} is not an XP value: {xp}", src.xp_pointer)))?;

    let reported_name = src
        .name_pointer
        .as_deref()
        .and_then(|p| doc.pointer(p))
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(Observation { reported_name, experience })
}

fn xp_value(v: &Value) -> Option<u64> {
    match v {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => parse_xp_number(s).and_then(|x| u64::try_from(x).ok()),
        _ => None,
    }
}
