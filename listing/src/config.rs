use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Column budget for every listing row, address column included.
    pub max_width: usize,
    /// Minimum hex digits of the address column; wider addresses widen it.
    pub address_width: usize,
    pub anchor_prefix: String,
    pub glossary_page: String,
    pub term_prefix: String,
    /// Link address literals without an exact anchor to the nearest preceding one.
    pub nearest_anchor: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_width: 80,
            address_width: 4,
            anchor_prefix: String::from("addr-"),
            glossary_page: String::from("glossary.html"),
            term_prefix: String::from("term-"),
            nearest_anchor: false,
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let file = File::open(path)?;
        Ok(serde_yaml::from_reader(BufReader::new(file))?)
    }

    pub fn from_yaml(text: &str) -> Result<Self, Error> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn with_max_width(mut self, max_width: usize) -> Self {
        self.max_width = max_width;
        self
    }

    /// Zero-padded uppercase hex, as shown in the address column.
    pub fn format_address(&self, addr: u32) -> String {
        format!("{:0width$X}", addr, width = self.address_width)
    }

    pub fn anchor_id(&self, addr: u32) -> String {
        format!("{}{}", self.anchor_prefix, self.format_address(addr))
    }

    pub fn term_href(&self, slug: &str) -> String {
        format!("{}#{}{}", self.glossary_page, self.term_prefix, slug)
    }
}
