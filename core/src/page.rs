//! Wire format of a resolved page.
//!
//! Maps are ordered so that serializing the same inputs twice yields the same
//! bytes. Empty metadata blocks are left out of the JSON.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollMetadata {
    pub page_name: String,
    pub previous_page: Option<u32>,
    pub next_page: Option<u32>,
    pub current_page: u32,
}

impl ScrollMetadata {
    pub fn new(page_name: impl Into<String>, current_page: u32, has_more: bool) -> Self {
        Self {
            page_name: page_name.into(),
            previous_page: (current_page > 1).then(|| current_page - 1),
            next_page: current_page.checked_add(1).filter(|_| has_more),
            current_page,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnceMetadata {
    pub prop: String,
    /// Milliseconds since the Unix epoch.
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPage {
    pub component: String,
    pub props: Map<String, Value>,
    pub url: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypt_history: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clear_history: Option<bool>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub deferred_props: BTreeMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub merge_props: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prepend_props: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deep_merge_props: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub match_props_on: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub scroll_props: BTreeMap<String, ScrollMetadata>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub once_props: BTreeMap<String, OnceMetadata>,
}

impl ResolvedPage {
    pub fn new(component: impl Into<String>, url: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            props: Map::new(),
            url: url.into(),
            version: version.into(),
            encrypt_history: None,
            clear_history: None,
            deferred_props: BTreeMap::new(),
            merge_props: Vec::new(),
            prepend_props: Vec::new(),
            deep_merge_props: Vec::new(),
            match_props_on: Vec::new(),
            scroll_props: BTreeMap::new(),
            once_props: BTreeMap::new(),
        }
    }

    pub fn prop(&self, name: &str) -> Option<&Value> {
        self.props.get(name)
    }

    /// Names of every prop listed under a deferred group.
    pub fn deferred_names(&self) -> impl Iterator<Item = &str> {
        self.deferred_props.values().flatten().map(String::as_str)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
