// SPDX: CC0-1.0

//! Append-only JSON log of completed operations.
//!
//! The file holds a single array and is rewritten in full on every append.

use chrono::{DateTime, Local};
use core::fmt;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpKind {
    Evaluate,
    Derivative,
    Integral,
    Limit,
    Taylor,
    Solve,
    Simplify,
}

impl OpKind {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Evaluate => "evaluate",
            Self::Derivative => "derivative",
            Self::Integral => "integral",
            Self::Limit => "limit",
            Self::Taylor => "taylor",
            Self::Solve => "solve",
            Self::Simplify => "simplify",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single printed result, or one per solution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Recorded {
    One(String),
    Many(Vec<String>),
}

impl fmt::Display for Recorded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::One(s) => f.write_str(s),
            Self::Many(xs) => write!(f, "[{}]", xs.join(", ")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(rename = "type")]
    pub kind: OpKind,
    pub expr: String,
    pub result: Recorded,
    /// Operation parameters such as `point`, `x0` or `n`.
    #[serde(flatten)]
    pub params: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Local>>,
}

#[derive(Debug, Error)]
pub enum HistoryErr {
    #[error("failed to access history file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("history file {path} is not a JSON list of entries, refusing to overwrite it")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode history")]
    Encode(#[from] serde_json::Error),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct History {
    path: PathBuf,
}

impl History {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Vec<Entry>, HistoryErr> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(HistoryErr::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&text).map_err(|source| HistoryErr::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// All entries, oldest first. An unreadable log counts as empty.
    pub fn load(&self) -> Vec<Entry> {
        match self.read() {
            Ok(entries) => entries,
            Err(err) => {
                warn!("{err}, treating history as empty");
                Vec::new()
            }
        }
    }

    pub fn append(&self, entry: Entry) -> Result<(), HistoryErr> {
        let mut entries = self.read()?;
        entries.push(entry);
        let text = serde_json::to_string_pretty(&entries)?;
        fs::write(&self.path, text).map_err(|source| HistoryErr::Io {
            path: self.path.clone(),
            source,
        })?;
        info!(
            "appended entry {} to {}",
            entries.len(),
            self.path.display()
        );
        Ok(())
    }
}
