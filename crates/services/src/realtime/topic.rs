use std::fmt;
use std::str::FromStr;

use bson::oid::ObjectId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// A broadcast stream name. Namespaces never overlap: a channel id and a user id
/// with the same hex value are different topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// `channel:<id>`
    Channel(ObjectId),
    /// `user:<id>`, the personal notification stream
    User(ObjectId),
    /// `global`, status broadcasts
    Global,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TopicParseError {
    #[error("unknown topic namespace: {0}")]
    UnknownNamespace(String),
    #[error("invalid id in topic: {0}")]
    InvalidId(String),
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topic::Channel(id) => write!(f, "channel:{}", id.to_hex()),
            Topic::User(id) => write!(f, "user:{}", id.to_hex()),
            Topic::Global => f.write_str("global"),
        }
    }
}

impl FromStr for Topic {
    type Err = TopicParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "global" {
            return Ok(Topic::Global);
        }
        let (namespace, id) = s
            .split_once(':')
            .ok_or_else(|| TopicParseError::UnknownNamespace(s.to_string()))?;
        let parse = |id: &str| {
            ObjectId::parse_str(id).map_err(|_| TopicParseError::InvalidId(id.to_string()))
        };
        match namespace {
            "channel" => Ok(Topic::Channel(parse(id)?)),
            "user" => Ok(Topic::User(parse(id)?)),
            other => Err(TopicParseError::UnknownNamespace(other.to_string())),
        }
    }
}

impl Serialize for Topic {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Topic {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
