use std::fmt;

use serde_json::Value;

use super::GatewayObject;
use crate::ExtractError;

/// Role of a gateway instance. Only the active instance is authoritative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HaStatus {
    Active,
    Passive,
    Other(String),
}

impl HaStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "active" => HaStatus::Active,
            "passive" => HaStatus::Passive,
            other => HaStatus::Other(other.to_string()),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, HaStatus::Active)
    }
}

impl fmt::Display for HaStatus {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            HaStatus::Active => f.write_str("active"),
            HaStatus::Passive => f.write_str("passive"),
            HaStatus::Other(s) => f.write_str(s),
        }
    }
}

/// State of the link from the local gateway to one remote cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    Connecting,
    Disconnected,
    Error,
    Other(String),
}

impl ConnectionStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "connected" => ConnectionStatus::Connected,
            "connecting" => ConnectionStatus::Connecting,
            "disconnected" => ConnectionStatus::Disconnected,
            "error" => ConnectionStatus::Error,
            other => ConnectionStatus::Other(other.to_string()),
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected)
    }
}

/// One validated entry of `status.connections`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub status: ConnectionStatus,
    pub cluster_id: String,
}

impl Connection {
    /// Extracts `status` and `endpoint.cluster_id` from one connection entry.
    ///
    /// `endpoint.clusterId` is accepted when `cluster_id` is absent.
    pub fn extract(entry: &Value) -> Result<Self, ExtractError> {
        let status = nested_str(entry, "status", &["status"])?;
        let cluster_id = match nested_str(entry, "endpoint.cluster_id", &["endpoint", "cluster_id"]) {
            Err(ExtractError::MissingField(_)) => {
                nested_str(entry, "endpoint.clusterId", &["endpoint", "clusterId"])
                    .map_err(|_| ExtractError::MissingField("endpoint.cluster_id"))?
            }
            other => other?,
        };
        if cluster_id.is_empty() {
            return Err(ExtractError::MissingField("endpoint.cluster_id"));
        }

        Ok(Self {
            status: ConnectionStatus::parse(status),
            cluster_id: cluster_id.to_string(),
        })
    }
}

/// The consumed part of a gateway object's `status`.
///
/// Connection entries are kept raw so that each one can be validated
/// independently.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayStatus<'a> {
    pub ha_status: HaStatus,
    pub connections: &'a [Value],
}

impl<'a> GatewayStatus<'a> {
    pub fn extract(obj: &'a GatewayObject) -> Result<Self, ExtractError> {
        let ha_status = ha_status(obj)?;
        let connections = status_field(obj)?
            .get("connections")
            .ok_or(ExtractError::MissingField("status.connections"))?
            .as_array()
            .ok_or(ExtractError::WrongType {
                field: "status.connections",
                expected: "array",
            })?;

        Ok(Self {
            ha_status,
            connections: connections.as_slice(),
        })
    }
}

/// Reads only `status.haStatus`, which is all the deletion path needs.
pub fn ha_status(obj: &GatewayObject) -> Result<HaStatus, ExtractError> {
    let raw = status_field(obj)?
        .get("haStatus")
        .ok_or(ExtractError::MissingField("status.haStatus"))?
        .as_str()
        .ok_or(ExtractError::WrongType {
            field: "status.haStatus",
            expected: "string",
        })?;
    Ok(HaStatus::parse(raw))
}

fn status_field(obj: &GatewayObject) -> Result<&Value, ExtractError> {
    let status = obj.body.get("status").ok_or(ExtractError::MissingField("status"))?;
    if !status.is_object() {
        return Err(ExtractError::WrongType {
            field: "status",
            expected: "object",
        });
    }
    Ok(status)
}

fn nested_str<'v>(
    value: &'v Value,
    field: &'static str,
    path: &[&str],
) -> Result<&'v str, ExtractError> {
    let mut current = value;
    for segment in path {
        current = current.get(*segment).ok_or(ExtractError::MissingField(field))?;
    }
    current.as_str().ok_or(ExtractError::WrongType {
        field,
        expected: "string",
    })
}
