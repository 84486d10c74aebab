use std::fmt;

use serde_json::Value;

use crate::ExtractError;

/// Identity of a watched object: namespace plus name.
///
/// Cluster-scoped objects use an empty namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey {
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Reads `metadata.namespace` and `metadata.name` from a raw object body.
    pub fn from_body(body: &Value) -> Result<Self, ExtractError> {
        let metadata = body
            .get("metadata")
            .ok_or(ExtractError::MissingField("metadata"))?;
        let name = metadata
            .get("name")
            .ok_or(ExtractError::MissingField("metadata.name"))?
            .as_str()
            .ok_or(ExtractError::WrongType {
                field: "metadata.name",
                expected: "string",
            })?;
        let namespace = match metadata.get("namespace") {
            None | Some(Value::Null) => "",
            Some(v) => v.as_str().ok_or(ExtractError::WrongType {
                field: "metadata.namespace",
                expected: "string",
            })?,
        };
        Ok(Self::new(namespace, name))
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}/{}", self.namespace, self.name)
        }
    }
}

/// A gateway status object as observed from the watch source.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayObject {
    pub key: ObjectKey,
    pub body: Value,
}

impl GatewayObject {
    pub fn new(
        key: ObjectKey,
        body: Value,
    ) -> Self {
        Self { key, body }
    }

    /// Builds an object from a raw body, taking its identity from `metadata`.
    pub fn from_body(body: Value) -> Result<Self, ExtractError> {
        let key = ObjectKey::from_body(&body)?;
        Ok(Self { key, body })
    }

    pub fn key(&self) -> &ObjectKey {
        &self.key
    }
}
