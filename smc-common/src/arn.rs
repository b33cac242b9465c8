//! Resource identifier (ARN) parsing and hostname encoding.
//!
//! The bridge addresses a space through an encoded hostname token in which
//! `_._` and `__` are structural separators. Because they are structural,
//! any ARN component that itself contains an underscore is rejected rather
//! than passed through.

use crate::errors::{Result, SmcError};
use serde::{Deserialize, Serialize};

/// Fixed prefix of every encoded hostname token.
pub const HOSTNAME_PREFIX: &str = "sm_lc_";

/// Resource type carried by an ARN. The bridge accepts only `Space`; an
/// `App` identifier is convertible input, not a hard error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Space,
    App,
}

/// Parsed `arn:<partition>:sagemaker:<region>:<account>:<type>/<path...>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceIdentifier {
    pub partition: String,
    pub service: String,
    pub region: String,
    pub account: String,
    pub resource_type: ResourceType,
    /// Path segments after the type: `[domain, space, ...]`.
    pub resource_path: Vec<String>,
}

impl ResourceIdentifier {
    pub fn parse(arn: &str) -> Result<Self> {
        let parts: Vec<&str> = arn.splitn(6, ':').collect();
        if parts.len() != 6 || parts[0] != "arn" {
            return Err(SmcError::ConversionFailed {
                detail: format!("expected 6 colon-separated segments, got '{arn}'"),
            });
        }
        if parts[2] != "sagemaker" {
            return Err(SmcError::ConversionFailed {
                detail: format!("unsupported service '{}'", parts[2]),
            });
        }
        let (type_str, path) = match parts[5].split_once('/') {
            Some((t, p)) => (t, p),
            None => {
                return Err(SmcError::ConversionFailed {
                    detail: format!("resource segment '{}' has no path", parts[5]),
                });
            }
        };
        let resource_type = match type_str {
            "space" => ResourceType::Space,
            "app" => ResourceType::App,
            other => {
                return Err(SmcError::ConversionFailed {
                    detail: format!("unsupported resource type '{other}'"),
                });
            }
        };
        let resource_path: Vec<String> = path.split('/').map(str::to_string).collect();
        if resource_path.len() < 2 || resource_path.iter().any(String::is_empty) {
            return Err(SmcError::ConversionFailed {
                detail: format!("resource path '{path}' needs at least domain and space name"),
            });
        }
        Ok(Self {
            partition: parts[1].to_string(),
            service: parts[2].to_string(),
            region: parts[3].to_string(),
            account: parts[4].to_string(),
            resource_type,
            resource_path,
        })
    }

    /// Render back to ARN string form.
    pub fn to_arn(&self) -> String {
        let type_str = match self.resource_type {
            ResourceType::Space => "space",
            ResourceType::App => "app",
        };
        format!(
            "arn:{}:{}:{}:{}:{}/{}",
            self.partition,
            self.service,
            self.region,
            self.account,
            type_str,
            self.resource_path.join("/")
        )
    }
}

/// Convert an app identifier to its owning space identifier.
///
/// App paths carry `[domain, space, appType, appName]`; only the first two
/// segments survive. Space identifiers pass through unchanged, so the
/// operation is idempotent.
pub fn normalize_to_space(id: &ResourceIdentifier) -> ResourceIdentifier {
    match id.resource_type {
        ResourceType::Space => id.clone(),
        ResourceType::App => ResourceIdentifier {
            resource_type: ResourceType::Space,
            resource_path: id.resource_path.iter().take(2).cloned().collect(),
            ..id.clone()
        },
    }
}

/// Encode a resource identifier into the hostname token the bridge expects.
///
/// App identifiers are normalized first, so `encode(app)` always equals
/// `encode(normalize_to_space(app))`.
pub fn encode(id: &ResourceIdentifier) -> Result<String> {
    let id = normalize_to_space(id);
    if id.resource_path.len() < 2 {
        return Err(SmcError::ConversionFailed {
            detail: "resource path needs domain and space name".to_string(),
        });
    }
    for (name, value) in [
        ("partition", &id.partition),
        ("region", &id.region),
        ("account", &id.account),
        ("domain", &id.resource_path[0]),
        ("space name", &id.resource_path[1]),
    ] {
        if value.contains('_') {
            return Err(SmcError::ConversionFailed {
                detail: format!("{name} '{value}' contains '_', a structural separator"),
            });
        }
    }
    Ok(format!(
        "{}arn_._{}_._{}_._{}._{}_._space__{}__{}",
        HOSTNAME_PREFIX,
        id.partition,
        id.service,
        id.region,
        id.account,
        id.resource_path[0],
        id.resource_path[1],
    ))
}

/// Rewrite an encoded hostname token that still refers to an app so it
/// refers to the owning space. Pure textual transform on the structural
/// separators; space tokens pass through unchanged.
pub fn space_token_from(hostname: &str) -> String {
    let Some((head, tail)) = hostname.split_once("_._app__") else {
        return hostname.to_string();
    };
    let segments: Vec<&str> = tail.split("__").collect();
    if segments.len() < 2 {
        return hostname.to_string();
    }
    format!("{head}_._space__{}__{}", segments[0], segments[1])
}

/// True when a hostname token encodes an app rather than a space.
pub fn is_app_token(hostname: &str) -> bool {
    hostname.contains("_._app__")
}
