//! Domain primitive types used across the fargate-stack workspace.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StackError;

/// Tag map applied to every declared resource. Ordered so rendering is stable.
pub type Tags = BTreeMap<String, String>;

/// Identifier selecting which configuration set applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentName {
    /// Development environment.
    Dev,
    /// Production environment.
    Prod,
}

impl EnvironmentName {
    /// Every recognized environment, in declaration order.
    pub const ALL: [Self; 2] = [Self::Dev, Self::Prod];

    /// Returns the selector string for this environment.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Prod => "prod",
        }
    }

    /// Returns the recognized names joined for error messages.
    #[must_use]
    pub fn available() -> String {
        Self::ALL
            .iter()
            .map(|name| name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for EnvironmentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnvironmentName {
    type Err = StackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| StackError::InvalidEnvironment {
                value: s.to_string(),
                available: Self::available(),
            })
    }
}

/// What happens to a stateful resource when it leaves the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemovalPolicy {
    /// Delete the resource and its data.
    Destroy,
    /// Keep the resource in the account, orphaned from the stack.
    Retain,
    /// Take a final snapshot, then delete.
    Snapshot,
}

impl RemovalPolicy {
    /// Returns `true` if removal loses data.
    #[must_use]
    pub const fn is_destructive(self) -> bool {
        matches!(self, Self::Destroy)
    }

    /// Deletion policy name understood by the provisioning engine.
    #[must_use]
    pub const fn deletion_policy(self) -> &'static str {
        match self {
            Self::Destroy => "Delete",
            Self::Retain => "Retain",
            Self::Snapshot => "Snapshot",
        }
    }
}

impl fmt::Display for RemovalPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Destroy => write!(f, "destroy"),
            Self::Retain => write!(f, "retain"),
            Self::Snapshot => write!(f, "snapshot"),
        }
    }
}

/// Database instance family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceClass {
    /// Burstable, Graviton2 (`t4g`).
    #[serde(rename = "t4g")]
    Burstable4Graviton,
    /// General purpose, Graviton3 (`m7g`).
    M7g,
    /// General purpose, Graviton4 (`m8g`).
    M8g,
    /// Memory optimized, Graviton4 (`r8g`).
    R8g,
}

impl InstanceClass {
    /// Short family identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Burstable4Graviton => "t4g",
            Self::M7g => "m7g",
            Self::M8g => "m8g",
            Self::R8g => "r8g",
        }
    }
}

/// Database instance size within a family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceSize {
    /// `micro`
    Micro,
    /// `small`
    Small,
    /// `medium`
    Medium,
    /// `large`
    Large,
    /// `xlarge`
    Xlarge,
}

impl InstanceSize {
    /// Size identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Micro => "micro",
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
            Self::Xlarge => "xlarge",
        }
    }
}

/// Instance type, e.g. `t4g.micro`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceType {
    /// Instance family.
    pub class: InstanceClass,
    /// Size within the family.
    pub size: InstanceSize,
}

impl InstanceType {
    /// Builds an instance type from a family and a size.
    #[must_use]
    pub const fn of(class: InstanceClass, size: InstanceSize) -> Self {
        Self { class, size }
    }

    /// Instance class name as the database service expects it (`db.` prefix).
    #[must_use]
    pub fn database_class(&self) -> String {
        format!("db.{self}")
    }
}

impl fmt::Display for InstanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.class.as_str(), self.size.as_str())
    }
}
