//! The tagged description string stored on every managed domain.
//!
//! Format: `<tag>:<ipv4>:<group>,<group>,...`. The tag marks the domain as
//! ours; listings ignore anything without it. There is no version field, so
//! the format must stay stable for domains created by older builds.

use std::net::Ipv4Addr;

use crate::error::LabError;
use crate::inventory::META_KEY;

/// Tag written by this tool.
pub const TAG: &str = "labcli";

/// Address and groups carried by a description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Description {
    /// `None` when the stored address segment is not an IPv4 literal.
    pub address: Option<Ipv4Addr>,
    pub groups: Vec<String>,
}

pub trait DescriptionCodec {
    fn encode(&self, address: Ipv4Addr, groups: &[String]) -> String;
    fn decode(&self, description: &str) -> Result<Description, LabError>;
    fn is_managed(&self, description: &str) -> bool;
}

/// Colon-delimited codec keyed on a fixed tag.
#[derive(Debug, Clone, Copy)]
pub struct TagCodec {
    tag: &'static str,
}

impl TagCodec {
    pub const fn new(tag: &'static str) -> Self {
        Self { tag }
    }
}

impl Default for TagCodec {
    fn default() -> Self {
        Self::new(TAG)
    }
}

impl DescriptionCodec for TagCodec {
    fn encode(&self, address: Ipv4Addr, groups: &[String]) -> String {
        format!("{}:{}:{}", self.tag, address, groups.join(","))
    }

    fn decode(&self, description: &str) -> Result<Description, LabError> {
        let parse_err = |message: String| LabError::DescriptionParse {
            description: description.to_string(),
            message,
        };

        let segments: Vec<&str> = description.split(':').collect();
        let [tag, address, groups] = segments.as_slice() else {
            return Err(parse_err(format!(
                "expected 3 ':'-separated segments, found {}",
                segments.len()
            )));
        };

        if *tag != self.tag {
            return Err(parse_err(format!("tag '{tag}' is not '{}'", self.tag)));
        }

        let address = address.parse::<Ipv4Addr>().ok();
        if address.is_none() {
            tracing::warn!(description, "description carries an invalid IPv4 address");
        }

        let groups = if groups.is_empty() {
            Vec::new()
        } else {
            groups.split(',').map(str::to_string).collect()
        };

        Ok(Description { address, groups })
    }

    fn is_managed(&self, description: &str) -> bool {
        description
            .strip_prefix(self.tag)
            .is_some_and(|rest| rest.starts_with(':'))
    }
}

/// Check a group label before it is written into a description.
pub fn validate_group(group: &str) -> Result<(), LabError> {
    if group.is_empty() {
        return Err(LabError::Validation {
            message: "group names must not be empty".into(),
        });
    }
    if group.chars().any(|c| c == ':' || c == ',' || c.is_whitespace()) {
        return Err(LabError::Validation {
            message: format!("group '{group}' must not contain ':', ',' or whitespace"),
        });
    }
    if group == META_KEY {
        return Err(LabError::Validation {
            message: format!("group name '{META_KEY}' is reserved by the Ansible inventory"),
        });
    }
    Ok(())
}
