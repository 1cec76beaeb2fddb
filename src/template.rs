//! Placeholder substitution for the preseed / kickstart templates.
//!
//! Placeholders look like `{{ .Hostname }}`; the leading dot and the inner
//! whitespace are optional, so `{{Hostname}}` works too.

use std::net::Ipv4Addr;
use std::path::Path;

use crate::error::LabError;

/// Values substituted into an install-config template.
#[derive(Debug, Clone)]
pub struct InstallVars<'a> {
    pub hostname: &'a str,
    pub domain: &'a str,
    pub address: Ipv4Addr,
    pub netmask: Ipv4Addr,
    pub gateway: Ipv4Addr,
    pub public_key: &'a str,
}

impl InstallVars<'_> {
    fn lookup(&self, key: &str) -> Option<String> {
        Some(match key {
            "Hostname" => self.hostname.to_string(),
            "Domain" => self.domain.to_string(),
            "Address" => self.address.to_string(),
            "Netmask" => self.netmask.to_string(),
            "Gateway" => self.gateway.to_string(),
            "AnsibleKey" => self.public_key.to_string(),
            _ => return None,
        })
    }
}

/// Substitute every placeholder in `template`. `origin` names the template in errors.
pub fn render(template: &str, vars: &InstallVars, origin: &str) -> Result<String, LabError> {
    let err = |message: String| LabError::Template {
        path: origin.to_string(),
        message,
    };

    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        let close = after.find("}}").ok_or_else(|| {
            err(format!(
                "unterminated '{{{{' at byte {}",
                template.len() - rest.len() + open
            ))
        })?;
        let key = after[..close].trim();
        let key = key.strip_prefix('.').unwrap_or(key);
        let value = vars
            .lookup(key)
            .ok_or_else(|| err(format!("unknown placeholder '{key}'")))?;
        out.push_str(&value);
        rest = &after[close + 2..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Read `template_path`, render it and write the result to `out_path`.
pub fn render_file(
    template_path: &Path,
    out_path: &Path,
    vars: &InstallVars,
) -> Result<(), LabError> {
    let template = std::fs::read_to_string(template_path).map_err(|e| LabError::Io {
        context: format!("reading template {}", template_path.display()),
        source: e,
    })?;
    let rendered = render(&template, vars, &template_path.display().to_string())?;
    std::fs::write(out_path, rendered).map_err(|e| LabError::Io {
        context: format!("writing {}", out_path.display()),
        source: e,
    })?;
    tracing::debug!(path = %out_path.display(), "rendered install config");
    Ok(())
}
