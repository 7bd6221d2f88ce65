use crate::utils::error::{GeneratorError, Result};
use std::path::Path;
use std::time::Duration;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field_name: &str, value: impl Into<String>, reason: impl Into<String>) -> GeneratorError {
    GeneratorError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: value.into(),
        reason: reason.into(),
    }
}

/// A WMS endpoint: http(s) with a host, and not already pointing at some
/// other WMS operation. A `request=GetCapabilities` parameter is tolerated
/// because the fetch appends the same one.
pub fn validate_service_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(invalid(field_name, url_str, "WMS service URL cannot be empty"));
    }

    let url = Url::parse(url_str)
        .map_err(|e| invalid(field_name, url_str, format!("Invalid URL format: {}", e)))?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(invalid(
                field_name,
                url_str,
                format!("Unsupported URL scheme: {} (WMS is served over http or https)", scheme),
            ))
        }
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid(field_name, url_str, "URL has no host"));
    }

    let request = url
        .query_pairs()
        .find(|(key, _)| key.eq_ignore_ascii_case("request"))
        .map(|(_, value)| value.into_owned());
    if let Some(request) = request {
        if !request.eq_ignore_ascii_case("GetCapabilities") {
            return Err(invalid(
                field_name,
                url_str,
                format!(
                    "URL is a {} request; pass the service endpoint instead",
                    request
                ),
            ));
        }
    }

    Ok(())
}

/// The output path as UTF-8 text, which is what `Storage` writes to.
pub fn validate_output_path<'a>(field_name: &str, path: &'a Path) -> Result<&'a str> {
    let text = path.to_str().ok_or_else(|| {
        invalid(
            field_name,
            path.to_string_lossy(),
            "Output path is not valid UTF-8",
        )
    })?;

    if text.is_empty() {
        return Err(invalid(field_name, text, "Output path cannot be empty"));
    }

    if text.contains('\0') {
        return Err(invalid(field_name, text, "Output path contains null bytes"));
    }

    if text.ends_with('/') || text.ends_with(std::path::MAIN_SEPARATOR) {
        return Err(invalid(
            field_name,
            text,
            "Output path names a directory; give a file such as mapproxy.yaml",
        ));
    }

    Ok(text)
}

pub fn validate_wms_version(field_name: &str, version: &str, supported: &[&str]) -> Result<()> {
    if !supported.contains(&version) {
        return Err(invalid(
            field_name,
            version,
            format!(
                "WMS version {} is not supported; use {}",
                version,
                supported.join(" or ")
            ),
        ));
    }
    Ok(())
}

/// Request timeouts are whole seconds on the command line; anything under
/// `min` would fail every fetch before a server could answer.
pub fn validate_timeout(field_name: &str, timeout: Duration, min: Duration) -> Result<()> {
    if timeout < min {
        return Err(invalid(
            field_name,
            format!("{:?}", timeout),
            format!("Request timeout must be at least {:?}", min),
        ));
    }
    Ok(())
}
