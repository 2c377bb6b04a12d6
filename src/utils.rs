//! Utility functions

use chrono::Utc;

/// Lowercase site slug: anything outside `[a-z0-9-]` becomes `-`
pub fn sanitize_site_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// Project/service slug: anything outside `[a-zA-Z0-9-]` becomes `-`
pub fn sanitize_service_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
        .collect()
}

/// Append a Unix-timestamp suffix, used when a name turns out to be taken
pub fn timestamped(name: &str) -> String {
    format!("{}-{}", name, Utc::now().timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_site_name() {
        assert_eq!(sanitize_site_name("My App!!"), "my-app--");
        assert_eq!(sanitize_site_name("already-fine-42"), "already-fine-42");
        assert_eq!(sanitize_site_name("Ünïcode"), "-n-code");
    }

    #[test]
    fn test_sanitize_service_name() {
        assert_eq!(sanitize_service_name("My App"), "My-App");
        assert_eq!(sanitize_service_name("api_v2"), "api-v2");
    }

    #[test]
    fn test_timestamped_appends_suffix() {
        let name = timestamped("my-app");
        assert!(name.starts_with("my-app-"));
        assert!(name.len() > "my-app-".len());
    }
}
