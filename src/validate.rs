//! Per-tool contract enforcement.
//!
//! All checks run before any backend I/O and fail closed: a violation aborts
//! the call with zero backend side effects. Required-field presence and type
//! conformance are already enforced by serde when tool parameters are
//! deserialized; the checks here cover the domain constraints serde cannot
//! express.

use crate::config::PolicyConfig;
use crate::error::GatewayError;

/// Hard cap on records per bulk-write call.
pub const MAX_BATCH_SIZE: usize = 500;

/// Reject oversized bulk-write batches.
pub fn check_batch(kind: &'static str, len: usize) -> Result<(), GatewayError> {
    if len > MAX_BATCH_SIZE {
        return Err(GatewayError::BatchTooLarge {
            kind,
            len,
            max: MAX_BATCH_SIZE,
        });
    }
    Ok(())
}

/// Resolve and bound pagination arguments.
///
/// Returns `(limit, offset)` with defaults applied. `offset` is unsigned by
/// type, so only the limit range needs checking.
pub fn check_page(
    policy: &PolicyConfig,
    limit: Option<u32>,
    offset: Option<u32>,
) -> Result<(u32, u32), GatewayError> {
    let limit = limit.unwrap_or(policy.default_page_size);
    if limit == 0 || limit > policy.max_page_size {
        return Err(GatewayError::PageSizeOutOfRange {
            got: limit,
            max: policy.max_page_size,
        });
    }
    Ok((limit, offset.unwrap_or(0)))
}

/// Resolve and bound a traversal depth.
///
/// Out-of-range depth is rejected rather than clamped, so the caller learns
/// the contract instead of silently getting a shallower walk.
pub fn check_depth(policy: &PolicyConfig, depth: Option<u32>) -> Result<u32, GatewayError> {
    let depth = depth.unwrap_or(policy.default_traversal_depth);
    if depth == 0 || depth > policy.max_traversal_depth {
        return Err(GatewayError::DepthOutOfRange {
            got: depth,
            max: policy.max_traversal_depth,
        });
    }
    Ok(depth)
}

/// Bound ingestion text length.
pub fn check_text_content(policy: &PolicyConfig, text: &str) -> Result<(), GatewayError> {
    let len = text.chars().count();
    if text.trim().chars().count() < policy.min_content_chars {
        return Err(GatewayError::ContentTooShort {
            min: policy.min_content_chars,
        });
    }
    if len > policy.max_content_chars {
        return Err(GatewayError::ContentTooLarge {
            len,
            max: policy.max_content_chars,
        });
    }
    Ok(())
}

/// Validate a URL for the fetch tool: parseable, http(s) only.
pub fn check_url(raw: &str) -> Result<reqwest::Url, GatewayError> {
    let url = reqwest::Url::parse(raw)
        .map_err(|e| GatewayError::Validation(format!("invalid URL: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(GatewayError::Validation(format!(
            "unsupported URL scheme '{other}' - only http and https are allowed"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> PolicyConfig {
        PolicyConfig::default()
    }

    #[test]
    fn test_batch_at_limit() {
        assert!(check_batch("entities", 500).is_ok());
        assert!(check_batch("entities", 0).is_ok());
    }

    #[test]
    fn test_batch_over_limit() {
        let err = check_batch("entities", 501).unwrap_err();
        assert!(matches!(
            err,
            GatewayError::BatchTooLarge {
                kind: "entities",
                len: 501,
                max: 500
            }
        ));
    }

    #[test]
    fn test_page_defaults() {
        let (limit, offset) = check_page(&policy(), None, None).unwrap();
        assert_eq!((limit, offset), (50, 0));
    }

    #[test]
    fn test_page_bounds() {
        assert!(check_page(&policy(), Some(500), Some(100)).is_ok());
        assert!(matches!(
            check_page(&policy(), Some(0), None),
            Err(GatewayError::PageSizeOutOfRange { got: 0, .. })
        ));
        assert!(matches!(
            check_page(&policy(), Some(501), None),
            Err(GatewayError::PageSizeOutOfRange { got: 501, .. })
        ));
    }

    #[test]
    fn test_depth_defaults_and_bounds() {
        assert_eq!(check_depth(&policy(), None).unwrap(), 3);
        assert_eq!(check_depth(&policy(), Some(5)).unwrap(), 5);
        assert!(matches!(
            check_depth(&policy(), Some(6)),
            Err(GatewayError::DepthOutOfRange { got: 6, max: 5 })
        ));
        assert!(matches!(
            check_depth(&policy(), Some(0)),
            Err(GatewayError::DepthOutOfRange { got: 0, .. })
        ));
    }

    #[test]
    fn test_text_content_bounds() {
        let policy = policy();
        assert!(check_text_content(&policy, &"a".repeat(50)).is_ok());
        assert!(matches!(
            check_text_content(&policy, "too short"),
            Err(GatewayError::ContentTooShort { min: 50 })
        ));
        // Whitespace padding does not count toward the minimum.
        let padded = format!("{}{}", " ".repeat(100), "abc");
        assert!(matches!(
            check_text_content(&policy, &padded),
            Err(GatewayError::ContentTooShort { .. })
        ));
    }

    #[test]
    fn test_text_content_too_large() {
        let mut policy = policy();
        policy.max_content_chars = 100;
        let err = check_text_content(&policy, &"a".repeat(101)).unwrap_err();
        assert!(matches!(
            err,
            GatewayError::ContentTooLarge { len: 101, max: 100 }
        ));
    }

    #[test]
    fn test_url_schemes() {
        assert!(check_url("https://example.com/article").is_ok());
        assert!(check_url("http://example.com").is_ok());
        assert!(check_url("ftp://example.com").is_err());
        assert!(check_url("file:///etc/passwd").is_err());
        assert!(check_url("not a url").is_err());
    }
}
