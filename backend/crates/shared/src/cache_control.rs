//! Cache-Control directive understood by the data-access layer.

/// Header value that forces a read to bypass the cache.
pub const MUST_REVALIDATE: &str = "must-revalidate";

/// How a read treats the cache.
///
/// ## Examples
/// ```rust
/// use kernel::cache_control::CacheDirective;
///
/// assert_eq!(CacheDirective::parse(Some("no-cache, Must-Revalidate")), CacheDirective::MustRevalidate);
/// assert_eq!(CacheDirective::parse(None), CacheDirective::Default);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CacheDirective {
    /// Cache-aside: serve hits, fill on miss.
    #[default]
    Default,
    /// Read the store, then refresh the cache entry.
    MustRevalidate,
}

impl CacheDirective {
    /// Parse a `Cache-Control` header value. Any value without a
    /// `must-revalidate` token (including no header) is [`CacheDirective::Default`].
    pub fn parse(header: Option<&str>) -> Self {
        let forced = header
            .map(|value| {
                value
                    .split(',')
                    .any(|token| token.trim().eq_ignore_ascii_case(MUST_REVALIDATE))
            })
            .unwrap_or(false);

        if forced {
            Self::MustRevalidate
        } else {
            Self::Default
        }
    }

    pub fn is_must_revalidate(&self) -> bool {
        matches!(self, Self::MustRevalidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(
            CacheDirective::parse(Some("must-revalidate")),
            CacheDirective::MustRevalidate
        );
        assert_eq!(
            CacheDirective::parse(Some("max-age=0,must-revalidate")),
            CacheDirective::MustRevalidate
        );
        assert_eq!(CacheDirective::parse(Some("no-store")), CacheDirective::Default);
        assert_eq!(CacheDirective::parse(Some("")), CacheDirective::Default);
        assert_eq!(CacheDirective::parse(None), CacheDirective::Default);
    }
}
