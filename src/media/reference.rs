//! The shapes a stored media reference can take.
//!
//! Over the application's lifetime media moved from local disk, to a proxied
//! upload path, to external object storage. Old records kept whatever form
//! they were written in, so one string field can hold any of these.

use std::fmt;

/// A stored reference, classified. Borrows from the raw string; built fresh on
/// every resolution and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaReference<'a> {
    /// Local-session preview (`blob:` / `data:`), not yet durable. The caller
    /// owns releasing it.
    Ephemeral(&'a str),
    /// Absolute URL under the current API base or a legacy origin. Served
    /// through the same-origin proxy as `path`.
    LegacyAbsolute { origin: &'a str, path: &'a str },
    /// Upload path already in proxied form.
    LegacyRelativePath(&'a str),
    /// `https://` URL on object storage or a third-party host.
    DirectAbsolute(&'a str),
    /// Matches no known shape; passed through untouched.
    Unrecognized(&'a str),
}

impl<'a> MediaReference<'a> {
    /// The single fetchable form of this reference.
    pub fn canonical(&self) -> &'a str {
        match *self {
            MediaReference::LegacyAbsolute { path: "", .. } => "/",
            MediaReference::LegacyAbsolute { path, .. } => path,
            MediaReference::Ephemeral(raw)
            | MediaReference::LegacyRelativePath(raw)
            | MediaReference::DirectAbsolute(raw)
            | MediaReference::Unrecognized(raw) => raw,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            MediaReference::Ephemeral(_) => "ephemeral",
            MediaReference::LegacyAbsolute { .. } => "legacy-absolute",
            MediaReference::LegacyRelativePath(_) => "legacy-relative",
            MediaReference::DirectAbsolute(_) => "direct",
            MediaReference::Unrecognized(_) => "unrecognized",
        }
    }

    /// Whether resolution changes the string.
    pub fn is_rewritten(&self) -> bool {
        matches!(self, MediaReference::LegacyAbsolute { .. })
    }
}

impl fmt::Display for MediaReference<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_absolute_canonical_is_path() {
        let r = MediaReference::LegacyAbsolute {
            origin: "http://localhost:8080",
            path: "/uploads/a.png",
        };
        assert_eq!(r.canonical(), "/uploads/a.png");
        assert!(r.is_rewritten());
    }

    #[test]
    fn legacy_absolute_with_empty_path_is_root() {
        let r = MediaReference::LegacyAbsolute {
            origin: "http://localhost:8080",
            path: "",
        };
        assert_eq!(r.canonical(), "/");
    }

    #[test]
    fn passthrough_variants_keep_raw() {
        let raw = "https://cdn.example.com/x.png";
        for r in [
            MediaReference::Ephemeral(raw),
            MediaReference::LegacyRelativePath(raw),
            MediaReference::DirectAbsolute(raw),
            MediaReference::Unrecognized(raw),
        ] {
            assert_eq!(r.canonical(), raw);
            assert!(!r.is_rewritten());
        }
    }

    #[test]
    fn display_is_canonical() {
        let r = MediaReference::LegacyRelativePath("/uploads/b.jpg");
        assert_eq!(r.to_string(), "/uploads/b.jpg");
        assert_eq!(r.kind(), "legacy-relative");
    }
}
