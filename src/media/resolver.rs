//! Stored reference → fetchable URL.
//!
//! Classification order, first match wins:
//!
//! | # | Shape | Result |
//! |---|---|---|
//! | 1 | `None` / empty | `None` |
//! | 2 | ephemeral scheme (`blob:`, `data:`) | unchanged |
//! | 3 | starts with the current API base URL | base stripped → `/path` |
//! | 4 | starts with a legacy origin | origin stripped → `/path` |
//! | 5 | starts with an upload prefix (`/uploads/`) | unchanged |
//! | 6 | `https://` on any other host | unchanged |
//! | 7 | anything else | unchanged |
//!
//! Stripped results always begin with `/`, and only absolute `scheme://`
//! origins are ever stripped, so a resolved string never matches tier 3 or 4
//! again: `resolve(resolve(x)) == resolve(x)`.
//!
//! Tier 4 exists because records written before the API origin changed still
//! carry the old host. The origin list lives in config (`api.legacy_origins`)
//! so the tier can be emptied once that data is migrated.

use super::reference::MediaReference;
use crate::config::MediaConfig;
use std::sync::LazyLock;

/// Development default for the API origin.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";

/// Resolve with the stock reference rules and the given API base URL.
///
/// Never fails: shapes it does not recognize pass through unchanged.
///
/// # Examples
/// ```
/// # use profile_media::media::resolve;
/// let base = "http://localhost:8080";
/// assert_eq!(
///     resolve(Some("http://localhost:8080/uploads/a.png"), base).as_deref(),
///     Some("/uploads/a.png")
/// );
/// assert_eq!(resolve(Some(""), base), None);
/// ```
pub fn resolve(raw: Option<&str>, api_base_url: &str) -> Option<String> {
    let base = normalized_origin(api_base_url);
    STOCK_RESOLVER
        .classify_against(raw, base)
        .map(|r| r.canonical().to_string())
}

/// Stock reference rules, built once. The API base comes from each call.
static STOCK_RESOLVER: LazyLock<MediaResolver> =
    LazyLock::new(|| MediaResolver::from_config(&MediaConfig::default()));

/// Classifies and resolves stored references.
///
/// Holds only configuration; every call is a pure function of its input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaResolver {
    /// Normalized (no trailing `/`); `None` when not an absolute origin.
    api_base_url: Option<String>,
    legacy_origins: Vec<String>,
    upload_prefixes: Vec<String>,
    ephemeral_schemes: Vec<String>,
}

impl MediaResolver {
    pub fn from_config(config: &MediaConfig) -> Self {
        Self {
            api_base_url: normalize_origin(&config.api.base_url),
            legacy_origins: config
                .api
                .legacy_origins
                .iter()
                .filter_map(|o| normalize_origin(o))
                .collect(),
            upload_prefixes: non_empty(&config.references.upload_prefixes),
            ephemeral_schemes: non_empty(&config.references.ephemeral_schemes),
        }
    }

    pub fn with_api_base_url(mut self, api_base_url: &str) -> Self {
        self.api_base_url = normalize_origin(api_base_url);
        self
    }

    pub fn with_legacy_origins(mut self, origins: &[&str]) -> Self {
        self.legacy_origins = origins.iter().filter_map(|o| normalize_origin(o)).collect();
        self
    }

    pub fn api_base_url(&self) -> Option<&str> {
        self.api_base_url.as_deref()
    }

    /// Work out which shape `raw` has. `None` for a missing or empty reference.
    pub fn classify<'a>(&self, raw: Option<&'a str>) -> Option<MediaReference<'a>> {
        self.classify_against(raw, self.api_base_url.as_deref())
    }

    fn classify_against<'a>(
        &self,
        raw: Option<&'a str>,
        api_base_url: Option<&str>,
    ) -> Option<MediaReference<'a>> {
        let raw = raw.filter(|r| !r.is_empty())?;

        let reference = if self.ephemeral_schemes.iter().any(|s| raw.starts_with(s.as_str())) {
            MediaReference::Ephemeral(raw)
        } else if let Some(reference) = api_base_url
            .into_iter()
            .chain(self.legacy_origins.iter().map(String::as_str))
            .find_map(|origin| strip_origin(raw, origin))
        {
            reference
        } else if self.upload_prefixes.iter().any(|p| raw.starts_with(p.as_str())) {
            MediaReference::LegacyRelativePath(raw)
        } else if is_secure_url(raw) {
            MediaReference::DirectAbsolute(raw)
        } else {
            MediaReference::Unrecognized(raw)
        };

        log::trace!("media reference {raw:?} classified as {}", reference.kind());
        Some(reference)
    }

    /// The canonical fetchable URL for `raw`, or `None` if there is none.
    pub fn resolve(&self, raw: Option<&str>) -> Option<String> {
        self.classify(raw).map(|r| r.canonical().to_string())
    }
}

/// Split `raw` into origin and path if it lies under `origin`.
///
/// The match must end at a path boundary: `http://host:80801/x` is not under
/// `http://host:8080`.
fn strip_origin<'a>(raw: &'a str, origin: &str) -> Option<MediaReference<'a>> {
    let path = raw.strip_prefix(origin)?;
    if !path.is_empty() && !path.starts_with('/') {
        return None;
    }
    // `//host/x` would be scheme-relative; keep a single leading slash.
    let extra = path.len() - path.trim_start_matches('/').len();
    let path = if extra > 1 { &path[extra - 1..] } else { path };
    Some(MediaReference::LegacyAbsolute {
        origin: &raw[..origin.len()],
        path,
    })
}

/// Trim a trailing `/` and reject anything that is not `scheme://host...`.
fn normalized_origin(origin: &str) -> Option<&str> {
    let trimmed = origin.trim().trim_end_matches('/');
    is_absolute_origin(trimmed).then_some(trimmed)
}

fn normalize_origin(origin: &str) -> Option<String> {
    normalized_origin(origin).map(str::to_string)
}

/// `scheme://` followed by at least one character.
pub(crate) fn is_absolute_origin(s: &str) -> bool {
    match s.find("://") {
        Some(idx) => {
            idx > 0
                && s[..idx]
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
                && s.len() > idx + 3
        }
        None => false,
    }
}

fn is_secure_url(raw: &str) -> bool {
    raw.get(..8)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("https://"))
        && raw.len() > 8
}

fn non_empty(values: &[String]) -> Vec<String> {
    values.iter().filter(|v| !v.is_empty()).cloned().collect()
}
