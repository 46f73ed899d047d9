//! Shared types for the media-bearing parts of API responses.
//!
//! The backend returns stored references as plain strings. These structs pick
//! out just the media fields of profile and post payloads (other fields are
//! ignored) so callers can resolve every reference in one place.

use crate::media::MediaResolver;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Which media field a crop is for. Each has its own aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaTarget {
    Avatar,
    Banner,
    Post,
}

impl fmt::Display for MediaTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MediaTarget::Avatar => "avatar",
            MediaTarget::Banner => "banner",
            MediaTarget::Post => "post",
        };
        f.write_str(name)
    }
}

impl FromStr for MediaTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "avatar" => Ok(MediaTarget::Avatar),
            "banner" => Ok(MediaTarget::Banner),
            "post" => Ok(MediaTarget::Post),
            other => Err(format!(
                "unknown media target '{other}' (expected avatar, banner or post)"
            )),
        }
    }
}

/// Media fields of a profile response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileMedia {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,
}

impl ProfileMedia {
    /// Copy with every reference resolved to its fetchable form.
    pub fn resolved(&self, resolver: &MediaResolver) -> ProfileMedia {
        ProfileMedia {
            avatar: resolver.resolve(self.avatar.as_deref()),
            banner: resolver.resolve(self.banner.as_deref()),
        }
    }
}

/// Media fields of a post response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostMedia {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Author avatar embedded in the post payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_avatar: Option<String>,
}

impl PostMedia {
    pub fn resolved(&self, resolver: &MediaResolver) -> PostMedia {
        PostMedia {
            image: resolver.resolve(self.image.as_deref()),
            author_avatar: resolver.resolve(self.author_avatar.as_deref()),
        }
    }
}

/// JSON keys whose string values are stored media references.
pub const MEDIA_FIELDS: &[&str] = &["avatar", "banner", "image", "authorAvatar"];

/// Resolve every media field anywhere inside an arbitrary API response.
///
/// Walks objects and arrays, rewriting [`MEDIA_FIELDS`] string values in place.
/// Empty references become `null`. Returns how many values changed.
pub fn resolve_media_fields(value: &mut Value, resolver: &MediaResolver) -> usize {
    match value {
        Value::Object(map) => {
            let mut changed = 0;
            for (key, field) in map.iter_mut() {
                if let (true, Value::String(raw)) = (MEDIA_FIELDS.contains(&key.as_str()), &*field) {
                    let resolved = match resolver.resolve(Some(raw)) {
                        Some(url) => Value::String(url),
                        None => Value::Null,
                    };
                    if resolved != *field {
                        *field = resolved;
                        changed += 1;
                    }
                } else {
                    changed += resolve_media_fields(field, resolver);
                }
            }
            changed
        }
        Value::Array(items) => items
            .iter_mut()
            .map(|item| resolve_media_fields(item, resolver))
            .sum(),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MediaConfig;

    fn resolver() -> MediaResolver {
        MediaResolver::from_config(&MediaConfig::default())
    }

    #[test]
    fn media_target_parses_and_displays() {
        for target in [MediaTarget::Avatar, MediaTarget::Banner, MediaTarget::Post] {
            assert_eq!(target.to_string().parse::<MediaTarget>(), Ok(target));
        }
        assert_eq!("Avatar".parse::<MediaTarget>(), Ok(MediaTarget::Avatar));
        assert!("cover".parse::<MediaTarget>().is_err());
    }

    #[test]
    fn profile_media_ignores_unrelated_fields() {
        let json = r#"{
            "id": 42,
            "displayName": "Ada",
            "avatar": "http://localhost:8080/uploads/ada.png",
            "banner": null
        }"#;
        let media: ProfileMedia = serde_json::from_str(json).unwrap();
        assert_eq!(
            media.avatar.as_deref(),
            Some("http://localhost:8080/uploads/ada.png")
        );
        assert_eq!(media.banner, None);
    }

    #[test]
    fn profile_media_resolves_every_field() {
        let media = ProfileMedia {
            avatar: Some("http://localhost:8080/uploads/ada.png".into()),
            banner: Some("https://cdn.example.com/banners/ada.jpg".into()),
        };
        let resolved = media.resolved(&resolver());
        assert_eq!(resolved.avatar.as_deref(), Some("/uploads/ada.png"));
        assert_eq!(
            resolved.banner.as_deref(),
            Some("https://cdn.example.com/banners/ada.jpg")
        );
    }

    #[test]
    fn post_media_empty_fields_stay_none() {
        let json = r#"{"image": "", "authorAvatar": "/uploads/u1.png"}"#;
        let post: PostMedia = serde_json::from_str(json).unwrap();
        let resolved = post.resolved(&resolver());
        assert_eq!(resolved.image, None);
        assert_eq!(resolved.author_avatar.as_deref(), Some("/uploads/u1.png"));
    }

    #[test]
    fn resolve_media_fields_walks_nested_payloads() {
        let mut value: Value = serde_json::from_str(
            r#"{
                "posts": [
                    {
                        "id": 1,
                        "image": "http://localhost:8080/uploads/p1.jpg",
                        "author": { "name": "Ada", "avatar": "/uploads/ada.png" }
                    },
                    { "id": 2, "image": "", "authorAvatar": "http://localhost:8080/uploads/bo.png" }
                ],
                "title": "http://localhost:8080/uploads/not-media.png"
            }"#,
        )
        .unwrap();

        let changed = resolve_media_fields(&mut value, &resolver());
        assert_eq!(changed, 3);
        assert_eq!(value["posts"][0]["image"], "/uploads/p1.jpg");
        assert_eq!(value["posts"][0]["author"]["avatar"], "/uploads/ada.png");
        assert_eq!(value["posts"][1]["image"], Value::Null);
        assert_eq!(value["posts"][1]["authorAvatar"], "/uploads/bo.png");
        // Only media keys are touched
        assert_eq!(value["title"], "http://localhost:8080/uploads/not-media.png");
    }
}
