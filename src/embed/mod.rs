//! Third-party video embed sanitizing.
//!
//! Editors paste provider embed snippets (`<iframe ...>` plus whatever markup
//! the provider wraps around it). Only the first iframe tag is looked at, and
//! only a fixed set of its attributes survives, each re-validated. The
//! result is a [`VideoEmbed`] descriptor a renderer can turn back into an
//! iframe; the pasted markup itself is never re-emitted.

pub mod attrs;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::OnceLock;
use strum::{Display, EnumString};
use url::Url;

use attrs::collect_attributes;

/// Video hosting provider.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Provider {
    Youtube,
    Vimeo,
    #[default]
    Other,
}

impl Provider {
    /// Classify an embed URL by host suffix.
    pub fn detect(src: &str) -> Self {
        let Ok(url) = Url::parse(src) else {
            return Provider::Other;
        };
        let host = url.host_str().unwrap_or_default().to_ascii_lowercase();

        if ["youtube.com", "youtube-nocookie.com", "youtu.be"]
            .iter()
            .any(|suffix| host.ends_with(suffix))
        {
            Provider::Youtube
        } else if ["vimeo.com", "player.vimeo.com"]
            .iter()
            .any(|suffix| host.ends_with(suffix))
        {
            Provider::Vimeo
        } else {
            Provider::Other
        }
    }
}

/// Supported player aspect ratios.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "16:9")]
    #[strum(serialize = "16:9")]
    Widescreen,
    #[serde(rename = "4:3")]
    #[strum(serialize = "4:3")]
    Standard,
    #[serde(rename = "1:1")]
    #[strum(serialize = "1:1")]
    Square,
    #[serde(rename = "9:16")]
    #[strum(serialize = "9:16")]
    Portrait,
}

impl AspectRatio {
    /// Parse one of the presets; anything else, or nothing, is 16:9.
    pub fn parse_or_default(value: Option<&str>) -> Self {
        value
            .and_then(|v| AspectRatio::from_str(v).ok())
            .unwrap_or_default()
    }
}

/// W3C referrer policy tokens accepted on an embed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ReferrerPolicy {
    NoReferrer,
    NoReferrerWhenDowngrade,
    Origin,
    OriginWhenCrossOrigin,
    SameOrigin,
    StrictOrigin,
    StrictOriginWhenCrossOrigin,
    UnsafeUrl,
}

/// Iframe loading strategy.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Loading {
    #[default]
    Lazy,
    Eager,
}

/// The iframe attributes that survive sanitizing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IframeAttributes {
    /// Always an `https` URL.
    pub src: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer_policy: Option<ReferrerPolicy>,
    pub loading: Loading,
    pub allow_full_screen: bool,
}

/// Sanitized embed descriptor, safe to hand to a renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoEmbed {
    pub provider: Provider,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub aspect_ratio: AspectRatio,
    pub iframe: IframeAttributes,
}

/// Values an editor declared alongside the pasted snippet. They take
/// precedence over what is parsed from the markup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedDeclaration {
    #[serde(default)]
    pub provider: Option<Provider>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub aspect_ratio: Option<String>,
}

/// Attributes parsed from the first iframe tag, before provider and
/// declaration resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedIframe {
    pub src: String,
    pub allow: Option<String>,
    pub title: Option<String>,
    pub referrer_policy: Option<ReferrerPolicy>,
    pub loading: Option<Loading>,
    pub allow_full_screen: bool,
}

/// Validate an iframe `src`, upgrading `http` to `https`.
///
/// Protocol-relative URLs are read as `https`. Anything that does not parse,
/// or uses a scheme other than http(s), is rejected.
pub fn normalize_src(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let candidate = if trimmed.starts_with("//") {
        format!("https:{}", trimmed)
    } else {
        trimmed.to_string()
    };

    let mut url = match Url::parse(&candidate) {
        Ok(url) => url,
        Err(e) => {
            tracing::debug!(src = %candidate, error = %e, "embed src does not parse");
            return None;
        }
    };

    match url.scheme() {
        "https" => {}
        "http" => {
            url.set_scheme("https").ok()?;
        }
        other => {
            tracing::debug!(scheme = other, "embed src uses a disallowed scheme");
            return None;
        }
    }

    Some(url.to_string())
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Parse the first `<iframe>` open tag in `html`.
pub fn parse_iframe(html: &str) -> Option<ParsedIframe> {
    static IFRAME_TAG: OnceLock<Regex> = OnceLock::new();
    let re = IFRAME_TAG.get_or_init(|| Regex::new(r"(?i)<iframe\b([^>]*)>").unwrap());

    let attribute_src = re.captures(html)?.get(1).map(|m| m.as_str()).unwrap_or("");
    let attributes = collect_attributes(attribute_src);

    let Some(Some(raw_src)) = attributes.get("src") else {
        tracing::debug!("iframe has no src value");
        return None;
    };
    let src = normalize_src(raw_src)?;

    let attr = |name: &str| attributes.get(name).copied().flatten();

    Some(ParsedIframe {
        src,
        allow: non_empty(attr("allow")),
        title: non_empty(attr("title")),
        referrer_policy: attr("referrerpolicy").and_then(|v| ReferrerPolicy::from_str(v.trim()).ok()),
        loading: attr("loading").and_then(|v| Loading::from_str(v.trim()).ok()),
        allow_full_screen: attributes.contains_key("allowfullscreen"),
    })
}

/// Sanitize pasted embed markup into a [`VideoEmbed`].
///
/// Returns `None` when there is no iframe, no usable `src`, or the `src`
/// uses a scheme other than http(s).
///
/// # Examples
///
/// ```
/// use blockpress::embed::{sanitize, EmbedDeclaration, Provider};
///
/// let embed = sanitize(
///     Some(r#"<iframe src="http://youtu.be/x"></iframe>"#),
///     &EmbedDeclaration::default(),
/// )
/// .unwrap();
/// assert_eq!(embed.iframe.src, "https://youtu.be/x");
/// assert_eq!(embed.provider, Provider::Youtube);
///
/// assert!(sanitize(Some(r#"<iframe src="javascript:alert(1)"></iframe>"#), &EmbedDeclaration::default()).is_none());
/// ```
pub fn sanitize(raw_html: Option<&str>, declared: &EmbedDeclaration) -> Option<VideoEmbed> {
    let html = raw_html?.trim();
    if html.is_empty() {
        return None;
    }

    let Some(iframe) = parse_iframe(html) else {
        tracing::debug!("embed rejected");
        return None;
    };

    let provider = declared
        .provider
        .unwrap_or_else(|| Provider::detect(&iframe.src));
    let title = declared.title.clone().or(iframe.title);

    Some(VideoEmbed {
        provider,
        title,
        aspect_ratio: AspectRatio::parse_or_default(declared.aspect_ratio.as_deref()),
        iframe: IframeAttributes {
            src: iframe.src,
            allow: iframe.allow,
            referrer_policy: iframe.referrer_policy,
            loading: iframe.loading.unwrap_or_default(),
            allow_full_screen: iframe.allow_full_screen,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sanitize_plain(html: &str) -> Option<VideoEmbed> {
        sanitize(Some(html), &EmbedDeclaration::default())
    }

    #[test]
    fn test_rejects_missing_or_unsafe_input() {
        assert!(sanitize(None, &EmbedDeclaration::default()).is_none());
        assert!(sanitize_plain("   ").is_none());
        assert!(sanitize_plain("<div>no frame here</div>").is_none());
        assert!(sanitize_plain("<iframe width=560></iframe>").is_none());
        assert!(sanitize_plain("<iframe src></iframe>").is_none());
        assert!(sanitize_plain(r#"<iframe src="javascript:alert(1)"></iframe>"#).is_none());
        assert!(sanitize_plain(r#"<iframe src="data:text/html,<b>x</b>"></iframe>"#).is_none());
        assert!(sanitize_plain(r#"<iframe src="ftp://files.test/v.mp4"></iframe>"#).is_none());
        assert!(sanitize_plain(r#"<iframe src="not a url"></iframe>"#).is_none());
    }

    #[test]
    fn test_http_upgraded_and_provider_detected() {
        let embed = sanitize_plain(r#"<iframe src="http://youtu.be/x"></iframe>"#).unwrap();
        assert_eq!(embed.iframe.src, "https://youtu.be/x");
        assert_eq!(embed.provider, Provider::Youtube);
        assert_eq!(embed.iframe.loading, Loading::Lazy);
        assert!(!embed.iframe.allow_full_screen);
        assert_eq!(embed.aspect_ratio, AspectRatio::Widescreen);
    }

    #[test]
    fn test_protocol_relative_src() {
        let embed =
            sanitize_plain(r#"<IFRAME SRC='//player.vimeo.com/video/1'></IFRAME>"#).unwrap();
        assert_eq!(embed.iframe.src, "https://player.vimeo.com/video/1");
        assert_eq!(embed.provider, Provider::Vimeo);
    }

    #[test]
    fn test_full_youtube_snippet() {
        let html = r#"
            <p>Watch below</p>
            <iframe width="560" height="315"
                src="https://www.youtube-nocookie.com/embed/abc?si=1"
                title="YouTube video player" frameborder="0"
                allow="accelerometer; autoplay; clipboard-write"
                referrerpolicy="strict-origin-when-cross-origin" loading="eager"
                allowfullscreen></iframe>
            <script>alert(1)</script>
        "#;
        let embed = sanitize_plain(html).unwrap();
        assert_eq!(embed.provider, Provider::Youtube);
        assert_eq!(embed.title.as_deref(), Some("YouTube video player"));
        assert_eq!(
            embed.iframe.allow.as_deref(),
            Some("accelerometer; autoplay; clipboard-write")
        );
        assert_eq!(
            embed.iframe.referrer_policy,
            Some(ReferrerPolicy::StrictOriginWhenCrossOrigin)
        );
        assert_eq!(embed.iframe.loading, Loading::Eager);
        assert!(embed.iframe.allow_full_screen);

        let json = serde_json::to_string(&embed).unwrap();
        assert!(!json.contains("script"));
        assert!(!json.contains("Watch below"));
    }

    #[test]
    fn test_only_first_iframe_honored() {
        let embed = sanitize_plain(
            r#"<iframe src="https://vimeo.com/1"></iframe><iframe src="https://youtube.com/2"></iframe>"#,
        )
        .unwrap();
        assert_eq!(embed.iframe.src, "https://vimeo.com/1");
    }

    #[test]
    fn test_invalid_tokens_dropped() {
        let embed = sanitize_plain(
            r#"<iframe src="https://media.test/v" referrerpolicy="everything" loading="soon" allow="  " title=""></iframe>"#,
        )
        .unwrap();
        assert_eq!(embed.provider, Provider::Other);
        assert_eq!(embed.iframe.referrer_policy, None);
        assert_eq!(embed.iframe.loading, Loading::Lazy);
        assert_eq!(embed.iframe.allow, None);
        assert_eq!(embed.title, None);
    }

    #[test]
    fn test_allowfullscreen_forms() {
        for attr in ["allowfullscreen", r#"allowfullscreen="""#, r#"allowfullscreen="true""#] {
            let html = format!(r#"<iframe src="https://a.test/v" {}></iframe>"#, attr);
            assert!(sanitize_plain(&html).unwrap().iframe.allow_full_screen, "{}", attr);
        }
    }

    #[test]
    fn test_declarations_take_precedence() {
        let declared = EmbedDeclaration {
            provider: Some(Provider::Other),
            title: Some("Council meeting".to_string()),
            aspect_ratio: Some("4:3".to_string()),
        };
        let embed = sanitize(
            Some(r#"<iframe src="https://youtube.com/embed/1" title="Parsed"></iframe>"#),
            &declared,
        )
        .unwrap();
        assert_eq!(embed.provider, Provider::Other);
        assert_eq!(embed.title.as_deref(), Some("Council meeting"));
        assert_eq!(embed.aspect_ratio, AspectRatio::Standard);
    }

    #[test]
    fn test_unknown_aspect_ratio_defaults() {
        let declared = EmbedDeclaration {
            aspect_ratio: Some("21:9".to_string()),
            ..EmbedDeclaration::default()
        };
        let embed = sanitize(Some(r#"<iframe src="https://a.test/v"></iframe>"#), &declared).unwrap();
        assert_eq!(embed.aspect_ratio, AspectRatio::Widescreen);
        assert_eq!(AspectRatio::parse_or_default(Some("9:16")), AspectRatio::Portrait);
        assert_eq!(AspectRatio::parse_or_default(None), AspectRatio::Widescreen);
    }

    #[test]
    fn test_embed_json_shape() {
        let embed = sanitize_plain(
            r#"<iframe src="https://youtu.be/x" referrerpolicy="no-referrer" allowfullscreen></iframe>"#,
        )
        .unwrap();
        assert_eq!(
            serde_json::to_value(&embed).unwrap(),
            serde_json::json!({
                "provider": "youtube",
                "aspectRatio": "16:9",
                "iframe": {
                    "src": "https://youtu.be/x",
                    "referrerPolicy": "no-referrer",
                    "loading": "lazy",
                    "allowFullScreen": true
                }
            })
        );
    }

    #[test]
    fn test_provider_parse_from_string() {
        assert_eq!(Provider::from_str("YouTube").unwrap(), Provider::Youtube);
        assert_eq!(Provider::Vimeo.to_string(), "vimeo");
    }
}
