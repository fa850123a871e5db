//! Source records: archival items with optional media and video embeds.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{AssetResolver, ContentMapper, document_key};
use crate::blocks::BlockTree;
use crate::embed::{EmbedDeclaration, VideoEmbed, sanitize};
use crate::plain::to_plain_text;

/// An uploaded file as the CMS describes it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MediaAsset {
    #[serde(deserialize_with = "super::null_as_default")]
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternative_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// Media relation in either the flat or the `{data: {attributes}}` shape.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MediaInput {
    Wrapped { data: MediaData },
    Direct(MediaAsset),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MediaData {
    #[serde(default)]
    attributes: Option<MediaAsset>,
}

impl MediaInput {
    /// The asset with an absolute URL, or `None` without a URL.
    pub fn resolve(&self, assets: &AssetResolver) -> Option<MediaAsset> {
        let media = match self {
            MediaInput::Wrapped { data } => data.attributes.as_ref()?,
            MediaInput::Direct(media) => media,
        };
        if media.url.is_empty() {
            return None;
        }
        Some(MediaAsset {
            url: assets.resolve(&media.url),
            ..media.clone()
        })
    }
}

/// Where a record's media comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MediaSource {
    Upload,
    ExternalEmbed,
}

/// Embed component as stored: the pasted snippet plus editor declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoEmbedDocument {
    #[serde(default)]
    pub embed_html: Option<String>,
    #[serde(flatten)]
    pub declared: EmbedDeclaration,
}

/// A record as returned by the CMS.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordDocument {
    pub id: Value,
    pub document_id: Option<String>,
    #[serde(deserialize_with = "super::null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "super::null_as_default")]
    pub slug: String,
    /// Blocks, or legacy text from before the rich text migration.
    pub description: Option<Value>,
    pub searchable_content: Option<Value>,
    pub media_type: Option<String>,
    pub media_asset: Option<MediaInput>,
    pub media_source: Option<MediaSource>,
    pub video_embed: Option<VideoEmbedDocument>,
    pub source_url: Option<String>,
    pub publish_date: Option<String>,
    pub published_at: Option<String>,
    pub created_at: Option<String>,
}

/// Record view model.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRecord {
    pub id: String,
    pub title: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<BlockTree>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub searchable_content: Option<BlockTree>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_asset: Option<MediaAsset>,
    pub media_source: MediaSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_embed: Option<VideoEmbed>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl ContentMapper {
    pub fn map_record(&self, doc: &RecordDocument) -> SourceRecord {
        let description = self.normalize_field(doc.description.as_ref());
        let description_text = Some(to_plain_text(description.as_ref())).filter(|t| !t.is_empty());

        let video_embed = doc
            .video_embed
            .as_ref()
            .and_then(|v| sanitize(v.embed_html.as_deref(), &v.declared));
        if doc.video_embed.is_some() && video_embed.is_none() {
            tracing::debug!(slug = %doc.slug, "record embed dropped");
        }

        let media_source = doc.media_source.unwrap_or(if video_embed.is_some() {
            MediaSource::ExternalEmbed
        } else {
            MediaSource::Upload
        });

        SourceRecord {
            id: document_key(doc.document_id.as_deref(), &doc.id),
            title: doc.title.clone(),
            slug: doc.slug.clone(),
            description,
            description_text,
            searchable_content: self.normalize_field(doc.searchable_content.as_ref()),
            media_type: doc.media_type.clone(),
            media_asset: doc
                .media_asset
                .as_ref()
                .and_then(|m| m.resolve(self.assets())),
            media_source,
            video_embed,
            source_url: doc.source_url.clone(),
            publish_date: doc
                .publish_date
                .clone()
                .or_else(|| doc.published_at.clone()),
            published_at: doc.published_at.clone(),
            created_at: doc.created_at.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::{AspectRatio, Provider};
    use serde_json::json;

    fn record(value: Value) -> RecordDocument {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_map_record_with_embed() {
        let doc = record(json!({
            "id": 12,
            "title": "Council minutes",
            "slug": "council-minutes",
            "description": "First line\n\n- point a\n- point b",
            "searchableContent": "minutes text",
            "videoEmbed": {
                "embedHtml": "<p>watch</p><iframe src=\"//player.vimeo.com/video/1\" allowfullscreen></iframe>",
                "aspectRatio": "4:3"
            },
            "publishedAt": "2024-03-01T00:00:00.000Z"
        }));

        let mapped = ContentMapper::default().map_record(&doc);
        assert_eq!(mapped.id, "12");
        assert_eq!(
            mapped.description_text.as_deref(),
            Some("First line point a point b")
        );
        assert!(mapped.searchable_content.is_some());
        assert_eq!(mapped.media_source, MediaSource::ExternalEmbed);

        let embed = mapped.video_embed.unwrap();
        assert_eq!(embed.provider, Provider::Vimeo);
        assert_eq!(embed.aspect_ratio, AspectRatio::Standard);
        assert_eq!(embed.iframe.src, "https://player.vimeo.com/video/1");
        assert_eq!(
            mapped.publish_date.as_deref(),
            Some("2024-03-01T00:00:00.000Z")
        );
    }

    #[test]
    fn test_map_record_upload_media() {
        let doc = record(json!({
            "id": "r-1",
            "documentId": "abc123",
            "title": "Photo",
            "slug": "photo",
            "mediaAsset": {"data": {"attributes": {"url": "/uploads/p.jpg", "mime": "image/jpeg"}}},
            "videoEmbed": {"embedHtml": "<iframe src=\"javascript:alert(1)\"></iframe>"},
            "publishDate": "2023-01-01"
        }));

        let mapped = ContentMapper::new(AssetResolver::new("https://cms.example.org").unwrap())
            .map_record(&doc);
        assert_eq!(mapped.id, "abc123");
        assert!(mapped.video_embed.is_none());
        assert_eq!(mapped.media_source, MediaSource::Upload);
        assert!(mapped.description.is_none());
        assert!(mapped.description_text.is_none());

        let asset = mapped.media_asset.unwrap();
        assert_eq!(asset.url, "https://cms.example.org/uploads/p.jpg");
        assert_eq!(asset.mime.as_deref(), Some("image/jpeg"));
        assert_eq!(mapped.publish_date.as_deref(), Some("2023-01-01"));
    }

    #[test]
    fn test_declared_media_source_wins() {
        let doc = record(json!({
            "title": "Clip",
            "slug": "clip",
            "mediaSource": "upload",
            "videoEmbed": {"embedHtml": "<iframe src=\"https://youtube.com/embed/x\"></iframe>"}
        }));
        let mapped = ContentMapper::default().map_record(&doc);
        assert_eq!(mapped.media_source, MediaSource::Upload);
        assert!(mapped.video_embed.is_some());
    }

    #[test]
    fn test_media_without_url_dropped() {
        let doc = record(json!({"title": "x", "slug": "x", "mediaAsset": {"data": null}}));
        assert!(ContentMapper::default().map_record(&doc).media_asset.is_none());
    }

    #[test]
    fn test_source_record_json_shape() {
        let doc = record(json!({"id": 1, "title": "T", "slug": "t"}));
        let value = serde_json::to_value(ContentMapper::default().map_record(&doc)).unwrap();
        assert_eq!(
            value,
            json!({"id": "1", "title": "T", "slug": "t", "mediaSource": "upload"})
        );
    }
}
