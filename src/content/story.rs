//! Stories: a timeline of dated entries, each citing source records.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::record::{MediaAsset, MediaInput, RecordDocument, SourceRecord};
use super::{ContentMapper, document_key};
use crate::blocks::BlockTree;
use crate::plain::has_content;

const DEFAULT_AUTHOR: &str = "Unknown";
const DEFAULT_SUMMARY_HEADING: &str = "Summary";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimelineEntryDocument {
    pub id: Value,
    #[serde(deserialize_with = "super::null_as_default")]
    pub entry_date: String,
    #[serde(deserialize_with = "super::null_as_default")]
    pub headline: String,
    pub body: Option<Value>,
    /// Number or numeric string.
    pub position: Option<Value>,
    /// Kept raw so one malformed record does not sink the entry.
    pub records: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SummaryCardDocument {
    pub heading: Option<String>,
    pub body: Option<Value>,
    pub bullets_text: Option<String>,
}

/// A story as returned by the CMS.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoryDocument {
    pub id: Value,
    pub document_id: Option<String>,
    #[serde(deserialize_with = "super::null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "super::null_as_default")]
    pub slug: String,
    #[serde(deserialize_with = "super::null_as_default")]
    pub blurb: String,
    pub author_name: Option<String>,
    pub location: Option<String>,
    pub published_date: Option<String>,
    pub published_at: Option<String>,
    pub hero_media: Option<MediaInput>,
    pub timeline_entries: Option<Vec<TimelineEntryDocument>>,
    pub summary_enabled: Option<bool>,
    pub summary_card: Option<SummaryCardDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    pub id: String,
    pub entry_date: String,
    pub headline: String,
    pub body: BlockTree,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<f64>,
    pub records: Vec<SourceRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryCard {
    pub heading: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<BlockTree>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bullets: Option<Vec<String>>,
}

/// Story view model.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub blurb: String,
    pub author_name: String,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hero_media: Option<MediaAsset>,
    pub timeline_entries: Vec<TimelineEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<SummaryCard>,
}

fn parse_position(value: &Value) -> Option<f64> {
    let position = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }?;
    position.is_finite().then_some(position)
}

impl ContentMapper {
    pub fn map_timeline_entry(&self, doc: &TimelineEntryDocument) -> TimelineEntry {
        let records = doc
            .records
            .iter()
            .flatten()
            .filter(|raw| !raw.is_null())
            .filter_map(
                |raw| match serde_json::from_value::<RecordDocument>(raw.clone()) {
                    Ok(record) => Some(self.map_record(&record)),
                    Err(e) => {
                        tracing::debug!(entry = %doc.headline, error = %e, "timeline record skipped");
                        None
                    }
                },
            )
            .collect();

        TimelineEntry {
            id: document_key(None, &doc.id),
            entry_date: doc.entry_date.clone(),
            headline: doc.headline.clone(),
            body: self.normalize_field(doc.body.as_ref()).unwrap_or_default(),
            position: doc.position.as_ref().and_then(parse_position),
            records,
        }
    }

    /// Summary card, shown only when enabled and it has a body or bullets.
    pub fn map_summary(&self, doc: &StoryDocument) -> Option<SummaryCard> {
        if !doc.summary_enabled.unwrap_or(false) {
            return None;
        }
        let card = doc.summary_card.as_ref()?;

        let heading = card
            .heading
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .unwrap_or(DEFAULT_SUMMARY_HEADING)
            .to_string();

        let bullets: Vec<String> = card
            .bullets_text
            .as_deref()
            .unwrap_or_default()
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect();

        let body = self
            .normalize_field(card.body.as_ref())
            .filter(|tree| has_content(Some(tree)));

        if body.is_none() && bullets.is_empty() {
            return None;
        }

        Some(SummaryCard {
            heading,
            body,
            bullets: (!bullets.is_empty()).then_some(bullets),
        })
    }

    /// Map a story. Timeline entries are ordered by position (unpositioned
    /// last), then entry date, then their stored order.
    pub fn map_story(&self, doc: &StoryDocument) -> Story {
        let mut timeline_entries: Vec<TimelineEntry> = doc
            .timeline_entries
            .iter()
            .flatten()
            .map(|entry| self.map_timeline_entry(entry))
            .collect();

        timeline_entries.sort_by(|a, b| {
            let a_pos = a.position.unwrap_or(f64::INFINITY);
            let b_pos = b.position.unwrap_or(f64::INFINITY);
            a_pos
                .total_cmp(&b_pos)
                .then_with(|| a.entry_date.cmp(&b.entry_date))
        });

        Story {
            id: document_key(doc.document_id.as_deref(), &doc.id),
            title: doc.title.clone(),
            slug: doc.slug.clone(),
            blurb: doc.blurb.clone(),
            author_name: doc
                .author_name
                .clone()
                .unwrap_or_else(|| DEFAULT_AUTHOR.to_string()),
            location: doc
                .location
                .clone()
                .unwrap_or_else(|| self.default_location.clone()),
            published_date: doc.published_date.clone(),
            published_at: doc.published_at.clone(),
            hero_media: doc
                .hero_media
                .as_ref()
                .and_then(|m| m.resolve(self.assets())),
            timeline_entries,
            summary: self.map_summary(doc),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn story(value: Value) -> StoryDocument {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_timeline_sorted_by_position_then_date() {
        let doc = story(json!({
            "id": 1,
            "title": "Flood",
            "slug": "flood",
            "blurb": "",
            "timelineEntries": [
                {"id": 1, "entryDate": "1990-05-01", "headline": "late"},
                {"id": 2, "entryDate": "1980-01-01", "headline": "second", "position": "2"},
                {"id": 3, "entryDate": "1985-01-01", "headline": "first", "position": 1},
                {"id": 4, "entryDate": "1970-01-01", "headline": "early"},
                {"id": 5, "entryDate": "1970-01-01", "headline": "early too"}
            ]
        }));

        let mapped = ContentMapper::default().map_story(&doc);
        let headlines: Vec<_> = mapped
            .timeline_entries
            .iter()
            .map(|e| e.headline.as_str())
            .collect();
        assert_eq!(
            headlines,
            vec!["first", "second", "early", "early too", "late"]
        );
    }

    #[test]
    fn test_story_defaults() {
        let mapped = ContentMapper::default()
            .with_default_location("Blenheim")
            .map_story(&story(json!({"id": 9, "title": "T", "slug": "t", "blurb": "b"})));
        assert_eq!(mapped.id, "9");
        assert_eq!(mapped.author_name, "Unknown");
        assert_eq!(mapped.location, "Blenheim");
        assert!(mapped.timeline_entries.is_empty());
        assert!(mapped.summary.is_none());
    }

    #[test]
    fn test_null_text_fields_read_as_empty() {
        let doc = story(json!({
            "id": 3,
            "title": "T",
            "slug": "t",
            "blurb": null,
            "timelineEntries": [{
                "id": 1,
                "entryDate": null,
                "headline": null,
                "records": [{"id": 5, "title": null, "slug": "r", "mediaAsset": {"url": null}}]
            }]
        }));

        let mapped = ContentMapper::default().map_story(&doc);
        assert_eq!(mapped.blurb, "");
        let entry = &mapped.timeline_entries[0];
        assert_eq!(entry.headline, "");
        assert_eq!(entry.entry_date, "");
        assert_eq!(entry.records.len(), 1);
        assert_eq!(entry.records[0].title, "");
        assert!(entry.records[0].media_asset.is_none());
    }

    #[test]
    fn test_entry_records_and_body() {
        let doc = story(json!({
            "title": "T",
            "slug": "t",
            "timelineEntries": [{
                "id": 7,
                "entryDate": "2001-01-01",
                "headline": "h",
                "body": "Entry text",
                "records": [
                    {"id": 1, "title": "R", "slug": "r"},
                    null,
                    {"id": 2, "title": ["not", "a", "string"]}
                ]
            }]
        }));

        let entry = &ContentMapper::default().map_story(&doc).timeline_entries[0];
        assert_eq!(entry.id, "7");
        assert_eq!(entry.records.len(), 1);
        assert_eq!(entry.records[0].slug, "r");
        assert_eq!(entry.body.len(), 1);
    }

    #[test]
    fn test_summary_card() {
        let mapper = ContentMapper::default();
        let doc = story(json!({
            "title": "T",
            "slug": "t",
            "summaryEnabled": true,
            "summaryCard": {"heading": "  ", "bulletsText": "one\n\n  two  \n"}
        }));
        let summary = mapper.map_summary(&doc).unwrap();
        assert_eq!(summary.heading, "Summary");
        assert_eq!(
            summary.bullets,
            Some(vec!["one".to_string(), "two".to_string()])
        );
        assert!(summary.body.is_none());

        let disabled = story(json!({
            "summaryEnabled": false,
            "summaryCard": {"bulletsText": "one"}
        }));
        assert!(mapper.map_summary(&disabled).is_none());

        let empty = story(json!({
            "summaryEnabled": true,
            "summaryCard": {"heading": "Key points", "bulletsText": "\n  \n", "body": []}
        }));
        assert!(mapper.map_summary(&empty).is_none());
    }
}
