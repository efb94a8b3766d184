//! RSS envelope extraction
//!
//! Pulls the channel items out of a weewx RSS 2.0 document. Only the elements
//! the report needs are captured; everything else in the feed is skipped.

use quick_xml::{Reader, events::Event};
use tracing::debug;

use crate::client::WeewxError;

const ITEM: &[u8] = b"item";
const TITLE: &[u8] = b"title";
const CONTENT_ENCODED: &[u8] = b"content:encoded";
const GEO_LAT: &[u8] = b"geo:lat";
const GEO_LONG: &[u8] = b"geo:long";

/// One `<item>` of the feed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedItem {
    /// Item title, e.g. "Weather Conditions at 18-Oct-2026 14:30"
    pub title: Option<String>,
    /// Free-text observation block from `content:encoded`
    pub content_encoded: Option<String>,
    /// Station latitude in decimal degrees (`geo:lat`)
    pub latitude: Option<String>,
    /// Station longitude in decimal degrees (`geo:long`)
    pub longitude: Option<String>,
}

impl FeedItem {
    /// Observation block of this item, or a structural error naming the item
    pub fn content(&self, index: usize) -> Result<&str, WeewxError> {
        self.content_encoded
            .as_deref()
            .ok_or(WeewxError::MissingElement {
                element: "content:encoded",
                item: index,
            })
    }

    /// Station coordinates of this item as `(latitude, longitude)`
    ///
    /// Both tags must be present; unparseable numbers become NaN and are
    /// rejected later by the timezone lookup.
    pub fn coordinates(&self, index: usize) -> Result<(f64, f64), WeewxError> {
        let latitude = self.latitude.as_deref().ok_or(WeewxError::MissingElement {
            element: "geo:lat",
            item: index,
        })?;
        let longitude = self.longitude.as_deref().ok_or(WeewxError::MissingElement {
            element: "geo:long",
            item: index,
        })?;

        Ok((
            crate::block::parse_leading_float(latitude),
            crate::block::parse_leading_float(longitude),
        ))
    }
}

/// Which captured field the reader is currently inside
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Content,
    Latitude,
    Longitude,
}

impl Field {
    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            TITLE => Some(Self::Title),
            CONTENT_ENCODED => Some(Self::Content),
            GEO_LAT => Some(Self::Latitude),
            GEO_LONG => Some(Self::Longitude),
            _ => None,
        }
    }

    fn store(self, item: &mut FeedItem, text: String) {
        // First occurrence wins, matching `element[0]` access on the feed
        let slot = match self {
            Self::Title => &mut item.title,
            Self::Content => &mut item.content_encoded,
            Self::Latitude => &mut item.latitude,
            Self::Longitude => &mut item.longitude,
        };
        if slot.is_none() {
            *slot = Some(text);
        }
    }
}

/// Parse an RSS document into its channel items, in document order
///
/// # Errors
///
/// Returns [`WeewxError::XmlParse`] if the document is not well-formed XML or
/// has no `<rss>` root.
pub fn parse_feed(xml: &str) -> Result<Vec<FeedItem>, WeewxError> {
    let mut reader = Reader::from_str(xml);

    let mut items = Vec::new();
    let mut seen_rss = false;
    let mut current: Option<FeedItem> = None;
    let mut field: Option<Field> = None;
    let mut text = String::new();

    loop {
        let event = reader.read_event().map_err(|e| {
            WeewxError::XmlParse(format!(
                "{e} at position {}",
                reader.error_position()
            ))
        })?;

        match event {
            Event::Start(e) => {
                let name = e.name();
                match name.as_ref() {
                    b"rss" => seen_rss = true,
                    ITEM => current = Some(FeedItem::default()),
                    other if current.is_some() && field.is_none() => {
                        field = Field::from_name(other);
                        text.clear();
                    },
                    _ => {},
                }
            },
            Event::Text(e) => {
                if field.is_some() {
                    let unescaped = e
                        .unescape()
                        .map_err(|e| WeewxError::XmlParse(e.to_string()))?;
                    text.push_str(&unescaped);
                }
            },
            Event::CData(e) => {
                if field.is_some() {
                    text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            },
            Event::End(e) => {
                let name = e.name();
                let name = name.as_ref();
                if name == ITEM {
                    if let Some(item) = current.take() {
                        items.push(item);
                    }
                    field = None;
                } else if let (Some(f), Some(item)) = (field, current.as_mut()) {
                    if Field::from_name(name) == Some(f) {
                        f.store(item, std::mem::take(&mut text).trim().to_string());
                        field = None;
                    }
                }
            },
            Event::Empty(e) => {
                if e.name().as_ref() == b"rss" {
                    seen_rss = true;
                }
            },
            Event::Eof => break,
            _ => {},
        }
    }

    if !seen_rss {
        return Err(WeewxError::XmlParse(
            "document has no <rss> element".to_string(),
        ));
    }

    debug!(items = items.len(), "Parsed RSS feed");
    Ok(items)
}
