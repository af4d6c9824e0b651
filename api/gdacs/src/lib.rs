use log::*;
use serde::{Deserialize, Serialize};

/// One `item` of the advisory RSS feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisoryItem {
    pub title: String,
    pub description: String,
    pub link: String,
    /// `(lat, lon)` from the `point` element, when present and numeric
    pub point: Option<(f64, f64)>,
}

/// Storm advisory feed client (GDACS RSS by default)
pub struct AdvisoryFeed {
    client: reqwest::Client,
    feed_url: String,
}

impl AdvisoryFeed {
    pub fn new() -> Result<Self, anyhow::Error> {
        Self::with_url("https://www.gdacs.org/xml/rss.xml")
    }

    pub fn with_url(feed_url: &str) -> Result<Self, anyhow::Error> {
        Ok(Self {
            client: reqwest::Client::builder().build()?,
            feed_url: feed_url.to_string(),
        })
    }

    /// Fetch the raw feed document
    pub async fn fetch_raw(&self) -> Result<String, anyhow::Error> {
        info!("Fetching advisory feed from: {}", self.feed_url);

        let response = self.client.get(&self.feed_url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!("HTTP {}: {}", response.status(), self.feed_url));
        }

        let text = response.text().await?;
        info!("Successfully fetched {} bytes from {}", text.len(), self.feed_url);

        Ok(text)
    }

    /// Fetch and parse every feed item
    pub async fn fetch_items(&self) -> Result<Vec<AdvisoryItem>, anyhow::Error> {
        let xml = self.fetch_raw().await?;
        Ok(parse_items(&xml))
    }
}

/// Parse all `item` elements of an RSS document.
///
/// Namespaced element names match on their local part, so `georss:point`
/// is read as `point`. Items that fail to parse are kept with empty fields.
pub fn parse_items(xml: &str) -> Vec<AdvisoryItem> {
    element_bodies(xml, "item")
        .into_iter()
        .map(|item| AdvisoryItem {
            title: first_text(item, "title"),
            description: first_text(item, "description"),
            link: first_text(item, "link"),
            point: element_bodies(item, "point")
                .first()
                .and_then(|raw| parse_point(&clean_text(raw))),
        })
        .collect()
}

/// Parse `"<lat> <lon>"`
pub fn parse_point(text: &str) -> Option<(f64, f64)> {
    let mut parts = text.split_whitespace();
    let lat = parts.next()?.parse().ok()?;
    let lon = parts.next()?.parse().ok()?;
    Some((lat, lon))
}

fn first_text(xml: &str, name: &str) -> String {
    element_bodies(xml, name)
        .first()
        .map(|raw| clean_text(raw))
        .unwrap_or_default()
}

/// Bodies of every element whose local name is `name`, in document order.
/// Nested elements of the same name are not supported.
fn element_bodies<'a>(xml: &'a str, name: &str) -> Vec<&'a str> {
    let mut found = Vec::new();
    let mut cursor = 0;

    while let Some(rel) = xml[cursor..].find('<') {
        let open = cursor + rel;
        let Some(rel_end) = xml[open..].find('>') else {
            break;
        };
        let tag = &xml[open + 1..open + rel_end];
        cursor = open + rel_end + 1;

        let tag_name = tag.split_whitespace().next().unwrap_or("");
        let local = tag_name.rsplit(':').next().unwrap_or(tag_name);
        if local != name || tag_name.starts_with('/') || tag.ends_with('/') {
            continue;
        }

        let close = format!("</{}>", tag_name);
        match xml[cursor..].find(&close) {
            Some(rel_close) => {
                found.push(&xml[cursor..cursor + rel_close]);
                cursor += rel_close + close.len();
            }
            None => {
                warn!("Unterminated <{}> element in feed", tag_name);
                break;
            }
        }
    }

    found
}

/// Strip a CDATA wrapper and decode the five predefined XML entities
fn clean_text(raw: &str) -> String {
    let trimmed = raw.trim();
    let inner = trimmed
        .strip_prefix("<![CDATA[")
        .and_then(|s| s.strip_suffix("]]>"))
        .unwrap_or(trimmed);

    inner
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}
