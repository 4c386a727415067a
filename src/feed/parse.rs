// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::{DateTime, FixedOffset, NaiveDateTime};

use crate::error::FeedError;

/// A parsed feed document, entries in document order
#[derive(Debug, Clone)]
pub struct Feed {
    pub title: String,
    pub entries: Vec<RawEntry>,
}

/// A feed entry as delivered by the feed document, before any filtering
///
/// `None` marks a field the document did not provide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    /// Publish time in UTC
    pub published_parsed: Option<NaiveDateTime>,
    pub links: Option<Vec<Link>>,
}

/// A link attached to a feed entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub rel: String,
    pub mime_type: String,
    pub href: String,
}

impl Link {
    pub fn new(rel: &str, mime_type: &str, href: &str) -> Self {
        Self {
            rel: rel.to_string(),
            mime_type: mime_type.to_string(),
            href: href.to_string(),
        }
    }
}

/// Parse feed bytes, trying RSS 2.0 first and Atom second
pub fn parse_feed(xml_bytes: &[u8]) -> Result<Feed, FeedError> {
    match rss::Channel::read_from(xml_bytes) {
        Ok(channel) => Ok(from_rss(&channel)),
        Err(rss) => match atom_syndication::Feed::read_from(xml_bytes) {
            Ok(feed) => Ok(from_atom(&feed)),
            Err(atom) => Err(FeedError::ParseFailed { rss, atom }),
        },
    }
}

fn from_rss(channel: &rss::Channel) -> Feed {
    Feed {
        title: channel.title().to_string(),
        entries: channel.items().iter().map(rss_entry).collect(),
    }
}

fn rss_entry(item: &rss::Item) -> RawEntry {
    let mut links = Vec::new();

    if let Some(href) = item.link() {
        links.push(Link::new("alternate", "text/html", href));
    }

    if let Some(enclosure) = item.enclosure() {
        links.push(Link::new("enclosure", enclosure.mime_type(), enclosure.url()));
    }

    let published_parsed = item
        .pub_date()
        .and_then(parse_date)
        .or_else(|| {
            item.dublin_core_ext()
                .and_then(|dc| dc.dates().first())
                .and_then(|date_str| DateTime::parse_from_rfc3339(date_str).ok())
        })
        .map(|dt| dt.naive_utc());

    RawEntry {
        published_parsed,
        links: Some(links),
    }
}

fn from_atom(feed: &atom_syndication::Feed) -> Feed {
    let entries = feed
        .entries()
        .iter()
        .map(|entry| RawEntry {
            published_parsed: Some(
                entry
                    .published()
                    .unwrap_or_else(|| entry.updated())
                    .naive_utc(),
            ),
            links: Some(
                entry
                    .links()
                    .iter()
                    .map(|link| Link::new(link.rel(), link.mime_type().unwrap_or(""), link.href()))
                    .collect(),
            ),
        })
        .collect();

    Feed {
        title: feed.title().as_str().to_string(),
        entries,
    }
}

/// Parse an RSS date, accepting the common deviations from RFC 2822
fn parse_date(date_str: &str) -> Option<DateTime<FixedOffset>> {
    const RELAXED_FORMATS: [&str; 3] = [
        "%a, %d %b %Y %H:%M:%S %z",
        "%Y-%m-%dT%H:%M:%S%:z",
        "%Y-%m-%d %H:%M:%S %z",
    ];

    let date_str = date_str.trim();

    DateTime::parse_from_rfc2822(date_str).ok().or_else(|| {
        RELAXED_FORMATS
            .iter()
            .find_map(|format| DateTime::parse_from_str(date_str, format).ok())
    })
}
