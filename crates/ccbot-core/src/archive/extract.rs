//! Best-effort link extraction from archive.org HTML.
//!
//! The pages are untrusted and schema-less, so everything here is plain
//! pattern matching on `href="..."` attributes. Nothing in this module does
//! I/O; the resolver feeds it page bodies.

use std::collections::HashSet;

use regex::Regex;

use crate::{errors::Error, Result};

/// A link on a detail page that points at an audio file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QualifyingLink<'a> {
    /// `http(s)://...` link, usable as is.
    Absolute(&'a str),
    /// Site-relative `/download/...` path that still needs the archive root.
    Relative(&'a str),
}

#[derive(Clone, Debug)]
pub struct Extractor {
    detail: Regex,
    absolute: Regex,
    relative: Regex,
    item_id: Regex,
}

impl Extractor {
    /// Compile the patterns for audio files ending in `.{extension}`.
    pub fn new(extension: &str) -> Result<Self> {
        let ext = regex::escape(extension.trim_start_matches('.'));
        if ext.is_empty() {
            return Err(Error::Config("audio extension must not be empty".to_string()));
        }

        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| Error::Config(format!("bad pattern {pattern}: {e}")))
        };

        Ok(Self {
            detail: compile(r#"href="(/details/[^"]+)""#)?,
            absolute: compile(&format!(r#"href="(https?://[^"]+\.{ext})""#))?,
            relative: compile(&format!(r#"href="(/download/[^"]+\.{ext})""#))?,
            item_id: compile(r#"/details/([^"\s/]+)"#)?,
        })
    }

    /// Item detail links in order of appearance, each distinct link once.
    pub fn detail_links<'a>(&self, page: &'a str) -> Vec<&'a str> {
        let mut seen = HashSet::new();
        self.detail
            .captures_iter(page)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str())
            .filter(|link| seen.insert(*link))
            .collect()
    }

    /// First audio link on a detail page. Absolute links win over relative
    /// ones regardless of their position in the page.
    pub fn qualifying_link<'a>(&self, page: &'a str) -> Option<QualifyingLink<'a>> {
        if let Some(m) = self.absolute.captures(page).and_then(|c| c.get(1)) {
            return Some(QualifyingLink::Absolute(m.as_str()));
        }
        self.relative
            .captures(page)
            .and_then(|c| c.get(1))
            .map(|m| QualifyingLink::Relative(m.as_str()))
    }

    /// Item identifier of a `/details/<id>...` link.
    pub fn item_id<'a>(&self, detail_link: &'a str) -> Option<&'a str> {
        self.item_id
            .captures(detail_link)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mp3() -> Extractor {
        Extractor::new("mp3").unwrap()
    }

    #[test]
    fn detail_links_keep_order_and_drop_duplicates() {
        let page = r#"
            <a href="/details/beethoven_5">x</a>
            <a href="/details/mozart-41">y</a>
            <a href="/details/beethoven_5">again</a>
            <a href="/search.php?query=x">noise</a>
            <a href="/details/bach?tab=about">z</a>
        "#;
        assert_eq!(
            mp3().detail_links(page),
            vec!["/details/beethoven_5", "/details/mozart-41", "/details/bach?tab=about"]
        );
    }

    #[test]
    fn no_detail_links_on_empty_listing() {
        assert!(mp3().detail_links("<html><body>No results</body></html>").is_empty());
    }

    #[test]
    fn absolute_link_wins_even_when_relative_comes_first() {
        let page = r#"
            <a href="/download/item/track.mp3">rel</a>
            <a href="https://ia800.us.archive.org/1/items/item/track.mp3">abs</a>
        "#;
        assert_eq!(
            mp3().qualifying_link(page),
            Some(QualifyingLink::Absolute(
                "https://ia800.us.archive.org/1/items/item/track.mp3"
            ))
        );
    }

    #[test]
    fn first_absolute_link_is_returned() {
        let page = r#"<a href="http://a.example/one.mp3"></a><a href="http://a.example/two.mp3"></a>"#;
        assert_eq!(
            mp3().qualifying_link(page),
            Some(QualifyingLink::Absolute("http://a.example/one.mp3"))
        );
    }

    #[test]
    fn relative_download_link_is_found() {
        let page = r#"<a href="/download/item/Track%2001.mp3">get</a>"#;
        assert_eq!(
            mp3().qualifying_link(page),
            Some(QualifyingLink::Relative("/download/item/Track%2001.mp3"))
        );
    }

    #[test]
    fn other_extensions_do_not_qualify() {
        let page = r#"
            <a href="https://archive.org/download/item/track.ogg">ogg</a>
            <a href="/download/item/track.mp3.torrent">torrent</a>
            <a href="/details/item/track.mp3">details page, not a download</a>
        "#;
        assert_eq!(mp3().qualifying_link(page), None);
    }

    #[test]
    fn extension_is_configurable_and_escaped() {
        let ogg = Extractor::new(".ogg").unwrap();
        let page = r#"<a href="/download/item/track.ogg">ogg</a><a href="/download/item/trackxogg">x</a>"#;
        assert_eq!(
            ogg.qualifying_link(page),
            Some(QualifyingLink::Relative("/download/item/track.ogg"))
        );
        assert!(Extractor::new("").is_err());
    }

    #[test]
    fn item_id_stops_at_path_separator() {
        let ex = mp3();
        assert_eq!(ex.item_id("/details/beethoven_5"), Some("beethoven_5"));
        assert_eq!(ex.item_id("/details/beethoven_5/disc1"), Some("beethoven_5"));
        assert_eq!(ex.item_id("/details/"), None);
        assert_eq!(ex.item_id("/search.php"), None);
    }
}
