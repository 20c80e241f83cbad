use std::cmp::Ordering;
use std::fmt;

/// How precisely a media range names a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Specificity {
    /// `*/*`
    Any,
    /// `type/*`
    SubtypeWildcard,
    /// `type/subtype`
    Exact,
}

/// One entry of an `Accept` header.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaTypePreference {
    main_type: String,
    sub_type: String,
    params: Vec<(String, String)>,
    quality: f32,
    raw: String,
}

impl MediaTypePreference {
    /// Parse one comma-separated entry. Returns `None` for entries without a `type/subtype`
    /// pair or with an unparsable `q`.
    fn parse(entry: &str) -> Option<Self> {
        let raw = entry.trim();
        let mut parts = raw.split(';').map(str::trim);
        let (main_type, sub_type) = parts.next()?.split_once('/')?;
        let (main_type, sub_type) = (main_type.trim(), sub_type.trim());
        if main_type.is_empty() || sub_type.is_empty() {
            return None;
        }

        let mut quality = 1.0_f32;
        let mut params = Vec::new();
        for part in parts.filter(|p| !p.is_empty()) {
            let (key, value) = match part.split_once('=') {
                Some((k, v)) => (k.trim(), v.trim().trim_matches('"')),
                None => (part, ""),
            };
            if key.eq_ignore_ascii_case("q") {
                let q: f32 = value.parse().ok().filter(|q: &f32| q.is_finite())?;
                quality = q.clamp(0.0, 1.0);
            } else {
                params.push((key.to_ascii_lowercase(), value.to_string()));
            }
        }

        Some(Self {
            main_type: main_type.to_ascii_lowercase(),
            sub_type: sub_type.to_ascii_lowercase(),
            params,
            quality,
            raw: raw.to_string(),
        })
    }

    #[inline]
    #[must_use]
    pub fn main_type(&self) -> &str {
        &self.main_type
    }

    #[inline]
    #[must_use]
    pub fn sub_type(&self) -> &str {
        &self.sub_type
    }

    /// Quality factor in `[0, 1]`.
    #[inline]
    #[must_use]
    pub fn quality(&self) -> f32 {
        self.quality
    }

    /// Parameters other than `q`, in header order.
    #[must_use]
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Value of a parameter (name is case-insensitive).
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The entry as it appeared in the header, trimmed.
    #[inline]
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn specificity(&self) -> Specificity {
        match (self.main_type.as_str(), self.sub_type.as_str()) {
            ("*", _) => Specificity::Any,
            (_, "*") => Specificity::SubtypeWildcard,
            _ => Specificity::Exact,
        }
    }

    /// True when this entry accepts `main/sub` (wildcards allowed on both sides).
    #[must_use]
    pub fn matches_type(&self, main: &str, sub: &str) -> bool {
        part_matches(&self.main_type, main) && part_matches(&self.sub_type, sub)
    }

    /// True when every `(name, value)` pair is present on this entry.
    #[must_use]
    pub fn matches_params<K, V>(&self, wanted: &[(K, V)]) -> bool
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        wanted
            .iter()
            .all(|(k, v)| self.param(k.as_ref()) == Some(v.as_ref()))
    }

    fn rank(&self, other: &Self) -> Ordering {
        other
            .quality
            .total_cmp(&self.quality)
            .then_with(|| other.specificity().cmp(&self.specificity()))
            .then_with(|| other.params.len().cmp(&self.params.len()))
    }
}

impl fmt::Display for MediaTypePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn part_matches(a: &str, b: &str) -> bool {
    a == "*" || b == "*" || a.eq_ignore_ascii_case(b)
}

/// Split `type/subtype;params` into its lowercased type pair. Anything unparsable is
/// treated as `*/*`.
fn split_content_type(content_type: &str) -> (String, String) {
    let media = content_type.split(';').next().unwrap_or_default().trim();
    match media.split_once('/') {
        Some((main, sub)) if !main.trim().is_empty() && !sub.trim().is_empty() => (
            main.trim().to_ascii_lowercase(),
            sub.trim().to_ascii_lowercase(),
        ),
        _ => ("*".to_string(), "*".to_string()),
    }
}

/// A parsed, ranked `Accept` header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AcceptHeader {
    media_types: Vec<MediaTypePreference>,
}

impl AcceptHeader {
    /// Parse a header value. Malformed entries are skipped; an empty header yields no entries.
    #[must_use]
    pub fn parse(header: &str) -> Self {
        let mut media_types: Vec<MediaTypePreference> = header
            .split(',')
            .filter(|entry| !entry.trim().is_empty())
            .filter_map(MediaTypePreference::parse)
            .collect();
        media_types.sort_by(MediaTypePreference::rank);
        Self { media_types }
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.media_types.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.media_types.len()
    }

    /// Entries in ranked order.
    pub fn iter(&self) -> std::slice::Iter<'_, MediaTypePreference> {
        self.media_types.iter()
    }

    #[must_use]
    pub fn first(&self) -> Option<&MediaTypePreference> {
        self.media_types.first()
    }

    /// Entries compatible with `content_type` that carry every `(name, value)` in
    /// `match_params`, best first.
    pub fn filter<'a>(
        &'a self,
        content_type: &str,
        match_params: &[(&str, &str)],
    ) -> impl Iterator<Item = &'a MediaTypePreference> + 'a {
        let (main, sub) = split_content_type(content_type);
        let wanted: Vec<(String, String)> = match_params
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        self.media_types
            .iter()
            .filter(move |m| m.matches_type(&main, &sub) && m.matches_params(&wanted))
    }

    /// Version token of the best entry compatible with `content_type` that has one.
    #[must_use]
    pub fn version(&self, content_type: &str) -> Option<&str> {
        self.filter(content_type, &[])
            .find_map(|m| m.param("version").filter(|v| !v.is_empty()))
    }
}

impl<'a> IntoIterator for &'a AcceptHeader {
    type Item = &'a MediaTypePreference;
    type IntoIter = std::slice::Iter<'a, MediaTypePreference>;

    fn into_iter(self) -> Self::IntoIter {
        self.media_types.iter()
    }
}
