//! Feature branch identifier extraction.
//!
//! A branch identifier is the value of the first `key=value` entry whose key contains the
//! marker `featbr`. Query strings are `&`-separated, cookie headers are `;`-separated and
//! trimmed. The value is taken verbatim after the first `=`; no decoding happens beyond what
//! the CDN already did.

use crate::event::CloudFrontRequest;
use std::fmt;

/// Marker substring recognized in query string and cookie entries.
pub const FEATURE_BRANCH_MARKER: &str = "featbr";

/// Header carrying the identifier from the viewer-request phase to the origin-request phase.
pub const FEATURE_BRANCH_HEADER: &str = "x-slf-mfe-branch-name";

const COOKIE_HEADER: &str = "cookie";

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BranchIdentifier(String);

impl BranchIdentifier {
    /// Empty values do not identify a branch.
    fn from_value(value: &str) -> Option<Self> {
        if value.is_empty() {
            None
        } else {
            Some(BranchIdentifier(value.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the name follows the branch naming convention: a short ticket prefix and
    /// number (`abc-123`, `pr-42-fix-login`) or a dependabot branch (`dependabot-npm_and_yarn`).
    pub fn is_valid_name(&self) -> bool {
        is_ticket_branch(&self.0) || is_dependabot_branch(&self.0)
    }
}

impl fmt::Display for BranchIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for BranchIdentifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Where an identifier was found.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Source {
    QueryString,
    Cookie,
    Header,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::QueryString => "querystring",
            Source::Cookie => "cookie",
            Source::Header => "header",
        }
    }
}

pub fn from_query_string(querystring: &str) -> Option<BranchIdentifier> {
    marked_value(querystring.split('&'))
}

/// Looks through every `cookie` header entry.
pub fn from_cookies(request: &CloudFrontRequest) -> Option<BranchIdentifier> {
    request
        .header_values(COOKIE_HEADER)
        .find_map(|cookies| marked_value(cookies.split(';').map(str::trim)))
}

pub fn from_header(request: &CloudFrontRequest) -> Option<BranchIdentifier> {
    request
        .first_header_value(FEATURE_BRANCH_HEADER)
        .and_then(BranchIdentifier::from_value)
}

// Only the first entry whose key contains the marker is considered, even if it has no value.
fn marked_value<'a>(mut entries: impl Iterator<Item = &'a str>) -> Option<BranchIdentifier> {
    let entry = entries.find(|entry| {
        let key = entry.split_once('=').map_or(*entry, |(key, _)| key);
        key.contains(FEATURE_BRANCH_MARKER)
    })?;
    let (_, value) = entry.split_once('=')?;
    BranchIdentifier::from_value(value)
}

fn is_word(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn is_ticket_branch(name: &str) -> bool {
    let bytes = name.as_bytes();
    let prefix = bytes.iter().take_while(|b| is_word(**b)).count();

    (1..=5).contains(&prefix)
        && bytes.get(prefix) == Some(&b'-')
        && bytes.get(prefix + 1).is_some_and(u8::is_ascii_digit)
}

fn is_dependabot_branch(name: &str) -> bool {
    let Some(rest) = name.as_bytes().strip_prefix(b"dependabot-") else {
        return false;
    };

    match rest {
        [first, ..] if is_word(*first) => true,
        [_, second, ..] => second.is_ascii_digit(),
        _ => false,
    }
}
