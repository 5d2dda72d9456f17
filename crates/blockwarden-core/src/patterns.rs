//! Pattern compiler
//!
//! A site list is a whitespace-separated token string:
//! - `FILE` / `+FILE` block or allow local files
//! - `~word` matches page text instead of the address
//! - `+site` is an exception
//! - `#...` is a comment
//! - anything else is a site glob
//!
//! Globs assume an optional `www.` prefix; `**` matches anything and `*`
//! matches anything but `/`. In keywords `_` matches whitespace.

use blockwarden_util::SetId;
use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Compiled matchers for one site list
#[derive(Debug, Default)]
pub struct SiteMatchers {
    block: Option<Regex>,
    allow: Option<Regex>,
    keyword: Option<Regex>,
}

impl SiteMatchers {
    /// Compile a site list. Never fails: an empty list matches nothing.
    pub fn compile(sites: &str) -> Self {
        let mut block_files = false;
        let mut allow_files = false;
        let mut blocks = Vec::new();
        let mut allows = Vec::new();
        let mut keywords = Vec::new();

        for token in sites.split_whitespace() {
            if token == "FILE" {
                block_files = true;
            } else if token == "+FILE" {
                allow_files = true;
            } else if let Some(keyword) = token.strip_prefix('~') {
                keywords.push(keyword_to_regex(keyword));
            } else if let Some(site) = token.strip_prefix('+') {
                allows.push(pattern_to_regex(site));
            } else if !token.starts_with('#') {
                blocks.push(pattern_to_regex(token));
            }
        }

        Self {
            block: address_matcher(&blocks, block_files),
            allow: address_matcher(&allows, allow_files),
            keyword: if keywords.is_empty() {
                None
            } else {
                build(&format!("(?i){}", keywords.join("|")))
            },
        }
    }

    /// Whether the list names anything to block
    pub fn has_block(&self) -> bool {
        self.block.is_some()
    }

    pub fn has_keywords(&self) -> bool {
        self.keyword.is_some()
    }

    /// Blocked iff the block matcher matches and the allow matcher does not
    pub fn matches_url(&self, url: &str) -> bool {
        match &self.block {
            Some(block) => {
                block.is_match(url) && !self.allow.as_ref().is_some_and(|a| a.is_match(url))
            }
            None => false,
        }
    }

    /// Whether any text fragment contains a keyword
    pub fn matches_text<S: AsRef<str>>(&self, text: &[S]) -> bool {
        match &self.keyword {
            Some(keyword) => text.iter().any(|t| keyword.is_match(t.as_ref())),
            None => false,
        }
    }
}

fn address_matcher(alternatives: &[String], files: bool) -> Option<Regex> {
    let files_alt = if files { "file:|" } else { "" };
    if !alternatives.is_empty() {
        build(&format!(
            "(?i)^(?:{files_alt}(?:https?|file):/+(?:{}))",
            alternatives.join("|")
        ))
    } else if files {
        build("(?i)^file:")
    } else {
        None
    }
}

fn build(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!(error = %e, "Site list too large to compile, ignoring it");
            None
        }
    }
}

/// Convert a site glob to a regular expression
pub fn pattern_to_regex(pattern: &str) -> String {
    let pattern = pattern.strip_prefix("www.").unwrap_or(pattern);
    let mut out = String::from("(?:www\\.)?");
    translate(pattern, &mut out, |run, out| match run {
        Run::Stars(n) if n >= 2 => out.push_str(".*"),
        Run::Stars(_) => out.push_str("[^/]*"),
        Run::Underscores(n) => out.push_str(&"_".repeat(n)),
    });
    out
}

/// Convert a keyword to a regular expression bounded by word breaks
pub fn keyword_to_regex(keyword: &str) -> String {
    let mut out = String::from("\\b");
    translate(keyword, &mut out, |run, out| match run {
        Run::Stars(_) => out.push_str("\\S*"),
        Run::Underscores(_) => out.push_str("\\s+"),
    });
    out.push_str("\\b");
    out
}

enum Run {
    Stars(usize),
    Underscores(usize),
}

/// Escape literal text and hand runs of `*` or `_` to `wildcard`
fn translate(text: &str, out: &mut String, wildcard: impl Fn(Run, &mut String)) {
    let mut chars = text.chars().peekable();
    let mut literal = String::new();
    while let Some(c) = chars.next() {
        if c != '*' && c != '_' {
            literal.push(c);
            continue;
        }
        out.push_str(&regex::escape(&literal));
        literal.clear();
        let mut n = 1;
        while chars.peek() == Some(&c) {
            chars.next();
            n += 1;
        }
        wildcard(
            if c == '*' { Run::Stars(n) } else { Run::Underscores(n) },
            out,
        );
    }
    out.push_str(&regex::escape(&literal));
}

/// Compiled matchers per set, rebuilt only when the site list changes
#[derive(Debug, Default)]
pub struct PatternCache {
    entries: Mutex<HashMap<SetId, (String, Arc<SiteMatchers>)>>,
}

impl PatternCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, set: SetId, sites: &str) -> Arc<SiteMatchers> {
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some((source, matchers)) = entries.get(&set)
            && source == sites
        {
            return Arc::clone(matchers);
        }
        debug!(set = %set, "Compiling site list");
        let matchers = Arc::new(SiteMatchers::compile(sites));
        entries.insert(set, (sites.to_string(), Arc::clone(&matchers)));
        matchers
    }
}
