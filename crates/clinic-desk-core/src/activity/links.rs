//! Turn an activity sentence back into structured, clickable spans.
//!
//! The scan runs over the whitespace-split words of `action` with two rules
//! tried at every position: the patient-name rule (once per sentence) and the
//! entity-word rule. Whether a span may be navigated is decided separately
//! by [`is_destructive`], so each rule can be tested on its own.

use serde::{Deserialize, Serialize};

use crate::models::{ActivityLogEntry, TargetType};

/// Words in an action that mark it as destructive.
const DESTRUCTIVE_MARKERS: [&str; 4] = ["edit", "update", "delete", "remove"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpanKind {
    Text,
    PatientRef,
    EntityRef,
}

/// Where a reference span points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkTarget {
    Patient(i64),
    Entity { target_type: TargetType, id: i64 },
}

/// One piece of a rendered activity sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub kind: SpanKind,
    pub value: String,
    /// Render as a navigable link (otherwise references are emphasized text)
    pub linkable: bool,
    pub target: Option<LinkTarget>,
}

impl Span {
    fn text(word: &str) -> Self {
        Self {
            kind: SpanKind::Text,
            value: word.to_string(),
            linkable: false,
            target: None,
        }
    }
}

/// True when the action edits or removes something, in which case nothing in
/// it is rendered as a link.
pub fn is_destructive(action: &str) -> bool {
    let lower = action.to_lowercase();
    DESTRUCTIVE_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Split an entry's action into spans.
pub fn linkify(entry: &ActivityLogEntry) -> Vec<Span> {
    let destructive = is_destructive(&entry.action);
    let mut spans = Scanner::new(entry).collect::<Vec<_>>();
    for span in &mut spans {
        span.linkable = !destructive && span.target.is_some();
    }
    spans
}

/// Rejoin spans into a sentence with single spaces.
pub fn render_plain(spans: &[Span]) -> String {
    spans
        .iter()
        .map(|s| s.value.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Word scanner state.
struct Scanner<'a> {
    entry: &'a ActivityLogEntry,
    words: Vec<&'a str>,
    name_words: Vec<String>,
    pos: usize,
    name_matched: bool,
}

impl<'a> Scanner<'a> {
    fn new(entry: &'a ActivityLogEntry) -> Self {
        let name_words = entry
            .patient_name
            .as_deref()
            .map(|name| name.split_whitespace().map(str::to_lowercase).collect())
            .unwrap_or_default();

        Self {
            entry,
            words: entry.action.split_whitespace().collect(),
            name_words,
            pos: 0,
            name_matched: false,
        }
    }

    /// Does the patient name start at the current position?
    fn name_at_cursor(&self) -> bool {
        if self.name_matched || self.name_words.is_empty() {
            return false;
        }
        let end = self.pos + self.name_words.len();
        if end > self.words.len() {
            return false;
        }
        self.words[self.pos..end]
            .iter()
            .zip(&self.name_words)
            .all(|(word, name)| word.to_lowercase() == *name)
    }

    fn entity_at_cursor(&self) -> Option<LinkTarget> {
        let word = self.words[self.pos];
        let target_type = TargetType::from_word(word)?;
        if target_type != self.entry.target_type {
            return None;
        }
        self.entry.target_id.map(|id| LinkTarget::Entity { target_type, id })
    }
}

impl Iterator for Scanner<'_> {
    type Item = Span;

    fn next(&mut self) -> Option<Span> {
        if self.pos >= self.words.len() {
            return None;
        }

        if self.name_at_cursor() {
            self.pos += self.name_words.len();
            self.name_matched = true;
            let value = self
                .entry
                .patient_name
                .as_deref()
                .map(|name| name.split_whitespace().collect::<Vec<_>>().join(" "))
                .unwrap_or_default();
            return Some(Span {
                kind: SpanKind::PatientRef,
                value,
                linkable: false,
                target: self.entry.patient_id.map(LinkTarget::Patient),
            });
        }

        let word = self.words[self.pos];
        let span = match self.entity_at_cursor() {
            Some(target) => Span {
                kind: SpanKind::EntityRef,
                value: word.to_string(),
                linkable: false,
                target: Some(target),
            },
            None => Span::text(word),
        };
        self.pos += 1;
        Some(span)
    }
}
