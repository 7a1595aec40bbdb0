//! Markup-aware sentence segmentation.
//!
//! Text is split on ASCII sentence punctuation (`.`, `!`, `?` followed by
//! whitespace) and on self-closing directive tags such as `<laugh/>`. Each
//! directive becomes its own fragment whose synthesis text is a spoken
//! stand-in for the non-speech event.
//!
//! No language-specific sentence detection is done. CJK punctuation, for
//! example, is not a boundary.

use once_cell::sync::Lazy;
use regex::Regex;

/// One independently synthesizable unit of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Text associated with the resulting audio, as written in the input.
    pub display_text: String,
    /// Text actually spoken.
    pub synthesis_text: String,
}

impl Fragment {
    /// Creates a fragment that is spoken as displayed.
    pub fn plain(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            synthesis_text: text.clone(),
            display_text: text,
        }
    }

    /// Returns true if the fragment carries no visible text.
    pub fn is_blank(&self) -> bool {
        self.display_text.trim().is_empty()
    }
}

/// An inline non-speech directive and its spoken substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub name: String,
    pub utterance: String,
}

impl Directive {
    pub fn new(name: impl Into<String>, utterance: impl Into<String>) -> Self {
        Self {
            name: name.into().to_lowercase(),
            utterance: utterance.into(),
        }
    }
}

/// A piece of the input produced by the boundary scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Span<'a> {
    /// Ordinary text between boundaries.
    Content(&'a str),
    /// Terminal punctuation plus the whitespace following it.
    Sentence(&'a str),
    /// A directive tag. `directive` indexes the segmenter's directive list.
    Directive { raw: &'a str, directive: usize },
}

impl<'a> Span<'a> {
    /// Returns the input text covered by this span.
    pub fn as_str(&self) -> &'a str {
        match *self {
            Span::Content(s) | Span::Sentence(s) => s,
            Span::Directive { raw, .. } => raw,
        }
    }
}

/// Interface for turning input text into ordered fragments.
pub trait Segmenter: Send + Sync {
    /// Segments the text. Returned fragments are never blank.
    fn segment(&self, text: &str) -> Vec<Fragment>;
}

/// Segmenter for sentence punctuation and `<name/>` directives.
#[derive(Debug, Clone)]
pub struct MarkupSegmenter {
    directives: Vec<Directive>,
    pattern: Regex,
}

static DEFAULT_SEGMENTER: Lazy<MarkupSegmenter> = Lazy::new(MarkupSegmenter::default);

/// Segments text with the default directive set.
pub fn segment(text: &str) -> Vec<Fragment> {
    DEFAULT_SEGMENTER.segment(text)
}

impl Default for MarkupSegmenter {
    fn default() -> Self {
        Self::from_unique(vec![Directive::new("laugh", "Hahaha.")])
    }
}

/// Error type for directives that cannot be spoken.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectiveError {
    #[error("directive name is empty")]
    EmptyName,
    #[error("directive <{0}/> has an empty utterance")]
    EmptyUtterance(String),
}

impl MarkupSegmenter {
    /// Creates a segmenter recognizing the given directives.
    ///
    /// A later directive with the same name replaces an earlier one.
    pub fn new(directives: Vec<Directive>) -> Result<Self, DirectiveError> {
        let mut unique: Vec<Directive> = Vec::with_capacity(directives.len());
        for d in directives {
            if d.name.trim().is_empty() {
                return Err(DirectiveError::EmptyName);
            }
            if d.utterance.trim().is_empty() {
                return Err(DirectiveError::EmptyUtterance(d.name));
            }
            match unique.iter_mut().find(|u| u.name == d.name) {
                Some(existing) => *existing = d,
                None => unique.push(d),
            }
        }
        Ok(Self::from_unique(unique))
    }

    fn from_unique(directives: Vec<Directive>) -> Self {
        let pattern = build_pattern(&directives);
        Self {
            directives,
            pattern,
        }
    }

    /// Returns a copy of this segmenter with one more directive.
    ///
    /// A directive with an existing name replaces it.
    pub fn with_directive(
        self,
        name: impl Into<String>,
        utterance: impl Into<String>,
    ) -> Result<Self, DirectiveError> {
        let mut directives = self.directives;
        directives.push(Directive::new(name, utterance));
        Self::new(directives)
    }

    /// Returns the recognized directives.
    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    /// Partitions the text into content and boundary spans.
    ///
    /// Concatenating the spans in order yields `text` exactly.
    pub fn spans<'a>(&self, text: &'a str) -> Vec<Span<'a>> {
        let mut spans = Vec::new();
        let mut last = 0;

        for caps in self.pattern.captures_iter(text) {
            let Some(m) = caps.get(0) else { continue };
            if m.start() > last {
                spans.push(Span::Content(&text[last..m.start()]));
            }
            let span = match caps.get(1) {
                Some(name) => match self.directive_index(name.as_str()) {
                    Some(directive) => Span::Directive {
                        raw: m.as_str(),
                        directive,
                    },
                    None => Span::Content(m.as_str()),
                },
                None => Span::Sentence(m.as_str()),
            };
            spans.push(span);
            last = m.end();
        }

        if last < text.len() {
            spans.push(Span::Content(&text[last..]));
        }
        spans
    }

    fn directive_index(&self, name: &str) -> Option<usize> {
        let name = name.to_lowercase();
        self.directives.iter().position(|d| d.name == name)
    }
}

impl Segmenter for MarkupSegmenter {
    fn segment(&self, text: &str) -> Vec<Fragment> {
        let mut fragments = Vec::new();
        let mut pending = String::new();

        for span in self.spans(text.trim()) {
            match span {
                Span::Directive { raw, directive } => {
                    flush(&mut pending, &mut fragments);
                    fragments.push(Fragment {
                        display_text: raw.to_string(),
                        synthesis_text: self.directives[directive].utterance.clone(),
                    });
                }
                Span::Sentence(s) => {
                    pending.push_str(s);
                    flush(&mut pending, &mut fragments);
                }
                Span::Content(s) => pending.push_str(s),
            }
        }
        flush(&mut pending, &mut fragments);

        fragments.retain(|f| !f.is_blank());
        fragments
    }
}

fn flush(pending: &mut String, fragments: &mut Vec<Fragment>) {
    if !pending.is_empty() {
        fragments.push(Fragment::plain(std::mem::take(pending)));
    }
}

fn build_pattern(directives: &[Directive]) -> Regex {
    let sentence = r"[.!?]+\s+";
    let pattern = if directives.is_empty() {
        sentence.to_string()
    } else {
        let names: Vec<String> = directives.iter().map(|d| regex::escape(&d.name)).collect();
        format!(r"(?i)<\s*({})\s*/\s*>|{sentence}", names.join("|"))
    };
    // Names are escaped, so the pattern is always valid.
    Regex::new(&pattern).unwrap_or_else(|e| panic!("segment: invalid boundary pattern: {e}"))
}
