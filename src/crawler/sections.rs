//! Profile page section extraction
//!
//! Profile pages have no reliable markup for their sections, only short
//! header lines ("Biography", "Research Interests") followed by prose. The
//! extractor is a single-pass state machine over the page's text lines:
//!
//! ```text
//!            header(S)              header(T)
//!   Idle ─────────────▶ In(S) ─────────────▶ In(T) ...
//!                        │  ▲
//!                        └──┘ prose line: append to buffer S
//! ```
//!
//! A line is a header for section S when it contains S's keyword
//! (case-insensitive) and is shorter than the header length threshold.
//! Keywords are checked in priority order and the first match wins.

use scraper::{Html, Node, Selector};

/// Containers tried in order when looking for the page's main content
const CONTENT_SELECTORS: [&str; 3] = ["div.region-content", "div#block-system-main", "body"];

/// Elements whose text never belongs to the visible content
const INVISIBLE_ELEMENTS: [&str; 3] = ["script", "style", "noscript"];

/// The five free-text sections of a profile, in header priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Biography,
    Specialization,
    Publications,
    Teaching,
    Research,
}

impl Section {
    /// All sections, highest header priority first
    pub const PRIORITY: [Section; 5] = [
        Section::Biography,
        Section::Specialization,
        Section::Publications,
        Section::Teaching,
        Section::Research,
    ];

    /// Lowercase keyword that marks this section's header line
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Biography => "biography",
            Self::Specialization => "specialization",
            Self::Publications => "publication",
            Self::Teaching => "teaching",
            Self::Research => "research",
        }
    }

    fn index(&self) -> usize {
        match self {
            Self::Biography => 0,
            Self::Specialization => 1,
            Self::Publications => 2,
            Self::Teaching => 3,
            Self::Research => 4,
        }
    }
}

/// Rules deciding which lines are headers and which are kept as prose
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderPolicy {
    /// Keyword table, highest priority first
    pub keywords: Vec<(Section, &'static str)>,

    /// A header line has fewer characters than this
    pub max_header_len: usize,

    /// A prose line must have more characters than this to be kept
    pub min_line_len: usize,
}

impl Default for HeaderPolicy {
    fn default() -> Self {
        Self {
            keywords: Section::PRIORITY
                .iter()
                .map(|section| (*section, section.keyword()))
                .collect(),
            max_header_len: 50,
            min_line_len: 3,
        }
    }
}

impl HeaderPolicy {
    /// Returns the section a line introduces, if it is a header line
    pub fn classify(&self, line: &str) -> Option<Section> {
        if line.chars().count() >= self.max_header_len {
            return None;
        }

        let lower = line.to_lowercase();
        self.keywords
            .iter()
            .find(|(_, keyword)| lower.contains(keyword))
            .map(|(section, _)| *section)
    }

    /// Returns true if a non-header line is long enough to keep
    pub fn keeps(&self, line: &str) -> bool {
        line.chars().count() > self.min_line_len
    }
}

/// Scanner state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    /// No header seen yet
    Idle,
    /// Collecting lines for a section
    In(Section),
}

/// Lines collected per section during one scan
#[derive(Debug, Default)]
struct SectionBuffer {
    lines: [Vec<String>; 5],
}

impl SectionBuffer {
    fn push(&mut self, section: Section, line: &str) {
        self.lines[section.index()].push(line.to_string());
    }

    fn take(&mut self, section: Section) -> Option<String> {
        let lines = std::mem::take(&mut self.lines[section.index()]);
        if lines.is_empty() {
            None
        } else {
            Some(lines.join(" "))
        }
    }
}

/// The extracted sections of one profile page
///
/// Absent sections are `None`, never an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileSections {
    pub biography: Option<String>,
    pub specialization: Option<String>,
    pub publications: Option<String>,
    pub teaching: Option<String>,
    pub research: Option<String>,
}

impl ProfileSections {
    /// Returns the text of one section
    pub fn get(&self, section: Section) -> Option<&str> {
        match section {
            Section::Biography => self.biography.as_deref(),
            Section::Specialization => self.specialization.as_deref(),
            Section::Publications => self.publications.as_deref(),
            Section::Teaching => self.teaching.as_deref(),
            Section::Research => self.research.as_deref(),
        }
    }

    /// Returns true if no section was found
    pub fn is_empty(&self) -> bool {
        Section::PRIORITY.iter().all(|s| self.get(*s).is_none())
    }
}

/// Single-pass section extractor
#[derive(Debug, Clone, Default)]
pub struct SectionExtractor {
    policy: HeaderPolicy,
}

impl SectionExtractor {
    pub fn new(policy: HeaderPolicy) -> Self {
        Self { policy }
    }

    /// Runs the state machine over pre-split, trimmed, non-empty lines
    pub fn extract<I, S>(&self, lines: I) -> ProfileSections
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut state = ScanState::Idle;
        let mut buffer = SectionBuffer::default();

        for line in lines {
            let line = line.as_ref();

            if let Some(section) = self.policy.classify(line) {
                state = ScanState::In(section);
                continue;
            }

            if let ScanState::In(section) = state {
                if self.policy.keeps(line) {
                    buffer.push(section, line);
                }
            }
        }

        ProfileSections {
            biography: buffer.take(Section::Biography),
            specialization: buffer.take(Section::Specialization),
            publications: buffer.take(Section::Publications),
            teaching: buffer.take(Section::Teaching),
            research: buffer.take(Section::Research),
        }
    }

    /// Extracts sections from a profile page's HTML
    pub fn extract_html(&self, html: &str) -> ProfileSections {
        self.extract(profile_text_lines(html))
    }
}

/// Extracts sections using the default header policy
pub fn extract_sections<I, S>(lines: I) -> ProfileSections
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    SectionExtractor::default().extract(lines)
}

/// Splits a page's visible text into trimmed, non-empty lines
///
/// Text is taken from the main content container, or from the whole body
/// when no known container is present.
pub fn profile_text_lines(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);

    let container = CONTENT_SELECTORS.iter().find_map(|css| {
        let selector = Selector::parse(css).ok()?;
        document.select(&selector).next()
    });

    let Some(container) = container else {
        return Vec::new();
    };

    let mut lines = Vec::new();
    for node in container.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| INVISIBLE_ELEMENTS.iter().any(|name| *name == el.name()))
        });
        if hidden {
            continue;
        }

        lines.extend(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string),
        );
    }

    lines
}
