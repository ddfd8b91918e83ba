//! Literal key-file documents.
//!
//! Both desktop entries and `mimeapps.list` are `[Section]` headers followed by `key=value`
//! lines. Values are stored and written byte for byte: `;`, `%` and `#` inside a value carry no
//! meaning here, and nothing is quoted or escaped. Comments and blank lines of a parsed document
//! are kept in place so a rewrite only changes what was edited.

use std::fmt;

use crate::error::{EntryError, Result};

const BOM: &str = "\u{feff}";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Entry { key: String, value: String },
    Raw(String),
}

/// A named group of ordered `key=value` entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    name: String,
    lines: Vec<Line>,
    parsed: bool,
}

impl Section {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lines: Vec::new(),
            parsed: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sets `key` to `value`, replacing the first existing entry or appending a new one.
    ///
    /// Values must be single lines; callers validate that before building a document.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let key = key.into();
        let value = value.into();

        let existing = self.lines.iter_mut().find_map(|line| {
            match line {
                Line::Entry { key: k, value: v } if *k == key => Some(v),
                _ => None,
            }
        });

        match existing {
            Some(slot) => *slot = value,
            None => self.lines.push(Line::Entry { key, value }),
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    /// Iterates over entries in document order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.lines.iter().filter_map(|line| {
            match line {
                Line::Entry { key, value } => Some((key.as_str(), value.as_str())),
                Line::Raw(_) => None,
            }
        })
    }

    pub fn is_empty(&self) -> bool {
        self.entries().next().is_none()
    }

    /// Removes every entry for which `predicate(key, value)` holds and returns the removed keys
    /// in document order.
    pub fn remove_where<F>(&mut self, mut predicate: F) -> Vec<String>
    where
        F: FnMut(&str, &str) -> bool,
    {
        let mut removed = Vec::new();
        self.lines.retain(|line| {
            match line {
                Line::Entry { key, value } if predicate(key.as_str(), value.as_str()) => {
                    removed.push(key.clone());
                    false
                }
                _ => true,
            }
        });
        removed
    }

    fn ends_with_blank(&self) -> bool {
        matches!(self.lines.last(), Some(Line::Raw(raw)) if raw.trim().is_empty())
    }
}

/// Line terminator used when writing a document back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }

    /// Terminator of the first line of `content`, `Lf` if it has none.
    fn detect(content: &str) -> Self {
        match content.find('\n') {
            Some(index) if content[..index].ends_with('\r') => LineEnding::CrLf,
            _ => LineEnding::Lf,
        }
    }
}

/// An ordered collection of sections.
///
/// A parsed document remembers its line ending and leading byte order mark and writes them back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyFile {
    bom: bool,
    line_ending: LineEnding,
    preamble: Vec<String>,
    sections: Vec<Section>,
}

impl KeyFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a key-file document.
    ///
    /// # Errors
    ///
    /// Returns [`EntryError::Parse`] with the 1-based line number for a line that is neither a
    /// header, a `#` comment, blank, nor `key=value`, for an unterminated header, and for an
    /// entry that appears before the first header.
    pub fn parse(content: &str) -> Result<Self> {
        let mut document = Self::new();
        let content = match content.strip_prefix(BOM) {
            Some(rest) => {
                document.bom = true;
                rest
            }
            None => content,
        };
        document.line_ending = LineEnding::detect(content);

        for (index, line) in content.lines().enumerate() {
            let parse_error = || {
                EntryError::Parse {
                    line: index + 1,
                    content: line.to_string(),
                }
            };
            let trimmed = line.trim();

            if trimmed.is_empty() || trimmed.starts_with('#') {
                match document.sections.last_mut() {
                    Some(section) => section.lines.push(Line::Raw(line.to_string())),
                    None => document.preamble.push(line.to_string()),
                }
                continue;
            }

            if let Some(header) = trimmed.strip_prefix('[') {
                let name = header.strip_suffix(']').ok_or_else(parse_error)?;
                let mut section = Section::new(name);
                section.parsed = true;
                document.sections.push(section);
                continue;
            }

            let (key, value) = line.split_once('=').ok_or_else(parse_error)?;
            let key = key.trim();
            if key.is_empty() {
                return Err(parse_error());
            }
            let section = document.sections.last_mut().ok_or_else(parse_error)?;
            section.lines.push(Line::Entry {
                key: key.to_string(),
                value: value.trim_start().to_string(),
            });
        }

        Ok(document)
    }

    /// Appends a section and returns a handle to it.
    pub fn add_section(&mut self, section: Section) -> &mut Section {
        self.sections.push(section);
        let last = self.sections.len() - 1;
        &mut self.sections[last]
    }

    /// Returns the first section called `name`.
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Returns every section called `name`; duplicated headers are tolerated.
    pub fn sections_named_mut<'a>(
        &'a mut self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a mut Section> + 'a {
        self.sections.iter_mut().filter(move |s| s.name == name)
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }
}

impl fmt::Display for KeyFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let eol = self.line_ending.as_str();
        if self.bom {
            f.write_str(BOM)?;
        }
        for raw in &self.preamble {
            write!(f, "{raw}{eol}")?;
        }

        let mut previous: Option<&Section> = None;
        for section in &self.sections {
            if !section.parsed && previous.is_some_and(|p| !p.ends_with_blank()) {
                f.write_str(eol)?;
            }
            write!(f, "[{}]{eol}", section.name)?;
            for line in &section.lines {
                match line {
                    Line::Entry { key, value } => write!(f, "{key}={value}{eol}")?,
                    Line::Raw(raw) => write!(f, "{raw}{eol}")?,
                }
            }
            previous = Some(section);
        }

        Ok(())
    }
}
