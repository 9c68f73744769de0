use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use failure::Error;

use crate::document::XPOS;
use crate::fields::EMPTY_VALUE;
use crate::{Document, Token};

/// Trait for document transformations.
pub trait Processor {
    /// Transform `doc` in place.
    fn process(&self, doc: &mut Document) -> Result<(), Error>;
}

static SENTENCE_PUNCT: &[&str] = &[".", ":", "!", "?", ";"];
static COMMA_PUNCT: &[&str] = &[",", "/"];
static OTHER_PUNCT: &[&str] = &["(", ")", "[", "]", "-", "\"", "'", "„"];

/// STTS punctuation tag for `form`.
pub fn punctuation_tag(form: &str) -> Option<&'static str> {
    if SENTENCE_PUNCT.contains(&form) {
        Some("$.")
    } else if COMMA_PUNCT.contains(&form) {
        Some("$,")
    } else if OTHER_PUNCT.contains(&form) {
        Some("$(")
    } else {
        None
    }
}

/// Maps the tags of one token layer to another layer through a table.
///
/// Tags without entry in the table are tagged by their form if the token is
/// punctuation, otherwise they get the fallback tag.
#[derive(Clone, Debug)]
pub struct TagMapper {
    source: String,
    target: String,
    mapping: HashMap<String, String>,
    fallback: String,
}

impl TagMapper {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        mapping: HashMap<String, String>,
    ) -> Self {
        TagMapper {
            source: source.into(),
            target: target.into(),
            mapping,
            fallback: EMPTY_VALUE.to_owned(),
        }
    }

    /// Map from `source` to `XPOS` with the table in `path`.
    pub fn from_file(source: impl Into<String>, path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|err| format_err!("Cannot open mapping {}: {}", path.display(), err))?;
        let mapping = Self::read_mapping(BufReader::new(file))?;
        Ok(TagMapper::new(source, XPOS, mapping))
    }

    /// Read a mapping table.
    ///
    /// Every line holds a source and a target tag separated by whitespace. Empty
    /// lines and lines starting with `#` are skipped.
    pub fn read_mapping(read: impl BufRead) -> Result<HashMap<String, String>, Error> {
        let mut mapping = HashMap::new();
        for (line_no, line) in read.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.split_whitespace();
            match (parts.next(), parts.next(), parts.next()) {
                (Some(source), Some(target), None) => {
                    mapping.insert(source.to_owned(), target.to_owned());
                }
                _ => bail!("Malformed mapping in line {}: '{}'", line_no + 1, line),
            }
        }
        Ok(mapping)
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = fallback.into();
        self
    }

    /// Look up the target tag of `token`.
    ///
    /// Returns `None` if neither the table nor the punctuation rules apply.
    pub fn lookup(&self, token: &Token) -> Option<&str> {
        match token.get(&self.source) {
            Some(tag) if tag != EMPTY_VALUE => self
                .mapping
                .get(tag)
                .map(String::as_str)
                .or_else(|| punctuation_tag(token.form())),
            _ => punctuation_tag(token.form()),
        }
    }

    /// Map all tokens of `doc`.
    ///
    /// Returns the number of tokens that received the fallback tag.
    pub fn map_document(&self, doc: &mut Document) -> usize {
        let mut misses = 0;
        let filename = doc.filename().to_owned();
        for sentence in doc.sentences_mut() {
            let sent_id = sentence.sent_id().to_owned();
            for token in sentence.tokens_mut() {
                let tag = match self.lookup(token) {
                    Some(tag) => tag.to_owned(),
                    None => {
                        warn!(
                            "{}: sentence {}: no {} tag for {} '{}' of token {}",
                            filename,
                            sent_id,
                            self.target,
                            self.source,
                            token.value(&self.source),
                            token.id()
                        );
                        misses += 1;
                        self.fallback.clone()
                    }
                };
                token.set(&self.target, tag);
            }
        }
        misses
    }
}

impl Processor for TagMapper {
    fn process(&self, doc: &mut Document) -> Result<(), Error> {
        let misses = self.map_document(doc);
        if misses > 0 {
            info!("{}: {} unmapped {} tags", doc.filename(), misses, self.source);
        }
        Ok(())
    }
}

/// Renumbers tokens `"1"` to `"n"` per sentence and sentences `"1"` to `"m"`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Reindexer;

impl Processor for Reindexer {
    fn process(&self, doc: &mut Document) -> Result<(), Error> {
        for (sent_idx, sentence) in doc.sentences_mut().iter_mut().enumerate() {
            for (idx, token) in sentence.tokens_mut().iter_mut().enumerate() {
                token.set_id((idx + 1).to_string());
            }
            sentence.set_sent_id((sent_idx + 1).to_string());
        }
        Ok(())
    }
}
