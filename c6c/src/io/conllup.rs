use std::collections::BTreeSet;
use std::io::{BufRead, Write};

use failure::Error;
use itertools::Itertools;

use crate::document::{DEFAULT_TREE, SENT_ID, TEXT};
use crate::fields::EMPTY_VALUE;
use crate::pipeline::{Export, Import};
use crate::{Document, Fields, Sentence, Token, Tree};

/// Meta key of the column header.
pub static GLOBAL_COLUMNS: &str = "global.columns";

/// Meta key of the labeled PTB serialization of a sentence's tree.
pub static PTB_STRING: &str = "PTBstring";

static CONLLU_COLUMNS: [&str; 10] = [
    "ID", "FORM", "LEMMA", "UPOS", "XPOS", "FEATS", "HEAD", "DEPREL", "DEPS", "MISC",
];

/// Importer for CoNLL-U Plus files.
///
/// The first non-empty line has to be the `# global.columns = ...` header.
/// Comment lines `# key = value` become sentence meta information, empty lines
/// end a sentence. Cells missing at the end of a row read as `"_"`. A
/// `PTBstring` comment is parsed and attached as the sentence's `tree`.
#[derive(Clone, Copy, Debug, Default)]
pub struct CONLLUPlusImporter;

impl CONLLUPlusImporter {
    fn read_columns(line: &str) -> Option<Vec<String>> {
        let (key, value) = split_comment(line)?;
        if key != GLOBAL_COLUMNS {
            return None;
        }
        let columns = value
            .split_whitespace()
            .map(ToOwned::to_owned)
            .collect::<Vec<_>>();
        if columns.is_empty() {
            None
        } else {
            Some(columns)
        }
    }

    fn finish_sentence(
        doc: &mut Document,
        tokens: &mut Vec<Token>,
        meta: &mut Fields,
    ) -> Result<(), Error> {
        if tokens.is_empty() {
            return Ok(());
        }
        let mut meta = std::mem::take(meta);
        let tree = match meta.remove(PTB_STRING) {
            Some((_, ptb)) => Tree::from_ptb_string(&ptb).map_err(|err| {
                format_err!(
                    "Invalid {} in sentence {} of {}: {}",
                    PTB_STRING,
                    doc.len() + 1,
                    doc.filename(),
                    err
                )
            })?,
            None => None,
        };

        let mut sentence = Sentence::from_tokens(tokens.drain(..), meta);
        if !sentence.meta().is_set(TEXT) {
            let text = sentence.text();
            sentence.meta_mut().insert(TEXT, text);
        }
        if let Some(tree) = tree {
            sentence.set_tree(DEFAULT_TREE, tree);
        }
        doc.add_sentence(sentence);
        Ok(())
    }
}

impl Import for CONLLUPlusImporter {
    fn import(&self, read: &mut dyn BufRead, filename: &str) -> Result<Document, Error> {
        let mut lines = read.lines();
        let mut columns = None;
        for line in &mut lines {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            columns = Self::read_columns(&line);
            break;
        }
        let columns =
            columns.ok_or_else(|| format_err!("Missing column information in {}", filename))?;

        let mut doc = Document::new(filename);
        let mut tokens = Vec::new();
        let mut meta = Fields::new();
        for line in lines {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                Self::finish_sentence(&mut doc, &mut tokens, &mut meta)?;
            } else if trimmed.starts_with('#') {
                if let Some((key, value)) = split_comment(trimmed) {
                    meta.insert(key, value);
                }
            } else {
                let mut cells = trimmed.split('\t');
                let token = columns
                    .iter()
                    .map(|column| (column, cells.next().unwrap_or(EMPTY_VALUE)))
                    .collect::<Token>();
                tokens.push(token);
            }
        }
        Self::finish_sentence(&mut doc, &mut tokens, &mut meta)?;
        Ok(doc)
    }
}

// "# key = value", the value may contain further '='
fn split_comment(line: &str) -> Option<(&str, &str)> {
    let comment = line.trim().trim_start_matches('#').trim();
    if comment.is_empty() {
        return None;
    }
    match comment.find('=') {
        Some(idx) => Some((comment[..idx].trim(), comment[idx + 1..].trim())),
        None => Some((comment, "")),
    }
}

/// Exporter for CoNLL-U Plus files.
///
/// The ten CoNLL-U columns are always written, followed by all additional token
/// fields that carry a value in the document, sorted alphabetically. The
/// sentence's `tree` is written as `PTBstring` meta information.
#[derive(Clone, Copy, Debug, Default)]
pub struct CONLLUPlusExporter;

impl CONLLUPlusExporter {
    /// The columns written for `doc`.
    pub fn columns(doc: &Document) -> Vec<String> {
        let additional = doc
            .iter()
            .flat_map(|sentence| sentence.iter())
            .flat_map(|token| token.fields().iter())
            .filter(|(key, value)| *value != EMPTY_VALUE && !CONLLU_COLUMNS.contains(key))
            .map(|(key, _)| key.to_owned())
            .collect::<BTreeSet<_>>();
        CONLLU_COLUMNS
            .iter()
            .map(|&column| column.to_owned())
            .chain(additional)
            .collect()
    }
}

impl Export for CONLLUPlusExporter {
    fn extension(&self) -> &str {
        "conllup"
    }

    fn export(&self, doc: &Document, write: &mut dyn Write) -> Result<(), Error> {
        let columns = Self::columns(doc);
        writeln!(write, "# {} = {}", GLOBAL_COLUMNS, columns.join(" "))?;
        for sentence in doc {
            writeln!(write, "# {} = {}", SENT_ID, sentence.sent_id())?;
            writeln!(write, "# {} = {}", TEXT, sentence.text())?;
            for (key, value) in sentence.meta().iter() {
                if key == SENT_ID || key == TEXT || key == GLOBAL_COLUMNS || key == PTB_STRING {
                    continue;
                }
                writeln!(write, "# {} = {}", key, value)?;
            }
            if let Some(tree) = sentence.tree(DEFAULT_TREE) {
                writeln!(write, "# {} = {}", PTB_STRING, tree.to_ptb_string(true))?;
            }
            for token in sentence {
                let row = columns.iter().map(|column| token.value(column)).join("\t");
                writeln!(write, "{}", row)?;
            }
            writeln!(write)?;
        }
        Ok(())
    }
}
