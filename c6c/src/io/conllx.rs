use std::io::{BufRead, Write};

use conllx::graph::{DepTriple, Sentence as ConllxSentence};
use conllx::io::{ReadSentence, Reader, WriteSentence, Writer};
use conllx::token::{Features, Token as ConllxToken};
use failure::Error;

use crate::document::{DEPREL, FEATS, HEAD, ID, LEMMA, UPOS, XPOS};
use crate::fields::EMPTY_VALUE;
use crate::pipeline::{Export, Import};
use crate::{Document, Sentence, Token};

/// Conversion Trait to CONLLX.
///
/// Creates a `conllx` token for each `Token`. FORM, LEMMA, UPOS (as CPOS),
/// XPOS (as POS) and FEATS are carried over, HEAD and DEPREL become edges of the
/// dependency graph.
pub trait ToConllx {
    fn to_conllx(&self) -> ConllxSentence;
}

/// Conversion Trait from CONLLX.
pub trait FromConllx {
    fn from_conllx(sentence: &ConllxSentence) -> Self;
}

fn optional(value: &str) -> Option<&str> {
    if value == EMPTY_VALUE {
        None
    } else {
        Some(value)
    }
}

impl<'a> From<&'a Token> for ConllxToken {
    fn from(token: &Token) -> Self {
        let mut conllx_token = ConllxToken::new(token.form());
        conllx_token.set_lemma(optional(token.value(LEMMA)));
        conllx_token.set_cpos(optional(token.value(UPOS)));
        conllx_token.set_pos(optional(token.xpos()));
        if let Some(features) = optional(token.value(FEATS)) {
            conllx_token.set_features(Some(Features::from_string(features)));
        }
        conllx_token
    }
}

impl ToConllx for Sentence {
    fn to_conllx(&self) -> ConllxSentence {
        let mut sentence = ConllxSentence::new();
        for token in self {
            sentence.push(token.into());
        }

        for (idx, token) in self.iter().enumerate() {
            let head = match token.head() {
                "0" => Some(0),
                head => self.position(head).map(|head| head + 1),
            };
            match head {
                Some(head) => sentence.dep_graph_mut().add_deprel(DepTriple::new(
                    head,
                    optional(token.deprel()),
                    idx + 1,
                )),
                None if token.head() != EMPTY_VALUE => warn!(
                    "Sentence {}: head {} of token {} does not exist",
                    self.sent_id(),
                    token.head(),
                    token.id()
                ),
                None => (),
            }
        }
        sentence
    }
}

impl FromConllx for Sentence {
    fn from_conllx(sentence: &ConllxSentence) -> Self {
        let mut tokens = Vec::with_capacity(sentence.len());
        // position 0 is the artificial root
        for idx in 1..sentence.len() {
            let conllx_token = match sentence[idx].token() {
                Some(token) => token,
                None => continue,
            };
            let mut token = Token::new(conllx_token.form());
            token.set(ID, idx.to_string());
            if let Some(lemma) = conllx_token.lemma() {
                token.set(LEMMA, lemma);
            }
            if let Some(cpos) = conllx_token.cpos() {
                token.set(UPOS, cpos);
            }
            if let Some(pos) = conllx_token.pos() {
                token.set(XPOS, pos);
            }
            if let Some(features) = conllx_token.features() {
                token.set(FEATS, features.as_str());
            }
            if let Some(triple) = sentence.dep_graph().head(idx) {
                token.set(HEAD, triple.head().to_string());
                token.set(DEPREL, triple.relation().unwrap_or(EMPTY_VALUE));
            }
            tokens.push(token);
        }
        Sentence::from_tokens(tokens, Default::default())
    }
}

/// Importer for CoNLL-X files.
#[derive(Clone, Copy, Debug, Default)]
pub struct CONLLXImporter;

impl Import for CONLLXImporter {
    fn import(&self, read: &mut dyn BufRead, filename: &str) -> Result<Document, Error> {
        let mut doc = Document::new(filename);
        for sentence in Reader::new(read).sentences() {
            doc.add_sentence(Sentence::from_conllx(&sentence?));
        }
        Ok(doc)
    }
}

/// Exporter for CoNLL-X files.
///
/// Only the CoNLL-X columns are written, sentence meta information is dropped.
#[derive(Clone, Copy, Debug, Default)]
pub struct CONLLXExporter;

impl Export for CONLLXExporter {
    fn extension(&self) -> &str {
        "conll"
    }

    fn export(&self, doc: &Document, write: &mut dyn Write) -> Result<(), Error> {
        let mut writer = Writer::new(write);
        for sentence in doc {
            writer.write_sentence(&sentence.to_conllx())?;
        }
        Ok(())
    }
}
