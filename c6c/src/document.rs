use std::collections::BTreeMap;
use std::fmt;
use std::iter::FromIterator;
use std::slice;

use itertools::Itertools;

use crate::fields::{Fields, EMPTY_VALUE};
use crate::Tree;

pub static ID: &str = "ID";
pub static FORM: &str = "FORM";
pub static LEMMA: &str = "LEMMA";
pub static UPOS: &str = "UPOS";
pub static XPOS: &str = "XPOS";
pub static FEATS: &str = "FEATS";
pub static HEAD: &str = "HEAD";
pub static DEPREL: &str = "DEPREL";

pub static SENT_ID: &str = "sent_id";
pub static TEXT: &str = "text";

/// Name under which importers attach a sentence's constituency tree.
pub static DEFAULT_TREE: &str = "tree";

/// A word or morpheme with its annotation layers.
///
/// Every layer that was not set reads as `"_"`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Token {
    fields: Fields,
}

impl Token {
    /// Construct a `Token` with the given form.
    pub fn new(form: impl Into<String>) -> Self {
        let mut fields = Fields::new();
        fields.insert(FORM, form);
        Token { fields }
    }

    pub fn from_fields(fields: Fields) -> Self {
        Token { fields }
    }

    /// Get the value of `layer` if it was set.
    pub fn get(&self, layer: &str) -> Option<&str> {
        self.fields.get(layer)
    }

    /// Get the value of `layer`, `"_"` if it was never set.
    pub fn value(&self, layer: &str) -> &str {
        self.fields.value(layer)
    }

    /// Set `layer` to `value`, returning the replaced value.
    pub fn set(&mut self, layer: impl AsRef<str>, value: impl Into<String>) -> Option<String> {
        self.fields.insert(layer, value)
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut Fields {
        &mut self.fields
    }

    pub fn id(&self) -> &str {
        self.value(ID)
    }

    pub fn set_id(&mut self, id: impl Into<String>) -> Option<String> {
        self.set(ID, id)
    }

    pub fn form(&self) -> &str {
        self.value(FORM)
    }

    pub fn set_form(&mut self, form: impl Into<String>) -> Option<String> {
        self.set(FORM, form)
    }

    /// Language specific part-of-speech tag, STTS for German data.
    pub fn xpos(&self) -> &str {
        self.value(XPOS)
    }

    pub fn set_xpos(&mut self, xpos: impl Into<String>) -> Option<String> {
        self.set(XPOS, xpos)
    }

    /// Head pointer: `"0"` for the root, another token's `ID` or `"_"`.
    pub fn head(&self) -> &str {
        self.value(HEAD)
    }

    pub fn set_head(&mut self, head: impl Into<String>) -> Option<String> {
        self.set(HEAD, head)
    }

    pub fn deprel(&self) -> &str {
        self.value(DEPREL)
    }

    pub fn set_deprel(&mut self, deprel: impl Into<String>) -> Option<String> {
        self.set(DEPREL, deprel)
    }
}

impl<K, V> FromIterator<(K, V)> for Token
where
    K: AsRef<str>,
    V: Into<String>,
{
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
    {
        Token {
            fields: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.form())
    }
}

/// A sentence: tokens in linear order, sentence meta information and
/// optionally named constituency trees.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sentence {
    tokens: Vec<Token>,
    meta: Fields,
    trees: BTreeMap<String, Tree>,
}

impl Sentence {
    pub fn new() -> Self {
        Sentence::default()
    }

    /// Construct a sentence from `tokens` and `meta`.
    ///
    /// Tokens are added through `add_token`, missing IDs get assigned.
    pub fn from_tokens(tokens: impl IntoIterator<Item = Token>, meta: Fields) -> Self {
        let mut sentence = Sentence {
            tokens: Vec::new(),
            meta,
            trees: BTreeMap::new(),
        };
        for token in tokens {
            sentence.add_token(token);
        }
        sentence
    }

    /// Construct a sentence from the terminals of `tree`.
    ///
    /// The tokens are copies of the terminal tokens, the tree is attached as
    /// `DEFAULT_TREE`.
    pub fn from_tree(tree: Tree) -> Self {
        let tokens = tree
            .terminals()
            .filter_map(|t| tree[t].terminal().map(|t| t.token().clone()))
            .collect::<Vec<_>>();
        let mut sentence = Sentence::from_tokens(tokens, Fields::new());
        sentence.set_tree(DEFAULT_TREE, tree);
        sentence
    }

    /// Append `token`.
    ///
    /// If the token has no `ID`, its 1-based position becomes its `ID`.
    pub fn add_token(&mut self, mut token: Token) {
        if !token.fields().is_set(ID) {
            token.set_id((self.tokens.len() + 1).to_string());
        }
        self.tokens.push(token);
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn tokens_mut(&mut self) -> &mut [Token] {
        &mut self.tokens
    }

    pub fn iter(&self) -> slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Get the position of the token with `ID == id`.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.tokens.iter().position(|token| token.id() == id)
    }

    pub fn meta(&self) -> &Fields {
        &self.meta
    }

    pub fn meta_mut(&mut self) -> &mut Fields {
        &mut self.meta
    }

    pub fn sent_id(&self) -> &str {
        self.meta.value(SENT_ID)
    }

    pub fn set_sent_id(&mut self, sent_id: impl Into<String>) -> Option<String> {
        self.meta.insert(SENT_ID, sent_id)
    }

    /// The `text` meta value or the space-joined forms if it is absent.
    pub fn text(&self) -> String {
        match self.meta.get(TEXT) {
            Some(text) if text != EMPTY_VALUE => text.to_owned(),
            _ => self.tokens.iter().map(Token::form).join(" "),
        }
    }

    /// Get the tree attached as `name`.
    pub fn tree(&self, name: &str) -> Option<&Tree> {
        self.trees.get(name)
    }

    /// Attach `tree` as `name`, returning a previously attached tree.
    pub fn set_tree(&mut self, name: impl Into<String>, tree: Tree) -> Option<Tree> {
        self.trees.insert(name.into(), tree)
    }

    pub fn remove_tree(&mut self, name: &str) -> Option<Tree> {
        self.trees.remove(name)
    }

    pub fn tree_names(&self) -> impl Iterator<Item = &str> {
        self.trees.keys().map(String::as_str)
    }
}

impl<'a> IntoIterator for &'a Sentence {
    type Item = &'a Token;
    type IntoIter = slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}

impl fmt::Display for Sentence {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.tokens.iter().map(Token::form).join(" "))
    }
}

/// A corpus document.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    filename: String,
    sentences: Vec<Sentence>,
    meta: Fields,
}

impl Document {
    pub fn new(filename: impl Into<String>) -> Self {
        Document {
            filename: filename.into(),
            sentences: Vec::new(),
            meta: Fields::new(),
        }
    }

    /// Construct a document, adding `sentences` through `add_sentence`.
    pub fn from_sentences(
        filename: impl Into<String>,
        sentences: impl IntoIterator<Item = Sentence>,
        meta: Fields,
    ) -> Self {
        let mut doc = Document::new(filename);
        doc.meta = meta;
        for sentence in sentences {
            doc.add_sentence(sentence);
        }
        doc
    }

    /// Append `sentence`.
    ///
    /// Sentences without `sent_id` get their 1-based position in the document.
    pub fn add_sentence(&mut self, mut sentence: Sentence) {
        if !sentence.meta().is_set(SENT_ID) {
            sentence.set_sent_id((self.sentences.len() + 1).to_string());
        }
        self.sentences.push(sentence);
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn sentences(&self) -> &[Sentence] {
        &self.sentences
    }

    pub fn sentences_mut(&mut self) -> &mut [Sentence] {
        &mut self.sentences
    }

    pub fn iter(&self) -> slice::Iter<'_, Sentence> {
        self.sentences.iter()
    }

    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    pub fn meta(&self) -> &Fields {
        &self.meta
    }

    pub fn meta_mut(&mut self) -> &mut Fields {
        &mut self.meta
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = &'a Sentence;
    type IntoIter = slice::Iter<'a, Sentence>;

    fn into_iter(self) -> Self::IntoIter {
        self.sentences.iter()
    }
}
