use std::cmp::Reverse;

use failure::Error;

use crate::document::DEFAULT_TREE;
use crate::processor::Processor;
use crate::{Document, Sentence, Tree};

/// Default token layer of the BIO annotation.
pub static DEFAULT_ANNOTATION: &str = "TREE";

static OUTSIDE: &str = "O";

/// Flattens a constituency tree to per token BIO tags.
///
/// Every nonterminal contributes a span from its first to its last token,
/// punctuation included. Tags of overlapping spans are stacked with `"|"`,
/// outer spans first, e.g. `"I-SIMPX|I-MF|B-NX"`. Tokens outside of all spans
/// are tagged `"O"`.
///
/// The root node contributes a span as well, so every token of a tree wrapped
/// in `VROOT` starts its tag with `B-VROOT` or `I-VROOT`. Use
/// [`include_root(false)`](TreeToBio::include_root) to leave the root out, as
/// TüBa-D/Z conversions usually do.
#[derive(Clone, Debug)]
pub struct TreeToBio {
    tree: String,
    annotation: String,
    include_root: bool,
}

impl Default for TreeToBio {
    fn default() -> Self {
        TreeToBio::new(DEFAULT_TREE, DEFAULT_ANNOTATION)
    }
}

impl TreeToBio {
    /// Annotate the tree attached as `tree` in the token layer `annotation`.
    pub fn new(tree: impl Into<String>, annotation: impl Into<String>) -> Self {
        TreeToBio {
            tree: tree.into(),
            annotation: annotation.into(),
            include_root: true,
        }
    }

    /// Set whether the root node contributes a span.
    pub fn include_root(mut self, include_root: bool) -> Self {
        self.include_root = include_root;
        self
    }

    /// Get the spans `(category, start, end)` of `tree`.
    ///
    /// Spans are sorted by start, spans with the same start by descending end.
    pub fn spans(&self, tree: &Tree) -> Vec<(String, usize, usize)> {
        let mut spans = tree
            .nonterminals()
            .filter(|&node| self.include_root || !tree.is_root(node))
            .filter_map(|node| {
                let start = tree.start_index(node, false)?;
                let end = tree.end_index(node, false)?;
                Some((tree[node].cat().to_owned(), start, end))
            })
            .collect::<Vec<_>>();
        spans.sort_by_key(|&(_, start, end)| (start, Reverse(end)));
        spans
    }

    /// Annotate the tokens of `sentence`.
    ///
    /// Sentences without the tree are annotated with `"O"` only.
    pub fn process_sentence(&self, sentence: &mut Sentence) {
        let mut tags = vec![Vec::new(); sentence.len()];
        match sentence.tree(&self.tree) {
            Some(tree) => {
                for (cat, start, end) in self.spans(tree) {
                    if end >= tags.len() || start > end {
                        warn!(
                            "Sentence {}: span {} ({}, {}) exceeds the sentence",
                            sentence.sent_id(),
                            cat,
                            start,
                            end
                        );
                        continue;
                    }
                    tags[start].push(format!("B-{}", cat));
                    for tag in &mut tags[start + 1..=end] {
                        tag.push(format!("I-{}", cat));
                    }
                }
            }
            None => warn!(
                "Sentence {}: no tree '{}'",
                sentence.sent_id(),
                self.tree
            ),
        }

        for (token, tags) in sentence.tokens_mut().iter_mut().zip(tags) {
            if tags.is_empty() {
                token.set(&self.annotation, OUTSIDE);
            } else {
                token.set(&self.annotation, tags.join("|"));
            }
        }
    }
}

impl Processor for TreeToBio {
    fn process(&self, doc: &mut Document) -> Result<(), Error> {
        for sentence in doc.sentences_mut() {
            self.process_sentence(sentence);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::bio::TreeToBio;
    use crate::processor::Processor;
    use crate::{Document, Sentence, Token, Tree};

    fn annotated(sentence: &Sentence, layer: &str) -> Vec<String> {
        sentence
            .iter()
            .map(|token| token.value(layer).to_owned())
            .collect()
    }

    fn sentence(ptb: &str) -> Sentence {
        Sentence::from_tree(Tree::from_ptb_string(ptb).unwrap().unwrap())
    }

    #[test]
    fn nested_spans() {
        let mut sentence = sentence("(NP (PP (APPR a) (NN b)) (NN c))");
        TreeToBio::default().process_sentence(&mut sentence);
        assert_eq!(
            annotated(&sentence, "TREE"),
            vec!["B-NP|B-PP", "I-NP|I-PP", "I-NP"]
        );
    }

    #[test]
    fn without_root() {
        let mut sentence = sentence("(VROOT (NP (PP (APPR a) (NN b)) (NN c)) (PUNKT .))");
        TreeToBio::default()
            .include_root(false)
            .process_sentence(&mut sentence);
        assert_eq!(
            annotated(&sentence, "TREE"),
            vec!["B-NP|B-PP", "I-NP|I-PP", "I-NP", "O"]
        );
    }

    #[test]
    fn topological_fields() {
        let mut sentence = sentence(
            "(VROOT:--(SIMPX:--(VF:--(NX:ON(NE:HD Maria)))(LK:--(VXFIN:HD(VVFIN:HD lacht))))(PUNKT:-- .))",
        );
        let bio = TreeToBio::new("tree", "TOPF").include_root(false);
        let spans = bio.spans(sentence.tree("tree").unwrap());
        assert_eq!(
            spans,
            vec![
                ("SIMPX".to_owned(), 0, 1),
                ("VF".to_owned(), 0, 0),
                ("NX".to_owned(), 0, 0),
                ("LK".to_owned(), 1, 1),
                ("VXFIN".to_owned(), 1, 1),
            ]
        );
        bio.process_sentence(&mut sentence);
        assert_eq!(
            annotated(&sentence, "TOPF"),
            vec!["B-SIMPX|B-VF|B-NX", "I-SIMPX|B-LK|B-VXFIN", "O"]
        );
        assert_eq!(sentence.tokens()[0].value("TREE"), "_");
    }

    #[test]
    fn missing_tree() {
        let mut sentence = Sentence::from_tokens(
            vec![Token::new("Hallo"), Token::new("!")],
            Default::default(),
        );
        TreeToBio::default().process_sentence(&mut sentence);
        assert_eq!(annotated(&sentence, "TREE"), vec!["O", "O"]);
    }

    #[test]
    fn tree_longer_than_sentence() {
        let mut sentence = sentence("(S (NP (NE Maria)) (VP (VVFIN lacht) (ADV laut)))");
        let tree = sentence.remove_tree("tree").unwrap();
        let mut short = Sentence::from_tokens(
            sentence.tokens()[..2].iter().cloned(),
            Default::default(),
        );
        short.set_tree("tree", tree);
        TreeToBio::default().process_sentence(&mut short);
        assert_eq!(annotated(&short, "TREE"), vec!["B-NP", "O"]);
    }

    #[test]
    fn process_document() {
        let mut doc = Document::new("test.txt");
        doc.add_sentence(sentence("(S (NE Maria) (VVFIN lacht))"));
        doc.add_sentence(Sentence::from_tokens(
            vec![Token::new("Hallo")],
            Default::default(),
        ));
        TreeToBio::default().process(&mut doc).unwrap();
        assert_eq!(annotated(&doc.sentences()[0], "TREE"), vec!["B-S", "I-S"]);
        assert_eq!(annotated(&doc.sentences()[1], "TREE"), vec!["O"]);
    }
}
