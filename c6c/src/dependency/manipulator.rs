use std::collections::HashSet;

use failure::Error;

use super::{DepGraph, DependencyProcessor, Head};
use crate::processor::Processor;
use crate::util::LabelSet;
use crate::{Document, Sentence, Token};

static COPULA_KEPT: &[&str] = &[
    "amod",
    "case",
    "det",
    "det:neg",
    "nmod:poss",
    "nmod",
    "fixed",
    "appos",
    "flat",
    "flat:foreign",
    "nummod",
];

static AUX_REASSIGNED: &[&str] = &[
    "nsubj",
    "nsubj:pass",
    "advmod:neg",
    "conj",
    "cc",
    "mark",
    "case",
];

fn label_set(labels: &[&str]) -> HashSet<String> {
    labels.iter().map(|&label| label.to_owned()).collect()
}

/// Rewrites UD style dependency structures.
///
/// Function words become heads of their phrases. The rewrites are applied
/// in a fixed order:
///
/// 1. copulas replace their predicate, which becomes a `pred` dependent,
/// 2. auxiliaries replace their verb, forming an `oc` chain down to the verb,
/// 3. adpositions replace their governor, which becomes an `nk` dependent,
/// 4. coordinating conjunctions replace the conjunct they depend on,
/// 5. the last `flat` dependent replaces its governor.
///
/// `HEAD` and `DEPREL` of the tokens are changed in place.
#[derive(Clone, Debug)]
pub struct DependencyManipulator {
    copula_reassign: LabelSet,
    aux_reassign: LabelSet,
}

impl Default for DependencyManipulator {
    fn default() -> Self {
        DependencyManipulator {
            copula_reassign: LabelSet::Negative(label_set(COPULA_KEPT)),
            aux_reassign: LabelSet::Positive(label_set(AUX_REASSIGNED)),
        }
    }
}

impl DependencyManipulator {
    /// Construct a manipulator with custom label sets.
    ///
    /// Dependents of a predicate whose relation matches `copula_reassign` are
    /// attached to the copula. Dependents of a verb whose relation matches
    /// `aux_reassign` are attached to the head auxiliary.
    pub fn new(copula_reassign: LabelSet, aux_reassign: LabelSet) -> Self {
        DependencyManipulator {
            copula_reassign,
            aux_reassign,
        }
    }

    /// Rewrite the dependency structure of `sentence`.
    ///
    /// Returns the graph after all rewrites.
    pub fn process_sentence(&self, sentence: &mut Sentence) -> DepGraph {
        let graph = DependencyProcessor.process_sentence(sentence);
        let mut rewriter = Rewriter { sentence, graph };
        self.invert_copulas(&mut rewriter);
        self.invert_auxiliaries(&mut rewriter);
        invert_adpositions(&mut rewriter);
        invert_coordinations(&mut rewriter);
        invert_flat(&mut rewriter);
        rewriter.graph
    }

    fn invert_copulas(&self, rw: &mut Rewriter) {
        for copula in rw.select(|token| token.deprel() == "cop") {
            let pred = match rw.graph.head(copula) {
                Head::Token(pred) => pred,
                _ => {
                    rw.skip("copula", copula);
                    continue;
                }
            };

            let dependents = rw.dependents(pred, |token| {
                self.copula_reassign.matches(token.deprel())
            });
            for dependent in dependents.into_iter().filter(|&dep| dep != copula) {
                rw.attach(dependent, copula);
            }
            rw.replace(copula, pred);
            rw.attach(pred, copula);
            rw.set_deprel(pred, "pred");
        }
    }

    fn invert_auxiliaries(&self, rw: &mut Rewriter) {
        let verbs = rw.governors(is_aux);
        for verb in verbs {
            let mut auxiliaries = rw.dependents(verb, is_aux);
            if auxiliaries.is_empty() {
                rw.skip("auxiliary chain", verb);
                continue;
            }

            let finite = auxiliaries
                .iter()
                .position(|&aux| rw.token(aux).xpos().ends_with("FIN"))
                .unwrap_or(0);
            let mut head_aux = auxiliaries.remove(finite);

            let dependents =
                rw.dependents(verb, |token| self.aux_reassign.matches(token.deprel()));
            for dependent in dependents {
                rw.attach(dependent, head_aux);
            }
            rw.replace(head_aux, verb);

            for aux in auxiliaries.into_iter().rev() {
                rw.attach(aux, head_aux);
                rw.set_deprel(aux, "oc");
                head_aux = aux;
            }
            rw.attach(verb, head_aux);
            rw.set_deprel(verb, "oc");
        }
    }
}

impl Processor for DependencyManipulator {
    fn process(&self, doc: &mut Document) -> Result<(), Error> {
        for sentence in doc.sentences_mut() {
            self.process_sentence(sentence);
        }
        Ok(())
    }
}

fn is_aux(token: &Token) -> bool {
    token.deprel().starts_with("aux")
}

fn is_adposition(token: &Token) -> bool {
    token.deprel() == "case" && token.xpos().starts_with("AP")
}

fn invert_adpositions(rw: &mut Rewriter) {
    for governor in rw.governors(is_adposition) {
        let mut adpositions = rw.dependents(governor, is_adposition);
        let new_head = match adpositions.pop() {
            Some(new_head) => new_head,
            None => {
                rw.skip("adposition", governor);
                continue;
            }
        };

        let circumpositions = rw.dependents(governor, |token| {
            token.deprel() == "fixed" && token.xpos() == "APZR"
        });
        for dependent in circumpositions.into_iter().chain(adpositions) {
            rw.attach(dependent, new_head);
            rw.set_deprel(dependent, "ac");
        }
        rw.replace(new_head, governor);
        rw.attach(governor, new_head);
        rw.set_deprel(governor, "nk");
    }
}

fn invert_coordinations(rw: &mut Rewriter) {
    for conjunct in rw.select(|token| token.deprel() == "conj") {
        let conjunctions = rw.dependents(conjunct, |token| token.deprel() == "cc");
        let (&new_head, rest) = match conjunctions.split_first() {
            Some(split) => split,
            None => continue,
        };

        for &conjunction in rest {
            rw.attach(conjunction, new_head);
        }
        rw.replace(new_head, conjunct);
        rw.attach(conjunct, new_head);
    }
}

fn invert_flat(rw: &mut Rewriter) {
    let is_flat = |token: &Token| token.deprel() == "flat";
    for governor in rw.governors(is_flat) {
        let new_head = match rw.dependents(governor, is_flat).last() {
            Some(&new_head) => new_head,
            None => {
                rw.skip("flat", governor);
                continue;
            }
        };

        let dependents = rw.dependents(governor, |_| true);
        for dependent in dependents.into_iter().filter(|&dep| dep != new_head) {
            rw.attach(dependent, new_head);
        }
        rw.replace(new_head, governor);
        rw.attach(governor, new_head);
        rw.set_deprel(governor, "flat");
    }
}

// Keeps the HEAD layer and the graph in sync.
struct Rewriter<'a> {
    sentence: &'a mut Sentence,
    graph: DepGraph,
}

impl<'a> Rewriter<'a> {
    fn token(&self, idx: usize) -> &Token {
        &self.sentence.tokens()[idx]
    }

    /// Positions of all tokens matching `predicate`.
    fn select(&self, predicate: impl Fn(&Token) -> bool) -> Vec<usize> {
        self.sentence
            .iter()
            .enumerate()
            .filter(|(_, token)| predicate(token))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Positions of all tokens with at least one dependent matching `predicate`.
    fn governors(&self, predicate: impl Fn(&Token) -> bool) -> Vec<usize> {
        (0..self.graph.len())
            .filter(|&idx| {
                self.graph
                    .dependents(idx)
                    .iter()
                    .any(|&dep| predicate(self.token(dep)))
            })
            .collect()
    }

    /// Dependents of `head` matching `predicate` in sentence order.
    fn dependents(&self, head: usize, predicate: impl Fn(&Token) -> bool) -> Vec<usize> {
        self.graph
            .dependents(head)
            .iter()
            .cloned()
            .filter(|&dep| predicate(self.token(dep)))
            .collect()
    }

    fn attach(&mut self, dependent: usize, head: usize) {
        let head_id = self.token(head).id().to_owned();
        self.sentence.tokens_mut()[dependent].set_head(head_id);
        self.graph.set_head(dependent, Head::Token(head));
    }

    /// `new_head` takes over head and relation of `old_head`.
    fn replace(&mut self, new_head: usize, old_head: usize) {
        let head = self.token(old_head).head().to_owned();
        let deprel = self.token(old_head).deprel().to_owned();
        let token = &mut self.sentence.tokens_mut()[new_head];
        token.set_head(head);
        token.set_deprel(deprel);
        let graph_head = self.graph.head(old_head);
        self.graph.set_head(new_head, graph_head);
    }

    fn set_deprel(&mut self, idx: usize, deprel: &str) {
        self.sentence.tokens_mut()[idx].set_deprel(deprel);
    }

    fn skip(&self, rewrite: &str, idx: usize) {
        debug!(
            "Sentence {}: skipping {} rewrite at token {}",
            self.sentence.sent_id(),
            rewrite,
            self.token(idx).id()
        );
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use crate::dependency::{DepGraph, DependencyManipulator, Head};
    use crate::processor::Processor;
    use crate::util::LabelSet;
    use crate::{Document, Sentence, Token};

    fn sentence(tokens: &[(&str, &str, &str, &str)]) -> Sentence {
        let tokens = tokens
            .iter()
            .enumerate()
            .map(|(idx, &(form, head, deprel, xpos))| {
                vec![
                    ("ID", (idx + 1).to_string()),
                    ("FORM", form.to_owned()),
                    ("XPOS", xpos.to_owned()),
                    ("HEAD", head.to_owned()),
                    ("DEPREL", deprel.to_owned()),
                ]
                .into_iter()
                .collect::<Token>()
            });
        Sentence::from_tokens(tokens, Default::default())
    }

    fn heads(sentence: &Sentence) -> Vec<(&str, &str)> {
        sentence
            .iter()
            .map(|token| (token.head(), token.deprel()))
            .collect()
    }

    #[test]
    fn copula() {
        let mut sentence = sentence(&[
            ("Maria", "3", "nsubj", "NE"),
            ("ist", "3", "cop", "VAFIN"),
            ("Lehrerin", "0", "root", "NN"),
        ]);
        let graph = DependencyManipulator::default().process_sentence(&mut sentence);
        assert_eq!(
            heads(&sentence),
            vec![("2", "nsubj"), ("0", "root"), ("2", "pred")]
        );
        assert_eq!(graph.roots(), &[1]);
        assert_eq!(graph.dependents(1), &[0, 2]);
    }

    #[test]
    fn copula_keeps_excluded() {
        let mut sentence = sentence(&[
            ("Maria", "4", "nsubj", "NE"),
            ("ist", "4", "cop", "VAFIN"),
            ("eine", "4", "det", "ART"),
            ("Lehrerin", "0", "root", "NN"),
            (".", "4", "punct", "$."),
        ]);
        DependencyManipulator::default().process_sentence(&mut sentence);
        assert_eq!(
            heads(&sentence),
            vec![
                ("2", "nsubj"),
                ("0", "root"),
                ("4", "det"),
                ("2", "pred"),
                ("2", "punct")
            ]
        );
    }

    #[test]
    fn copula_without_head() {
        let input = [
            ("ist", "0", "cop", "VAFIN"),
            ("so", "_", "cop", "ADV"),
            ("gut", "9", "cop", "ADJD"),
        ];
        let mut sentence = sentence(&input);
        DependencyManipulator::default().process_sentence(&mut sentence);
        assert_eq!(
            heads(&sentence),
            vec![("0", "cop"), ("_", "cop"), ("9", "cop")]
        );
    }

    #[test]
    fn custom_copula_set() {
        let mut sentence = sentence(&[
            ("Maria", "3", "nsubj", "NE"),
            ("ist", "3", "cop", "VAFIN"),
            ("Lehrerin", "0", "root", "NN"),
        ]);
        let keep = vec!["nsubj".to_owned()].into_iter().collect::<HashSet<_>>();
        let manipulator = DependencyManipulator::new(
            LabelSet::Negative(keep),
            LabelSet::Positive(HashSet::new()),
        );
        manipulator.process_sentence(&mut sentence);
        assert_eq!(sentence.tokens()[0].head(), "3");
    }

    #[test]
    fn auxiliary() {
        let mut sentence = sentence(&[
            ("Er", "3", "nsubj", "PPER"),
            ("hat", "3", "aux", "VAFIN"),
            ("gelacht", "0", "root", "VVPP"),
            (".", "3", "punct", "$."),
        ]);
        DependencyManipulator::default().process_sentence(&mut sentence);
        assert_eq!(
            heads(&sentence),
            vec![("2", "nsubj"), ("0", "root"), ("2", "oc"), ("3", "punct")]
        );
    }

    #[test]
    fn auxiliary_chain() {
        let mut sentence = sentence(&[
            ("Er", "3", "nsubj", "PPER"),
            ("wird", "3", "aux", "VAFIN"),
            ("gelacht", "0", "root", "VVPP"),
            ("haben", "3", "aux", "VAINF"),
        ]);
        DependencyManipulator::default().process_sentence(&mut sentence);
        assert_eq!(
            heads(&sentence),
            vec![("2", "nsubj"), ("0", "root"), ("4", "oc"), ("2", "oc")]
        );
    }

    #[test]
    fn auxiliary_without_finite() {
        let mut sentence = sentence(&[
            ("gelacht", "0", "root", "VVPP"),
            ("worden", "1", "aux:pass", "VAPP"),
            ("sein", "1", "aux", "VAINF"),
            ("nicht", "1", "advmod:neg", "PTKNEG"),
        ]);
        DependencyManipulator::default().process_sentence(&mut sentence);
        assert_eq!(
            heads(&sentence),
            vec![("3", "oc"), ("0", "root"), ("2", "oc"), ("2", "advmod:neg")]
        );
    }

    #[test]
    fn adposition() {
        let mut sentence = sentence(&[
            ("Maria", "2", "nsubj", "NE"),
            ("lacht", "0", "root", "VVFIN"),
            ("über", "5", "case", "APPR"),
            ("den", "5", "det", "ART"),
            ("Hund", "2", "obl", "NN"),
        ]);
        DependencyManipulator::default().process_sentence(&mut sentence);
        assert_eq!(
            heads(&sentence),
            vec![
                ("2", "nsubj"),
                ("0", "root"),
                ("2", "obl"),
                ("5", "det"),
                ("3", "nk")
            ]
        );
    }

    #[test]
    fn circumposition() {
        let mut sentence = sentence(&[
            ("bis", "4", "case", "APPR"),
            ("zu", "4", "case", "APPRART"),
            ("dem", "4", "det", "ART"),
            ("Haus", "0", "root", "NN"),
            ("hin", "4", "fixed", "APZR"),
        ]);
        DependencyManipulator::default().process_sentence(&mut sentence);
        assert_eq!(
            heads(&sentence),
            vec![
                ("2", "ac"),
                ("0", "root"),
                ("4", "det"),
                ("2", "nk"),
                ("2", "ac")
            ]
        );
    }

    #[test]
    fn coordination() {
        let mut sentence = sentence(&[
            ("Hund", "0", "root", "NN"),
            ("und", "3", "cc", "KON"),
            ("Katze", "1", "conj", "NN"),
        ]);
        DependencyManipulator::default().process_sentence(&mut sentence);
        assert_eq!(
            heads(&sentence),
            vec![("0", "root"), ("1", "conj"), ("2", "conj")]
        );
    }

    #[test]
    fn coordination_multiple_conjunctions() {
        let mut sentence = sentence(&[
            ("Hund", "0", "root", "NN"),
            ("weder", "4", "cc", "KON"),
            ("noch", "4", "cc", "KON"),
            ("Katze", "1", "conj", "NN"),
            ("Maus", "1", "conj", "NN"),
        ]);
        DependencyManipulator::default().process_sentence(&mut sentence);
        assert_eq!(
            heads(&sentence),
            vec![
                ("0", "root"),
                ("1", "conj"),
                ("2", "cc"),
                ("2", "conj"),
                ("1", "conj")
            ]
        );
    }

    #[test]
    fn flat() {
        let mut sentence = sentence(&[
            ("Angela", "4", "nsubj", "NE"),
            ("Dorothea", "1", "flat", "NE"),
            ("Merkel", "1", "flat", "NE"),
            ("lacht", "0", "root", "VVFIN"),
        ]);
        DependencyManipulator::default().process_sentence(&mut sentence);
        assert_eq!(
            heads(&sentence),
            vec![("3", "flat"), ("3", "flat"), ("4", "nsubj"), ("0", "root")]
        );
    }

    #[test]
    fn tolerates_cycles_and_dangling_heads() {
        let mut sentence = sentence(&[
            ("a", "2", "aux", "VAFIN"),
            ("b", "1", "cop", "VAFIN"),
            ("c", "7", "case", "APPR"),
            ("d", "4", "flat", "NE"),
            ("e", "3", "conj", "NN"),
        ]);
        let graph = DependencyManipulator::default().process_sentence(&mut sentence);
        assert_eq!(graph, DepGraph::from_sentence(&sentence));
        assert_eq!(graph.head(2), Head::Unattached);
    }

    #[test]
    fn graph_matches_heads() {
        let mut sentence = sentence(&[
            ("Maria", "3", "nsubj", "NE"),
            ("ist", "3", "cop", "VAFIN"),
            ("Lehrerin", "0", "root", "NN"),
            ("und", "7", "cc", "KON"),
            ("Peter", "7", "nsubj", "NE"),
            ("hat", "7", "aux", "VAFIN"),
            ("gelacht", "3", "conj", "VVPP"),
            ("mit", "9", "case", "APPR"),
            ("Anna", "7", "obl", "NE"),
            ("Schmidt", "9", "flat", "NE"),
        ]);
        let graph = DependencyManipulator::default().process_sentence(&mut sentence);
        assert_eq!(graph, DepGraph::from_sentence(&sentence));
        // hat heads the conjunct and is itself attached to the conjunction
        assert_eq!(sentence.tokens()[5].head(), "4");
        assert_eq!(sentence.tokens()[3].head(), "2");
        assert_eq!(sentence.tokens()[7].head(), "7");
        assert_eq!(sentence.tokens()[9].head(), "8");
    }

    #[test]
    fn process_document() {
        let mut doc = Document::new("test.conllup");
        doc.add_sentence(sentence(&[
            ("Maria", "3", "nsubj", "NE"),
            ("ist", "3", "cop", "VAFIN"),
            ("Lehrerin", "0", "root", "NN"),
        ]));
        DependencyManipulator::default().process(&mut doc).unwrap();
        assert_eq!(doc.sentences()[0].tokens()[1].head(), "0");
    }
}
