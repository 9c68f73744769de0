//! Dependency structure of sentences.
//!
//! The structure is derived from the `HEAD` layer of the tokens. It is not
//! stored in the sentence and has to be derived again after `HEAD` changes.

mod graph;
pub use graph::{DepGraph, Head};

mod manipulator;
pub use manipulator::DependencyManipulator;

use failure::Error;

use crate::processor::Processor;
use crate::{Document, Sentence};

/// Derives the dependency graph of a sentence.
#[derive(Clone, Copy, Debug, Default)]
pub struct DependencyProcessor;

impl DependencyProcessor {
    /// Derive the `DepGraph` of `sentence`.
    ///
    /// `HEAD == "0"` attaches a token to the root, a `HEAD` equal to the `ID` of a
    /// token in the sentence attaches it to that token. Any other `HEAD` leaves the
    /// token unattached.
    pub fn process_sentence(&self, sentence: &Sentence) -> DepGraph {
        DepGraph::from_sentence(sentence)
    }
}

impl Processor for DependencyProcessor {
    /// Check the dependency structure of all sentences.
    ///
    /// Heads pointing to missing tokens and cycles are logged, the document is
    /// not changed.
    fn process(&self, doc: &mut Document) -> Result<(), Error> {
        for sentence in doc.iter() {
            let graph = self.process_sentence(sentence);
            for (idx, token) in sentence.iter().enumerate() {
                if graph.is_dangling(sentence, idx) {
                    warn!(
                        "{}: sentence {}: head {} of token {} does not exist",
                        doc.filename(),
                        sentence.sent_id(),
                        token.head(),
                        token.id()
                    );
                }
            }
            for cycle in graph.cycles() {
                let ids = cycle
                    .iter()
                    .map(|&idx| sentence.tokens()[idx].id())
                    .collect::<Vec<_>>();
                warn!(
                    "{}: sentence {}: cycle between tokens {}",
                    doc.filename(),
                    sentence.sent_id(),
                    ids.join(", ")
                );
            }
        }
        Ok(())
    }
}
