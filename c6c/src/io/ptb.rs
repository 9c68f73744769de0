use std::io::{BufRead, Lines, Write};

use failure::Error;
use pest::iterators::Pair;
use pest::Parser;
use petgraph::prelude::{NodeIndex, StableGraph};

use crate::document::DEFAULT_TREE;
use crate::io::{ReadTree, WriteTree};
use crate::pipeline::{Export, Import};
use crate::{Document, Node, NonTerminal, Sentence, Terminal, Token, Tree};

/// Bracket notation of the tree without children.
pub static EMPTY_TREE: &str = "(VROOT)";

static PUNCT_NOTATION: &[(&str, &str)] = &[("$(", "KLAMMER"), ("$.", "PUNKT"), ("$,", "KOMMA")];

/// Bracket notation of a part-of-speech tag.
///
/// Punctuation tags are renamed, remaining parentheses become `"LBR"` and `"RBR"`.
pub fn escape_pos(pos: &str) -> String {
    PUNCT_NOTATION
        .iter()
        .find(|(tag, _)| *tag == pos)
        .map(|(_, notation)| (*notation).to_owned())
        .unwrap_or_else(|| escape_form(pos))
}

/// Inverse of `escape_pos`.
pub fn unescape_pos(pos: &str) -> String {
    PUNCT_NOTATION
        .iter()
        .find(|(_, notation)| *notation == pos)
        .map(|(tag, _)| (*tag).to_owned())
        .unwrap_or_else(|| unescape_form(pos))
}

/// Replace parentheses in a token form by `"LBR"` and `"RBR"`.
pub fn escape_form(form: &str) -> String {
    form.replace('(', "LBR").replace(')', "RBR")
}

/// Inverse of `escape_form`.
pub fn unescape_form(form: &str) -> String {
    form.replace("LBR", "(").replace("RBR", ")")
}

/// `PTBFormat`
///
/// Both formats read the same notation: nodes are `(CAT CHILDREN)` or
/// `(CAT:LABEL CHILDREN)`, terminals `(POS FORM)` or `(POS:LABEL FORM)`.
/// Edge labels default to `"--"`. The formats differ in how trees are written.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PTBFormat {
    /// Labeled Format.
    ///
    /// Every node is written with category and edge label, child nodes are not
    /// separated, e.g. `"(SIMPX:--(NX:ON(NE:HD Maria))(VXFIN:HD(VVFIN:HD lacht)))"`.
    Labeled,
    /// Simple Format.
    ///
    /// Every node is written with its simple category, i.e. the notation it was
    /// read with, child nodes are separated by a space,
    /// e.g. `"(SIMPX (NX:ON (NE Maria)) (VXFIN (VVFIN lacht)))"`.
    Simple,
}

// dummy struct required by pest
#[derive(Parser)]
#[grammar = "io/ptb.pest"]
struct PTBParser;

impl ReadTree for PTBFormat {
    fn string_to_tree(&self, string: &str) -> Result<Option<Tree>, Error> {
        let string = string.trim();
        if string.is_empty() || string == EMPTY_TREE {
            return Ok(None);
        }

        let mut graph = StableGraph::new();
        let mut parsed_line = PTBParser::parse(Rule::tree, string)?;
        let node = parsed_line
            .next()
            .ok_or_else(|| format_err!("No tree in '{}'", string))?;
        let root = parse_value(node, &mut graph)?;
        let mut tree = Tree::from_graph(graph, root);
        tree.reindex_terminals();
        Ok(Some(tree))
    }
}

impl WriteTree for PTBFormat {
    fn tree_to_string(&self, tree: &Tree) -> String {
        self.format_sub_tree(tree, tree.root())
    }
}

impl PTBFormat {
    fn format_sub_tree(&self, tree: &Tree, position: NodeIndex) -> String {
        match &tree[position] {
            Node::Terminal(terminal) => {
                // pruned terminals
                if terminal.simple_cat().is_empty() {
                    return String::new();
                }
                self.fmt_term(terminal)
            }
            Node::NonTerminal(nt) => {
                let children = tree
                    .children(position)
                    .into_iter()
                    .map(|child| self.format_sub_tree(tree, child))
                    .filter(|child| !child.is_empty())
                    .collect::<Vec<_>>();
                match self {
                    PTBFormat::Labeled => {
                        format!("({}:{}{})", nt.cat(), nt.label(), children.join(""))
                    }
                    PTBFormat::Simple if children.is_empty() => format!("({})", nt.simple_cat()),
                    PTBFormat::Simple => {
                        format!("({} {})", nt.simple_cat(), children.join(" "))
                    }
                }
            }
        }
    }

    fn fmt_term(&self, terminal: &Terminal) -> String {
        let form = escape_form(terminal.form());
        match self {
            PTBFormat::Labeled => format!(
                "({}:{} {})",
                escape_pos(terminal.pos()),
                terminal.label(),
                form
            ),
            PTBFormat::Simple => format!("({} {})", terminal.simple_cat(), form),
        }
    }
}

impl Tree {
    /// Read a tree from bracket notation.
    ///
    /// Returns `Ok(None)` for the empty string and `"(VROOT)"`, `Error` for
    /// malformed input.
    pub fn from_ptb_string(string: &str) -> Result<Option<Tree>, Error> {
        PTBFormat::Labeled.string_to_tree(string)
    }

    /// Write the tree in bracket notation.
    ///
    /// With `include_labels`, nodes are written as `CAT:LABEL`, otherwise with
    /// their simple category.
    pub fn to_ptb_string(&self, include_labels: bool) -> String {
        if include_labels {
            PTBFormat::Labeled.tree_to_string(self)
        } else {
            PTBFormat::Simple.tree_to_string(self)
        }
    }
}

// this method traverses the linearized tree and builds a StableGraph
fn parse_value(pair: Pair<Rule>, g: &mut StableGraph<Node, usize>) -> Result<NodeIndex, Error> {
    match pair.as_rule() {
        Rule::nonterminal => {
            let mut pairs = pair.into_inner();
            // first rule after matching nonterminal will always be the label of the inner node
            let notation = next_inner(&mut pairs, Rule::node_label)?;
            let (cat, label) = split_label(notation);
            let nt_idx = g.add_node(Node::NonTerminal(NonTerminal::new(cat, label)));
            for (position, inner_pair) in pairs.enumerate() {
                let child_idx = parse_value(inner_pair, g)?;
                g.add_edge(nt_idx, child_idx, position);
            }
            Ok(nt_idx)
        }
        Rule::preterminal => {
            let mut pairs = pair.into_inner();
            let notation = next_inner(&mut pairs, Rule::node_label)?;
            let form = next_inner(&mut pairs, Rule::terminal)?;
            let (pos, label) = split_label(notation);

            let mut token = Token::new(unescape_form(form));
            token.set_xpos(unescape_pos(pos));
            let terminal = Terminal::with_simple_cat(token, label, notation.to_owned());
            Ok(g.add_node(Node::Terminal(terminal)))
        }
        rule => Err(format_err!(
            "Expected node, got {:?}: '{}'",
            rule,
            pair.as_str()
        )),
    }
}

fn next_inner<'a>(
    pairs: &mut pest::iterators::Pairs<'a, Rule>,
    rule: Rule,
) -> Result<&'a str, Error> {
    match pairs.next() {
        Some(pair) if pair.as_rule() == rule => Ok(pair.as_str()),
        Some(pair) => Err(format_err!(
            "Expected {:?}, got {:?}: '{}'",
            rule,
            pair.as_rule(),
            pair.as_str()
        )),
        None => Err(format_err!("Expected {:?}", rule)),
    }
}

// CAT:LABEL is split on the first colon
fn split_label(notation: &str) -> (&str, Option<&str>) {
    match notation.find(':') {
        Some(idx) => (&notation[..idx], Some(&notation[idx + 1..])),
        None => (notation, None),
    }
}

/// Iterator over the trees in a file with one bracketed tree per line.
///
/// Empty lines and `"(VROOT)"` are skipped.
pub struct PTBReader<R> {
    inner: Lines<R>,
    line_no: usize,
}

impl<R> PTBReader<R>
where
    R: BufRead,
{
    /// Constructs a new tree iterator.
    pub fn new(read: R) -> Self {
        PTBReader {
            inner: read.lines(),
            line_no: 0,
        }
    }
}

impl<R> Iterator for PTBReader<R>
where
    R: BufRead,
{
    type Item = Result<Tree, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(line) = self.inner.next() {
            self.line_no += 1;
            let line = match line {
                Ok(line) => line,
                Err(err) => return Some(Err(err.into())),
            };
            match PTBFormat::Labeled.string_to_tree(&line) {
                Ok(Some(tree)) => return Some(Ok(tree)),
                Ok(None) => continue,
                Err(err) => {
                    return Some(Err(format_err!(
                        "Malformed tree in line {}: {}",
                        self.line_no,
                        err
                    )))
                }
            }
        }
        None
    }
}

/// Importer for files with one bracketed tree per line.
///
/// Each tree becomes a sentence whose tokens are the tree's terminals. The tree
/// is attached as `"tree"`.
#[derive(Clone, Copy, Debug, Default)]
pub struct PTBImporter;

impl Import for PTBImporter {
    fn import(&self, read: &mut dyn BufRead, filename: &str) -> Result<Document, Error> {
        let mut doc = Document::new(filename);
        for tree in PTBReader::new(read) {
            doc.add_sentence(Sentence::from_tree(tree?));
        }
        Ok(doc)
    }
}

/// Exporter writing each sentence's tree on its own line.
///
/// Sentences without tree are skipped.
#[derive(Clone, Debug)]
pub struct PTBExporter {
    tree: String,
    format: PTBFormat,
}

impl Default for PTBExporter {
    fn default() -> Self {
        PTBExporter::new(DEFAULT_TREE, PTBFormat::Labeled)
    }
}

impl PTBExporter {
    pub fn new(tree: impl Into<String>, format: PTBFormat) -> Self {
        PTBExporter {
            tree: tree.into(),
            format,
        }
    }
}

impl Export for PTBExporter {
    fn extension(&self) -> &str {
        "txt"
    }

    fn export(&self, doc: &Document, write: &mut dyn Write) -> Result<(), Error> {
        for sentence in doc {
            match sentence.tree(&self.tree) {
                Some(tree) => writeln!(write, "{}", self.format.tree_to_string(tree))?,
                None => warn!(
                    "No tree for sentence {} in file {}",
                    sentence.sent_id(),
                    doc.filename()
                ),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::io::{BufReader, Cursor};

    use crate::io::{PTBExporter, PTBFormat, PTBImporter, PTBReader, ReadTree, WriteTree};
    use crate::pipeline::{Export, Import};
    use crate::{Node, Tree};

    fn cats_and_labels(tree: &Tree) -> Vec<(String, String)> {
        tree.preorder(tree.root())
            .map(|node| (tree[node].cat().to_owned(), tree[node].label().to_owned()))
            .collect()
    }

    fn forms(tree: &Tree) -> Vec<String> {
        tree.terminals()
            .map(|t| tree[t].terminal().unwrap().form().to_owned())
            .collect()
    }

    #[test]
    fn empty_and_vroot() {
        assert!(PTBFormat::Labeled.string_to_tree("").unwrap().is_none());
        assert!(PTBFormat::Labeled.string_to_tree("  ").unwrap().is_none());
        assert!(Tree::from_ptb_string("(VROOT)").unwrap().is_none());
    }

    #[test]
    fn labels_default() {
        let tree = Tree::from_ptb_string("(SIMPX (NX:ON (NE Maria)) (VXFIN (VVFIN lacht)))")
            .unwrap()
            .unwrap();
        let root = tree.root();
        assert_eq!(tree[root].cat(), "SIMPX");
        assert_eq!(tree[root].label(), "--");
        assert_eq!(tree[root].simple_cat(), "SIMPX");
        let nx = tree.children(root)[0];
        assert_eq!(tree[nx].cat(), "NX");
        assert_eq!(tree[nx].label(), "ON");
        assert_eq!(tree[nx].simple_cat(), "NX:ON");
        assert_eq!(forms(&tree), vec!["Maria", "lacht"]);
    }

    #[test]
    fn terminal_ids() {
        let tree = Tree::from_ptb_string(
            "(VROOT:--(SIMPX:--(VF:--(NX:ON(ART:-- Der)(NN:HD Hund)))(LK:--(VXFIN:HD(VVFIN:HD bellt))))(PUNKT:-- .))",
        )
        .unwrap()
        .unwrap();
        let ids = tree
            .terminals()
            .map(|t| tree[t].terminal().unwrap().token().id().to_owned())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["1", "2", "3", "4"]);
        assert_eq!(tree.n_terminals(), 4);
    }

    #[test]
    fn punctuation_round_trip() {
        let input = "(KLAMMER:-- LBR)";
        let tree = Tree::from_ptb_string(input).unwrap().unwrap();
        let terminal = tree[tree.root()].terminal().unwrap();
        assert_eq!(terminal.pos(), "$(");
        assert_eq!(terminal.form(), "(");
        assert_eq!(tree.to_ptb_string(true), input);
        assert_eq!(tree.to_ptb_string(false), input);

        let tree = Tree::from_ptb_string("(S (KOMMA ,) (PUNKT .) (KLAMMER RBR))")
            .unwrap()
            .unwrap();
        let pos = tree
            .terminals()
            .map(|t| tree[t].cat().to_owned())
            .collect::<Vec<_>>();
        assert_eq!(pos, vec!["$,", "$.", "$("]);
        assert_eq!(forms(&tree), vec![",", ".", ")"]);
        assert_eq!(
            tree.to_ptb_string(true),
            "(S:--(KOMMA:-- ,)(PUNKT:-- .)(KLAMMER:-- RBR))"
        );
    }

    #[test]
    fn labeled_round_trip() {
        let input = "(VROOT:--(SIMPX:--(NX:ON(NE:HD Maria)(NE:-- von Trapp))(VXFIN:HD(VVFIN:HD singt)))(PUNKT:-- .))";
        let tree = Tree::from_ptb_string(input).unwrap().unwrap();
        assert_eq!(forms(&tree)[1], "von Trapp");
        let string = tree.to_ptb_string(true);
        assert_eq!(string, input);

        let reread = Tree::from_ptb_string(&string).unwrap().unwrap();
        assert_eq!(cats_and_labels(&tree), cats_and_labels(&reread));
        assert_eq!(forms(&tree), forms(&reread));
        assert_eq!(tree, reread);
    }

    #[test]
    fn simple_round_trip() {
        let input = "(VROOT (SIMPX:-- (NX:ON (NE Maria)) (VXFIN (VVFIN lacht))) (PUNKT .))";
        let tree = PTBFormat::Simple.string_to_tree(input).unwrap().unwrap();
        assert_eq!(PTBFormat::Simple.tree_to_string(&tree), input);

        // parsing the labeled serialization keeps categories and labels
        let labeled = tree.to_ptb_string(true);
        let reread = Tree::from_ptb_string(&labeled).unwrap().unwrap();
        assert_eq!(cats_and_labels(&tree), cats_and_labels(&reread));
        assert_eq!(forms(&tree), forms(&reread));
    }

    #[test]
    fn pruned_terminals() {
        let mut tree = Tree::from_ptb_string("(S:--(NE:SB Maria)(VVFIN:HD lacht)(PUNKT:-- .))")
            .unwrap()
            .unwrap();
        let punct = tree.terminals().last().unwrap();
        tree[punct].set_simple_cat("");
        assert_eq!(tree.to_ptb_string(true), "(S:--(NE:SB Maria)(VVFIN:HD lacht))");
        // simple categories keep the notation the tree was read with
        assert_eq!(tree.to_ptb_string(false), "(S:-- (NE:SB Maria) (VVFIN:HD lacht))");

        let mut tree = PTBFormat::Simple
            .string_to_tree("(S (NE Maria) (VVFIN lacht) (PUNKT .))")
            .unwrap()
            .unwrap();
        let punct = tree.terminals().last().unwrap();
        tree[punct].set_simple_cat("");
        assert_eq!(tree.to_ptb_string(false), "(S (NE Maria) (VVFIN lacht))");
    }

    #[test]
    fn single_terminal() {
        let input = "(T t)";
        let t = PTBFormat::Simple.string_to_tree(input).unwrap().unwrap();
        assert!(t[t.root()].is_terminal());
        assert_eq!(input, PTBFormat::Simple.tree_to_string(&t))
    }

    #[test]
    fn whitespace_variants() {
        let tree = Tree::from_ptb_string(" (NX (DET a ) (ADJ single)\t(NX line)) ")
            .unwrap()
            .unwrap();
        assert_eq!(forms(&tree), vec!["a", "single", "line"]);
        match &tree[tree.children(tree.root())[0]] {
            Node::Terminal(t) => assert_eq!(t.pos(), "DET"),
            Node::NonTerminal(_) => panic!("Expected terminal"),
        }
    }

    #[test]
    #[should_panic]
    pub fn closed_too_early() {
        let l = "(ROOT (FIRST (TERM1 t1) (TERM2 t2)) (SEC:label (TERM1 t1)))) (TERM t))";
        Tree::from_ptb_string(l).unwrap();
    }

    #[test]
    #[should_panic]
    pub fn missing_par() {
        let l = "(ROOT (FIRST (TERM1 t1) (TERM2 t2)) (SEC:label (TERM1 t1)) (TERM t)";
        Tree::from_ptb_string(l).unwrap();
    }

    #[test]
    #[should_panic]
    pub fn second_tree() {
        let l = "(ROOT (TERM t)) (ROOT (Second tree))";
        Tree::from_ptb_string(l).unwrap();
    }

    #[test]
    #[should_panic]
    pub fn illegal_char() {
        // parenthesis as terminal in TERM1 node
        let l = "(ROOT (FIRST (TERM1 () (TERM2 t2)) (SEC:label (TERM1 t1)) (TERM t))";
        Tree::from_ptb_string(l).unwrap();
    }

    #[test]
    #[should_panic]
    pub fn empty_node() {
        Tree::from_ptb_string("(ROOT (NX))").unwrap();
    }

    #[test]
    fn reader_skips_empty_lines() {
        let input = "(S:--(NE:SB Maria)(VVFIN:HD lacht))\n\n(VROOT)\n(NN:-- Hund)\n";
        let trees = PTBReader::new(Cursor::new(input))
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(trees.len(), 2);
        assert_eq!(trees[1].n_terminals(), 1);

        let mut reader = PTBReader::new(Cursor::new("(S:--(NE:SB Maria)\n"));
        let err = reader.next().unwrap().unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn import_export() {
        let mut read = BufReader::new(File::open("testdata/tueba.ptb").unwrap());
        let doc = PTBImporter.import(&mut read, "tueba.ptb").unwrap();
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.sentences()[0].sent_id(), "1");
        assert_eq!(doc.sentences()[1].sent_id(), "2");
        let first = &doc.sentences()[0];
        assert_eq!(first.tokens()[0].form(), "Die");
        assert_eq!(first.tokens()[0].id(), "1");
        assert_eq!(first.tokens().last().unwrap().xpos(), "$.");

        let mut out = Vec::new();
        PTBExporter::default().export(&doc, &mut out).unwrap();
        let expected = std::fs::read_to_string("testdata/tueba.ptb").unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }
}
