use std::fmt;
use std::mem;

use crate::io::ptb::escape_pos;
use crate::Token;

/// Edge label of nodes read without one.
pub static DEFAULT_LABEL: &str = "--";

/// Enum representing Nodes in a constituency tree.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Node {
    /// Nonterminal Node.
    NonTerminal(NonTerminal),
    /// Terminal Node.
    Terminal(Terminal),
}

impl Node {
    /// Returns whether a `self` is `Terminal`.
    pub fn is_terminal(&self) -> bool {
        match self {
            Node::Terminal(_) => true,
            Node::NonTerminal(_) => false,
        }
    }

    /// Get a `Option<&Terminal>`.
    ///
    /// Returns `None` if `self` is a `Node::NonTerminal`.
    pub fn terminal(&self) -> Option<&Terminal> {
        match self {
            Node::Terminal(terminal) => Some(terminal),
            Node::NonTerminal(_) => None,
        }
    }

    /// Get a `Option<&mut Terminal>`.
    ///
    /// Returns `None` if `self` is a `Node::NonTerminal`.
    pub fn terminal_mut(&mut self) -> Option<&mut Terminal> {
        match self {
            Node::Terminal(terminal) => Some(terminal),
            Node::NonTerminal(_) => None,
        }
    }

    /// Get a `Option<&NonTerminal>`.
    ///
    /// Returns `None` if `self` is a `Node::Terminal`.
    pub fn nonterminal(&self) -> Option<&NonTerminal> {
        match self {
            Node::Terminal(_) => None,
            Node::NonTerminal(nt) => Some(nt),
        }
    }

    /// Get a `Option<&mut NonTerminal>`.
    ///
    /// Returns `None` if `self` is a `Node::Terminal`.
    pub fn nonterminal_mut(&mut self) -> Option<&mut NonTerminal> {
        match self {
            Node::Terminal(_) => None,
            Node::NonTerminal(nt) => Some(nt),
        }
    }

    /// Get the node's category.
    ///
    /// Returns the part-of-speech for `Terminal`s and the phrase category for `NonTerminal`s.
    pub fn cat(&self) -> &str {
        match self {
            Node::NonTerminal(nt) => nt.cat(),
            Node::Terminal(t) => t.pos(),
        }
    }

    /// Get the label of the edge to the node's parent.
    pub fn label(&self) -> &str {
        match self {
            Node::NonTerminal(nt) => nt.label(),
            Node::Terminal(t) => t.label(),
        }
    }

    /// Set the node's edge label.
    ///
    /// Returns the replaced label.
    pub fn set_label(&mut self, label: impl Into<String>) -> String {
        match self {
            Node::NonTerminal(nt) => nt.set_label(label),
            Node::Terminal(t) => t.set_label(label),
        }
    }

    /// Get the node's simple category.
    pub fn simple_cat(&self) -> &str {
        match self {
            Node::NonTerminal(nt) => nt.simple_cat(),
            Node::Terminal(t) => t.simple_cat(),
        }
    }

    /// Set the node's simple category.
    ///
    /// Returns the replaced value.
    pub fn set_simple_cat(&mut self, simple_cat: impl Into<String>) -> String {
        match self {
            Node::NonTerminal(nt) => mem::replace(&mut nt.simple_cat, simple_cat.into()),
            Node::Terminal(t) => mem::replace(&mut t.simple_cat, simple_cat.into()),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Node::Terminal(terminal) => write!(f, "{}", terminal),
            Node::NonTerminal(nt) => write!(f, "{}", nt),
        }
    }
}

// "cat" or "cat:label", depending on whether the label was given
fn simple_cat(cat: &str, label: Option<&str>) -> String {
    match label {
        Some(label) => format!("{}:{}", cat, label),
        None => cat.to_owned(),
    }
}

/// Struct representing a non terminal tree node.
///
/// `NonTerminal`s are defined by their category, the label of the edge to their
/// parent and their simple category. The simple category keeps the notation the
/// node was read with: `"cat"` if the label was absent, `"cat:label"` otherwise.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NonTerminal {
    cat: String,
    label: String,
    simple_cat: String,
}

impl NonTerminal {
    /// Construct a new `NonTerminal`.
    ///
    /// The edge label defaults to `"--"` if `label` is `None`.
    pub fn new(cat: impl Into<String>, label: Option<&str>) -> Self {
        let cat = cat.into();
        NonTerminal {
            simple_cat: simple_cat(&cat, label),
            label: label.unwrap_or(DEFAULT_LABEL).to_owned(),
            cat,
        }
    }

    /// Return the phrase category.
    pub fn cat(&self) -> &str {
        self.cat.as_str()
    }

    /// Return old category and replace with `cat`.
    pub fn set_cat(&mut self, cat: impl Into<String>) -> String {
        mem::replace(&mut self.cat, cat.into())
    }

    /// Return the edge label.
    pub fn label(&self) -> &str {
        self.label.as_str()
    }

    /// Return old edge label and replace with `label`.
    pub fn set_label(&mut self, label: impl Into<String>) -> String {
        mem::replace(&mut self.label, label.into())
    }

    pub fn simple_cat(&self) -> &str {
        self.simple_cat.as_str()
    }
}

impl fmt::Display for NonTerminal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.cat, self.label)
    }
}

/// Struct representing a Terminal.
///
/// A `Terminal` carries the token it stands for. Its category is the token's
/// `XPOS`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Terminal {
    token: Token,
    label: String,
    simple_cat: String,
}

impl Terminal {
    /// Construct a new `Terminal`.
    ///
    /// The simple category is derived from the token's part-of-speech in
    /// bracket notation, e.g. `"KOMMA"` for `"$,"`.
    pub fn new(token: Token, label: Option<&str>) -> Self {
        Terminal {
            simple_cat: simple_cat(&escape_pos(token.xpos()), label),
            label: label.unwrap_or(DEFAULT_LABEL).to_owned(),
            token,
        }
    }

    pub(crate) fn with_simple_cat(token: Token, label: Option<&str>, simple_cat: String) -> Self {
        Terminal {
            simple_cat,
            label: label.unwrap_or(DEFAULT_LABEL).to_owned(),
            token,
        }
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn token_mut(&mut self) -> &mut Token {
        &mut self.token
    }

    /// Return the `Terminal`s form.
    pub fn form(&self) -> &str {
        self.token.form()
    }

    /// Return part of speech.
    pub fn pos(&self) -> &str {
        self.token.xpos()
    }

    /// Return the edge label.
    pub fn label(&self) -> &str {
        self.label.as_str()
    }

    /// Return old edge label and replace with `label`.
    pub fn set_label(&mut self, label: impl Into<String>) -> String {
        mem::replace(&mut self.label, label.into())
    }

    pub fn simple_cat(&self) -> &str {
        self.simple_cat.as_str()
    }
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.pos(), self.form())
    }
}
