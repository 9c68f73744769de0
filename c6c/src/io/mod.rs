mod conllup;
pub use conllup::{CONLLUPlusExporter, CONLLUPlusImporter, GLOBAL_COLUMNS, PTB_STRING};

mod conllx;
pub use self::conllx::{CONLLXExporter, CONLLXImporter, FromConllx, ToConllx};

pub(crate) mod ptb;
pub use ptb::{
    escape_form, escape_pos, unescape_form, unescape_pos, PTBExporter, PTBFormat, PTBImporter,
    PTBReader,
};

use failure::Error;

use crate::Tree;

/// Trait to read a `Tree` from its string representation.
pub trait ReadTree {
    /// Parse a single tree.
    ///
    /// Returns `Ok(None)` if the string does not contain a tree and `Error` if it is malformed.
    fn string_to_tree(&self, string: &str) -> Result<Option<Tree>, Error>;
}

/// Trait to get the string representation of a `Tree`.
pub trait WriteTree {
    fn tree_to_string(&self, tree: &Tree) -> String;
}
