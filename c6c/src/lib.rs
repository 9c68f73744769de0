#[macro_use]
extern crate failure;

#[macro_use]
extern crate log;

#[macro_use]
extern crate pest_derive;

mod bio;
pub use bio::{TreeToBio, DEFAULT_ANNOTATION};

pub mod config;
pub use config::{PipelineConfig, TomlRead};

pub mod dependency;
pub use dependency::{DepGraph, DependencyManipulator, DependencyProcessor, Head};

mod document;
pub use document::{Document, Sentence, Token, DEFAULT_TREE};

mod fields;
pub use fields::{Fields, EMPTY_VALUE};

pub mod io;
pub use io::{PTBFormat, ReadTree, WriteTree};

mod node;
pub use node::{Node, NonTerminal, Terminal, DEFAULT_LABEL};

pub mod pipeline;
pub use pipeline::{collect_files, ConversionReport, Export, Import, Pipeline};

pub mod processor;
pub use processor::{Processor, Reindexer, TagMapper};

mod tree;
pub use tree::{Preorder, Tree};

pub mod util;
