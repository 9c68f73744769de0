use std::fs::File;
use std::io::Read;
use std::path::Path;

use failure::Error;
use serde::Deserialize;

use crate::bio::{TreeToBio, DEFAULT_ANNOTATION};
use crate::dependency::{DependencyManipulator, DependencyProcessor};
use crate::document::DEFAULT_TREE;
use crate::fields::EMPTY_VALUE;
use crate::io::{
    CONLLUPlusExporter, CONLLUPlusImporter, CONLLXExporter, CONLLXImporter, PTBExporter,
    PTBImporter,
};
use crate::pipeline::{Export, Import, Pipeline};
use crate::processor::{Processor, Reindexer, TagMapper};

/// File formats.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
pub enum Format {
    #[serde(rename = "conlluplus")]
    CONLLUPlus,
    #[serde(rename = "conllx")]
    CONLLX,
    #[serde(rename = "ptb")]
    PTB,
}

impl Format {
    pub fn importer(self) -> Box<dyn Import> {
        match self {
            Format::CONLLUPlus => Box::new(CONLLUPlusImporter),
            Format::CONLLX => Box::new(CONLLXImporter),
            Format::PTB => Box::new(PTBImporter),
        }
    }

    pub fn exporter(self) -> Box<dyn Export> {
        match self {
            Format::CONLLUPlus => Box::new(CONLLUPlusExporter),
            Format::CONLLX => Box::new(CONLLXExporter),
            Format::PTB => Box::new(PTBExporter::default()),
        }
    }
}

/// Processor configuration.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProcessorConfig {
    DependencyProcessor,
    DependencyManipulator,
    TreeToBio {
        /// Name of the tree.
        #[serde(default = "default_tree")]
        tree: String,

        /// Token layer of the annotation.
        #[serde(default = "default_annotation")]
        annotation: String,

        #[serde(default = "default_include_root")]
        include_root: bool,
    },
    TagMapper {
        source: String,

        #[serde(default = "default_target")]
        target: String,

        /// Mapping table, relative to the configuration file.
        mapping: String,

        #[serde(default = "default_fallback")]
        fallback: String,
    },
    Reindexer,
}

fn default_tree() -> String {
    DEFAULT_TREE.to_owned()
}

fn default_annotation() -> String {
    DEFAULT_ANNOTATION.to_owned()
}

fn default_include_root() -> bool {
    true
}

fn default_target() -> String {
    "XPOS".to_owned()
}

fn default_fallback() -> String {
    EMPTY_VALUE.to_owned()
}

impl ProcessorConfig {
    /// Construct the processor, mapping tables are read.
    pub fn build(&self) -> Result<Box<dyn Processor>, Error> {
        let processor: Box<dyn Processor> = match self {
            ProcessorConfig::DependencyProcessor => Box::new(DependencyProcessor),
            ProcessorConfig::DependencyManipulator => Box::new(DependencyManipulator::default()),
            ProcessorConfig::TreeToBio {
                tree,
                annotation,
                include_root,
            } => Box::new(
                TreeToBio::new(tree.as_str(), annotation.as_str()).include_root(*include_root),
            ),
            ProcessorConfig::TagMapper {
                source,
                target,
                mapping,
                fallback,
            } => Box::new(
                TagMapper::from_file(source.as_str(), mapping)?
                    .with_target(target.as_str())
                    .with_fallback(fallback.as_str()),
            ),
            ProcessorConfig::Reindexer => Box::new(Reindexer),
        };
        Ok(processor)
    }
}

/// Pipeline configuration.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    pub importer: Format,
    pub exporter: Format,
    #[serde(default)]
    pub processors: Vec<ProcessorConfig>,
}

impl PipelineConfig {
    /// Read the configuration at `path`.
    ///
    /// Relative paths in the configuration are resolved against the directory
    /// of the configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|err| format_err!("Cannot open configuration {}: {}", path.display(), err))?;
        let mut config = PipelineConfig::from_toml_read(file)?;
        config.relativize_paths(path)?;
        Ok(config)
    }

    /// Make the paths in the configuration relative to `config_path`.
    pub fn relativize_paths<P>(&mut self, config_path: P) -> Result<(), Error>
    where
        P: AsRef<Path>,
    {
        let config_path = config_path.as_ref();
        for processor in &mut self.processors {
            if let ProcessorConfig::TagMapper { mapping, .. } = processor {
                *mapping = relativize_path(config_path, mapping)?;
            }
        }
        Ok(())
    }

    /// Construct the configured pipeline.
    pub fn build(&self) -> Result<Pipeline, Error> {
        let mut pipeline = Pipeline::new(self.importer.importer(), self.exporter.exporter());
        for processor in &self.processors {
            pipeline.add_processor(processor.build()?);
        }
        Ok(pipeline)
    }
}

pub trait TomlRead
where
    Self: Sized,
{
    fn from_toml_read(read: impl Read) -> Result<Self, Error>;
}

impl TomlRead for PipelineConfig {
    fn from_toml_read(mut read: impl Read) -> Result<Self, Error> {
        let mut data = String::new();
        read.read_to_string(&mut data)?;
        let config: PipelineConfig = toml::from_str(&data)?;
        Ok(config)
    }
}

fn relativize_path(config_path: &Path, filename: &str) -> Result<String, Error> {
    if filename.is_empty() {
        return Ok(filename.to_owned());
    }

    let path = Path::new(&filename);

    // Don't touch absolute paths.
    if path.is_absolute() {
        return Ok(filename.to_owned());
    }

    let abs_config_path = config_path.canonicalize()?;
    Ok(abs_config_path
        .parent()
        .ok_or_else(|| {
            format_err!(
                "Cannot get parent path of the configuration file: {}",
                abs_config_path.to_string_lossy()
            )
        })?
        .join(path)
        .to_str()
        .ok_or_else(|| {
            format_err!(
                "Cannot convert parent path to string: {}",
                abs_config_path.to_string_lossy()
            )
        })?
        .to_owned())
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use tempfile::TempDir;

    use crate::config::{Format, PipelineConfig, ProcessorConfig, TomlRead};

    static CONFIG: &str = r#"
importer = "ptb"
exporter = "conlluplus"

[[processors]]
type = "tree_to_bio"
annotation = "TOPF"

[[processors]]
type = "dependency_manipulator"
"#;

    #[test]
    fn read_config() {
        let config = PipelineConfig::from_toml_read(CONFIG.as_bytes()).unwrap();
        assert_eq!(config.importer, Format::PTB);
        assert_eq!(config.exporter, Format::CONLLUPlus);
        assert_eq!(
            config.processors,
            vec![
                ProcessorConfig::TreeToBio {
                    tree: "tree".to_owned(),
                    annotation: "TOPF".to_owned(),
                    include_root: true,
                },
                ProcessorConfig::DependencyManipulator,
            ]
        );
        assert_eq!(config.build().unwrap().n_processors(), 2);
    }

    #[test]
    fn unknown_values() {
        let unknown_processor =
            "importer = \"ptb\"\nexporter = \"ptb\"\n[[processors]]\ntype = \"chopper\"\n";
        assert!(PipelineConfig::from_toml_read(unknown_processor.as_bytes()).is_err());
        let unknown_format = "importer = \"tcf\"\nexporter = \"ptb\"\n";
        assert!(PipelineConfig::from_toml_read(unknown_format.as_bytes()).is_err());
        let missing_mapping = "importer = \"ptb\"\nexporter = \"ptb\"\n\
                               [[processors]]\ntype = \"tag_mapper\"\nsource = \"POS\"\n";
        assert!(PipelineConfig::from_toml_read(missing_mapping.as_bytes()).is_err());
    }

    #[test]
    fn relative_mapping() {
        let config = PipelineConfig::from_file("testdata/pipeline.toml").unwrap();
        let mapping = match &config.processors[1] {
            ProcessorConfig::TagMapper { mapping, .. } => mapping.clone(),
            other => panic!("Expected tag mapper, got {:?}", other),
        };
        assert!(Path::new(&mapping).is_absolute());
        assert!(mapping.ends_with("hipkon-stts.tsv"));
        assert_eq!(config.build().unwrap().n_processors(), 3);
    }

    #[test]
    fn run_configured_pipeline() {
        let config = PipelineConfig::from_file("testdata/pipeline.toml").unwrap();
        let pipeline = config.build().unwrap();
        let outdir = TempDir::new().unwrap();
        let output = pipeline
            .convert(Path::new("testdata/maria.conllup"), outdir.path())
            .unwrap();
        let converted = fs::read_to_string(output).unwrap();
        assert!(converted.contains("\tsein\tAUX\tVAFIN\t_\t0\troot\t"));
        // NE is missing in the table, "." is mapped by its form
        assert!(converted.contains("\tMaria\tMaria\tPROPN\tNE\t_\t2\tnsubj\t_\t_\t_\tVF"));
        assert!(converted.contains("\t.\t.\tPUNCT\t$.\t_\t2\tpunct\t_\t_\t$.\t_"));
    }
}
