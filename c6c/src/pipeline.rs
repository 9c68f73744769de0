use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use failure::Error;

use crate::processor::Processor;
use crate::Document;

/// Trait for reading a `Document`.
pub trait Import {
    /// Read the document in `read`, `filename` is recorded in the document.
    fn import(&self, read: &mut dyn BufRead, filename: &str) -> Result<Document, Error>;
}

/// Trait for writing a `Document`.
pub trait Export {
    /// File extension of the output format.
    fn extension(&self) -> &str;

    fn export(&self, doc: &Document, write: &mut dyn Write) -> Result<(), Error>;
}

/// Files that were converted and files that failed with their error.
#[derive(Debug, Default)]
pub struct ConversionReport {
    pub converted: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, Error)>,
}

impl ConversionReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Conversion pipeline.
///
/// Every file is imported, transformed by the processors in the order in which
/// they were added and exported.
pub struct Pipeline {
    importer: Box<dyn Import>,
    processors: Vec<Box<dyn Processor>>,
    exporter: Box<dyn Export>,
}

impl Pipeline {
    pub fn new(importer: Box<dyn Import>, exporter: Box<dyn Export>) -> Self {
        Pipeline {
            importer,
            processors: Vec::new(),
            exporter,
        }
    }

    pub fn add_processor(&mut self, processor: Box<dyn Processor>) {
        self.processors.push(processor);
    }

    pub fn n_processors(&self) -> usize {
        self.processors.len()
    }

    /// Apply all processors to `doc`.
    pub fn process(&self, doc: &mut Document) -> Result<(), Error> {
        for processor in &self.processors {
            processor.process(doc)?;
        }
        Ok(())
    }

    /// Get the output path for `input` in `outdir`.
    ///
    /// The file stem of `input` is kept, the extension is the exporter's.
    pub fn output_path(&self, input: &Path, outdir: &Path) -> Result<PathBuf, Error> {
        let stem = input
            .file_stem()
            .ok_or_else(|| format_err!("Not a file: {}", input.display()))?;
        let mut path = outdir.join(stem);
        path.set_extension(self.exporter.extension());
        Ok(path)
    }

    /// Convert the file at `input`, writing the result to `outdir`.
    ///
    /// Returns the path of the output file.
    pub fn convert(&self, input: &Path, outdir: &Path) -> Result<PathBuf, Error> {
        let filename = input
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| format_err!("Not a file: {}", input.display()))?;
        let mut read = BufReader::new(File::open(input)?);
        let mut doc = self.importer.import(&mut read, &filename)?;
        self.process(&mut doc)?;

        // no output file is created if the export fails
        let mut buffer = Vec::new();
        self.exporter.export(&doc, &mut buffer)?;

        fs::create_dir_all(outdir)?;
        let output = self.output_path(input, outdir)?;
        fs::write(&output, buffer)?;
        Ok(output)
    }

    /// Convert all `files`.
    ///
    /// A failing file does not stop the conversion of the remaining files.
    pub fn convert_all<P>(&self, files: &[P], outdir: &Path) -> ConversionReport
    where
        P: AsRef<Path>,
    {
        let mut report = ConversionReport::default();
        for file in files {
            let file = file.as_ref();
            match self.convert(file, outdir) {
                Ok(output) => {
                    info!("Converted {} to {}", file.display(), output.display());
                    report.converted.push(file.to_owned());
                }
                Err(err) => {
                    error!("Could not convert {}: {}", file.display(), err);
                    report.failed.push((file.to_owned(), err));
                }
            }
        }
        report
    }
}

/// Collect the files in `paths`.
///
/// Directories are searched recursively. Paths that do not exist are skipped.
/// The files are returned sorted.
pub fn collect_files<P>(paths: &[P]) -> Result<Vec<PathBuf>, Error>
where
    P: AsRef<Path>,
{
    let mut files = Vec::new();
    for path in paths {
        collect_path(path.as_ref(), &mut files)?;
    }
    files.sort();
    files.dedup();
    Ok(files)
}

fn collect_path(path: &Path, files: &mut Vec<PathBuf>) -> Result<(), Error> {
    if path.is_dir() {
        for entry in fs::read_dir(path)? {
            collect_path(&entry?.path(), files)?;
        }
    } else if path.is_file() {
        files.push(path.to_owned());
    } else {
        warn!("Skipping {}: no such file or directory", path.display());
    }
    Ok(())
}
