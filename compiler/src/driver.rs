use std::fs;
use std::path::PathBuf;

use crate::{
    error::MrError,
    gen_c::{generate_header, generate_source, output_names, GeneratorOptions},
    types::{MrFile, Specification},
};

/// Forward-only walk over the specifications of a parsed file.
pub struct SpecificationCursor<'a> {
    specifications: &'a [Specification],
    index:          usize,
}

impl<'a> SpecificationCursor<'a> {
    pub fn new(file: &'a MrFile) -> Self {
        SpecificationCursor { specifications: &file.specifications, index: 0 }
    }
}

impl<'a> Iterator for SpecificationCursor<'a> {
    type Item = &'a Specification;

    fn next(&mut self) -> Option<Self::Item> {
        let spec = self.specifications.get(self.index)?;
        self.index += 1;
        Some(spec)
    }
}

/// Outcome of generating one specification. The two files are written
/// independently, so one may succeed while the other fails.
#[derive(Debug)]
pub struct SpecReport {
    pub name:   String,
    pub header: Result<PathBuf, MrError>,
    pub source: Result<PathBuf, MrError>,
}

impl SpecReport {
    pub fn is_ok(&self) -> bool {
        self.header.is_ok() && self.source.is_ok()
    }
}

pub struct Generator {
    output_dir: PathBuf,
    options:    GeneratorOptions,
}

impl Generator {
    pub fn new(output_dir: impl Into<PathBuf>, options: GeneratorOptions) -> Self {
        Generator { output_dir: output_dir.into(), options }
    }

    /// Write `<name>.h` then `<name>.c` for `spec`. Each file is rendered in
    /// full before anything is written.
    pub fn write_specification(&self, spec: &Specification) -> SpecReport {
        let (header_name, source_name) = output_names(spec);

        let header_path = self.output_dir.join(header_name);
        let header = write_file(header_path, &generate_header(spec, &self.options));

        let source_path = self.output_dir.join(source_name);
        let source = generate_source(spec, &self.options)
            .and_then(|text| write_file(source_path, &text));

        SpecReport { name: spec.name.clone(), header, source }
    }

    /// Generate every specification of `file` in source order. A failure on
    /// one specification does not stop the others.
    pub fn write_all(&self, file: &MrFile) -> Vec<SpecReport> {
        SpecificationCursor::new(file)
            .map(|spec| self.write_specification(spec))
            .collect()
    }
}

fn write_file(path: PathBuf, contents: &str) -> Result<PathBuf, MrError> {
    match fs::write(&path, contents) {
        Ok(()) => Ok(path),
        Err(source) => Err(MrError::Output { path, source }),
    }
}
