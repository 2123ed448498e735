//! Finding modules on disk and running them through one [`CodeWriter`].
use crate::compiler::{CodeWriter, CompileError, DEFAULT_ENTRY_POINT};
use crate::error::SourceMetadata;
use crate::parser::{is_symbol, ParseError, Parser};
use itertools::Itertools;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

const SOURCE_EXTENSION: &str = "vm";
const OUTPUT_EXTENSION: &str = "asm";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Precede every command's code with a `// <command>` comment
    pub annotate: bool,
    /// Function the bootstrap code calls
    pub entry_point: String,
    /// `None` bootstraps only when translating more than one module
    pub bootstrap: Option<bool>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            annotate: false,
            entry_point: DEFAULT_ENTRY_POINT.to_string(),
            bootstrap: None,
        }
    }
}

impl Options {
    fn wants_bootstrap(&self, modules: usize) -> bool {
        self.bootstrap.unwrap_or(modules > 1)
    }
}

/// One source file, its statics living under `namespace`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub namespace: String,
    pub path: PathBuf,
    pub source: String,
}

impl Module {
    pub fn new(namespace: impl Into<String>, path: impl Into<PathBuf>, source: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            path: path.into(),
            source: source.into(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, TranslateError> {
        let namespace = path
            .file_stem()
            .and_then(OsStr::to_str)
            .filter(|stem| is_symbol(stem))
            .ok_or_else(|| TranslateError::InvalidModuleName(path.to_path_buf()))?;
        let source = fs::read_to_string(path).map_err(|source| TranslateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(target: "driver", "loaded {} ({} bytes)", path.display(), source.len());
        Ok(Self::new(namespace, path, source))
    }
}

/// A `.vm` file on its own, or every `.vm` file below a directory in path
/// order.
pub fn discover_modules(path: &Path) -> Result<Vec<PathBuf>, TranslateError> {
    let found = if path.is_dir() {
        let mut found = Vec::new();
        collect_modules(path, &mut found)?;
        found.into_iter().sorted().collect()
    } else if is_module(path) && path.is_file() {
        vec![path.to_path_buf()]
    } else {
        Vec::new()
    };

    if found.is_empty() {
        return Err(TranslateError::NoModules(path.to_path_buf()));
    }
    tracing::debug!(
        target: "driver",
        "modules: {}",
        found.iter().map(|path| path.display()).join(", ")
    );
    Ok(found)
}

fn collect_modules(dir: &Path, found: &mut Vec<PathBuf>) -> Result<(), TranslateError> {
    let io_error = |source: io::Error| TranslateError::Io {
        path: dir.to_path_buf(),
        source,
    };
    for entry in fs::read_dir(dir).map_err(io_error)? {
        let entry = entry.map_err(io_error)?;
        // symlinked directories are not followed, they may point back up
        let file_type = entry.file_type().map_err(io_error)?;
        let path = entry.path();
        if file_type.is_dir() {
            collect_modules(&path, found)?;
        } else if is_module(&path) && path.is_file() {
            found.push(path);
        }
    }
    Ok(())
}

fn is_module(path: &Path) -> bool {
    path.extension() == Some(OsStr::new(SOURCE_EXTENSION))
}

/// `X.vm` becomes `X.asm`; a directory `D` becomes `D/D.asm`
pub fn default_output_path(input: &Path) -> PathBuf {
    if !input.is_dir() {
        return input.with_extension(OUTPUT_EXTENSION);
    }
    let name = input
        .file_name()
        .map(OsStr::to_os_string)
        .or_else(|| {
            input
                .canonicalize()
                .ok()
                .and_then(|full| full.file_name().map(OsStr::to_os_string))
        })
        .unwrap_or_else(|| "out".into());
    let mut file = name;
    file.push(".");
    file.push(OUTPUT_EXTENSION);
    input.join(file)
}

/// Translates `modules` in order into a single assembly program.
pub fn translate(modules: &[Module], options: &Options) -> Result<String, TranslateError> {
    let mut writer = CodeWriter::new()
        .annotated(options.annotate)
        .with_entry_point(options.entry_point.clone());

    if options.wants_bootstrap(modules.len()) {
        writer
            .bootstrap()
            .map_err(|e| e.add_context("emitting the bootstrap code"))?;
    }
    for module in modules {
        translate_module(&mut writer, module)?;
    }

    let output = writer.finalize();
    tracing::info!(
        target: "driver",
        "translated {} module(s) into {} lines",
        modules.len(),
        output.lines().count()
    );
    Ok(output)
}

fn translate_module(writer: &mut CodeWriter, module: &Module) -> Result<(), TranslateError> {
    tracing::debug!(target: "driver", "translating {}", module.path.display());
    let meta = SourceMetadata::new(&module.source).with_file(module.path.clone());
    writer.set_namespace(module.namespace.as_str());

    for command in Parser::new(&meta) {
        let command = command.map_err(|e| e.add_context("reading the module"))?;
        writer.emit(&command.command).map_err(|e| {
            e.with_backup_source(command.span, &meta)
                .add_context("translating the command")
        })?;
    }
    Ok(())
}

#[derive(Error, Debug)]
pub enum TranslateError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error("{}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("no .vm files found at {}", .0.display())]
    NoModules(PathBuf),
    #[error("cannot derive a valid module name from {}", .0.display())]
    InvalidModuleName(PathBuf),
}
