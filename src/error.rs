use std::error;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Error<T> {
    pub kind: T,
    file: Option<PathBuf>,
    snippet: Option<Snippet>,
    contexts: Vec<&'static str>,
}

/// Byte range of a command inside its module's source text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub offset: usize,
    pub len: usize,
}

impl Span {
    pub const fn new(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }
    pub fn snippet_from_source(&self, source: &SourceMetadata) -> Option<Snippet> {
        let mut offset = 0;
        for (i, line) in source.input().split_terminator('\n').enumerate() {
            let next_offset = offset + line.len() + 1;
            if next_offset > self.offset {
                // offset is somewhere in the current line
                return Some(Snippet {
                    position: Position {
                        line: i,
                        col: self.offset - offset,
                    },
                    width: self.len.max(1),
                    line: line.trim_end_matches('\r').to_string(),
                });
            }
            offset = next_offset;
        }
        None
    }
}

#[derive(Debug)]
pub struct SourceMetadata<'a> {
    file: Option<PathBuf>,
    source: &'a str,
}

impl<'a> SourceMetadata<'a> {
    pub const fn input(&self) -> &'a str {
        self.source
    }
    pub const fn new(source: &'a str) -> Self {
        Self { file: None, source }
    }
    #[must_use]
    pub fn with_file(mut self, file: PathBuf) -> Self {
        self.file = Some(file);
        self
    }
    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }
}

impl<T> Error<T> {
    pub const fn new(kind: T) -> Self {
        Self {
            kind,
            snippet: None,
            file: None,
            contexts: Vec::new(),
        }
    }
    /// The source given is only applied if there was no additional source
    #[must_use]
    pub fn with_backup_source(self, span: Span, source: &SourceMetadata) -> Self {
        if self.snippet.is_some() {
            self
        } else {
            self.with_source(span, source)
        }
    }
    #[must_use]
    pub fn with_source(mut self, span: Span, source: &SourceMetadata) -> Self {
        self.file = source.file.clone();
        self.snippet = span.snippet_from_source(source);
        self
    }
    #[must_use]
    pub fn add_context(mut self, ctx: &'static str) -> Self {
        self.contexts.push(ctx);
        self
    }
    pub fn position(&self) -> Option<Position> {
        self.snippet.as_ref().map(|snippet| snippet.position)
    }
}

#[derive(Debug, Clone)]
pub struct Snippet {
    position: Position,
    width: usize,
    line: String,
}

/// Zero-based line and column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub col: usize,
    pub line: usize,
}

impl<T: error::Error + 'static> error::Error for Error<T> {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        Some(&self.kind)
    }
}

impl<T: fmt::Display> fmt::Display for Error<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let whiles = self
            .contexts
            .iter()
            .copied()
            .fold(String::new(), |acc, next| acc + "\nwhile " + next);
        let snippet = if let Some(snip) = &self.snippet {
            snip
        } else {
            return write!(f, "{}(no location info){}", self.kind, whiles);
        };
        let file = self
            .file
            .as_ref()
            .and_then(|x| x.to_str())
            .unwrap_or("<unknown source>");

        write!(
            f,
            "\
{kind}
   --> {file}:{line}:{col}
    |
{line:3} | {snippet}
    | {pad}{marker}{whiles}",
            pad = " ".repeat(snippet.position.col),
            marker = "^".repeat(snippet.width),
            line = snippet.position.line + 1,
            col = snippet.position.col + 1,
            file = file,
            kind = self.kind,
            snippet = snippet.line,
            whiles = whiles,
        )
    }
}
