use crate::ast::*;
use crate::error::*;
use std::collections::VecDeque;
use std::fmt;
use thiserror::Error;

const COMMENT_MARKER: &str = "//";

/// A non-empty, comment-free line of a module
#[derive(Debug, Clone, Copy)]
struct Line<'source> {
    text: &'source str,
    span: Span,
}

impl<'source> Line<'source> {
    fn tokens(&self) -> impl Iterator<Item = (Span, &'source str)> + '_ {
        let base = self.text.as_ptr() as usize;
        let line_offset = self.span.offset;
        self.text.split_whitespace().map(move |token| {
            let offset = line_offset + (token.as_ptr() as usize - base);
            (Span::new(offset, token.len()), token)
        })
    }

    fn token(&self, index: usize) -> Option<(Span, &'source str)> {
        self.tokens().nth(index)
    }

    fn mnemonic(&self) -> &'source str {
        // lines are never empty, so there's always a first token
        self.token(0).map_or("", |(_, token)| token)
    }
}

/// A decoded command along with where it came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceCommand<'source> {
    pub command: Command<'source>,
    pub span: Span,
}

/// Reads the commands of a single module, one at a time.
pub struct Parser<'meta, 'source> {
    lines: VecDeque<Line<'source>>,
    current: Option<Line<'source>>,
    metadata: &'meta SourceMetadata<'source>,
}

impl<'meta, 'source> Parser<'meta, 'source> {
    pub fn new(source: &'meta SourceMetadata<'source>) -> Self {
        let mut lines = VecDeque::new();
        let mut line_start = 0;
        for raw in source.input().split_inclusive('\n') {
            let code = raw
                .find(COMMENT_MARKER)
                .map_or(raw, |comment_start| &raw[..comment_start]);
            let text = code.trim();
            if !text.is_empty() {
                let leading = code.len() - code.trim_start().len();
                lines.push_back(Line {
                    text,
                    span: Span::new(line_start + leading, text.len()),
                });
            }
            line_start += raw.len();
        }
        tracing::trace!(target: "parser", "found {} commands in {:?}", lines.len(), source.file());
        Self {
            lines,
            current: None,
            metadata: source,
        }
    }

    pub fn has_more(&self) -> bool {
        !self.lines.is_empty()
    }

    /// Makes the next command the current one.
    pub fn advance(&mut self) -> ParseRes<()> {
        match self.lines.pop_front() {
            Some(line) => {
                self.current = Some(line);
                Ok(())
            }
            None => Err(self.error_without_location(ParseErrorKind::NoMoreCommands)),
        }
    }

    pub fn command_kind(&self) -> ParseRes<CommandKind> {
        self.current_line()
            .map(|line| CommandKind::from_mnemonic(line.mnemonic()))
    }

    /// The first operand. For arithmetic commands, the operator itself.
    pub fn arg1(&self) -> ParseRes<&'source str> {
        self.arg1_with_span().map(|(_, arg)| arg)
    }

    /// The second operand, only defined for push, pop, function and call.
    pub fn arg2(&self) -> ParseRes<&'source str> {
        self.arg2_with_span().map(|(_, arg)| arg)
    }

    /// Decodes the current line into a typed command.
    pub fn command(&self) -> ParseRes<SourceCommand<'source>> {
        let line = self.current_line()?;
        let kind = CommandKind::from_mnemonic(line.mnemonic());
        if let Some((span, extra)) = line.token(kind.operand_count() + 1) {
            return self.emit_error_at(
                span,
                ParseErrorKind::UnexpectedOperand {
                    kind,
                    found: extra.to_string(),
                },
            );
        }

        let command = match kind {
            CommandKind::Arithmetic => {
                let (span, mnemonic) = self.arg1_with_span()?;
                match ArithmeticOp::from_mnemonic(mnemonic) {
                    Some(op) => Command::Arithmetic(op),
                    None => {
                        return self.emit_error_at(
                            span,
                            ParseErrorKind::UnknownArithmetic(mnemonic.to_string()),
                        )
                    }
                }
            }
            CommandKind::Push => Command::Push {
                segment: self.segment()?,
                index: self.number()?,
            },
            CommandKind::Pop => Command::Pop {
                segment: self.segment()?,
                index: self.number()?,
            },
            CommandKind::Label => Command::Label(self.symbol()?),
            CommandKind::Goto => Command::Goto(self.symbol()?),
            CommandKind::IfGoto => Command::IfGoto(self.symbol()?),
            CommandKind::Function => Command::Function {
                name: self.symbol()?,
                locals: self.number()?,
            },
            CommandKind::Call => Command::Call {
                name: self.symbol()?,
                args: self.number()?,
            },
            CommandKind::Return => Command::Return,
        };
        tracing::trace!(target: "parser", "decoded `{}` as {command:?}", line.text);
        Ok(SourceCommand {
            command,
            span: line.span,
        })
    }

    fn current_line(&self) -> ParseRes<Line<'source>> {
        self.current
            .ok_or_else(|| self.error_without_location(ParseErrorKind::NoCurrentCommand))
    }

    fn arg1_with_span(&self) -> ParseRes<(Span, &'source str)> {
        let line = self.current_line()?;
        let kind = CommandKind::from_mnemonic(line.mnemonic());
        if !kind.has_arg1() {
            return self.emit_error_at(
                line.span,
                ParseErrorKind::NoSuchOperand {
                    kind,
                    which: Operand::First,
                },
            );
        }
        let index = if kind == CommandKind::Arithmetic { 0 } else { 1 };
        self.operand(line, kind, index, Operand::First)
    }

    fn arg2_with_span(&self) -> ParseRes<(Span, &'source str)> {
        let line = self.current_line()?;
        let kind = CommandKind::from_mnemonic(line.mnemonic());
        if !kind.has_arg2() {
            return self.emit_error_at(
                line.span,
                ParseErrorKind::NoSuchOperand {
                    kind,
                    which: Operand::Second,
                },
            );
        }
        self.operand(line, kind, 2, Operand::Second)
    }

    fn operand(
        &self,
        line: Line<'source>,
        kind: CommandKind,
        index: usize,
        which: Operand,
    ) -> ParseRes<(Span, &'source str)> {
        line.token(index).map_or_else(
            || self.emit_error_at(line.span, ParseErrorKind::MissingOperand { kind, which }),
            Ok,
        )
    }

    fn segment(&self) -> ParseRes<Segment> {
        let (span, name) = self.arg1_with_span()?;
        Segment::from_name(name).map_or_else(
            || self.emit_error_at(span, ParseErrorKind::UnknownSegment(name.to_string())),
            Ok,
        )
    }

    fn number(&self) -> ParseRes<u16> {
        let (span, number) = self.arg2_with_span()?;
        number.parse::<u16>().or_else(|_| {
            self.emit_error_at(span, ParseErrorKind::InvalidNumber(number.to_string()))
        })
    }

    fn symbol(&self) -> ParseRes<&'source str> {
        let (span, symbol) = self.arg1_with_span()?;
        if is_symbol(symbol) {
            Ok(symbol)
        } else {
            self.emit_error_at(span, ParseErrorKind::InvalidSymbol(symbol.to_string()))
        }
    }

    fn emit_error_at<T>(&self, span: Span, kind: ParseErrorKind) -> ParseRes<T> {
        Err(ParseError::new(kind).with_source(span, self.metadata))
    }

    fn error_without_location(&self, kind: ParseErrorKind) -> ParseError {
        match self.current {
            Some(line) => ParseError::new(kind).with_source(line.span, self.metadata),
            None => ParseError::new(kind),
        }
    }
}

/// letters, digits, `_`, `.`, `$` and `:`, not starting with a digit
pub(crate) fn is_symbol(name: &str) -> bool {
    let valid_char = |c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '$' | ':');
    !name.is_empty()
        && name.chars().all(valid_char)
        && !name.starts_with(|c: char| c.is_ascii_digit())
}

pub struct Commands<'meta, 'source> {
    parser: Parser<'meta, 'source>,
    failed: bool,
}

impl<'source> Iterator for Commands<'_, 'source> {
    type Item = ParseRes<SourceCommand<'source>>;
    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || !self.parser.has_more() {
            return None;
        }
        let next = self
            .parser
            .advance()
            .and_then(|()| self.parser.command());
        self.failed = next.is_err();
        Some(next)
    }
}

impl std::iter::FusedIterator for Commands<'_, '_> {}

impl<'meta, 'source> IntoIterator for Parser<'meta, 'source> {
    type IntoIter = Commands<'meta, 'source>;
    type Item = <Self::IntoIter as Iterator>::Item;
    fn into_iter(self) -> Self::IntoIter {
        Commands {
            parser: self,
            failed: false,
        }
    }
}

pub type ParseRes<T> = Result<T, ParseError>;
pub type ParseError = Error<ParseErrorKind>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    First,
    Second,
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::First => write!(f, "first"),
            Self::Second => write!(f, "second"),
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("no more commands to advance to")]
    NoMoreCommands,
    #[error("there is no current command")]
    NoCurrentCommand,
    #[error("`{kind}` commands have no {which} operand")]
    NoSuchOperand { kind: CommandKind, which: Operand },
    #[error("`{kind}` command is missing its {which} operand")]
    MissingOperand { kind: CommandKind, which: Operand },
    #[error("unexpected operand {found:?} for `{kind}` command")]
    UnexpectedOperand { kind: CommandKind, found: String },
    #[error("expected a non-negative integer, found {0:?}")]
    InvalidNumber(String),
    #[error("invalid symbol {0:?}")]
    InvalidSymbol(String),
    #[error("unknown memory segment {0:?}")]
    UnknownSegment(String),
    #[error("unknown arithmetic command {0:?}")]
    UnknownArithmetic(String),
}
