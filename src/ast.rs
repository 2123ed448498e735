//! Typed representation of VM commands, without source information
use std::fmt;

/// The nine command kinds a VM line can be classified as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Arithmetic,
    Push,
    Pop,
    Label,
    Goto,
    IfGoto,
    Function,
    Return,
    Call,
}

impl CommandKind {
    /// Classifies a line by its first token. Anything that is not one of the
    /// reserved mnemonics is an arithmetic command; its validity is checked
    /// when decoding the operator.
    pub fn from_mnemonic(mnemonic: &str) -> Self {
        match mnemonic {
            "push" => Self::Push,
            "pop" => Self::Pop,
            "label" => Self::Label,
            "goto" => Self::Goto,
            "if-goto" => Self::IfGoto,
            "function" => Self::Function,
            "call" => Self::Call,
            "return" => Self::Return,
            _ => Self::Arithmetic,
        }
    }

    /// Number of operand tokens following the mnemonic
    pub const fn operand_count(self) -> usize {
        match self {
            Self::Arithmetic | Self::Return => 0,
            Self::Label | Self::Goto | Self::IfGoto => 1,
            Self::Push | Self::Pop | Self::Function | Self::Call => 2,
        }
    }

    pub const fn has_arg1(self) -> bool {
        !matches!(self, Self::Return)
    }

    pub const fn has_arg2(self) -> bool {
        self.operand_count() == 2
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Arithmetic => write!(f, "arithmetic"),
            Self::Push => write!(f, "push"),
            Self::Pop => write!(f, "pop"),
            Self::Label => write!(f, "label"),
            Self::Goto => write!(f, "goto"),
            Self::IfGoto => write!(f, "if-goto"),
            Self::Function => write!(f, "function"),
            Self::Return => write!(f, "return"),
            Self::Call => write!(f, "call"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Eq,
    Gt,
    Lt,
}

/// An arithmetic/logical stack operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Binary(BinaryOp),
    Unary(UnaryOp),
    Compare(Comparison),
}

impl ArithmeticOp {
    pub fn from_mnemonic(mnemonic: &str) -> Option<Self> {
        Some(match mnemonic {
            "add" => Self::Binary(BinaryOp::Add),
            "sub" => Self::Binary(BinaryOp::Sub),
            "and" => Self::Binary(BinaryOp::And),
            "or" => Self::Binary(BinaryOp::Or),
            "neg" => Self::Unary(UnaryOp::Neg),
            "not" => Self::Unary(UnaryOp::Not),
            "eq" => Self::Compare(Comparison::Eq),
            "gt" => Self::Compare(Comparison::Gt),
            "lt" => Self::Compare(Comparison::Lt),
            _ => return None,
        })
    }

    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Binary(BinaryOp::Add) => "add",
            Self::Binary(BinaryOp::Sub) => "sub",
            Self::Binary(BinaryOp::And) => "and",
            Self::Binary(BinaryOp::Or) => "or",
            Self::Unary(UnaryOp::Neg) => "neg",
            Self::Unary(UnaryOp::Not) => "not",
            Self::Compare(Comparison::Eq) => "eq",
            Self::Compare(Comparison::Gt) => "gt",
            Self::Compare(Comparison::Lt) => "lt",
        }
    }
}

/// One of the eight memory segments addressable by push/pop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Constant,
    Local,
    Argument,
    This,
    That,
    Temp,
    Pointer,
    Static,
}

impl Segment {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "constant" => Self::Constant,
            "local" => Self::Local,
            "argument" => Self::Argument,
            "this" => Self::This,
            "that" => Self::That,
            "temp" => Self::Temp,
            "pointer" => Self::Pointer,
            "static" => Self::Static,
            _ => return None,
        })
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Constant => "constant",
            Self::Local => "local",
            Self::Argument => "argument",
            Self::This => "this",
            Self::That => "that",
            Self::Temp => "temp",
            Self::Pointer => "pointer",
            Self::Static => "static",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'source> {
    Arithmetic(ArithmeticOp),
    Push { segment: Segment, index: u16 },
    Pop { segment: Segment, index: u16 },
    Label(&'source str),
    Goto(&'source str),
    IfGoto(&'source str),
    Function { name: &'source str, locals: u16 },
    Call { name: &'source str, args: u16 },
    Return,
}

impl Command<'_> {
    pub const fn kind(&self) -> CommandKind {
        match self {
            Self::Arithmetic(_) => CommandKind::Arithmetic,
            Self::Push { .. } => CommandKind::Push,
            Self::Pop { .. } => CommandKind::Pop,
            Self::Label(_) => CommandKind::Label,
            Self::Goto(_) => CommandKind::Goto,
            Self::IfGoto(_) => CommandKind::IfGoto,
            Self::Function { .. } => CommandKind::Function,
            Self::Call { .. } => CommandKind::Call,
            Self::Return => CommandKind::Return,
        }
    }
}

// canonical VM text, also used to annotate the generated assembly
impl fmt::Display for Command<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Arithmetic(op) => f.write_str(op.mnemonic()),
            Self::Push { segment, index } => write!(f, "push {} {}", segment, index),
            Self::Pop { segment, index } => write!(f, "pop {} {}", segment, index),
            Self::Label(label) => write!(f, "label {}", label),
            Self::Goto(label) => write!(f, "goto {}", label),
            Self::IfGoto(label) => write!(f, "if-goto {}", label),
            Self::Function { name, locals } => write!(f, "function {} {}", name, locals),
            Self::Call { name, args } => write!(f, "call {} {}", name, args),
            Self::Return => write!(f, "return"),
        }
    }
}
