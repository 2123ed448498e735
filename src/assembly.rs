use crate::ast::Comparison;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assembly {
    Label(Symbol),
    Instruction(Instruction),
    Comment(String),
}

impl fmt::Display for Assembly {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Instruction(instr) => write!(f, "{}", instr),
            Self::Label(name) => write!(f, "({})", name),
            Self::Comment(comment) => write!(f, "// {}", comment),
        }
    }
}

impl From<Instruction> for Assembly {
    fn from(instr: Instruction) -> Self {
        Self::Instruction(instr)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// `@value`: load a constant or the address of a symbol into A
    Address(Address),
    /// `dest=comp;jump`
    Compute { dest: Dest, comp: Comp, jump: Jump },
}

impl Instruction {
    pub const fn assign(dest: Dest, comp: Comp) -> Self {
        Self::Compute {
            dest,
            comp,
            jump: Jump::Never,
        }
    }
    pub const fn jump(comp: Comp, jump: Jump) -> Self {
        Self::Compute {
            dest: Dest::None,
            comp,
            jump,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Address(address) => write!(f, "@{}", address),
            Self::Compute { dest, comp, jump } => {
                if *dest != Dest::None {
                    write!(f, "{}=", dest)?;
                }
                write!(f, "{}", comp)?;
                if *jump != Jump::Never {
                    write!(f, ";{}", jump)?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    /// 15 bit literal
    Constant(u16),
    Symbol(Symbol),
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Constant(value) => write!(f, "{}", value),
            Self::Symbol(symbol) => write!(f, "{}", symbol),
        }
    }
}

impl From<u16> for Address {
    fn from(value: u16) -> Self {
        Self::Constant(value)
    }
}

impl From<Symbol> for Address {
    fn from(symbol: Symbol) -> Self {
        Self::Symbol(symbol)
    }
}

impl From<Register> for Address {
    fn from(register: Register) -> Self {
        Self::Symbol(Symbol::Register(register))
    }
}

/// Every name the generated code refers to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Symbol {
    Register(Register),
    /// `<namespace>.<index>`
    Static { namespace: String, index: u16 },
    /// `<function>$<label>`
    Scoped { function: String, label: String },
    /// entry point of a VM function
    Function(String),
    /// `<function>.return.<call>`
    ReturnAddress { function: String, call: usize },
    /// one of the blocks of a comparison, e.g. `CHECKEQ3`
    Comparison {
        block: ComparisonBlock,
        comparison: Comparison,
        index: usize,
    },
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Register(register) => write!(f, "{}", register),
            Self::Static { namespace, index } => write!(f, "{}.{}", namespace, index),
            Self::Scoped { function, label } => write!(f, "{}${}", function, label),
            Self::Function(name) => f.write_str(name),
            Self::ReturnAddress { function, call } => write!(f, "{}.return.{}", function, call),
            Self::Comparison {
                block,
                comparison,
                index,
            } => {
                let op = comparison_name(*comparison);
                match block {
                    ComparisonBlock::Check => write!(f, "CHECK{}{}", op, index),
                    ComparisonBlock::True => write!(f, "IS{}{}", op, index),
                    ComparisonBlock::End => write!(f, "{}END{}", op, index),
                }
            }
        }
    }
}

const fn comparison_name(comparison: Comparison) -> &'static str {
    match comparison {
        Comparison::Eq => "EQ",
        Comparison::Gt => "GT",
        Comparison::Lt => "LT",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonBlock {
    /// computes the difference and branches
    Check,
    /// writes `true`
    True,
    /// where both paths join
    End,
}

/// Memory cells with a fixed role in the runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    StackPointer,
    Local,
    Argument,
    This,
    That,
    /// base of the `temp` segment
    Temp,
    /// scratch cell holding the frame base while returning
    Frame,
    /// scratch cell holding the return address while returning
    ReturnAddress,
}

impl Register {
    pub const fn address(self) -> u16 {
        match self {
            Self::StackPointer => 0,
            Self::Local => 1,
            Self::Argument => 2,
            Self::This => 3,
            Self::That => 4,
            Self::Temp => 5,
            Self::Frame => 13,
            Self::ReturnAddress => 14,
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::StackPointer => write!(f, "SP"),
            Self::Local => write!(f, "LCL"),
            Self::Argument => write!(f, "ARG"),
            Self::This => write!(f, "THIS"),
            Self::That => write!(f, "THAT"),
            Self::Temp => write!(f, "R5"),
            Self::Frame => write!(f, "R13"),
            Self::ReturnAddress => write!(f, "R14"),
        }
    }
}

/// Registers written by a computation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dest {
    None,
    M,
    D,
    MD,
    A,
    AM,
    AD,
    AMD,
}

impl Dest {
    pub const fn writes_a(self) -> bool {
        matches!(self, Self::A | Self::AM | Self::AD | Self::AMD)
    }
    pub const fn writes_d(self) -> bool {
        matches!(self, Self::D | Self::MD | Self::AD | Self::AMD)
    }
    pub const fn writes_m(self) -> bool {
        matches!(self, Self::M | Self::MD | Self::AM | Self::AMD)
    }
}

impl fmt::Display for Dest {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::None => Ok(()),
            Self::M => write!(f, "M"),
            Self::D => write!(f, "D"),
            Self::MD => write!(f, "MD"),
            Self::A => write!(f, "A"),
            Self::AM => write!(f, "AM"),
            Self::AD => write!(f, "AD"),
            Self::AMD => write!(f, "AMD"),
        }
    }
}

/// The ALU computations of the target machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comp {
    Zero,
    One,
    MinusOne,
    D,
    A,
    M,
    NotD,
    NotA,
    NotM,
    NegD,
    NegA,
    NegM,
    DPlusOne,
    APlusOne,
    MPlusOne,
    DMinusOne,
    AMinusOne,
    MMinusOne,
    DPlusA,
    DPlusM,
    DMinusA,
    DMinusM,
    AMinusD,
    MMinusD,
    DAndA,
    DAndM,
    DOrA,
    DOrM,
}

impl fmt::Display for Comp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let text = match self {
            Self::Zero => "0",
            Self::One => "1",
            Self::MinusOne => "-1",
            Self::D => "D",
            Self::A => "A",
            Self::M => "M",
            Self::NotD => "!D",
            Self::NotA => "!A",
            Self::NotM => "!M",
            Self::NegD => "-D",
            Self::NegA => "-A",
            Self::NegM => "-M",
            Self::DPlusOne => "D+1",
            Self::APlusOne => "A+1",
            Self::MPlusOne => "M+1",
            Self::DMinusOne => "D-1",
            Self::AMinusOne => "A-1",
            Self::MMinusOne => "M-1",
            Self::DPlusA => "D+A",
            Self::DPlusM => "D+M",
            Self::DMinusA => "D-A",
            Self::DMinusM => "D-M",
            Self::AMinusD => "A-D",
            Self::MMinusD => "M-D",
            Self::DAndA => "D&A",
            Self::DAndM => "D&M",
            Self::DOrA => "D|A",
            Self::DOrM => "D|M",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Jump {
    Never,
    GreaterThan,
    Equals,
    GreaterEqual,
    LessThan,
    NotEquals,
    LessEqual,
    Always,
}

impl From<Comparison> for Jump {
    fn from(comparison: Comparison) -> Self {
        match comparison {
            Comparison::Eq => Self::Equals,
            Comparison::Gt => Self::GreaterThan,
            Comparison::Lt => Self::LessThan,
        }
    }
}

impl fmt::Display for Jump {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Never => Ok(()),
            Self::GreaterThan => write!(f, "JGT"),
            Self::Equals => write!(f, "JEQ"),
            Self::GreaterEqual => write!(f, "JGE"),
            Self::LessThan => write!(f, "JLT"),
            Self::NotEquals => write!(f, "JNE"),
            Self::LessEqual => write!(f, "JLE"),
            Self::Always => write!(f, "JMP"),
        }
    }
}
