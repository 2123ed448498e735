use crate::assembly::{Address, Assembly, Comp, Dest, Instruction, Jump, Symbol};
use std::collections::VecDeque;
use std::fmt;

/// Append-only sequence of assembly, built one instruction at a time.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AssemblyOutput(VecDeque<Assembly>);

impl AssemblyOutput {
    pub fn new() -> Self {
        Self(VecDeque::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Assembly> {
        self.0.iter()
    }

    pub fn push_back(&mut self, value: impl Into<Assembly>) -> &mut Self {
        self.0.push_back(value.into());
        self
    }

    /// `@address`
    pub fn at(&mut self, address: impl Into<Address>) -> &mut Self {
        self.push_back(Instruction::Address(address.into()))
    }

    /// `dest=comp`
    pub fn assign(&mut self, dest: Dest, comp: Comp) -> &mut Self {
        self.push_back(Instruction::assign(dest, comp))
    }

    /// `comp;jump`
    pub fn jump(&mut self, comp: Comp, jump: Jump) -> &mut Self {
        self.push_back(Instruction::jump(comp, jump))
    }

    /// `(symbol)`
    pub fn label(&mut self, symbol: Symbol) -> &mut Self {
        self.push_back(Assembly::Label(symbol))
    }

    pub fn comment(&mut self, comment: impl fmt::Display) -> &mut Self {
        self.push_back(Assembly::Comment(comment.to_string()))
    }

    pub fn chain(mut self, other: AssemblyOutput) -> Self {
        self.0.extend(other.0);
        self
    }

    pub fn extend<T>(&mut self, values: impl IntoIterator<Item = T>) -> &mut Self
    where
        T: Into<Assembly>,
    {
        self.0.extend(values.into_iter().map(T::into));
        self
    }
}

impl IntoIterator for AssemblyOutput {
    type Item = Assembly;
    type IntoIter = <VecDeque<Assembly> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<AssemblyOutput> for AssemblyOutput {
    fn from_iter<T: IntoIterator<Item = AssemblyOutput>>(iter: T) -> Self {
        iter.into_iter()
            .fold(AssemblyOutput::new(), AssemblyOutput::chain)
    }
}

impl FromIterator<Assembly> for AssemblyOutput {
    fn from_iter<T: IntoIterator<Item = Assembly>>(iter: T) -> Self {
        Self(VecDeque::from_iter(iter))
    }
}

// one item per line, the way the assembler reads it
impl fmt::Display for AssemblyOutput {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.iter().try_for_each(|asm| writeln!(f, "{}", asm))
    }
}

impl fmt::Debug for AssemblyOutput {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        struct DoDisplay<'a>(&'a Assembly);

        impl fmt::Debug for DoDisplay<'_> {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        f.debug_list()
            .entries(self.0.iter().map(DoDisplay))
            .finish()
    }
}
