mod arithmetic;
mod branch;
#[cfg(test)]
mod emulator;
mod function;
pub mod labels;
mod memory;
pub mod stack;

use crate::assembly::Symbol;
use crate::ast::Command;
use crate::error;
use crate::output::AssemblyOutput;
use labels::LabelGenerator;
use thiserror::Error;

/// Function the bootstrap code calls into
pub const DEFAULT_ENTRY_POINT: &str = "Sys.init";

pub trait CompileWith<State> {
    fn compile(self, state: &mut State) -> CompileRes<AssemblyOutput>;
}

/// Everything that outlives a single command: scopes and label counters.
#[derive(Debug, Default)]
pub struct TranslatorState {
    current_function: String,
    namespace: Option<String>,
    labels: LabelGenerator,
}

impl TranslatorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// `<current function>$<label>`
    pub fn scoped_label(&self, label: &str) -> Symbol {
        Symbol::Scoped {
            function: self.current_function.clone(),
            label: label.to_string(),
        }
    }

    pub fn static_symbol(&self, index: u16) -> CompileRes<Symbol> {
        match &self.namespace {
            Some(namespace) => Ok(Symbol::Static {
                namespace: namespace.clone(),
                index,
            }),
            None => Err(CompileError::new(CompileErrorKind::NoNamespace { index })),
        }
    }

    pub fn labels(&mut self) -> &mut LabelGenerator {
        &mut self.labels
    }
}

impl CompileWith<TranslatorState> for Command<'_> {
    fn compile(self, state: &mut TranslatorState) -> CompileRes<AssemblyOutput> {
        match self {
            Command::Arithmetic(op) => Ok(arithmetic::compile_arithmetic(state, op)),
            Command::Push { segment, index } => memory::compile_push(state, segment, index),
            Command::Pop { segment, index } => memory::compile_pop(state, segment, index),
            Command::Label(label) => Ok(branch::compile_label(state, label)),
            Command::Goto(label) => Ok(branch::compile_goto(state, label)),
            Command::IfGoto(label) => Ok(branch::compile_if_goto(state, label)),
            Command::Function { name, locals } => {
                Ok(function::compile_function(state, name, locals))
            }
            Command::Call { name, args } => function::compile_call(state, name, args),
            Command::Return => Ok(function::compile_return()),
        }
    }
}

/// Translates commands into one growing unit of assembly.
///
/// A single writer is meant to live for a whole translation run, across
/// every module, so that static variables stay private to their module and
/// every generated label is defined exactly once.
#[derive(Debug)]
pub struct CodeWriter {
    state: TranslatorState,
    output: AssemblyOutput,
    annotate: bool,
    entry_point: String,
}

impl Default for CodeWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeWriter {
    pub fn new() -> Self {
        Self {
            state: TranslatorState::new(),
            output: AssemblyOutput::new(),
            annotate: false,
            entry_point: DEFAULT_ENTRY_POINT.to_string(),
        }
    }

    /// Precede every translated command with a comment holding its VM text
    #[must_use]
    pub fn annotated(mut self, annotate: bool) -> Self {
        self.annotate = annotate;
        self
    }

    #[must_use]
    pub fn with_entry_point(mut self, entry_point: impl Into<String>) -> Self {
        self.entry_point = entry_point.into();
        self
    }

    /// Scope for the static variables of the module about to be translated
    pub fn set_namespace(&mut self, namespace: impl Into<String>) {
        let namespace = namespace.into();
        tracing::debug!(target: "codegen", "static namespace is now {namespace:?}");
        self.state.namespace = Some(namespace);
    }

    pub fn namespace(&self) -> Option<&str> {
        self.state.namespace.as_deref()
    }

    pub fn set_current_function(&mut self, function: impl Into<String>) {
        self.state.current_function = function.into();
    }

    pub fn current_function(&self) -> &str {
        &self.state.current_function
    }

    /// Translates a single command. Nothing is appended if it fails.
    pub fn emit(&mut self, command: &Command) -> CompileRes<()> {
        tracing::trace!(target: "codegen", "emitting `{command}`");
        let code = (*command).compile(&mut self.state)?;
        if self.annotate {
            self.output.comment(command);
        }
        self.output.extend(code);
        Ok(())
    }

    /// Sets up the stack and calls the entry point. Emitted once, before any
    /// module, when several modules are translated together.
    pub fn bootstrap(&mut self) -> CompileRes<()> {
        tracing::debug!(target: "codegen", "bootstrapping into {}", self.entry_point);
        let code = function::compile_bootstrap(&mut self.state, &self.entry_point)?;
        if self.annotate {
            self.output.comment("bootstrap");
        }
        self.output.extend(code);
        Ok(())
    }

    pub fn output(&self) -> &AssemblyOutput {
        &self.output
    }

    /// The translated program as assembly text
    pub fn finalize(self) -> String {
        self.output.to_string()
    }
}

pub type CompileRes<T> = Result<T, CompileError>;
pub type CompileError = error::Error<CompileErrorKind>;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CompileErrorKind {
    #[error("cannot pop into the constant segment (index {0})")]
    PopConstant(u16),
    #[error("pointer index must be 0 or 1, found {0}")]
    PointerIndex(u16),
    #[error("temp index must be between 0 and {max}, found {0}", max = memory::TEMP_SIZE - 1)]
    TempIndex(u16),
    #[error("constant {0} does not fit in an address instruction (max {max})", max = memory::MAX_CONSTANT)]
    ConstantOutOfRange(u16),
    #[error("static {index} used before any namespace was set")]
    NoNamespace { index: u16 },
    #[error("entry point {0:?} is not a valid function name")]
    InvalidEntryPoint(String),
}

#[cfg(test)]
fn compile_source(namespace: &str, source: &str) -> anyhow::Result<CodeWriter> {
    let meta = error::SourceMetadata::new(source).with_file("<test program>".into());
    let mut writer = CodeWriter::new();
    writer.set_namespace(namespace);
    for command in crate::parser::Parser::new(&meta) {
        let command = command?;
        writer
            .emit(&command.command)
            .map_err(|e| e.with_source(command.span, &meta))?;
    }
    Ok(writer)
}

#[cfg(test)]
mod tests {
    use super::emulator::Emulator;
    use super::*;
    use crate::assembly::{Address, Assembly, Instruction};
    use crate::ast::Segment;
    use std::collections::HashSet;

    fn run(source: &str) -> anyhow::Result<Emulator> {
        let writer = compile_source("Test", source)?;
        let mut emulator = Emulator::new(writer.output());
        emulator.set_stack(256);
        emulator.run(10_000);
        Ok(emulator)
    }

    #[test]
    fn add_leaves_the_sum_on_the_stack() -> anyhow::Result<()> {
        let emulator = run("push constant 7\npush constant 8\nadd\n")?;
        assert_eq!(emulator.sp(), 257);
        assert_eq!(emulator.stack_top(), 15);
        Ok(())
    }

    #[test]
    fn equal_values_compare_true() -> anyhow::Result<()> {
        let emulator = run("push constant 5\npush constant 5\neq\n")?;
        assert_eq!(emulator.sp(), 257);
        assert_eq!(emulator.stack_top(), -1);
        Ok(())
    }

    #[test]
    fn arithmetic_follows_operand_order() -> anyhow::Result<()> {
        let cases = [
            ("push constant 10\npush constant 3\nsub", 7),
            ("push constant 3\npush constant 10\nsub", -7),
            ("push constant 3\npush constant 10\nlt", -1),
            ("push constant 10\npush constant 3\nlt", 0),
            ("push constant 10\npush constant 3\ngt", -1),
            ("push constant 3\npush constant 3\ngt", 0),
            ("push constant 4\npush constant 5\neq", 0),
            ("push constant 12\npush constant 10\nand", 8),
            ("push constant 12\npush constant 10\nor", 14),
            ("push constant 9\nneg", -9),
            ("push constant 0\nnot", -1),
            ("push constant 1\nneg\npush constant 2\nlt", -1),
        ];
        for (source, expected) in cases {
            let emulator = run(source)?;
            assert_eq!(emulator.sp(), 257, "{source}");
            assert_eq!(emulator.stack_top(), expected, "{source}");
        }
        Ok(())
    }

    #[test]
    fn every_comparison_defines_fresh_labels() -> anyhow::Result<()> {
        let source = "push constant 1\npush constant 2\neq\n".repeat(4)
            + &"push constant 1\npush constant 2\nlt\n".repeat(3)
            + &"push constant 1\npush constant 2\ngt\n".repeat(2);
        let writer = compile_source("Test", &source)?;

        let labels: Vec<_> = writer
            .output()
            .iter()
            .filter_map(|asm| match asm {
                Assembly::Label(symbol) => Some(symbol.to_string()),
                _ => None,
            })
            .collect();
        let unique: HashSet<_> = labels.iter().collect();
        assert_eq!(labels.len(), 3 * 9);
        assert_eq!(unique.len(), labels.len());
        Ok(())
    }

    #[test]
    fn values_round_trip_through_every_segment() -> anyhow::Result<()> {
        let segments = [
            (Segment::Local, 3),
            (Segment::Argument, 2),
            (Segment::This, 4),
            (Segment::That, 0),
            (Segment::Temp, 7),
            (Segment::Pointer, 0),
            (Segment::Pointer, 1),
            (Segment::Static, 5),
        ];
        for (segment, index) in segments {
            let source = format!(
                "push constant 1234\npop {segment} {index}\npush {segment} {index}\n"
            );
            let writer = compile_source("Test", &source)?;
            let mut emulator = Emulator::new(writer.output());
            emulator.set_stack(256);
            emulator.set_ram(1, 300);
            emulator.set_ram(2, 400);
            emulator.set_ram(3, 3000);
            emulator.set_ram(4, 4000);
            emulator.run(1_000);

            assert_eq!(emulator.sp(), 257, "{source}");
            assert_eq!(emulator.stack_top(), 1234, "{source}");
        }
        Ok(())
    }

    #[test]
    fn segments_address_the_expected_cells() -> anyhow::Result<()> {
        let source = "push constant 11\npop local 2\npush constant 22\npop that 1\n\
                      push constant 33\npop temp 6\npush constant 3030\npop pointer 0\n\
                      push constant 44\npop this 0\n";
        let writer = compile_source("Test", source)?;
        let mut emulator = Emulator::new(writer.output());
        emulator.set_stack(256);
        emulator.set_ram(1, 300);
        emulator.set_ram(4, 4000);
        emulator.run(1_000);

        assert_eq!(emulator.ram(302), 11);
        assert_eq!(emulator.ram(4001), 22);
        assert_eq!(emulator.ram(11), 33);
        assert_eq!(emulator.ram(3), 3030);
        assert_eq!(emulator.ram(3030), 44);
        assert_eq!(emulator.sp(), 256);
        Ok(())
    }

    #[test]
    fn statics_are_private_to_their_namespace() -> anyhow::Result<()> {
        let mut writer = CodeWriter::new();
        writer.set_namespace("Foo");
        writer.emit(&Command::Push {
            segment: Segment::Static,
            index: 3,
        })?;
        writer.set_namespace("Bar");
        writer.emit(&Command::Push {
            segment: Segment::Static,
            index: 3,
        })?;

        let addressed: Vec<_> = writer
            .output()
            .iter()
            .filter_map(|asm| match asm {
                Assembly::Instruction(Instruction::Address(Address::Symbol(
                    symbol @ Symbol::Static { .. },
                ))) => Some(symbol.to_string()),
                _ => None,
            })
            .collect();
        assert_eq!(addressed, ["Foo.3", "Bar.3"]);
        Ok(())
    }

    #[test]
    fn call_and_return_restore_the_caller_frame() -> anyhow::Result<()> {
        let source = "\
push constant 11
push constant 22
push constant 33
call Foo.add 2
label END
goto END
function Foo.add 1
push argument 0
push argument 1
add
pop local 0
push local 0
return
";
        let writer = compile_source("Foo", source)?;
        let mut emulator = Emulator::new(writer.output());
        emulator.set_stack(261);
        emulator.set_ram(1, 261);
        emulator.set_ram(2, 256);
        emulator.set_ram(3, 3000);
        emulator.set_ram(4, 4000);
        emulator.run_until("$END", 1_000);

        // three pushes, two arguments consumed, one value returned
        assert_eq!(emulator.sp(), 261 + 3 - 2 + 1);
        assert_eq!(emulator.stack_top(), 55);
        assert_eq!(emulator.ram(261), 11);
        assert_eq!(
            [emulator.ram(1), emulator.ram(2), emulator.ram(3), emulator.ram(4)],
            [261, 256, 3000, 4000]
        );
        Ok(())
    }

    #[test]
    fn recursion_keeps_frames_apart() -> anyhow::Result<()> {
        // sum(n) = n == 0 ? 0 : n + sum(n - 1)
        let source = "\
push constant 10
call Main.sum 1
label END
goto END
function Main.sum 0
push argument 0
if-goto RECURSE
push constant 0
return
label RECURSE
push argument 0
push argument 0
push constant 1
sub
call Main.sum 1
add
return
";
        let writer = compile_source("Main", source)?;
        let mut emulator = Emulator::new(writer.output());
        emulator.set_stack(256);
        emulator.run_until("$END", 100_000);

        assert_eq!(emulator.sp(), 257);
        assert_eq!(emulator.stack_top(), 55);
        Ok(())
    }

    #[test]
    fn return_without_a_pushed_value_overwrites_the_first_argument() -> anyhow::Result<()> {
        let source = "\
push constant 7
push constant 8
call Foo.bar 2
label END
goto END
function Foo.bar 2
return
";
        let writer = compile_source("Foo", source)?;
        let mut emulator = Emulator::new(writer.output());
        emulator.set_stack(256);
        emulator.set_ram(1, 256);
        emulator.set_ram(2, 250);
        emulator.run_until("$END", 1_000);

        // ARG pointed at the 7; the "popped" value is the second local
        assert_eq!(emulator.sp(), 257);
        assert_eq!(emulator.ram(256), 0);
        assert_eq!([emulator.ram(1), emulator.ram(2)], [256, 250]);
        Ok(())
    }

    #[test]
    fn bootstrap_runs_the_entry_point_with_an_empty_stack() -> anyhow::Result<()> {
        let mut writer = CodeWriter::new();
        writer.bootstrap()?;
        writer.set_namespace("Sys");
        for command in [
            Command::Function {
                name: "Sys.init",
                locals: 0,
            },
            Command::Push {
                segment: Segment::Constant,
                index: 42,
            },
            Command::Pop {
                segment: Segment::Static,
                index: 0,
            },
            Command::Label("HALT"),
            Command::Goto("HALT"),
        ] {
            writer.emit(&command)?;
        }
        let mut emulator = Emulator::new(writer.output());
        emulator.run_until("Sys.init$HALT", 1_000);

        assert_eq!(emulator.ram(emulator.variable("Sys.0")), 42);
        // return address and the four saved pointers
        assert_eq!(emulator.sp(), 261);
        assert_eq!(emulator.ram(1), 261);
        assert_eq!(emulator.ram(2), 256);
        Ok(())
    }

    #[test]
    fn failed_commands_leave_no_output() {
        let mut writer = CodeWriter::new();
        let err = writer
            .emit(&Command::Push {
                segment: Segment::Static,
                index: 0,
            })
            .unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::NoNamespace { index: 0 });
        assert!(writer.output().is_empty());
    }

    #[test]
    fn annotations_precede_each_command() -> anyhow::Result<()> {
        let mut writer = CodeWriter::new().annotated(true);
        writer.emit(&Command::Label("START"))?;
        writer.emit(&Command::Goto("START"))?;
        assert_eq!(
            writer.finalize(),
            "// label START\n($START)\n// goto START\n@$START\n0;JMP\n"
        );
        Ok(())
    }

    #[test]
    fn errors_carry_the_source_location() {
        let err = compile_source("Test", "push constant 1\npop constant 2\n").unwrap_err();
        let err = err.downcast::<CompileError>().unwrap();
        assert_eq!(err.kind, CompileErrorKind::PopConstant(2));
        assert_eq!(
            err.position(),
            Some(crate::error::Position { line: 1, col: 0 })
        );
    }
}
