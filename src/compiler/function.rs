use super::memory::constant;
use super::stack::{pop_d, push_d};
use super::{CompileError, CompileErrorKind, CompileRes, TranslatorState};
use crate::assembly::{Comp, Dest, Jump, Register, Symbol};
use crate::output::AssemblyOutput;
use crate::parser::is_symbol;

/// Cells a call pushes before jumping: the return address and the four
/// saved segment pointers.
const FRAME_SIZE: u16 = 5;
/// Where the stack starts
const STACK_BASE: u16 = 256;

/// Pointers saved by `call` and restored by `return`, in push order
const SAVED_POINTERS: [Register; 4] = [
    Register::Local,
    Register::Argument,
    Register::This,
    Register::That,
];

pub fn compile_function(state: &mut TranslatorState, name: &str, locals: u16) -> AssemblyOutput {
    tracing::debug!(target: "codegen", "entering function {name} with {locals} locals");
    state.current_function = name.to_string();

    let mut out = AssemblyOutput::new();
    out.label(Symbol::Function(name.to_string()));
    for _ in 0..locals {
        out.at(0u16).assign(Dest::D, Comp::A);
        push_d(&mut out);
    }
    out
}

pub fn compile_call(state: &mut TranslatorState, name: &str, args: u16) -> CompileRes<AssemblyOutput> {
    let args = constant(args)?;
    let return_address = state.labels().new_return_address(name);
    let mut out = AssemblyOutput::new();

    out.at(return_address.clone()).assign(Dest::D, Comp::A);
    push_d(&mut out);
    for pointer in SAVED_POINTERS {
        out.at(pointer).assign(Dest::D, Comp::M);
        push_d(&mut out);
    }

    // ARG = SP - 5 - args
    out.at(Register::StackPointer)
        .assign(Dest::D, Comp::M)
        .at(FRAME_SIZE)
        .assign(Dest::D, Comp::DMinusA)
        .at(args)
        .assign(Dest::D, Comp::DMinusA)
        .at(Register::Argument)
        .assign(Dest::M, Comp::D);
    // LCL = SP
    out.at(Register::StackPointer)
        .assign(Dest::D, Comp::M)
        .at(Register::Local)
        .assign(Dest::M, Comp::D);

    out.at(Symbol::Function(name.to_string()))
        .jump(Comp::Zero, Jump::Always)
        .label(return_address);
    Ok(out)
}

/// Hands the top of the stack back to the caller in place of its arguments,
/// then restores the caller's frame through R13 and jumps through R14.
pub fn compile_return() -> AssemblyOutput {
    let mut out = AssemblyOutput::new();
    out.at(Register::Local)
        .assign(Dest::D, Comp::M)
        .at(Register::Frame)
        .assign(Dest::M, Comp::D);
    // the return address must be read before the return value can clobber it
    out.at(FRAME_SIZE)
        .assign(Dest::A, Comp::DMinusA)
        .assign(Dest::D, Comp::M)
        .at(Register::ReturnAddress)
        .assign(Dest::M, Comp::D);

    pop_d(&mut out)
        .at(Register::Argument)
        .assign(Dest::A, Comp::M)
        .assign(Dest::M, Comp::D);
    out.at(Register::Argument)
        .assign(Dest::D, Comp::MPlusOne)
        .at(Register::StackPointer)
        .assign(Dest::M, Comp::D);

    for pointer in SAVED_POINTERS.into_iter().rev() {
        out.at(Register::Frame)
            .assign(Dest::AM, Comp::MMinusOne)
            .assign(Dest::D, Comp::M)
            .at(pointer)
            .assign(Dest::M, Comp::D);
    }

    out.at(Register::ReturnAddress)
        .assign(Dest::A, Comp::M)
        .jump(Comp::Zero, Jump::Always);
    out
}

/// `SP = 256`, then a call into `entry` with no arguments
pub fn compile_bootstrap(state: &mut TranslatorState, entry: &str) -> CompileRes<AssemblyOutput> {
    if !is_symbol(entry) {
        return Err(CompileError::new(CompileErrorKind::InvalidEntryPoint(
            entry.to_string(),
        )));
    }
    let mut out = AssemblyOutput::new();
    out.at(STACK_BASE)
        .assign(Dest::D, Comp::A)
        .at(Register::StackPointer)
        .assign(Dest::M, Comp::D);
    Ok(out.chain(compile_call(state, entry, 0)?))
}
