use super::stack::{pop_d, push_d};
use super::{CompileError, CompileErrorKind, CompileRes, TranslatorState};
use crate::assembly::{Comp, Dest, Register};
use crate::ast::Segment;
use crate::output::AssemblyOutput;

/// Largest value an address instruction can load
pub const MAX_CONSTANT: u16 = 0x7fff;
/// Number of cells in the temp segment (R5..R12)
pub const TEMP_SIZE: u16 = 8;

pub fn compile_push(
    state: &TranslatorState,
    segment: Segment,
    index: u16,
) -> CompileRes<AssemblyOutput> {
    let mut out = if segment == Segment::Constant {
        let mut out = AssemblyOutput::new();
        out.at(constant(index)?).assign(Dest::D, Comp::A);
        out
    } else {
        let mut out = address_of(state, segment, index)?;
        out.assign(Dest::D, Comp::M);
        out
    };
    push_d(&mut out);
    Ok(out)
}

pub fn compile_pop(
    state: &TranslatorState,
    segment: Segment,
    index: u16,
) -> CompileRes<AssemblyOutput> {
    let target = address_of(state, segment, index)?;
    let mut out = AssemblyOutput::new();
    pop_d(&mut out)
        .extend(target)
        .assign(Dest::M, Comp::D);
    Ok(out)
}

pub fn constant(value: u16) -> CompileRes<u16> {
    if value > MAX_CONSTANT {
        Err(CompileError::new(CompileErrorKind::ConstantOutOfRange(value)))
    } else {
        Ok(value)
    }
}

/// Code leaving A at the cell `segment[index]`, without touching D
fn address_of(state: &TranslatorState, segment: Segment, index: u16) -> CompileRes<AssemblyOutput> {
    let mut out = AssemblyOutput::new();
    match segment {
        Segment::Constant => {
            return Err(CompileError::new(CompileErrorKind::PopConstant(index)));
        }
        Segment::Local | Segment::Argument | Segment::This | Segment::That => {
            out.at(base_pointer(segment)).assign(Dest::A, Comp::M);
            offset(&mut out, index);
        }
        Segment::Temp => {
            if index >= TEMP_SIZE {
                return Err(CompileError::new(CompileErrorKind::TempIndex(index)));
            }
            out.at(Register::Temp);
            offset(&mut out, index);
        }
        Segment::Pointer => {
            let register = match index {
                0 => Register::This,
                1 => Register::That,
                _ => return Err(CompileError::new(CompileErrorKind::PointerIndex(index))),
            };
            out.at(register);
        }
        Segment::Static => {
            out.at(state.static_symbol(index)?);
        }
    }
    Ok(out)
}

const fn base_pointer(segment: Segment) -> Register {
    match segment {
        Segment::Argument => Register::Argument,
        Segment::This => Register::This,
        Segment::That => Register::That,
        _ => Register::Local,
    }
}

// walks A forward one cell at a time
fn offset(out: &mut AssemblyOutput, index: u16) {
    for _ in 0..index {
        out.assign(Dest::A, Comp::APlusOne);
    }
}
