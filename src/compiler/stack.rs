//! Stack primitives shared by every command. SP always points at the next
//! free slot.
use crate::assembly::{Comp, Dest, Register};
use crate::output::AssemblyOutput;

/// `*SP = D; SP++`
pub fn push_d(out: &mut AssemblyOutput) -> &mut AssemblyOutput {
    out.at(Register::StackPointer)
        .assign(Dest::A, Comp::M)
        .assign(Dest::M, Comp::D);
    increment(out)
}

/// `SP--; A = SP`, leaving the popped slot addressable as M
pub fn pop_address(out: &mut AssemblyOutput) -> &mut AssemblyOutput {
    out.at(Register::StackPointer)
        .assign(Dest::M, Comp::MMinusOne)
        .assign(Dest::A, Comp::M)
}

/// `SP--; D = *SP`
pub fn pop_d(out: &mut AssemblyOutput) -> &mut AssemblyOutput {
    pop_address(out).assign(Dest::D, Comp::M)
}

/// `SP++`
pub fn increment(out: &mut AssemblyOutput) -> &mut AssemblyOutput {
    out.at(Register::StackPointer)
        .assign(Dest::M, Comp::MPlusOne)
}

/// `*SP = value`, without moving SP
pub fn write_top(out: &mut AssemblyOutput, comp: Comp) -> &mut AssemblyOutput {
    out.at(Register::StackPointer)
        .assign(Dest::A, Comp::M)
        .assign(Dest::M, comp)
}
