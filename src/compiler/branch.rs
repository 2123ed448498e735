//! Labels are scoped to the function they appear in, so the same name can be
//! reused across functions.
use super::stack::pop_d;
use super::TranslatorState;
use crate::assembly::{Comp, Jump};
use crate::output::AssemblyOutput;

pub fn compile_label(state: &TranslatorState, label: &str) -> AssemblyOutput {
    let mut out = AssemblyOutput::new();
    out.label(state.scoped_label(label));
    out
}

pub fn compile_goto(state: &TranslatorState, label: &str) -> AssemblyOutput {
    let mut out = AssemblyOutput::new();
    out.at(state.scoped_label(label))
        .jump(Comp::Zero, Jump::Always);
    out
}

/// Jumps when the popped value is anything but zero
pub fn compile_if_goto(state: &TranslatorState, label: &str) -> AssemblyOutput {
    let mut out = AssemblyOutput::new();
    pop_d(&mut out)
        .at(state.scoped_label(label))
        .jump(Comp::D, Jump::NotEquals);
    out
}
