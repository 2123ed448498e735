use super::stack::{increment, pop_address, pop_d, write_top};
use super::TranslatorState;
use crate::assembly::{Comp, Dest, Jump};
use crate::ast::{ArithmeticOp, BinaryOp, Comparison, UnaryOp};
use crate::output::AssemblyOutput;

pub fn compile_arithmetic(state: &mut TranslatorState, op: ArithmeticOp) -> AssemblyOutput {
    match op {
        ArithmeticOp::Binary(op) => compile_binary(op),
        ArithmeticOp::Unary(op) => compile_unary(op),
        ArithmeticOp::Compare(comparison) => compile_comparison(state, comparison),
    }
}

// y is popped into D, then x is left addressable as M and overwritten in place
fn compile_binary(op: BinaryOp) -> AssemblyOutput {
    let mut out = AssemblyOutput::new();
    pop_d(&mut out);
    pop_address(&mut out);
    let comp = match op {
        BinaryOp::Add => Comp::DPlusM,
        BinaryOp::Sub => {
            // -y - (-x)
            out.assign(Dest::D, Comp::NegD).assign(Dest::M, Comp::NegM);
            Comp::DMinusM
        }
        BinaryOp::And => Comp::DAndM,
        BinaryOp::Or => Comp::DOrM,
    };
    out.assign(Dest::M, comp);
    increment(&mut out);
    out
}

fn compile_unary(op: UnaryOp) -> AssemblyOutput {
    let comp = match op {
        UnaryOp::Neg => Comp::NegM,
        UnaryOp::Not => Comp::NotM,
    };
    let mut out = AssemblyOutput::new();
    pop_address(&mut out).assign(Dest::M, comp);
    increment(&mut out);
    out
}

/// The true block is laid out first and skipped over, so the check can fall
/// through to writing `false`.
fn compile_comparison(state: &mut TranslatorState, comparison: Comparison) -> AssemblyOutput {
    let labels = state.labels().new_comparison(comparison);
    let mut out = AssemblyOutput::new();

    out.at(labels.check.clone())
        .jump(Comp::Zero, Jump::Always)
        .label(labels.is_true.clone());
    write_top(&mut out, Comp::MinusOne)
        .at(labels.end.clone())
        .jump(Comp::Zero, Jump::Always)
        .label(labels.check);

    pop_d(&mut out);
    pop_address(&mut out)
        .assign(Dest::D, Comp::DMinusM)
        .assign(Dest::D, Comp::NegD)
        .at(labels.is_true)
        .jump(Comp::D, Jump::from(comparison));
    write_top(&mut out, Comp::Zero).label(labels.end);
    increment(&mut out);
    out
}
