use crate::assembly::{ComparisonBlock, Symbol};
use crate::ast::Comparison;
use std::collections::HashMap;

/// Hands out the indices that keep generated labels unique over a whole
/// translation run. Counters only ever go up.
#[derive(Debug, Default)]
pub struct LabelGenerator {
    comparisons: HashMap<Comparison, usize>,
    call_sites: HashMap<String, usize>,
}

/// The three labels of one comparison site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonLabels {
    pub check: Symbol,
    pub is_true: Symbol,
    pub end: Symbol,
}

impl LabelGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_comparison(&mut self, comparison: Comparison) -> ComparisonLabels {
        let counter = self.comparisons.entry(comparison).or_default();
        let index = *counter;
        *counter += 1;
        tracing::trace!(target: "codegen::labels", "comparison {comparison:?} #{index}");
        let label = |block| Symbol::Comparison {
            block,
            comparison,
            index,
        };
        ComparisonLabels {
            check: label(ComparisonBlock::Check),
            is_true: label(ComparisonBlock::True),
            end: label(ComparisonBlock::End),
        }
    }

    pub fn new_return_address(&mut self, function: &str) -> Symbol {
        let counter = self.call_sites.entry(function.to_string()).or_default();
        let call = *counter;
        *counter += 1;
        tracing::trace!(target: "codegen::labels", "call site #{call} of {function}");
        Symbol::ReturnAddress {
            function: function.to_string(),
            call,
        }
    }
}
