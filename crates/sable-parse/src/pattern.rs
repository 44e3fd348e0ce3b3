//! Fixed-shape rule matchers.
//!
//! A [`Pattern`] runs its steps in order against a rule-specific builder.
//! A failed step reports what it expected and the pattern carries on; the
//! node is still built when at least half of the steps matched.

use sable_errors::ParseErrorKind;
use tracing::trace;

use crate::ast::{Node, NodeId, Rule};
use crate::parser::Parser;

/// A builder field that can be written once.
pub(crate) struct Slot<T>(Option<T>);

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self(None)
    }
}

impl<T> Slot<T> {
    pub(crate) fn set(&mut self, value: T) {
        assert!(self.0.is_none(), "builder field written twice");
        self.0 = Some(value);
    }

    /// Stores `value` if there is one and reports whether it did.
    pub(crate) fn fill(&mut self, value: Option<T>) -> bool {
        match value {
            Some(value) => {
                self.set(value);
                true
            }
            None => false,
        }
    }

    pub(crate) fn into_inner(self) -> Option<T> {
        self.0
    }
}

pub(crate) trait Builder: Default {
    /// Finalizes the fields written so far, or gives up on the node.
    fn build(self) -> Option<Node>;
}

type StepFn<B> = fn(&mut Parser<'_>, &mut B) -> bool;

pub(crate) struct Step<B> {
    name: &'static str,
    optional: bool,
    run: StepFn<B>,
}

impl<B> Step<B> {
    pub(crate) const fn required(name: &'static str, run: StepFn<B>) -> Self {
        Self { name, optional: false, run }
    }

    /// A step whose absence is neither an error nor a match.
    pub(crate) const fn optional(name: &'static str, run: StepFn<B>) -> Self {
        Self { name, optional: true, run }
    }
}

pub(crate) struct Pattern<B: 'static> {
    rule: Rule,
    steps: &'static [Step<B>],
}

pub(crate) const fn create_pattern<B: 'static>(
    rule: Rule,
    steps: &'static [Step<B>],
) -> Pattern<B> {
    Pattern { rule, steps }
}

impl<B: Builder + 'static> Pattern<B> {
    fn threshold(&self) -> usize {
        self.steps.len().div_ceil(2).max(1)
    }

    /// Matches the pattern at the cursor. On failure the cursor is back where
    /// it started and every diagnostic of the attempt is discarded.
    pub(crate) fn parse(&self, p: &mut Parser<'_>) -> Option<NodeId> {
        let checkpoint = p.checkpoint();
        let frame = p.push_frame();
        let marker = p.start();
        let threshold = self.threshold();
        let mut builder = B::default();
        let mut matched = 0;

        for step in self.steps {
            if p.eof() {
                if step.optional {
                    continue;
                }
                if matched >= threshold {
                    p.report(ParseErrorKind::UnexpectedEndOfFile);
                }
                break;
            }

            let before = p.checkpoint();
            let step_frame = p.push_frame();
            if (step.run)(p, &mut builder) {
                p.merge_frame(step_frame);
                p.commit(before);
                matched += 1;
            } else {
                p.pop_frame(step_frame, None);
                p.restore(before);
                if !step.optional {
                    p.report(ParseErrorKind::ExpectedToken(step.name));
                }
            }
        }

        let node = match builder.build() {
            Some(kind) if matched >= threshold => marker.complete(p, kind, self.rule),
            _ => {
                marker.abandon();
                None
            }
        };

        p.pop_frame(frame, node);
        match node {
            Some(_) => p.commit(checkpoint),
            None => {
                trace!(rule = ?self.rule, matched, threshold, "pattern failed, backtracking");
                p.restore(checkpoint);
            }
        }
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "builder field written twice")]
    fn slots_are_write_once() {
        let mut slot = Slot::default();
        slot.set(1);
        slot.set(2);
    }

    #[test]
    fn fill_skips_missing_values() {
        let mut slot = Slot::default();
        assert!(!slot.fill(None::<u32>));
        assert!(slot.fill(Some(3)));
        assert_eq!(slot.into_inner(), Some(3));
    }
}
