// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The stack of ancestor operations applied to a subtree.
//!
//! During Preroll every clip, transform, and opacity node pushes a
//! [`Mutator`] before visiting its children and pops it afterwards. Platform
//! views capture a snapshot of the stack so the embedder can reproduce the
//! same clipping and transformation natively.

use kurbo::{Affine, BezPath, Ellipse, Rect, RoundedRect, Shape as _};

use crate::shape::Shape;

/// A single ancestor operation.
#[derive(Clone, Debug, PartialEq)]
pub enum Mutator {
    /// Clip to a rectangle.
    ClipRect(Rect),
    /// Clip to a rounded rectangle.
    ClipRoundedRect(RoundedRect),
    /// Clip to a path.
    ClipPath(BezPath),
    /// Apply a transform.
    Transform(Affine),
    /// Multiply alpha.
    Opacity(u8),
}

impl Mutator {
    /// Opacity as a fraction in `0..=1`, or `1.0` for non-opacity mutators.
    #[must_use]
    pub fn alpha_fraction(&self) -> f64 {
        match self {
            Self::Opacity(alpha) => f64::from(*alpha) / 255.0,
            _ => 1.0,
        }
    }
}

impl From<&Shape> for Mutator {
    fn from(shape: &Shape) -> Self {
        match shape {
            Shape::Rect(r) => Self::ClipRect(*r),
            Shape::RoundedRect(rr) => Self::ClipRoundedRect(*rr),
            Shape::Oval(r) => Self::ClipPath(Ellipse::from_rect(*r).to_path(0.1)),
            Shape::Path(path) => Self::ClipPath(path.clone()),
        }
    }
}

/// Ordered list of mutators from the root down to the current node.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MutatorsStack {
    stack: Vec<Mutator>,
}

impl MutatorsStack {
    /// Creates an empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a mutator.
    pub fn push(&mut self, mutator: Mutator) {
        self.stack.push(mutator);
    }

    /// Pops the most recent mutator.
    pub fn pop(&mut self) -> Option<Mutator> {
        self.stack.pop()
    }

    /// Pops mutators until at most `len` remain.
    pub fn truncate(&mut self, len: usize) {
        self.stack.truncate(len);
    }

    /// Number of mutators on the stack.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    /// Returns `true` if the stack is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// The most recently pushed mutator.
    #[must_use]
    pub fn top(&self) -> Option<&Mutator> {
        self.stack.last()
    }

    /// Iterates from the root (outermost) mutator inwards.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Mutator> {
        self.stack.iter()
    }

    /// Product of every transform on the stack.
    #[must_use]
    pub fn total_transform(&self) -> Affine {
        self.stack.iter().fold(Affine::IDENTITY, |acc, m| match m {
            Mutator::Transform(t) => acc * *t,
            _ => acc,
        })
    }

    /// Product of every opacity on the stack, as a fraction.
    #[must_use]
    pub fn total_opacity(&self) -> f64 {
        self.stack.iter().map(Mutator::alpha_fraction).product()
    }
}
