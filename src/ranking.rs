use crate::error::{Result, SalesAnalyticsError};
use crate::grouping::GroupAggregate;
use crate::schema::QuickFilter;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: usize = 5;
pub const DEFAULT_PAGE_INCREMENT: usize = 5;

/// Sorts by total value, highest first. Ties keep their incoming order.
pub fn rank(mut groups: Vec<GroupAggregate>) -> Vec<GroupAggregate> {
    groups.sort_by(|a, b| b.metrics.total_value.total_cmp(&a.metrics.total_value));
    groups
}

impl QuickFilter {
    pub fn matches(self, group: &GroupAggregate) -> bool {
        match self {
            QuickFilter::All => true,
            QuickFilter::Active => group.metrics.total_value > 0.0,
            QuickFilter::Inactive => group.metrics.total_value == 0.0,
        }
    }
}

pub fn apply_filter(groups: &[GroupAggregate], filter: QuickFilter) -> Vec<GroupAggregate> {
    groups.iter().filter(|g| filter.matches(g)).cloned().collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuickFilterCounts {
    pub all: usize,
    pub active: usize,
    pub inactive: usize,
}

impl QuickFilterCounts {
    pub fn from_groups(groups: &[GroupAggregate]) -> Self {
        Self {
            all: groups.len(),
            active: groups.iter().filter(|g| QuickFilter::Active.matches(g)).count(),
            inactive: groups
                .iter()
                .filter(|g| QuickFilter::Inactive.matches(g))
                .count(),
        }
    }
}

/// First `n` rows of an already ranked sequence.
pub fn top_n<T>(ranked: &[T], n: usize) -> &[T] {
    &ranked[..n.min(ranked.len())]
}

/// Last `n` rows of a ranked sequence, weakest first.
pub fn bottom_n<T: Clone>(ranked: &[T], n: usize) -> Vec<T> {
    let start = ranked.len().saturating_sub(n);
    ranked[start..].iter().rev().cloned().collect()
}

/// How many ranked rows are visible. Growing the window never touches the
/// rows themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageWindow {
    initial: usize,
    increment: usize,
    shown: usize,
}

impl Default for PageWindow {
    fn default() -> Self {
        Self {
            initial: DEFAULT_PAGE_SIZE,
            increment: DEFAULT_PAGE_INCREMENT,
            shown: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageWindow {
    pub fn new(initial: usize, increment: usize) -> Result<Self> {
        if initial == 0 {
            return Err(SalesAnalyticsError::InvalidPageSize(initial));
        }
        if increment == 0 {
            return Err(SalesAnalyticsError::InvalidPageSize(increment));
        }
        Ok(Self {
            initial,
            increment,
            shown: initial,
        })
    }

    pub fn shown(&self) -> usize {
        self.shown
    }

    pub fn show_more(&mut self) {
        self.shown = self.shown.saturating_add(self.increment);
    }

    pub fn reset(&mut self) {
        self.shown = self.initial;
    }

    pub fn is_expanded(&self) -> bool {
        self.shown > self.initial
    }

    pub fn has_more(&self, len: usize) -> bool {
        len > self.shown
    }

    /// Rows the next [`PageWindow::show_more`] would reveal.
    pub fn next_increment(&self, len: usize) -> usize {
        self.increment.min(len.saturating_sub(self.shown))
    }

    pub fn top<'a, T>(&self, ranked: &'a [T]) -> &'a [T] {
        top_n(ranked, self.shown)
    }

    pub fn bottom<T: Clone>(&self, ranked: &[T]) -> Vec<T> {
        bottom_n(ranked, self.shown)
    }
}
