//! # Credit Ledger
//!
//! **Append-only signed deltas with paged running balances**
//!
//! A gang's balance is never stored. It is the sum of every change ever
//! written for that gang. History views show the newest transactions first,
//! each annotated with the balance immediately after it was applied.
//!
//! ## Paging Without Re-Summing
//!
//! ```text
//! newest ──────────────────────────────────────────────▶ oldest
//! [ rows newer than the page ][ page rows ][ older rows ]
//!   └── newer_sum ──────────┘
//!
//! top_balance      = current_balance - newer_sum
//! balance_after[0] = top_balance
//! balance_after[i] = balance_after[i-1] - change[i-1]
//! ```
//!
//! Only one aggregate over the first `offset` rows is needed per page; the
//! page itself is walked once.

use underhive_shared::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, MIN_PAGE_SIZE};

use crate::error::{EconomyError, EconomyResult};

/// Anything that carries a signed credit change.
pub trait LedgerRow {
    /// The signed change this row applied to the balance.
    fn change(&self) -> i64;
}

impl LedgerRow for i64 {
    fn change(&self) -> i64 {
        *self
    }
}

// ============================================================================
// Page Requests
// ============================================================================

/// A clamped history request: 1-based page, size within `[1, 50]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    /// Clamps raw user input into a valid request.
    #[must_use]
    pub fn new(page: i64, page_size: i64) -> Self {
        let page = u32::try_from(page.max(1)).unwrap_or(u32::MAX);
        let page_size = page_size.clamp(i64::from(MIN_PAGE_SIZE), i64::from(MAX_PAGE_SIZE));
        Self {
            page,
            // clamped above, always fits
            page_size: u32::try_from(page_size).unwrap_or(MAX_PAGE_SIZE),
        }
    }

    /// Requested page (1-based).
    #[must_use]
    pub const fn page(self) -> u32 {
        self.page
    }

    /// Requested page size.
    #[must_use]
    pub const fn page_size(self) -> u32 {
        self.page_size
    }

    /// Resolves the request against the number of stored transactions.
    ///
    /// A page past the end is clamped to the last page.
    #[must_use]
    pub fn window(self, total_count: u64) -> PageWindow {
        let size = u64::from(self.page_size);
        let total_pages = total_count.div_ceil(size).max(1);
        let total_pages = u32::try_from(total_pages).unwrap_or(u32::MAX);
        let page = self.page.min(total_pages);
        PageWindow {
            page,
            page_size: self.page_size,
            total_pages,
            offset: u64::from(page - 1) * size,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// The concrete slice of history a request resolved to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageWindow {
    /// Effective page (1-based, never past the last page).
    pub page: u32,
    /// Rows per page.
    pub page_size: u32,
    /// Total number of pages, at least 1.
    pub total_pages: u32,
    /// Number of newer rows skipped before this page.
    pub offset: u64,
}

// ============================================================================
// Annotated Pages
// ============================================================================

/// A transaction together with the balance right after it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryEntry<R> {
    /// The stored transaction.
    pub row: R,
    /// Balance immediately after this transaction was applied.
    pub balance_after: i64,
}

/// One page of a gang's history, newest first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryPage<R> {
    /// Annotated rows for this page.
    pub entries: Vec<HistoryEntry<R>>,
    /// Which slice of history this is.
    pub window: PageWindow,
    /// Total number of transactions for the gang.
    pub total_count: u64,
    /// The gang's balance after its newest transaction.
    pub current_balance: i64,
}

impl<R: LedgerRow> HistoryPage<R> {
    /// Builds a page from its rows and the two aggregates the store computes.
    ///
    /// * `current_balance` - sum of every change for the gang
    /// * `newer_sum` - sum of the changes of the `window.offset` newest rows
    /// * `rows` - this page's rows, newest first
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::ArithmeticOverflow`] if a balance leaves `i64`.
    pub fn assemble(
        window: PageWindow,
        total_count: u64,
        current_balance: i64,
        newer_sum: i64,
        rows: Vec<R>,
    ) -> EconomyResult<Self> {
        let mut reference = current_balance
            .checked_sub(newer_sum)
            .ok_or(EconomyError::ArithmeticOverflow)?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let balance_after = reference;
            reference = reference
                .checked_sub(row.change())
                .ok_or(EconomyError::ArithmeticOverflow)?;
            entries.push(HistoryEntry { row, balance_after });
        }

        Ok(Self {
            entries,
            window,
            total_count,
            current_balance,
        })
    }

    /// Empty history: balance 0, one (empty) page.
    #[must_use]
    pub fn empty(request: PageRequest) -> Self {
        Self {
            entries: Vec::new(),
            window: request.window(0),
            total_count: 0,
            current_balance: 0,
        }
    }

    /// Whether the page carries no transactions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Pages an in-memory history (newest first) the same way the store does.
///
/// # Errors
///
/// Returns [`EconomyError::ArithmeticOverflow`] if the balance leaves `i64`.
pub fn paginate<R: LedgerRow + Clone>(
    newest_first: &[R],
    request: PageRequest,
) -> EconomyResult<HistoryPage<R>> {
    let current_balance = sum_changes(newest_first)?;
    let window = request.window(newest_first.len() as u64);

    let offset = usize::try_from(window.offset).unwrap_or(usize::MAX);
    let newer = newest_first.get(..offset).unwrap_or(newest_first);
    let newer_sum = sum_changes(newer)?;

    let rows = newest_first
        .iter()
        .skip(offset)
        .take(window.page_size as usize)
        .cloned()
        .collect();

    HistoryPage::assemble(
        window,
        newest_first.len() as u64,
        current_balance,
        newer_sum,
        rows,
    )
}

/// Sums the changes of a slice of rows.
///
/// # Errors
///
/// Returns [`EconomyError::ArithmeticOverflow`] on overflow.
pub fn sum_changes<R: LedgerRow>(rows: &[R]) -> EconomyResult<i64> {
    rows.iter().try_fold(0i64, |acc, row| {
        acc.checked_add(row.change())
            .ok_or(EconomyError::ArithmeticOverflow)
    })
}

// ============================================================================
// Balance Guards
// ============================================================================

/// Checks that applying `change` keeps the balance at or above zero.
///
/// Credits are never overdrawn: a debit larger than the balance is refused
/// and nothing should be written.
///
/// # Errors
///
/// Returns [`EconomyError::InsufficientCredits`] for an overdraft.
pub fn check_debit(balance: i64, change: i64) -> EconomyResult<()> {
    if change < 0 && balance < change.saturating_neg() {
        return Err(EconomyError::InsufficientCredits {
            available: balance,
            requested: change.saturating_neg(),
        });
    }
    balance
        .checked_add(change)
        .map(|_| ())
        .ok_or(EconomyError::ArithmeticOverflow)
}

/// Delta that takes `current` to exactly `target`.
///
/// # Errors
///
/// Returns [`EconomyError::NegativeAmount`] for a negative target.
pub fn delta_to(current: i64, target: i64) -> EconomyResult<i64> {
    if target < 0 {
        return Err(EconomyError::NegativeAmount(target));
    }
    target
        .checked_sub(current)
        .ok_or(EconomyError::ArithmeticOverflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Oldest first, as they would be written.
    fn history(changes: &[i64]) -> Vec<i64> {
        changes.iter().rev().copied().collect()
    }

    #[test]
    fn test_page_request_clamps() {
        let req = PageRequest::new(0, 500);
        assert_eq!(req.page(), 1);
        assert_eq!(req.page_size(), MAX_PAGE_SIZE);

        let req = PageRequest::new(-3, 0);
        assert_eq!(req.page(), 1);
        assert_eq!(req.page_size(), MIN_PAGE_SIZE);
    }

    #[test]
    fn test_window_clamps_to_last_page() {
        let window = PageRequest::new(9, 10).window(25);
        assert_eq!(window.total_pages, 3);
        assert_eq!(window.page, 3);
        assert_eq!(window.offset, 20);
    }

    #[test]
    fn test_window_for_empty_history() {
        let window = PageRequest::new(4, 10).window(0);
        assert_eq!(window.total_pages, 1);
        assert_eq!(window.page, 1);
        assert_eq!(window.offset, 0);
    }

    #[test]
    fn test_empty_history_page() {
        let page = paginate::<i64>(&[], PageRequest::new(2, 10)).unwrap();
        assert!(page.is_empty());
        assert_eq!(page.current_balance, 0);
        assert_eq!(page.window.total_pages, 1);
        assert_eq!(page, HistoryPage::empty(PageRequest::new(2, 10)));
    }

    #[test]
    fn test_running_balance_first_page() {
        // written: +100, -30, +50  => balances 100, 70, 120
        let rows = history(&[100, -30, 50]);
        let page = paginate(&rows, PageRequest::new(1, 10)).unwrap();

        let balances: Vec<i64> = page.entries.iter().map(|e| e.balance_after).collect();
        assert_eq!(balances, vec![120, 70, 100]);
        assert_eq!(page.current_balance, 120);
    }

    #[test]
    fn test_running_balance_later_page() {
        // written: +10, +20, +30, +40, +50  => balances 10, 30, 60, 100, 150
        let rows = history(&[10, 20, 30, 40, 50]);
        let page = paginate(&rows, PageRequest::new(2, 2)).unwrap();

        assert_eq!(page.window.offset, 2);
        let got: Vec<(i64, i64)> = page
            .entries
            .iter()
            .map(|e| (e.row, e.balance_after))
            .collect();
        assert_eq!(got, vec![(30, 60), (20, 30)]);
    }

    #[test]
    fn test_check_debit() {
        assert!(check_debit(50, -50).is_ok());
        assert!(check_debit(0, 25).is_ok());
        assert_eq!(
            check_debit(40, -50),
            Err(EconomyError::InsufficientCredits {
                available: 40,
                requested: 50
            })
        );
        assert_eq!(check_debit(i64::MAX, 1), Err(EconomyError::ArithmeticOverflow));
    }

    #[test]
    fn test_delta_to() {
        assert_eq!(delta_to(120, 50), Ok(-70));
        assert_eq!(delta_to(0, 0), Ok(0));
        assert_eq!(delta_to(10, -1), Err(EconomyError::NegativeAmount(-1)));
    }
}
