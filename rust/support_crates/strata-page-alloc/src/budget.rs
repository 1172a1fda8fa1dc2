use std::sync::Arc;

use crate::counter::Counter;

/// Represents a budget of direct memory bytes that can be allocated from.
#[derive(Clone)]
pub struct Budget(Arc<BudgetNode>);

impl Budget {
    /// Creates a new budget with the given limit.
    pub fn new(limit: u64) -> Budget {
        Budget(Arc::new(BudgetNode {
            limit,
            remaining: Counter::new(limit),
        }))
    }

    /// Returns the total amount this budget was created with.
    pub fn limit(&self) -> u64 {
        self.0.limit
    }

    /// Returns the remaining amount in this budget.
    ///
    /// **Note**: This method is primarily intended for diagnostic purposes. The returned
    /// value may be outdated in a concurrent environment.
    pub fn remaining(&self) -> u64 {
        self.0.remaining.read()
    }

    /// Attempts to allocate the specified amount from the budget.
    ///
    /// Returns an `Allocation` upon success, or an `AllocationError` if the budget
    /// lacks sufficient remaining funds. A failed attempt leaves the budget unchanged.
    ///
    /// The allocated amount is automatically returned to the `Budget` when the
    /// `Allocation` is dropped.
    pub fn allocate(&self, amount: u64) -> Result<Allocation, AllocationError> {
        if self.0.remaining.withdraw(amount) {
            Ok(Allocation {
                budget: self.0.clone(),
                amount,
            })
        } else {
            Err(AllocationError)
        }
    }
}

impl std::fmt::Debug for Budget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Budget")
            .field("limit", &self.limit())
            .field("remaining", &self.remaining())
            .finish()
    }
}

/// Represents an allocation from a budget.
///
/// When the allocation is dropped, the allocated amount is returned to the budget.
pub struct Allocation {
    budget: Arc<BudgetNode>,
    amount: u64,
}

impl Allocation {
    /// Currently allocated amount.
    pub fn amount(&self) -> u64 {
        self.amount
    }
}

impl Drop for Allocation {
    fn drop(&mut self) {
        if self.amount != 0 {
            self.budget.remaining.deposit(self.amount);
        }
    }
}

impl std::fmt::Debug for Allocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Allocation")
            .field("amount", &self.amount)
            .finish_non_exhaustive()
    }
}

/// An error that occurs when a budget allocation fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AllocationError;

impl std::fmt::Display for AllocationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Budget allocation error")
    }
}

impl std::error::Error for AllocationError {}

struct BudgetNode {
    limit: u64,
    remaining: Counter,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_creation() {
        let budget = Budget::new(100);
        assert_eq!(budget.remaining(), 100);
        assert_eq!(budget.limit(), 100);
    }

    #[test]
    fn test_allocate_success() {
        let budget = Budget::new(100);
        let allocation = budget.allocate(50).unwrap();
        assert_eq!(allocation.amount(), 50);
        assert_eq!(budget.remaining(), 50);
    }

    #[test]
    fn test_allocate_failure() {
        let budget = Budget::new(100);
        let result = budget.allocate(150);
        assert_eq!(result.unwrap_err(), AllocationError);
        assert_eq!(budget.remaining(), 100);
    }

    #[test]
    fn test_allocation_drop() {
        let budget = Budget::new(100);
        {
            let _allocation = budget.allocate(50).unwrap();
            assert_eq!(budget.remaining(), 50);
        }
        assert_eq!(budget.remaining(), 100);
    }

    #[test]
    fn test_allocation_outlives_budget_handle() {
        let budget = Budget::new(100);
        let allocation = budget.allocate(40).unwrap();
        let clone = budget.clone();
        drop(budget);
        assert_eq!(clone.remaining(), 60);
        drop(allocation);
        assert_eq!(clone.remaining(), 100);
    }
}
