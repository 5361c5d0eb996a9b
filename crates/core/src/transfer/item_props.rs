//! Property-based tests for the transfer item state machine.

use proptest::prelude::*;
use rust_decimal::Decimal;

use budgetctl_shared::types::{BudgetControlId, BudgetLineId};

use crate::budget::{BudgetBook, BudgetControlSheet, BudgetLedger, BudgetLine, BudgetScope};
use crate::transfer::error::TransferError;
use crate::transfer::item::TransferItem;
use crate::transfer::types::ItemState;

/// Strategy for amounts with two decimal places, positive or negative.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (-1_000_000i64..1_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

struct Pair {
    book: BudgetBook,
    source_sheet: BudgetControlId,
    target_sheet: BudgetControlId,
    source: BudgetLineId,
    target: BudgetLineId,
}

fn pair(source_amount: Decimal, target_amount: Decimal) -> Pair {
    let mut book = BudgetBook::new();
    let scope = book.insert_scope(BudgetScope::new("FY2026"));
    let source_sheet = book
        .insert_sheet(BudgetControlSheet::new("Source", scope))
        .unwrap();
    let target_sheet = book
        .insert_sheet(BudgetControlSheet::new("Target", scope))
        .unwrap();
    let source = book
        .insert_line(BudgetLine::new(Some(source_sheet), source_amount))
        .unwrap();
    let target = book
        .insert_line(BudgetLine::new(Some(target_sheet), target_amount))
        .unwrap();
    Pair {
        book,
        source_sheet,
        target_sheet,
        source,
        target,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Same sheet on both ends always fails, whatever the amount.
    #[test]
    fn prop_same_endpoint_rejected(amount in arb_amount(), start in arb_amount()) {
        let mut p = pair(start, Decimal::ZERO);
        let mut item = TransferItem::new(p.source_sheet, p.source_sheet)
            .with_lines(p.source, p.source, amount);

        prop_assert_eq!(
            item.commit(&mut p.book),
            Err(TransferError::SameEndpoint(p.source_sheet))
        );
        prop_assert_eq!(p.book.amount(p.source).unwrap(), start);
        prop_assert_eq!(item.state, ItemState::Draft);
    }

    /// Commit fails exactly when amount > source amount, and then mutates nothing.
    #[test]
    fn prop_commit_iff_amount_covered(
        amount in arb_amount(),
        source_amount in arb_amount(),
        target_amount in arb_amount(),
    ) {
        let mut p = pair(source_amount, target_amount);
        let mut item = TransferItem::new(p.source_sheet, p.target_sheet)
            .with_lines(p.source, p.target, amount);

        let result = item.commit(&mut p.book);

        if amount > source_amount {
            prop_assert_eq!(
                result,
                Err(TransferError::InsufficientAmount { requested: amount, available: source_amount })
            );
            prop_assert_eq!(p.book.amount(p.source).unwrap(), source_amount);
            prop_assert_eq!(p.book.amount(p.target).unwrap(), target_amount);
            prop_assert_eq!(item.state, ItemState::Draft);
        } else {
            prop_assert!(result.is_ok());
            prop_assert_eq!(p.book.amount(p.source).unwrap(), source_amount - amount);
            prop_assert_eq!(p.book.amount(p.target).unwrap(), target_amount + amount);
            prop_assert_eq!(item.state, ItemState::Transferred);
        }
    }

    /// Commit conserves the sum of the two lines.
    #[test]
    fn prop_commit_conserves_total(
        amount in arb_amount(),
        source_amount in arb_amount(),
        target_amount in arb_amount(),
    ) {
        prop_assume!(amount <= source_amount);
        let mut p = pair(source_amount, target_amount);
        let mut item = TransferItem::new(p.source_sheet, p.target_sheet)
            .with_lines(p.source, p.target, amount);

        item.commit(&mut p.book).unwrap();

        prop_assert_eq!(p.book.total(), source_amount + target_amount);
    }

    /// Rollback after commit restores both lines when nothing else moved them.
    #[test]
    fn prop_round_trip(
        amount in arb_amount(),
        source_amount in arb_amount(),
        target_amount in arb_amount(),
    ) {
        prop_assume!(amount <= source_amount);
        // Reversal re-checks against the depleted source.
        prop_assume!(amount <= source_amount - amount);
        let mut p = pair(source_amount, target_amount);
        let mut item = TransferItem::new(p.source_sheet, p.target_sheet)
            .with_lines(p.source, p.target, amount);

        item.commit(&mut p.book).unwrap();
        item.rollback(&mut p.book).unwrap();

        prop_assert_eq!(p.book.amount(p.source).unwrap(), source_amount);
        prop_assert_eq!(p.book.amount(p.target).unwrap(), target_amount);
        prop_assert_eq!(item.state, ItemState::Reversed);
    }

    /// A second commit or rollback always fails with InvalidState and changes nothing.
    #[test]
    fn prop_repeat_operations_rejected(amount in 0i64..1_000, extra in 0i64..1_000) {
        let amount = Decimal::from(amount);
        let source_amount = amount * Decimal::TWO + Decimal::from(extra);
        let mut p = pair(source_amount, Decimal::ZERO);
        let mut item = TransferItem::new(p.source_sheet, p.target_sheet)
            .with_lines(p.source, p.target, amount);

        item.commit(&mut p.book).unwrap();
        let after_commit = p.book.clone();
        let is_invalid_state = matches!(item.commit(&mut p.book), Err(TransferError::InvalidState { .. }));
        prop_assert!(is_invalid_state);
        prop_assert_eq!(&p.book, &after_commit);

        item.rollback(&mut p.book).unwrap();
        let after_rollback = p.book.clone();
        let is_invalid_state = matches!(item.rollback(&mut p.book), Err(TransferError::InvalidState { .. }));
        prop_assert!(is_invalid_state);
        prop_assert_eq!(&p.book, &after_rollback);
    }
}
