//! Property-based tests for batch transfer and reverse.

use std::sync::Arc;

use proptest::prelude::*;
use rust_decimal::Decimal;

use budgetctl_shared::BatchMode;
use budgetctl_shared::types::BudgetLineId;

use crate::budget::{BudgetBook, BudgetControlSheet, BudgetLedger, BudgetLine, BudgetScope};
use crate::transfer::batch::BudgetTransfer;
use crate::transfer::check::NoopBudgetCheck;
use crate::transfer::item::TransferItem;
use crate::transfer::service::TransferEngine;
use crate::transfer::types::{ItemState, TransferState};

const SHEETS: usize = 4;

/// Strategy for one item: (source index, target index, amount).
fn arb_item() -> impl Strategy<Value = (usize, usize, i64)> {
    (0..SHEETS, 0..SHEETS, 0i64..150)
}

fn setup(
    starts: &[i64],
    items: &[(usize, usize, i64)],
) -> (BudgetBook, BudgetTransfer, Vec<BudgetLineId>) {
    let mut book = BudgetBook::new();
    let scope = book.insert_scope(BudgetScope::new("FY2026"));
    let mut sheets = Vec::new();
    let mut lines = Vec::new();
    for (i, start) in starts.iter().enumerate() {
        let sheet = book
            .insert_sheet(BudgetControlSheet::new(format!("Sheet {i}"), scope))
            .unwrap();
        sheets.push(sheet);
        lines.push(
            book.insert_line(BudgetLine::new(Some(sheet), Decimal::from(*start)))
                .unwrap(),
        );
    }

    let mut batch = BudgetTransfer::new("Generated", scope).unwrap();
    for &(s, t, amount) in items {
        let item = TransferItem::new(sheets[s], sheets[t]).with_lines(
            lines[s],
            lines[t],
            Decimal::from(amount),
        );
        batch.add_item(item, &book).unwrap();
    }
    (book, batch, lines)
}

fn amounts(book: &BudgetBook, lines: &[BudgetLineId]) -> Vec<Decimal> {
    lines.iter().map(|line| book.amount(*line).unwrap()).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Atomic mode: either the whole batch applies or the book and batch are untouched.
    #[test]
    fn prop_atomic_all_or_nothing(
        starts in prop::collection::vec(0i64..200, SHEETS),
        items in prop::collection::vec(arb_item(), 0..6),
    ) {
        let (mut book, mut batch, _) = setup(&starts, &items);
        let book_before = book.clone();
        let batch_before = batch.clone();
        let engine = TransferEngine::new(BatchMode::Atomic, Arc::new(NoopBudgetCheck));

        match engine.transfer(&mut batch, &mut book) {
            Ok(_) => {
                prop_assert_eq!(batch.state, TransferState::Transfer);
                prop_assert!(batch.items.iter().all(|i| i.state == ItemState::Transferred));
            }
            Err(_) => {
                prop_assert_eq!(&book, &book_before);
                prop_assert_eq!(&batch, &batch_before);
            }
        }
        prop_assert_eq!(book.total(), book_before.total());
    }

    /// Literal mode: exactly the items before the failing one are applied.
    #[test]
    fn prop_literal_applies_prefix(
        starts in prop::collection::vec(0i64..200, SHEETS),
        items in prop::collection::vec(arb_item(), 1..6),
    ) {
        let (mut book, mut batch, lines) = setup(&starts, &items);
        let mut expected_book = book.clone();
        let engine = TransferEngine::new(BatchMode::Literal, Arc::new(NoopBudgetCheck));

        let result = engine.transfer(&mut batch, &mut book);

        let applied = batch
            .items
            .iter()
            .take_while(|i| i.state == ItemState::Transferred)
            .count();
        prop_assert!(batch.items[applied..].iter().all(|i| i.state == ItemState::Draft));

        // Replay the applied prefix on the untouched copy.
        for &(s, t, amount) in &items[..applied] {
            let amount = Decimal::from(amount);
            expected_book.adjust_amount(lines[s], -amount).unwrap();
            expected_book.adjust_amount(lines[t], amount).unwrap();
        }
        prop_assert_eq!(amounts(&book, &lines), amounts(&expected_book, &lines));

        if result.is_ok() {
            prop_assert_eq!(applied, items.len());
            prop_assert_eq!(batch.state, TransferState::Transfer);
        } else {
            prop_assert!(applied < items.len());
            prop_assert_eq!(batch.state, TransferState::Draft);
        }
    }

    /// Transfer then reverse on disjoint sheet pairs restores the book.
    #[test]
    fn prop_batch_round_trip(
        a in 0i64..1_000,
        b in 0i64..1_000,
        amount in 0i64..500,
    ) {
        prop_assume!(amount * 2 <= a);
        let (mut book, mut batch, _) = setup(&[a, b], &[(0, 1, amount)]);
        let before = book.clone();
        let engine = TransferEngine::default();

        engine.transfer(&mut batch, &mut book).unwrap();
        engine.reverse(&mut batch, &mut book).unwrap();

        prop_assert_eq!(&book, &before);
        prop_assert_eq!(batch.state, TransferState::Reverse);
    }
}
