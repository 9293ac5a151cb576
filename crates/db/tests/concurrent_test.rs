//! Concurrent access tests for ledger commands.
//!
//! These tests verify that:
//! - Concurrent debits on one account never lose an update
//! - The balance floor holds no matter how many debits race for it
//! - One operation id submitted concurrently applies exactly once
//! - A command waits for a held row lock and gives up after the lock timeout
//! - Transfers in opposite directions between the same accounts do not deadlock

#![allow(clippy::uninlined_format_args)]
#![allow(clippy::cast_possible_truncation)]

mod common;

use caixa_core::ledger::NewTransfer;
use caixa_db::{AccountRepository, CommandError, UnitOfWork};
use futures::future::join_all;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Barrier;
use uuid::Uuid;

use common::*;

const NUM_TASKS: usize = 20;

#[tokio::test]
async fn test_concurrent_debits_no_lost_update() {
    let Some(db) = setup().await else { return };
    let commands = commands(&db);
    let category_id = category(&db).await;
    let account = checking(&commands, dec!(1000)).await;

    let barrier = Arc::new(Barrier::new(NUM_TASKS));
    let mut handles = Vec::with_capacity(NUM_TASKS);

    for i in 0..NUM_TASKS {
        let commands = commands.clone();
        let barrier = Arc::clone(&barrier);
        let amount = Decimal::from(i as u32 + 1);

        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            commands
                .create_transaction(account.id, paid_debit(category_id, amount))
                .await
        }));
    }

    let results = join_all(handles).await;
    let mut success_count = 0;
    for result in results {
        match result {
            Ok(Ok(_)) => success_count += 1,
            Ok(Err(e)) => eprintln!("Transaction failed: {}", e),
            Err(e) => eprintln!("Task panicked: {}", e),
        }
    }

    // 1 + 2 + ... + 20
    let total_debited = Decimal::from((NUM_TASKS * (NUM_TASKS + 1) / 2) as u32);
    println!("Concurrent debits: {}/{} succeeded", success_count, NUM_TASKS);
    assert_eq!(success_count, NUM_TASKS);
    assert_eq!(
        balance(&commands, account.id).await,
        dec!(1000) - total_debited
    );
}

#[tokio::test]
async fn test_concurrent_debits_respect_balance_floor() {
    let Some(db) = setup().await else { return };
    let commands = commands(&db);
    let category_id = category(&db).await;
    let account = checking(&commands, dec!(100)).await;

    let barrier = Arc::new(Barrier::new(NUM_TASKS));
    let handles: Vec<_> = (0..NUM_TASKS)
        .map(|_| {
            let commands = commands.clone();
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                barrier.wait().await;
                commands
                    .create_transaction(account.id, paid_debit(category_id, dec!(10)))
                    .await
            })
        })
        .collect();

    let mut accepted = 0;
    let mut rejected = 0;
    for result in join_all(handles).await {
        match result.unwrap() {
            Ok(_) => accepted += 1,
            Err(e) => {
                assert_eq!(e.error_code(), "INSUFFICIENT_BALANCE", "unexpected error: {}", e);
                rejected += 1;
            }
        }
    }

    assert_eq!(accepted, 10);
    assert_eq!(rejected, NUM_TASKS - 10);
    assert_eq!(balance(&commands, account.id).await, Decimal::ZERO);
}

#[tokio::test]
async fn test_concurrent_duplicate_operation_applies_once() {
    let Some(db) = setup().await else { return };
    let commands = commands(&db);
    let category_id = category(&db).await;
    let account = checking(&commands, dec!(500)).await;
    let op = operation_id("concurrent");

    let barrier = Arc::new(Barrier::new(NUM_TASKS));
    let handles: Vec<_> = (0..NUM_TASKS)
        .map(|_| {
            let commands = commands.clone();
            let barrier = Arc::clone(&barrier);
            let mut input = paid_debit(category_id, dec!(25));
            input.operation_id = op.clone();
            tokio::spawn(async move {
                barrier.wait().await;
                commands.create_transaction(account.id, input).await
            })
        })
        .collect();

    let mut created = Vec::new();
    let mut duplicates = Vec::new();
    for result in join_all(handles).await {
        match result.unwrap() {
            Ok(tx) => created.push(tx.id),
            Err(CommandError::DuplicateOperation {
                result_entity_id, ..
            }) => duplicates.push(result_entity_id),
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    assert_eq!(created.len(), 1);
    assert_eq!(duplicates.len(), NUM_TASKS - 1);
    assert!(duplicates.iter().all(|id| *id == Some(created[0])));
    assert_eq!(balance(&commands, account.id).await, dec!(475));
}

#[tokio::test]
async fn test_command_waits_for_held_lock() {
    let Some(db) = setup().await else { return };
    let commands = commands(&db);
    let category_id = category(&db).await;
    let account = checking(&commands, dec!(100)).await;

    let holder = UnitOfWork::begin(&db, 0).await.unwrap();
    AccountRepository::new(db.clone())
        .get_for_exclusive_mutation(holder.txn(), account.id)
        .await
        .unwrap();

    let waiting = {
        let commands = commands.clone();
        tokio::spawn(async move {
            commands
                .create_transaction(account.id, paid_debit(category_id, dec!(40)))
                .await
        })
    };

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(!waiting.is_finished(), "command should block on the held lock");

    holder.commit().await.unwrap();
    let tx = waiting.await.unwrap().unwrap();
    assert_eq!(tx.amount, dec!(40));
    assert_eq!(balance(&commands, account.id).await, dec!(60));
}

#[tokio::test]
async fn test_lock_timeout_is_retryable() {
    let Some(db) = setup().await else { return };
    let impatient = commands_with_timeout(&db, 200);
    let category_id = category(&db).await;
    let account = checking(&impatient, dec!(100)).await;

    let holder = UnitOfWork::begin(&db, 0).await.unwrap();
    AccountRepository::new(db.clone())
        .get_for_exclusive_mutation(holder.txn(), account.id)
        .await
        .unwrap();

    let op = operation_id("timeout");
    let mut input = paid_debit(category_id, dec!(30));
    input.operation_id = op.clone();
    let result = impatient.create_transaction(account.id, input.clone()).await;
    holder.rollback().await.unwrap();

    let err = result.unwrap_err();
    assert!(matches!(err, CommandError::LockTimeout(_)), "got {:?}", err);
    assert!(err.is_retryable());
    assert_eq!(err.error_code(), "LOCK_TIMEOUT");
    assert_eq!(balance(&impatient, account.id).await, dec!(100));

    // Nothing was recorded, so the same operation id can be retried.
    impatient.create_transaction(account.id, input).await.unwrap();
    assert_eq!(balance(&impatient, account.id).await, dec!(70));
}

#[tokio::test]
async fn test_opposite_transfers_do_not_deadlock() {
    let Some(db) = setup().await else { return };
    let commands = commands(&db);
    let category_id = category(&db).await;
    let first = checking(&commands, dec!(1000)).await;
    let second = checking(&commands, dec!(1000)).await;

    let barrier = Arc::new(Barrier::new(NUM_TASKS));
    let handles: Vec<_> = (0..NUM_TASKS)
        .map(|i| {
            let commands = commands.clone();
            let barrier = Arc::clone(&barrier);
            let (source, destination) = if i % 2 == 0 {
                (first.id, second.id)
            } else {
                (second.id, first.id)
            };
            tokio::spawn(async move {
                barrier.wait().await;
                commands
                    .create_transfer(
                        source,
                        destination,
                        NewTransfer {
                            category_id,
                            amount: dec!(15),
                            description: "Acerto".to_string(),
                            competence_date: date(2025, 7, 1),
                            user_id: Uuid::new_v4(),
                            operation_id: None,
                        },
                    )
                    .await
            })
        })
        .collect();

    for result in join_all(handles).await {
        if let Err(e) = result.unwrap() {
            panic!("transfer failed: {}", e);
        }
    }

    assert_eq!(balance(&commands, first.id).await, dec!(1000));
    assert_eq!(balance(&commands, second.id).await, dec!(1000));
}
