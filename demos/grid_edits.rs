use serde_json::json;
use txlog::{RecordingObserver, TransactionConfig, TransactionService, Transactions, transaction};

fn main() -> Result<(), txlog::TransactionError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut rows = vec![
        json!({"id": 1, "product": "Chai", "price": 18}),
        json!({"id": 2, "product": "Chang", "price": 19}),
    ];
    let mut service =
        TransactionService::with_observer(TransactionConfig::default(), RecordingObserver::new());

    // a user edits a cell, deletes a row and adds a new one
    service.add(transaction!(1, update, {"price": 20}), Some(rows[0].clone()))?;
    service.add(transaction!(2, delete), Some(rows[1].clone()))?;
    service.add(transaction!(3, add, {"id": 3, "product": "Aniseed Syrup", "price": 10}), None)?;

    // ... then steps back twice and forward once, keeping the delete but not the new row
    service.undo();
    service.undo();
    service.redo();

    println!("Pending edits:");
    for change in service.aggregated_changes(true) {
        println!("  {} {}: {}", change.kind, change.id, change.new_value);
    }

    service.commit(&mut rows, None);
    println!("\nCommitted rows:");
    for row in &rows {
        println!("  {row}");
    }

    println!("\nEvents:");
    for event in &service.observer().events_seen {
        println!("  {event}");
    }
    Ok(())
}
