use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const FIXTURE: &str = r#"{
  "items": {
    "item-1": {
      "pages": [
        {
          "cursor": null,
          "page": {
            "accounts": [
              {
                "account_id": "acc-checking",
                "name": "Everyday Checking",
                "type": "depository",
                "subtype": "checking",
                "balances": { "current": 100000, "available": 95000, "iso_currency_code": "USD" }
              },
              {
                "account_id": "acc-savings",
                "name": "Rainy Day Savings",
                "type": "depository",
                "subtype": "savings",
                "balances": { "current": 250000 }
              }
            ],
            "added": [
              {
                "transaction_id": "txn-grocery",
                "account_id": "acc-checking",
                "amount": -4200,
                "date": "2025-01-10",
                "name": "Corner Grocery",
                "counterparties": [
                  { "name": "Corner Grocery", "entity_id": "ent-1", "type": "merchant", "confidence": "HIGH" }
                ]
              },
              {
                "transaction_id": "txn-xfer-out",
                "account_id": "acc-checking",
                "amount": -50000,
                "date": "2025-01-12",
                "name": "Transfer to savings",
                "category": { "primary": "TRANSFER_OUT" }
              },
              {
                "transaction_id": "txn-xfer-in",
                "account_id": "acc-savings",
                "amount": 50000,
                "date": "2025-01-13",
                "name": "Transfer from checking",
                "category": { "primary": "TRANSFER_IN" }
              }
            ],
            "has_more": false,
            "next_cursor": "cursor-1"
          }
        }
      ]
    }
  }
}"#;

fn ledger(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("envelope-ledger").unwrap();
    cmd.env("ENVELOPE_LEDGER_DATA_DIR", dir.path())
        .env_remove("RUST_LOG");
    cmd
}

/// Initialized ledger with the fixture connector and item-1 linked
fn setup() -> TempDir {
    let dir = TempDir::new().unwrap();
    ledger(&dir).arg("init").assert().success();

    let fixture_path = dir.path().join("fixture.json");
    fs::write(&fixture_path, FIXTURE).unwrap();
    let config = serde_json::json!({ "provider": { "fixture_file": fixture_path } });
    fs::write(dir.path().join("config.json"), config.to_string()).unwrap();

    ledger(&dir)
        .args(["item", "add", "item-1", "--token", "access-sandbox", "--institution", "Platypus Bank"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Linked item: item-1"));
    dir
}

#[test]
fn test_init_seeds_categories() {
    let dir = TempDir::new().unwrap();
    ledger(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created 8 default categories"));

    ledger(&dir)
        .args(["category", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Needs").and(predicate::str::contains("Groceries")));
}

#[test]
fn test_sync_from_fixture() {
    let dir = setup();

    ledger(&dir)
        .args(["sync", "item-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("item-1: 3 added, 0 modified, 0 removed"));

    ledger(&dir)
        .args(["txn", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Corner Grocery").and(predicate::str::contains("-$42.00")));

    ledger(&dir)
        .args(["item", "accounts", "item-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Everyday Checking").and(predicate::str::contains("$1000.00")));

    ledger(&dir)
        .args(["txn", "transfers"])
        .assert()
        .success()
        .stdout(predicate::str::contains("All transfers are matched."));
}

#[test]
fn test_reports_after_sync() {
    let dir = setup();
    ledger(&dir).args(["sync", "item-1"]).assert().success();

    ledger(&dir)
        .args(["report", "balance"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total balance:").and(predicate::str::contains("$3500.00")));

    ledger(&dir)
        .args(["report", "income", "--month", "2025-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("$500.00").not().and(predicate::str::contains("-$42.00")));

    ledger(&dir)
        .args(["report", "spending", "--from", "2025-01-01", "--to", "2025-01-31"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Uncategorized").and(predicate::str::contains("100.0%")));

    ledger(&dir)
        .args(["report", "spending", "--from", "2025-02-01", "--to", "2025-01-01"])
        .assert()
        .failure();
}

#[test]
fn test_transfer_details_show_counterpart_from_either_side() {
    let dir = setup();
    ledger(&dir).args(["sync", "item-1"]).assert().success();

    ledger(&dir)
        .args(["txn", "show", "txn-xfer-out"])
        .assert()
        .success()
        .stdout(predicate::str::contains("matched with txn-xfer-in"));

    ledger(&dir)
        .args(["txn", "show", "txn-xfer-in"])
        .assert()
        .success()
        .stdout(predicate::str::contains("matched with txn-xfer-out"));
}

#[test]
fn test_resync_is_idempotent() {
    let dir = setup();
    ledger(&dir).args(["sync", "item-1"]).assert().success();
    ledger(&dir)
        .args(["sync", "item-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 added"));

    let output = ledger(&dir).args(["txn", "list"]).output().unwrap();
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.matches("Corner Grocery").count(), 1);
}

#[test]
fn test_budget_tracks_categorized_spending() {
    let dir = setup();
    ledger(&dir).args(["sync"]).assert().success();

    ledger(&dir)
        .args(["budget", "assign", "Needs/Groceries", "100", "--period", "2025-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Assigned $100.00 to 'Groceries' for 2025-01"));

    ledger(&dir)
        .args(["txn", "categorize", "txn-grocery", "Needs/Groceries"])
        .assert()
        .success();

    ledger(&dir)
        .args(["budget", "show", "--period", "2025-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Needs/Groceries").and(predicate::str::contains("$58.00")));
}

#[test]
fn test_split_must_match_amount() {
    let dir = setup();
    ledger(&dir).args(["sync", "item-1"]).assert().success();

    ledger(&dir)
        .args([
            "txn", "split", "txn-grocery",
            "-p", "Needs/Groceries=-20",
            "-p", "Needs/Household Supplies=-20",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Validation error"));

    ledger(&dir)
        .args([
            "txn", "split", "txn-grocery",
            "-p", "Needs/Groceries=-20",
            "-p", "Needs/Household Supplies=-22",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Split txn-grocery into 2 parts"));
}

#[test]
fn test_sync_unknown_item_fails() {
    let dir = setup();
    ledger(&dir)
        .args(["sync", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_notify_marks_item_and_acknowledges() {
    let dir = setup();
    let payload = dir.path().join("error.json");
    fs::write(
        &payload,
        r#"{"webhook_type":"ITEM","webhook_code":"ERROR","item_id":"item-1",
            "error":{"error_code":"ITEM_LOGIN_REQUIRED","error_message":"login required"}}"#,
    )
    .unwrap();

    ledger(&dir)
        .args(["notify", "--file"])
        .arg(&payload)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"{"status":"received"}"#));

    ledger(&dir)
        .args(["item", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("login required (ITEM_LOGIN_REQUIRED)"));
}

#[test]
fn test_notify_sync_runs_queued_job() {
    let dir = setup();

    ledger(&dir)
        .arg("notify")
        .write_stdin(
            r#"{"webhook_type":"TRANSACTIONS","webhook_code":"SYNC_UPDATES_AVAILABLE","item_id":"item-1"}"#,
        )
        .assert()
        .success()
        .stdout(predicate::str::contains("received"));

    ledger(&dir)
        .args(["txn", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Corner Grocery"));
}

#[test]
fn test_notify_garbage_still_acknowledged() {
    let dir = setup();
    ledger(&dir)
        .arg("notify")
        .write_stdin("not json at all")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"{"status":"received"}"#));
}
