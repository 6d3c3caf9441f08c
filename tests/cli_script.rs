use assert_cmd::Command;
use predicates::str::contains;
use tempfile::TempDir;

fn script_command(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("expense_cli").unwrap();
    cmd.env("EXPENSE_CORE_CLI_SCRIPT", "1")
        .env("EXPENSE_CORE_HOME", home.path())
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn script_mode_runs_basic_flow() {
    let home = TempDir::new().unwrap();
    script_command(&home)
        .write_stdin("add 250 Lunch 1 2025-09-01\nbudget 4000\nstatus\nexit\n")
        .assert()
        .success()
        .stdout(contains("Expense added"))
        .stdout(contains("Budget updated"));

    let json = std::fs::read_to_string(home.path().join("store/expenses.json")).unwrap();
    assert!(json.contains("\"Lunch\""));
    let budget = std::fs::read_to_string(home.path().join("store/budget.json")).unwrap();
    assert_eq!(budget.trim(), "4000");
}

#[test]
fn rejected_input_is_reported_and_shell_continues() {
    let home = TempDir::new().unwrap();
    script_command(&home)
        .write_stdin("add 0 Nothing 1 2025-09-01\nbudget -5\nbudgte\nadd 12 \"Late snack\" Food 2025-09-02\n")
        .assert()
        .success()
        .stderr(contains("Amount must be greater than 0"))
        .stderr(contains("did you mean `budget`"))
        .stdout(contains("Expense added"));
}

#[test]
fn state_is_reloaded_between_runs() {
    let home = TempDir::new().unwrap();
    script_command(&home)
        .write_stdin("add 99 Shoes Shopping 2025-09-03\ncategory-add pets Pets\n")
        .assert()
        .success();

    script_command(&home)
        .write_stdin("list\ncategories\n")
        .assert()
        .success()
        .stdout(contains("Shoes"))
        .stdout(contains("Pets"));
}

#[test]
fn corrupt_stored_key_is_reported_without_losing_the_rest() {
    let home = TempDir::new().unwrap();
    script_command(&home)
        .write_stdin("add 99 Shoes Shopping 2025-09-03\nbudget 3000\n")
        .assert()
        .success();
    std::fs::write(home.path().join("store/categories.json"), r#"[{"id":"x"}]"#).unwrap();

    script_command(&home)
        .write_stdin("list\nbudget\n")
        .assert()
        .success()
        .stdout(contains("Error loading saved data `categories`"))
        .stdout(contains("Shoes"))
        .stdout(contains("3,000.00"));
}
