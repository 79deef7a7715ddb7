use assert_cmd::Command;
use predicates::prelude::*;

fn hedgelock() -> Command {
    let mut cmd = Command::cargo_bin("hedgelock").expect("binary builds");
    // Keep tests hermetic: no ambient secrets.
    cmd.env_remove("WALLET_PRIVATE_KEY")
        .env_remove("ORACLE_API_KEY")
        .env_remove("EGRESS_PROXY_URL");
    cmd
}

#[test]
fn help_lists_subcommands() {
    hedgelock()
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("markets")
                .and(predicate::str::contains("hedge"))
                .and(predicate::str::contains("arb"))
                .and(predicate::str::contains("buy")),
        );
}

#[test]
fn rejects_invalid_config() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("hedgelock.toml");
    std::fs::write(&path, "[trading]\nmax_tier = 7\n").expect("write config");

    hedgelock()
        .args(["--config"])
        .arg(&path)
        .arg("positions")
        .assert()
        .failure()
        .stderr(predicate::str::contains("max_tier"));
}

#[test]
fn trading_commands_require_wallet_key() {
    let dir = tempfile::tempdir().expect("tempdir");

    hedgelock()
        .args(["--config"])
        .arg(dir.path().join("absent.toml"))
        .arg("positions")
        .assert()
        .failure()
        .stderr(predicate::str::contains("WALLET_PRIVATE_KEY"));
}

#[test]
fn hedge_scan_requires_oracle_key() {
    let dir = tempfile::tempdir().expect("tempdir");

    hedgelock()
        .args(["--config"])
        .arg(dir.path().join("absent.toml"))
        .args(["hedge", "scan"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ORACLE_API_KEY"));
}

#[test]
fn arb_scan_requires_a_grouping() {
    let dir = tempfile::tempdir().expect("tempdir");

    hedgelock()
        .args(["--config"])
        .arg(dir.path().join("absent.toml"))
        .args(["arb", "scan"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("aggregate"));
}
