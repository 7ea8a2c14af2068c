//! Integration tests for srpminfo

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;

    fn srpminfo() -> Command {
        cargo_bin_cmd!("srpminfo")
    }

    #[test]
    fn help_displays() {
        srpminfo()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "Caching lookup service for SRPM metadata",
            ));
    }

    #[test]
    fn version_displays() {
        srpminfo()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("srpminfo"));
    }

    #[test]
    fn invalid_config_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "not [valid toml").unwrap();

        srpminfo()
            .arg("--config")
            .arg(&path)
            .assert()
            .failure()
            .stderr(predicate::str::contains("invalid configuration"));
    }

    #[test]
    fn unbindable_address_is_reported() {
        srpminfo()
            .args(["--bind", "not-an-address"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("failed to bind listener"));
    }
}
