//! CLI argument parsing tests for the ethtool command.
//!
//! Every case here fails (or succeeds) before any socket is opened, so
//! they run without network access or root privileges.

use assert_cmd::Command;
use predicates::prelude::*;

fn ethtool_cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_ethtool"))
}

mod global_flags {
    use super::*;

    #[test]
    fn test_help() {
        ethtool_cmd()
            .arg("-h")
            .assert()
            .code(0)
            .stdout(predicate::str::contains("Usage:"))
            .stdout(predicate::str::contains("--show-ring"));
    }

    #[test]
    fn test_long_help() {
        ethtool_cmd()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("--set-fec"));
    }

    #[test]
    fn test_version() {
        ethtool_cmd()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("ethtool"));
    }

    #[test]
    fn test_no_arguments() {
        ethtool_cmd().assert().code(1);
    }

    #[test]
    fn test_unknown_option() {
        ethtool_cmd()
            .args(["--bogus", "eth0"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("ethtool -h"));
    }
}

mod device_argument {
    use super::*;

    #[test]
    fn test_missing_device() {
        ethtool_cmd()
            .arg("-g")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("requires a device"));
    }

    #[test]
    fn test_verb_in_place_of_device() {
        ethtool_cmd().args(["-g", "-k"]).assert().code(1);
    }

    #[test]
    fn test_device_name_too_long() {
        ethtool_cmd()
            .args(["-i", "a_very_long_interface_name"])
            .assert()
            .code(1);
    }

    #[test]
    fn test_show_takes_no_arguments() {
        ethtool_cmd().args(["-g", "eth0", "rx"]).assert().code(1);
    }
}

mod option_values {
    use super::*;

    #[test]
    fn test_bad_duplex() {
        ethtool_cmd()
            .args(["-s", "eth0", "speed", "100", "duplex", "bogus"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("duplex"));
    }

    #[test]
    fn test_missing_value() {
        ethtool_cmd().args(["-s", "eth0", "speed"]).assert().code(1);
    }

    #[test]
    fn test_unknown_ring_option() {
        ethtool_cmd()
            .args(["-G", "eth0", "bogus", "10"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("bogus"));
    }

    #[test]
    fn test_pause_expects_on_off() {
        ethtool_cmd()
            .args(["-A", "eth0", "rx", "sometimes"])
            .assert()
            .code(1);
    }

    #[test]
    fn test_set_fec_requires_encoding() {
        ethtool_cmd().args(["--set-fec", "eth0"]).assert().code(1);
    }

    #[test]
    fn test_eeprom_change_requires_all_fields() {
        ethtool_cmd()
            .args(["-E", "eth0", "magic", "0x1234", "offset", "4"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("value"));
    }

    #[test]
    fn test_unknown_test_mode() {
        ethtool_cmd().args(["-t", "eth0", "thorough"]).assert().code(1);
    }

    #[test]
    fn test_unknown_flow_type() {
        ethtool_cmd()
            .args(["-N", "eth0", "rx-flow-hash", "bogus4", "sdfn"])
            .assert()
            .code(1);
    }
}
