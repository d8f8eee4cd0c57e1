//! Fuzz target: stored config decoder
//!
//! Feeds arbitrary bytes to `DispenserConfig::from_bytes`, the path every
//! NVS blob takes at boot, and verifies:
//! - No panics under arbitrary byte inputs
//! - Anything accepted passes `validate()`
//! - Anything accepted survives a re-encode unchanged
//!
//! cargo fuzz run fuzz_config_decode

#![no_main]

use dispenser::config::DispenserConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(cfg) = DispenserConfig::from_bytes(data) else {
        return;
    };

    assert!(cfg.validate().is_ok(), "decoder accepted an invalid config");

    let bytes = cfg.to_bytes().expect("valid config must encode");
    let back = DispenserConfig::from_bytes(&bytes).expect("re-encoded blob must decode");
    assert_eq!(back, cfg);
});
