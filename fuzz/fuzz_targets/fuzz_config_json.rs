//! Fuzz target: configuration parsing
//!
//! Parses arbitrary bytes as a JSON configuration and verifies:
//! - No panics on malformed or hostile input
//! - Anything accepted also passes validation and builds a service
//!
//! cargo fuzz run fuzz_config_json

#![no_main]

use chargectl::app::service::ChargeService;
use chargectl::config::SystemConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    if let Ok(cfg) = SystemConfig::from_json(text) {
        assert!(cfg.validate().is_ok());
        assert!(ChargeService::new(cfg).is_ok());
    }
});
