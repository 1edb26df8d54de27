//! Fuzz target: plausibility gate
//!
//! Feeds arbitrary f32 bit patterns (NaN payloads, infinities, subnormals)
//! through `validate` with fuzz-chosen limits and verifies:
//! - No panics
//! - An accepted value is exactly the raw input and is finite
//! - The held value is always finite and within range
//!
//! cargo fuzz run fuzz_plausibility_gate

#![no_main]

use chargectl::plausibility::{PlausibilityState, RangeLimits, validate};
use libfuzzer_sys::fuzz_target;

fn f32_at(data: &[u8], i: usize) -> Option<f32> {
    data.get(i..i + 4)
        .and_then(|b| b.try_into().ok())
        .map(f32::from_le_bytes)
}

fuzz_target!(|data: &[u8]| {
    let (Some(max_abs), Some(max_slew)) = (f32_at(data, 0), f32_at(data, 4)) else {
        return;
    };
    if !(max_abs.is_finite() && max_abs > 0.0 && max_slew.is_finite() && max_slew > 0.0) {
        return;
    }
    let limits = RangeLimits::new(max_abs, max_slew);
    let mut state = PlausibilityState::new();

    for chunk in data[8..].chunks_exact(4) {
        let raw = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        let before = state.last_valid();
        match validate(raw, &mut state, limits) {
            Ok(v) => {
                assert_eq!(v.to_bits(), raw.to_bits());
                assert!(v.is_finite());
                assert!(v.abs() <= max_abs);
            }
            Err(_) => assert_eq!(state.last_valid().to_bits(), before.to_bits()),
        }
        assert!(state.last_valid().is_finite());
        assert!(state.last_valid().abs() <= max_abs);
    }
});
