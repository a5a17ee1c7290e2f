#![no_main]

use libfuzzer_sys::fuzz_target;

// Arbitrary bytes split into (original, patch); decoding must error
// gracefully, never panic.
fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }
    let split = usize::from(data[0]) % data.len();
    let (original, patch) = data.split_at(split);
    let _ = jojodiff::engine::decode(original, patch);
});
