#![no_main]

use libfuzzer_sys::fuzz_target;

// Arbitrary bytes split into (original, new); encode-then-decode must
// reproduce the new side exactly.
fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }
    let split = usize::from(data[0]) % data.len();
    let (original, new) = data.split_at(split);
    let patch = jojodiff::engine::encode_to_vec(original, new).unwrap();
    let restored = jojodiff::engine::decode(original, &patch).unwrap();
    assert_eq!(restored, new);
});
