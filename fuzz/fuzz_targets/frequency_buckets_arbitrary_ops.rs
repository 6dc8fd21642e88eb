#![no_main]

use freqcache::ds::FrequencyBuckets;
use libfuzzer_sys::fuzz_target;

// Arbitrary insert / touch / remove / pop_min / clear sequences on the
// frequency index, checking the watermark and bucket links after every step.
fuzz_target!(|data: &[u8]| {
    let mut buckets: FrequencyBuckets<u32> = FrequencyBuckets::new();

    for chunk in data.chunks_exact(2) {
        let key = u32::from(chunk[1] % 64);

        match chunk[0] % 8 {
            0 | 1 => {
                buckets.insert(key);
            },
            2 | 3 => {
                let before = buckets.frequency(&key);
                let after = buckets.touch(&key);
                assert_eq!(after, before.map(|f| f.saturating_add(1)));
            },
            4 => {
                buckets.remove(&key);
                assert_eq!(buckets.frequency(&key), None);
            },
            5 => {
                let min = buckets.min_freq();
                let popped = buckets.pop_min();
                assert_eq!(popped.map(|(_, freq)| freq), min);
            },
            6 => {
                let ranked: Vec<u64> = buckets.iter_descending().map(|(_, freq)| freq).collect();
                assert_eq!(ranked.len(), buckets.len());
                assert!(ranked.windows(2).all(|w| w[0] >= w[1]));
            },
            _ => buckets.clear(),
        }

        if let Err(err) = buckets.check_invariants() {
            panic!("{err}");
        }
        assert_eq!(buckets.is_empty(), buckets.min_freq().is_none());
        assert_eq!(buckets.is_empty(), buckets.peek_min().is_none());
    }
});
