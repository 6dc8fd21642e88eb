pub mod frequency_buckets;

pub use frequency_buckets::FrequencyBuckets;
