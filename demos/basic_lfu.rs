use std::time::Duration;

use freqcache::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .init();

    let registry: CacheRegistry<&str, String> = CacheRegistry::new();
    let cache = registry.lfu("fruit", 2);

    cache.add_about_to_delete_callback(|item| println!("evicting {}", item.key()));
    cache.set_data_loader(|key, _args| {
        (*key == "grape").then(|| CacheItem::new(*key, Duration::ZERO, "loaded grape".to_string()))
    });

    cache.insert("a", Duration::ZERO, "alpha".to_string());
    cache.insert("b", Duration::ZERO, "beta".to_string());

    cache.get(&"a").unwrap();
    cache.insert("c", Duration::ZERO, "gamma".to_string());

    println!("contains a? {}", cache.exists(&"a"));
    println!("contains b? {}", cache.exists(&"b"));

    match cache.get(&"grape") {
        Ok(item) => println!("grape -> {}", item.data()),
        Err(err) => println!("grape -> {err}"),
    }
    match cache.get(&"kiwi") {
        Ok(item) => println!("kiwi -> {}", item.data()),
        Err(err) => println!("kiwi -> {err}"),
    }

    for item in cache.most_accessed(2) {
        println!("{} accessed {} times", item.key(), item.access_count());
    }
}

// Expected output (log lines omitted):
// evicting b
// contains a? true
// contains b? false
// evicting c
// grape -> loaded grape
// kiwi -> key not found and could not be loaded into cache
// a accessed 2 times
// grape accessed 1 times
//
// Explanation: capacity=2; "a" is read before inserting "c", so "b" is evicted.
// Loading "grape" then evicts "c", the least recently touched item at frequency 1.
