//! Prometheus metrics, gated behind the `metrics` feature so the
//! pure-library default stays dependency-light: `lazy_static` globals
//! registered with `prometheus`'s `register_*_vec!` macros.

use lazy_static::lazy_static;
use prometheus::{register_counter_vec, register_int_counter_vec, CounterVec, IntCounterVec};

lazy_static! {
    pub static ref EVENTS_INGESTED: IntCounterVec = register_int_counter_vec!(
        "bundle_reconstructor_events_ingested_total",
        "Total number of spoke events ingested",
        &["chain", "kind"]
    )
    .unwrap();

    pub static ref DEDUP_DROPS: IntCounterVec = register_int_counter_vec!(
        "bundle_reconstructor_dedup_drops_total",
        "Total number of events dropped as exact duplicates",
        &["chain", "kind"]
    )
    .unwrap();

    pub static ref RECONSTRUCTION_CACHE_HITS: CounterVec = register_counter_vec!(
        "bundle_reconstructor_cache_hits_total",
        "Reconstruction results served without recomputing",
        &["source"]
    )
    .unwrap();

    pub static ref RECONSTRUCTION_CACHE_MISSES: CounterVec = register_counter_vec!(
        "bundle_reconstructor_cache_misses_total",
        "Reconstruction results that required a full recompute",
        &["reason"]
    )
    .unwrap();

    pub static ref BLOB_CACHE_MISSES: CounterVec = register_counter_vec!(
        "bundle_reconstructor_blob_cache_misses_total",
        "BlobCacheMiss occurrences while consulting the persisted blob layer",
        &["cache"]
    )
    .unwrap();
}
