use anyhow::{Context, Result};
use metrics::{describe_counter, increment_counter};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub const REQUESTS: &str = "coop_requests_total";
pub const LOCAL_HITS: &str = "coop_local_hits_total";
pub const SIBLING_HITS: &str = "coop_sibling_hits_total";
pub const ORIGIN_HITS: &str = "coop_origin_hits_total";
pub const NOT_FOUND: &str = "coop_not_found_total";
pub const SOURCE_FAILURES: &str = "coop_source_failures_total";
pub const EVICTIONS: &str = "coop_evictions_total";
pub const STORAGE_FAULTS: &str = "coop_storage_faults_total";

/// Installs the global prometheus recorder. Until this runs every counter below
/// is a no-op.
pub fn setup_metrics_handler(node: &str) -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .add_global_label("node", node)
        .install_recorder()
        .context("Failed to install prometheus recorder")?;
    describe();
    Ok(handle)
}

fn describe() {
    describe_counter!(REQUESTS, "Content requests received");
    describe_counter!(LOCAL_HITS, "Requests answered from the local cache");
    describe_counter!(SIBLING_HITS, "Requests answered by a sibling");
    describe_counter!(ORIGIN_HITS, "Requests answered by the origin");
    describe_counter!(NOT_FOUND, "Requests no source could answer");
    describe_counter!(SOURCE_FAILURES, "Remote lookups that failed or timed out");
    describe_counter!(EVICTIONS, "Entries evicted to admit new content");
    describe_counter!(STORAGE_FAULTS, "Local storage faults during admission");
}

pub(crate) fn track_request() {
    increment_counter!(REQUESTS);
}

pub(crate) fn track_local_hit() {
    increment_counter!(LOCAL_HITS);
}

pub(crate) fn track_sibling_hit(sibling: &str) {
    increment_counter!(SIBLING_HITS, "sibling" => sibling.to_string());
}

pub(crate) fn track_origin_hit() {
    increment_counter!(ORIGIN_HITS);
}

pub(crate) fn track_not_found() {
    increment_counter!(NOT_FOUND);
}

pub(crate) fn track_source_failure(source: &str) {
    increment_counter!(SOURCE_FAILURES, "source" => source.to_string());
}

pub(crate) fn track_eviction() {
    increment_counter!(EVICTIONS);
}

pub(crate) fn track_storage_fault() {
    increment_counter!(STORAGE_FAULTS);
}
