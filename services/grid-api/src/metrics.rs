//! Prometheus metrics for grid serving.

use std::sync::atomic::Ordering;

use metrics::{counter, gauge};
use storage::GridCacheStats;

pub const CACHE_HITS: &str = "grid_cache_hits_total";
pub const CACHE_MISSES: &str = "grid_cache_misses_total";
pub const CACHE_DISK_READS: &str = "grid_cache_disk_reads_total";

/// Record one grid request with its outcome.
pub fn record_grid_request(grid: &'static str, status: u16, gzip: bool) {
    counter!(
        "grid_requests_total",
        "grid" => grid,
        "status" => status.to_string(),
        "encoding" => if gzip { "gzip" } else { "identity" }
    )
    .increment(1);
}

/// Record bytes sent for a grid response.
pub fn record_bytes_sent(grid: &'static str, bytes: usize) {
    counter!("grid_bytes_sent_total", "grid" => grid).increment(bytes as u64);
}

/// Publish the cache counters before rendering.
pub fn record_cache_stats(stats: &GridCacheStats, memory_bytes: usize) {
    counter!(CACHE_HITS).absolute(stats.hits.load(Ordering::Relaxed));
    counter!(CACHE_MISSES).absolute(stats.misses.load(Ordering::Relaxed));
    counter!(CACHE_DISK_READS).absolute(stats.disk_reads.load(Ordering::Relaxed));
    gauge!("grid_cache_hit_rate_percent").set(stats.hit_rate());
    gauge!("grid_cache_memory_bytes").set(memory_bytes as f64);
}

/// Exposition text for the cache counters, used when no recorder is
/// installed.
pub fn render_cache_stats(stats: &GridCacheStats) -> String {
    [
        (CACHE_HITS, "Grid cache hits", &stats.hits),
        (CACHE_MISSES, "Grid cache misses", &stats.misses),
        (CACHE_DISK_READS, "Grid record reads from storage", &stats.disk_reads),
    ]
    .into_iter()
    .map(|(name, help, value)| {
        format!(
            "# HELP {name} {help}\n# TYPE {name} counter\n{name} {}\n",
            value.load(Ordering::Relaxed)
        )
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::PrometheusBuilder;

    fn stats(hits: u64, misses: u64, disk_reads: u64) -> GridCacheStats {
        let stats = GridCacheStats::default();
        stats.hits.store(hits, Ordering::Relaxed);
        stats.misses.store(misses, Ordering::Relaxed);
        stats.disk_reads.store(disk_reads, Ordering::Relaxed);
        stats
    }

    #[test]
    fn test_cache_totals_are_counters() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        metrics::with_local_recorder(&recorder, || record_cache_stats(&stats(7, 3, 2), 512));

        let text = handle.render();
        for name in [CACHE_HITS, CACHE_MISSES, CACHE_DISK_READS] {
            assert!(text.contains(&format!("# TYPE {} counter", name)), "{}", text);
        }
        assert!(text.contains("grid_cache_hits_total 7"), "{}", text);
        assert!(text.contains("# TYPE grid_cache_memory_bytes gauge"), "{}", text);
    }

    #[test]
    fn test_fallback_text_matches_recorded_types() {
        let text = render_cache_stats(&stats(4, 1, 1));
        assert!(text.contains("# TYPE grid_cache_misses_total counter\ngrid_cache_misses_total 1\n"));
        assert_eq!(text.matches("# TYPE").count(), 3);
        assert!(!text.contains("gauge"));
    }
}
