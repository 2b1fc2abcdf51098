//! Console projections of the cadence state.
//!
//! Everything here is a read-only rendering of the cadence book and the
//! validator directory; nothing mutates. The monitor prints the live
//! line per observation and the CLI prints the final summary once after
//! cancellation.

use std::fmt::Write;

use crate::directory::ValidatorDirectory;
use crate::monitor::Observation;
use crate::stats::CadenceBook;

/// Proposers with fewer recorded blocks than this stay out of the
/// offender tables.
pub const MIN_BLOCKS_FOR_RANKING: u64 = 5;

const TOP_OFFENDERS: usize = 10;

/// One line per newly observed block.
pub fn live_line(
    observation: &Observation,
    book: &CadenceBook,
    directory: &ValidatorDirectory,
) -> String {
    let config = book.config();
    let window = book.window();
    let global = book.global();
    let label = directory.resolve_label(&observation.proposer_key);

    let mut flags = String::new();
    if config.is_fast(observation.per_block_secs) {
        flags.push_str(" ⚡FAST");
    }
    if config.is_fail(observation.per_block_secs) {
        flags.push_str(" ⛔FAIL");
    }

    format!(
        "🧱 Height: {} | ⏱ {:5.3}s | 📊 Avg({}): {:5.3}s | ⚡ {:4.2} blk/s | 👤 {} | fast={:.1}% fail={:.1}%{}",
        observation.height,
        observation.per_block_secs,
        window.len(),
        window.average().unwrap_or(0.0),
        window.rate(),
        label,
        global.fast_rate(),
        global.fail_rate(),
        flags,
    )
}

/// One ranked row of the final offender tables.
#[derive(Debug, Clone)]
pub struct ProposerRow {
    pub label: String,
    pub count: u64,
    pub avg_secs: f64,
    pub p95_secs: f64,
    pub fast_rate: f64,
    pub fail_rate: f64,
    pub max_secs: f64,
}

/// Rows for every proposer that cleared the ranking floor, unsorted.
pub fn offender_rows(book: &CadenceBook, directory: &ValidatorDirectory) -> Vec<ProposerRow> {
    book.proposers()
        .filter(|(_, stats)| stats.count >= MIN_BLOCKS_FOR_RANKING)
        .map(|(key, stats)| ProposerRow {
            label: directory.resolve_label(key),
            count: stats.count,
            avg_secs: stats.average().unwrap_or(0.0),
            p95_secs: stats.percentile(95.0).unwrap_or(0.0),
            fast_rate: stats.fast_rate(),
            fail_rate: stats.fail_rate(),
            max_secs: stats.max,
        })
        .collect()
}

/// Sort descending by fail rate, ties broken by higher average duration.
pub fn rank_by_fail_rate(rows: &mut [ProposerRow]) {
    rows.sort_by(|a, b| {
        b.fail_rate
            .total_cmp(&a.fail_rate)
            .then(b.avg_secs.total_cmp(&a.avg_secs))
    });
}

/// Sort descending by average duration.
pub fn rank_by_average(rows: &mut [ProposerRow]) {
    rows.sort_by(|a, b| b.avg_secs.total_cmp(&a.avg_secs));
}

/// Session summary printed once after the monitor stops.
pub fn final_summary(book: &CadenceBook, directory: &ValidatorDirectory) -> String {
    let mut out = String::new();
    let global = book.global();
    let config = book.config();

    out.push_str("📊 Final statistics\n");
    if global.count == 0 {
        out.push_str("⚠️  No blocks observed\n");
        return out;
    }

    let _ = writeln!(out, "🧱 Blocks observed : {}", global.count);
    let _ = writeln!(out, "⏱  Total time      : {:.2}s", global.sum);
    let _ = writeln!(out, "⚡ Avg block time   : {:.3}s", global.average().unwrap_or(0.0));
    let _ = writeln!(out, "🚀 Min block time   : {:.3}s  (fastest)", global.min);
    let _ = writeln!(out, "🐢 Max block time   : {:.3}s  (slowest)", global.max);
    let _ = writeln!(
        out,
        "⚡ FAST (<= {:.1}s)  : {} ({:.1}%)",
        config.fast_threshold_secs,
        global.fast_count,
        global.fast_rate()
    );
    let _ = writeln!(
        out,
        "⛔ FAIL (>= {:.1}s)  : {} ({:.1}%)",
        config.fail_threshold_secs,
        global.fail_count,
        global.fail_rate()
    );

    let mut rows = offender_rows(book, directory);
    if rows.is_empty() {
        return out;
    }

    rank_by_fail_rate(&mut rows);
    let _ = writeln!(
        out,
        "\n🏷️ Top offenders by FAIL-rate (min {MIN_BLOCKS_FOR_RANKING} blocks)"
    );
    for row in rows.iter().take(TOP_OFFENDERS) {
        let _ = writeln!(
            out,
            "- {} | n={} | fail={:.1}% | fast={:.1}% | avg={:.3}s | p95~={:.3}s | max={:.3}s",
            row.label, row.count, row.fail_rate, row.fast_rate, row.avg_secs, row.p95_secs, row.max_secs
        );
    }

    rank_by_average(&mut rows);
    let _ = writeln!(
        out,
        "\n🐢 Top offenders by AVG block time (min {MIN_BLOCKS_FOR_RANKING} blocks)"
    );
    for row in rows.iter().take(TOP_OFFENDERS) {
        let _ = writeln!(
            out,
            "- {} | n={} | avg={:.3}s | p95~={:.3}s | fail={:.1}% | max={:.3}s",
            row.label, row.count, row.avg_secs, row.p95_secs, row.fail_rate, row.max_secs
        );
    }

    out
}
