use chrono::{DateTime, Local, TimeZone};
use logcache_core::Record;
use logcache_engine::TableStats;
use std::io::{self, Write};

fn format_timestamp(secs: u32, utc: bool) -> String {
    let secs = i64::from(secs);

    if utc {
        if let Some(dt) = DateTime::from_timestamp(secs, 0) {
            return dt.format("%Y-%m-%d %H:%M:%S UTC").to_string();
        }
    } else if let Some(dt) = Local.timestamp_opt(secs, 0).single() {
        return dt.format("%Y-%m-%d %H:%M:%S").to_string();
    }

    format!("{secs}")
}

/// The message without its `[timestamp] ` prefix
fn body(record: &Record) -> &str {
    let text = &record.message().text;
    match text.split_once("] ") {
        Some((_, rest)) => rest,
        None => text,
    }
}

/// short format: `YYYY-MM-DD HH:MM:SS class message`
pub fn format_short(record: &Record, utc: bool, w: &mut impl Write) -> io::Result<()> {
    let ts = format_timestamp(record.time().get(), utc);
    writeln!(w, "{ts} {:<12} {}", record.class(), body(record))
}

/// json format: single-line JSON object per record.
pub fn format_json(record: &Record, w: &mut impl Write) -> io::Result<()> {
    serde_json::to_writer(&mut *w, record).map_err(io::Error::other)?;
    writeln!(w)
}

/// cat format: the complete log line, as it appears in the file.
pub fn format_cat(record: &Record, w: &mut impl Write) -> io::Result<()> {
    writeln!(w, "{}", record.message().text)
}

pub fn format_stats(stats: &TableStats, json: bool, w: &mut impl Write) -> io::Result<()> {
    if json {
        serde_json::to_writer(&mut *w, stats).map_err(io::Error::other)?;
        return writeln!(w);
    }

    writeln!(
        w,
        "{} logfiles, {} cached records (max {})",
        stats.logfiles.len(),
        stats.cached_records,
        stats.max_cached_records
    )?;

    for logfile in &stats.logfiles {
        writeln!(
            w,
            "  {} from {}{}, {} records, classes: {}",
            logfile.path.display(),
            logfile.since.get(),
            if logfile.active { " (active)" } else { "" },
            logfile.records,
            logfile.classes_read
        )?;
    }

    Ok(())
}
