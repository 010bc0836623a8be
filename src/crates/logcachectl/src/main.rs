mod config;
mod output;
mod tracing_setup;

use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate, NaiveDateTime, TimeZone};
use clap::{Parser, ValueEnum};
use logcache_common::{ClassMask, LogClass, Seconds};
use logcache_core::{Flow, Record};
use logcache_engine::{Direction, LogQuery, LogTable};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Local time, class and message
    Short,
    /// One JSON object per record
    Json,
    /// The log line as it appears in the file
    Cat,
}

#[derive(Parser)]
#[command(name = "lcq", about = "Query the log files of a monitoring core")]
struct Cli {
    /// Read settings from a YAML file
    #[arg(long)]
    config: Option<PathBuf>,

    /// The log file currently being written to
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Directory holding the rotated log files
    #[arg(long)]
    archive: Option<PathBuf>,

    /// Show entries on or after TIME
    #[arg(short = 'S', long)]
    since: Option<String>,

    /// Show entries on or before TIME
    #[arg(short = 'U', long)]
    until: Option<String>,

    /// Only show entries of CLASS (name or number), may be repeated
    #[arg(short, long = "class")]
    classes: Vec<LogClass>,

    /// Show at most N entries
    #[arg(short = 'n', long)]
    lines: Option<usize>,

    /// Oldest entries first
    #[arg(long)]
    forward: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "short")]
    output: OutputFormat,

    /// Timestamps in UTC
    #[arg(long)]
    utc: bool,

    /// Maximum number of records kept in memory
    #[arg(long)]
    max_cached: Option<usize>,

    /// Print what has been cached after the query
    #[arg(long)]
    stats: bool,
}

fn local_midnight(date: NaiveDate) -> Result<i64> {
    let ndt = date.and_hms_opt(0, 0, 0).context("invalid midnight")?;
    let dt = Local
        .from_local_datetime(&ndt)
        .single()
        .context("ambiguous local time")?;
    Ok(dt.timestamp())
}

fn to_seconds(secs: i64, input: &str) -> Result<Seconds> {
    let secs = u32::try_from(secs)
        .with_context(|| format!("timestamp out of range: {input:?}"))?;
    Ok(Seconds(secs))
}

fn parse_timestamp(s: &str) -> Result<Seconds> {
    // Raw integer → seconds since epoch
    if let Ok(secs) = s.parse::<u32>() {
        return Ok(Seconds(secs));
    }

    let s_lower = s.to_lowercase();

    if s_lower == "now" {
        return Ok(Seconds::now());
    }

    if s_lower == "today" {
        return to_seconds(local_midnight(Local::now().date_naive())?, s);
    }

    if s_lower == "yesterday" {
        let yesterday = Local::now()
            .date_naive()
            .pred_opt()
            .context("date underflow")?;
        return to_seconds(local_midnight(yesterday)?, s);
    }

    // "YYYY-MM-DD HH:MM:SS"
    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        let dt = Local
            .from_local_datetime(&ndt)
            .single()
            .context("ambiguous local time")?;
        return to_seconds(dt.timestamp(), s);
    }

    // "YYYY-MM-DD"
    if let Ok(nd) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return to_seconds(local_midnight(nd)?, s);
    }

    // "N unit ago"
    if let Some(rest) = s_lower.strip_suffix(" ago") {
        let (num_str, unit) = rest
            .trim()
            .rsplit_once(' ')
            .with_context(|| format!("cannot parse relative time: {s:?}"))?;
        let n: i64 = num_str
            .parse()
            .with_context(|| format!("invalid number in relative time: {s:?}"))?;

        let unit_secs: i64 = match unit {
            "second" | "seconds" | "sec" | "s" => 1,
            "minute" | "minutes" | "min" => 60,
            "hour" | "hours" | "hr" => 3600,
            "day" | "days" => 86400,
            "week" | "weeks" => 7 * 86400,
            "month" | "months" => 30 * 86400,
            "year" | "years" => 365 * 86400,
            _ => bail!("unknown time unit in relative time: {unit:?}"),
        };

        let Some(secs) = n
            .checked_mul(unit_secs)
            .and_then(|offset| i64::from(Seconds::now().get()).checked_sub(offset))
        else {
            bail!("relative time out of range: {s:?}");
        };

        return to_seconds(secs, s);
    }

    bail!("cannot parse timestamp: {s:?}")
}

fn build_query(cli: &Cli) -> Result<LogQuery> {
    let direction = if cli.forward {
        Direction::Forward
    } else {
        Direction::Backward
    };

    let mut query = LogQuery::new(direction);

    if let Some(since) = cli.since.as_deref() {
        query = query.with_since(parse_timestamp(since)?);
    }
    if let Some(until) = cli.until.as_deref() {
        // The query window excludes its upper bound
        query = query.with_until(parse_timestamp(until)?.saturating_add(Seconds(1)));
    }
    if !cli.classes.is_empty() {
        query = query.with_classes(cli.classes.iter().copied().collect::<ClassMask>());
    }
    if let Some(lines) = cli.lines {
        query = query.with_limit(lines);
    }

    Ok(query)
}

fn main() -> Result<()> {
    tracing_setup::init_tracing("warn");

    let cli = Cli::parse();

    let config = config::load(
        cli.config.as_deref(),
        config::Overrides {
            log_file: cli.log_file.clone(),
            archive_path: cli.archive.clone(),
            max_cached_messages: cli.max_cached,
        },
    )?;

    let query = build_query(&cli)?;
    let mut table = LogTable::new(config);

    let stdout = io::stdout();
    let mut w = BufWriter::new(stdout.lock());
    let mut count = 0usize;
    let limit = query.limit().unwrap_or(usize::MAX);
    let mut write_error = None;

    // Records are written while the files are scanned, nothing is collected
    let mut sink = |record: &Record| {
        let written = match cli.output {
            OutputFormat::Short => output::format_short(record, cli.utc, &mut w),
            OutputFormat::Json => output::format_json(record, &mut w),
            OutputFormat::Cat => output::format_cat(record, &mut w),
        };

        if let Err(e) = written {
            write_error = Some(e);
            return Flow::Stop;
        }

        count += 1;
        if count >= limit {
            Flow::Stop
        } else {
            Flow::Continue
        }
    };

    table.query(&query, &mut sink).context("query failed")?;

    if let Some(e) = write_error {
        if e.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(e).context("failed to write output");
    }

    if cli.stats {
        output::format_stats(&table.stats(), cli.output == OutputFormat::Json, &mut w)?;
    }

    w.flush()?;
    Ok(())
}
