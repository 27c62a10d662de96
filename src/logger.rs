//! File-backed trace logging.

use std::fs::File;

use anyhow::Context;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::UtcOffset;
use tracing::{subscriber::set_global_default, Level};
use tracing_subscriber::{fmt::writer::BoxMakeWriter, FmtSubscriber};

use crate::entity::OwnerId;

const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]");

/// Routes every trace event to `"{tag}_{name}.log"` in the working directory.
///
/// Stdout belongs to the engine protocol, so nothing is ever written there. Fails if the file
/// cannot be created or a global subscriber is already installed.
pub fn init_logger(tag: OwnerId, name: &str) -> anyhow::Result<()> {
    let file_name = log_file_name(tag, name);
    let file = File::create(&file_name).with_context(|| format!("creating {file_name}"))?;
    let writer = BoxMakeWriter::new(file);
    let local_offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    let timer = tracing_subscriber::fmt::time::OffsetTime::new(local_offset, TIMESTAMP_FORMAT);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::TRACE)
        .with_ansi(false)
        .with_timer(timer)
        .with_writer(writer)
        .finish();

    set_global_default(subscriber).context(
        "Could not set global default tracing subscriber. Consider disabling logs if you are already setting a subscriber.",
    )
}

fn log_file_name(tag: OwnerId, name: &str) -> String {
    format!("{tag}_{name}.log")
}
