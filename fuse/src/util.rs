use std::fmt::Display;

use fuse_lightning::bitcoin::Amount;
use serde::Serializer;

/// Serialize bytes as lowercase hex
pub fn as_hex<T, S>(buf: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: AsRef<[u8]>,
    S: Serializer,
{
    serializer.serialize_str(&hex::encode(buf))
}

/// Serialize through `Display`
pub fn as_display<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Display,
    S: Serializer,
{
    serializer.collect_str(value)
}

/// Serialize an amount as whole satoshis
pub fn as_sat<S>(amount: &Amount, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u64(amount.to_sat())
}

#[cfg(feature = "main")]
fn dispatch<P, C>(datadir: P, who: &str, level_arg: &str, console: C) -> anyhow::Result<fern::Dispatch>
where
    P: AsRef<std::path::Path>,
    C: Into<fern::Output>,
{
    use fern::colors::{Color, ColoredLevelConfig};
    use std::str::FromStr;

    // RUST_LOG wins over the command line
    let level = std::env::var("RUST_LOG").unwrap_or(level_arg.to_string());
    let level = log::LevelFilter::from_str(&level)?;

    // file
    let who_clone = who.to_string();
    let logfile = datadir.as_ref().join(format!("{}.log", who));
    let file_config = fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{} {}/{} {}] {}",
                tstamp(),
                who_clone,
                record.target(),
                record.level(),
                message
            ))
        })
        .level(level)
        .level_for("h2", log::LevelFilter::Info)
        .level_for("tower", log::LevelFilter::Info)
        .chain(fern::log_file(logfile)?);

    // console
    let who_clone = who.to_string();
    let colors = ColoredLevelConfig::new().info(Color::Green).error(Color::Red).warn(Color::Yellow);
    let console_config = fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{} {}/{} {}] {}",
                tstamp(),
                who_clone,
                record.target(),
                colors.color(record.level()),
                message
            ))
        })
        .level(level)
        .level_for("h2", log::LevelFilter::Info)
        .level_for("tower", log::LevelFilter::Info)
        .chain(console);

    Ok(fern::Dispatch::new().chain(console_config).chain(file_config))
}

/// Log to stderr and to `<datadir>/<who>.log`
#[cfg(feature = "main")]
pub fn setup_logging<P: AsRef<std::path::Path>>(
    datadir: P,
    who: &str,
    level_arg: &str,
) -> anyhow::Result<()> {
    std::fs::create_dir_all(datadir.as_ref())?;
    // stdout carries only the JSON payload
    dispatch(datadir, who, level_arg, std::io::stderr())?.apply()?;
    Ok(())
}

/// Current UTC time with millisecond precision, for log lines
// UTC, local time lookup is unsound on some platforms
#[cfg(feature = "main")]
pub fn tstamp() -> String {
    use time::{macros::format_description, OffsetDateTime};

    OffsetDateTime::now_utc()
        .format(format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]"
        ))
        .unwrap_or_default()
}
