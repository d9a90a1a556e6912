//! Lists the serial number of every attached USB device.
//!
//! Each device produces one log line, `Found S/N: <serial>`, or a warning
//! describing which step failed for it.  All logging goes to stderr and can
//! be controlled via the `RUST_LOG` environment variable, which defaults to
//! `info`.
//!
//! With `--json` the full report is also printed to stdout.
use usb_sn::{EnumeratorBuilder, Error, LogSink};

use clap::Parser;
use env_logger::Env;
#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// Only report devices with this vendor ID (hex)
    #[arg(long, value_parser = parse_hex_u16)]
    vid: Option<u16>,

    /// Only report devices with this product ID (hex)
    #[arg(long, value_parser = parse_hex_u16)]
    pid: Option<u16>,

    /// Log an empty serial number for devices that fail, instead of an error
    #[arg(long)]
    lenient: bool,

    /// Print the report as JSON to stdout
    #[arg(long)]
    json: bool,

    /// Turn on libusb's own debug logging
    #[arg(long)]
    usb_debug: bool,
}

fn parse_hex_u16(s: &str) -> Result<u16, String> {
    let digits = s.trim_start_matches("0x").trim_start_matches("0X");
    u16::from_str_radix(digits, 16).map_err(|e| format!("invalid hex ID {s}: {e}"))
}

/// A lenient run treats a failure to build as nothing to report
fn accept_build<T>(result: Result<T, Error>, lenient: bool) -> Result<Option<T>, Error> {
    match result {
        Ok(built) => Ok(Some(built)),
        Err(e) if lenient => {
            warn!("{e}");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

fn execute(args: &Args) -> Result<(), Error> {
    let mut builder = EnumeratorBuilder::new();
    builder.lenient(args.lenient);
    if let Some(vid) = args.vid {
        builder.vendor_id(vid);
    }
    if let Some(pid) = args.pid {
        builder.product_id(pid);
    }
    if args.usb_debug {
        builder.usb_log_level(rusb::LogLevel::Debug);
    }

    let Some(mut enumerator) = accept_build(builder.build(), args.lenient)? else {
        return Ok(());
    };

    let report = enumerator.run(&mut LogSink)?;
    drop(enumerator);

    if args.json {
        let json = serde_json::to_string_pretty(&report).map_err(|e| Error::Serialize {
            message: e.to_string(),
        })?;
        println!("{json}");
    }

    Ok(())
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match execute(&args) {
        Ok(_) => std::process::exit(0),
        Err(e) => {
            error!("Error: {}", e);
            std::process::exit(e.to_errno());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_u16() {
        assert_eq!(parse_hex_u16("16d0"), Ok(0x16d0));
        assert_eq!(parse_hex_u16("0x0504"), Ok(0x0504));
        assert!(parse_hex_u16("xyz").is_err());
        assert!(parse_hex_u16("10000").is_err());
    }

    #[test]
    fn test_accept_build_context_unavailable() {
        let unavailable = || -> Result<(), Error> {
            Err(Error::ContextUnavailable {
                message: "Entity not found".to_string(),
            })
        };

        assert_eq!(accept_build(unavailable(), true), Ok(None));

        let result = accept_build(unavailable(), false);
        assert!(matches!(result, Err(Error::ContextUnavailable { .. })));
        assert_eq!(result.unwrap_err().to_errno(), libc::EIO);

        assert_eq!(accept_build(Ok(7), false), Ok(Some(7)));
    }
}
