//! Pack, unpack and byte-swap from the command line.
//!
//! Usage:
//!   bitstruct [OPTIONS] pack <FORMAT> <VALUE>...
//!   bitstruct [OPTIONS] unpack <FORMAT> <HEX>
//!   bitstruct [OPTIONS] calcsize <FORMAT>
//!   bitstruct byteswap <GROUPS> <HEX> [--offset N]
//!
//! Options:
//!   --legacy, -l   Unmarked fields are big endian (no endianness carry-forward)
//!   --fields, -F   unpack: print one line per field instead of a tuple
//!
//! Values are parsed per field: `u`/`s` decimal or 0x hex, `f` float,
//! `b` true/false/1/0, `r` hex bytes. Packed data is read and printed as hex.
//! Set RUST_LOG=debug for codec tracing on stderr.

use anyhow::{anyhow, bail, Context};
use bitstruct::dump::{format_fields, format_tuple, hex_string, parse_hex, parse_value};
use bitstruct::{byteswap, Codec, Format, FormatOptions};
use tracing_subscriber::{prelude::*, EnvFilter};

const USAGE: &str = "usage: bitstruct [--legacy] [--fields] <pack|unpack|calcsize|byteswap> ...";

fn take_flag(args: &mut Vec<String>, long: &str, short: &str) -> bool {
    if let Some(pos) = args.iter().position(|a| a == long || a == short) {
        args.remove(pos);
        true
    } else {
        false
    }
}

fn take_option(args: &mut Vec<String>, long: &str) -> anyhow::Result<Option<String>> {
    match args.iter().position(|a| a == long) {
        Some(pos) => {
            if pos + 1 >= args.len() {
                bail!("{} needs a value", long);
            }
            let value = args.remove(pos + 1);
            args.remove(pos);
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

fn main() -> anyhow::Result<()> {
    let filter_layer = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("warn"))?;
    let format_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(format_layer)
        .init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let options = if take_flag(&mut args, "--legacy", "-l") {
        FormatOptions::legacy()
    } else {
        FormatOptions::default()
    };
    let per_field = take_flag(&mut args, "--fields", "-F");
    let offset = take_option(&mut args, "--offset")?
        .map(|s| s.parse::<usize>().with_context(|| format!("bad --offset {:?}", s)))
        .transpose()?
        .unwrap_or(0);

    let (command, rest) = args.split_first().ok_or_else(|| anyhow!(USAGE))?;
    tracing::debug!(command = command.as_str(), args = rest.len(), ?options, "bitstruct");
    match command.as_str() {
        "pack" => {
            let (fmt, literals) = rest.split_first().ok_or_else(|| anyhow!("pack <FORMAT> <VALUE>..."))?;
            let codec = Codec::compile_with(fmt, options)?;
            let kinds = codec
                .format()
                .fields()
                .iter()
                .map(|f| f.kind)
                .filter(|k| k.carries_value());
            if literals.len() != codec.format().value_count() {
                bail!(
                    "format '{}' takes {} value(s), got {}",
                    fmt,
                    codec.format().value_count(),
                    literals.len()
                );
            }
            let values = kinds
                .zip(literals)
                .map(|(kind, s)| parse_value(kind, s))
                .collect::<Result<Vec<_>, _>>()?;
            println!("{}", hex_string(&codec.pack(&values)?));
        }
        "unpack" => {
            let [fmt, hex] = rest else {
                bail!("unpack <FORMAT> <HEX>");
            };
            let codec = Codec::compile_with(fmt, options)?;
            let values = codec.unpack(&parse_hex(hex)?)?;
            if per_field {
                println!("{}", format_fields(codec.format(), &values));
            } else {
                println!("{}", format_tuple(&values));
            }
        }
        "calcsize" => {
            let [fmt] = rest else {
                bail!("calcsize <FORMAT>");
            };
            println!("{}", Format::compile_with(fmt, options)?.calcsize());
        }
        "byteswap" => {
            let [groups, hex] = rest else {
                bail!("byteswap <GROUPS> <HEX> [--offset N]");
            };
            let mut data = parse_hex(hex)?;
            println!("{}", hex_string(byteswap(groups, &mut data, offset)?));
        }
        other => {
            eprintln!("{}", USAGE);
            bail!("unknown command '{}'", other);
        }
    }
    Ok(())
}
