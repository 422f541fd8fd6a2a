use anyhow::{Context, Result};
use b64codec::{Codec, CodecOptions};
use clap::Parser;
use log::debug;
use std::fs;
use std::io::{self, Read, Write};

mod args;

use args::Args;

fn main() {
    // Initialize logger
    env_logger::init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "warn"),
    );

    if let Err(e) = run() {
        eprintln!("b64: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    let input = read_input(&args)?;
    let options = args.codec_options()?;
    debug!("Codec options: {:?}", options);

    let output = transform(&options, args.decode, &input)?;
    debug!("Writing {} bytes", output.len());

    let mut stdout = io::stdout().lock();
    stdout.write_all(&output).context("failed to write output")?;
    stdout.flush().context("failed to write output")?;
    Ok(())
}

fn read_input(args: &Args) -> Result<Vec<u8>> {
    let input = match args.file.as_deref() {
        Some(path) if !args.reads_stdin() => {
            fs::read(path).with_context(|| format!("failed to read {}", path))?
        }
        _ => {
            let mut buf = Vec::new();
            io::stdin()
                .read_to_end(&mut buf)
                .context("failed to read standard input")?;
            buf
        }
    };
    debug!(
        "Read {} bytes from {}",
        input.len(),
        args.file.as_deref().unwrap_or("-")
    );
    Ok(input)
}

/// Encode or decode one whole input
///
/// Encoded output ends with a newline unless it is empty. Decoding always
/// accepts line breaks, and any ASCII whitespace with `ignore_whitespace`.
/// Offsets in decode errors point into `input` as given.
fn transform(options: &CodecOptions, decode: bool, input: &[u8]) -> Result<Vec<u8>> {
    let codec = Codec::new(options.clone());

    if decode {
        let skipped = |b: u8| {
            if options.ignore_whitespace {
                b.is_ascii_whitespace()
            } else {
                b == b'\n' || b == b'\r'
            }
        };
        let (compact, positions): (Vec<u8>, Vec<usize>) = input
            .iter()
            .enumerate()
            .filter(|&(_, &b)| !skipped(b))
            .map(|(i, &b)| (b, i))
            .unzip();

        let text = std::str::from_utf8(&compact).context("invalid input")?;
        return codec
            .decode(text)
            .map_err(|e| e.map_offset(|offset| positions.get(offset).copied().unwrap_or(offset)))
            .context("invalid input");
    }

    let mut encoded = codec.encode(input);
    if !encoded.is_empty() {
        encoded.push('\n');
    }
    Ok(encoded.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_encode() {
        let options = CodecOptions::new().with_line_width(8);
        let output = transform(&options, false, b"AAAAAAAAA").unwrap();
        assert_eq!(output, b"QUFBQUFB\nQUFB\n");

        assert_eq!(transform(&options, false, b"").unwrap(), b"");
    }

    #[test]
    fn test_transform_decode_accepts_line_breaks() {
        let options = CodecOptions::new();
        let output = transform(&options, true, b"QUFBQUFB\r\nQUFB\n").unwrap();
        assert_eq!(output, b"AAAAAAAAA");
    }

    #[test]
    fn test_transform_decode_whitespace() {
        let strict = CodecOptions::new();
        assert!(transform(&strict, true, b"QUFB QUFB\n").is_err());

        let lenient = CodecOptions::new().with_ignore_whitespace(true);
        let output = transform(&lenient, true, b"QUFB QUFB\n").unwrap();
        assert_eq!(output, b"AAAAAA");
    }

    #[test]
    fn test_transform_decode_error_context() {
        let err = transform(&CodecOptions::new(), true, b"QUF").unwrap_err();
        assert_eq!(
            format!("{:#}", err),
            "invalid input: Invalid length: 3 is not a multiple of 4"
        );

        assert!(transform(&CodecOptions::new(), true, &[0xff, 0xfe, 0x41, 0x41]).is_err());
    }

    #[test]
    fn test_transform_decode_error_offsets_match_input() {
        let err = transform(&CodecOptions::new(), true, b"QUFB\r\nQU*B\n").unwrap_err();
        assert_eq!(
            format!("{:#}", err),
            "invalid input: Invalid character 0x2a at offset 8"
        );

        let lenient = CodecOptions::new().with_ignore_whitespace(true);
        let err = transform(&lenient, true, b"QUFB \n QU*B").unwrap_err();
        assert_eq!(
            format!("{:#}", err),
            "invalid input: Invalid character 0x2a at offset 9"
        );

        let err = transform(&CodecOptions::new(), true, b"QQ==\nQUFB\n").unwrap_err();
        assert_eq!(
            format!("{:#}", err),
            "invalid input: Invalid padding at offset 2"
        );
    }
}
