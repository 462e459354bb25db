//! zpng CLI - Command-line tool for zpng greyscale containers.
//!
//! This is the main entry point for the zpng command-line application.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info, metadata::LevelFilter};
use tracing_subscriber::{prelude::*, EnvFilter};

use zpng::{BitDepth, Codec, DecoderOptions, EncoderOptions, RasterInfo, ZpngDecoder, ZpngEncoder};

/// zpng - greyscale PNG-style container tool
#[derive(Parser)]
#[command(name = "zpng")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Compressor back-end.
#[derive(Clone, Copy, ValueEnum)]
enum CodecArg {
    Zstd,
    Deflate,
}

impl From<CodecArg> for Codec {
    fn from(arg: CodecArg) -> Self {
        match arg {
            CodecArg::Zstd => Codec::Zstd,
            CodecArg::Deflate => Codec::Deflate,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Encode raw greyscale pixels into a container
    Encode {
        /// Raw pixel file (row-major, big-endian samples for 16-bit)
        #[arg(short, long)]
        input: PathBuf,

        /// Output container file
        #[arg(short, long)]
        output: PathBuf,

        /// Image width in pixels
        #[arg(short = 'W', long)]
        width: u32,

        /// Image height in pixels
        #[arg(short = 'H', long)]
        height: u32,

        /// Bits per sample (8 or 16)
        #[arg(short, long, default_value_t = 8)]
        depth: u8,

        /// Compression level
        #[arg(short, long, env = "ZPNG_LEVEL", default_value_t = zpng::DEFAULT_LEVEL)]
        level: i32,

        /// Compressor back-end
        #[arg(short, long, env = "ZPNG_CODEC", value_enum, default_value_t = CodecArg::Zstd)]
        codec: CodecArg,
    },

    /// Decode a container back to raw pixels
    Decode {
        /// Input container file
        #[arg(short, long)]
        input: PathBuf,

        /// Output raw pixel file
        #[arg(short, long)]
        output: PathBuf,

        /// Compressor back-end the container was written with
        #[arg(short, long, env = "ZPNG_CODEC", value_enum, default_value_t = CodecArg::Zstd)]
        codec: CodecArg,

        /// Skip CRC verification
        #[arg(long)]
        no_verify: bool,
    },

    /// Show geometry and chunk layout of a container
    Info {
        /// Input container file
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn fallible_main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Encode {
            input,
            output,
            width,
            height,
            depth,
            level,
            codec,
        } => {
            let info = RasterInfo::new(width, height, BitDepth::from_bits(depth)?);
            let options = EncoderOptions::new()
                .with_level(level)
                .with_codec(codec.into());
            cmd_encode(&input, &output, info, options)?;
        }
        Commands::Decode {
            input,
            output,
            codec,
            no_verify,
        } => {
            let options = DecoderOptions::new()
                .with_codec(codec.into())
                .with_verify_crc(!no_verify);
            cmd_decode(&input, &output, options)?;
        }
        Commands::Info { input } => {
            cmd_info(&input)?;
        }
    }

    Ok(())
}

fn main() {
    let subscriber = tracing_subscriber::registry()
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with(tracing_subscriber::fmt::layer().without_time());
    tracing::subscriber::set_global_default(subscriber)
        .expect("cannot set default tracing subscriber");

    if let Err(err) = fallible_main() {
        error!("{err:?}");
        std::process::exit(1);
    }
}

fn cmd_encode(
    input: &PathBuf,
    output: &PathBuf,
    raster: RasterInfo,
    options: EncoderOptions,
) -> Result<()> {
    info!("Encoding: {} -> {}", input.display(), output.display());

    let start = Instant::now();
    let pixels = fs::read(input).context("Failed to read raw pixel file")?;

    let encoder = ZpngEncoder::new(&pixels, raster, options);
    let container = encoder
        .encode_to_vec()
        .context("Failed to encode container")?;
    fs::write(output, &container).context("Failed to write output file")?;

    info!(
        "Wrote {} bytes ({:.1}% of raw) in {:?}",
        container.len(),
        container.len() as f64 * 100.0 / pixels.len().max(1) as f64,
        start.elapsed()
    );

    Ok(())
}

fn cmd_decode(input: &PathBuf, output: &PathBuf, options: DecoderOptions) -> Result<()> {
    info!("Decoding: {} -> {}", input.display(), output.display());

    let start = Instant::now();
    let data = fs::read(input).context("Failed to read container file")?;

    let container = ZpngDecoder::new_with_options(&data, options)
        .parse()
        .context("Failed to parse container")?;
    let pixels = container.decode().context("Failed to decompress payload")?;
    fs::write(output, &pixels).context("Failed to write output file")?;

    info!(
        "Decoded {}x{}@{} image ({} bytes) in {:?}",
        container.width(),
        container.height(),
        container.bit_depth(),
        pixels.len(),
        start.elapsed()
    );

    Ok(())
}

fn cmd_info(input: &PathBuf) -> Result<()> {
    let data = fs::read(input).context("Failed to read container file")?;

    let mut offset = zpng::SIGNATURE.len();
    let mut broken = 0;
    for chunk in zpng::chunks(&data).context("Not a zpng container")? {
        let chunk = chunk.with_context(|| format!("Truncated chunk at offset {offset:#x}"))?;
        let status = if chunk.is_valid() { "ok" } else { "BAD CRC" };
        if !chunk.is_valid() {
            broken += 1;
        }
        println!(
            "{offset:#010x}  {}  {:>10} bytes  crc {:#010x} ({status})",
            chunk.chunk_type,
            chunk.data.len(),
            chunk.crc
        );
        offset += chunk.total_len();
    }

    let lenient = DecoderOptions::new().with_verify_crc(false).with_strict(false);
    let container = ZpngDecoder::new_with_options(&data, lenient)
        .parse()
        .context("Failed to parse container")?;

    println!("Width:     {}", container.width());
    println!("Height:    {}", container.height());
    println!("Bit depth: {}", container.bit_depth());
    match container.raw_size() {
        Ok(size) => println!("Raw size:  {size} bytes"),
        Err(err) => println!("Raw size:  {err}"),
    }
    println!(
        "Payload:   {} bytes at offset {:#x}",
        container.payload_len(),
        container.payload_offset()
    );

    if broken > 0 {
        bail!("{broken} chunk(s) failed CRC verification");
    }

    Ok(())
}
