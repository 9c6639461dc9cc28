use anyhow::{Context, Result};
use clap::Parser;
use doc_text_etl::config::clean::{CleanConfig, CleanMode, DEFAULT_GARBLED_CHARS};
use doc_text_etl::core::encoding::{decode_lenient, resolve_label, OutputEncoding};
use doc_text_etl::utils::{logger, validation::Validate};
use doc_text_etl::TextCleaner;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "clean-text")]
#[command(about = "Clean garbled lines and markup out of an extracted text file")]
struct Args {
    /// Text file to clean
    input: PathBuf,

    /// Encoding of the input file
    #[arg(long, default_value = "utf-8")]
    input_encoding: String,

    /// Encoding of the cleaned file
    #[arg(short, long, default_value = "utf-8")]
    encoding: String,

    /// Output file (defaults to <stem>_cleaned.txt next to the input)
    #[arg(short, long, conflicts_with = "in_place")]
    output: Option<PathBuf>,

    /// Cleaning mode
    #[arg(long, value_enum, default_value = "basic")]
    mode: CleanMode,

    /// Keep text up to and including this phrase
    #[arg(long)]
    truncate_after: Option<String>,

    /// Characters that mark a line as garbled
    #[arg(long, default_value = DEFAULT_GARBLED_CHARS)]
    garbled_chars: String,

    /// Overwrite the input, keeping a copy at <input>.backup
    #[arg(long)]
    in_place: bool,

    /// Replace characters the output encoding cannot represent with '?'
    #[arg(long)]
    lossy: bool,

    #[arg(short, long, help = "Enable verbose output")]
    verbose: bool,
}

fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{}_cleaned.txt", stem))
}

fn backup_path(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_os_string();
    name.push(".backup");
    PathBuf::from(name)
}

struct Cleaned {
    output: PathBuf,
    lines_before: usize,
    lines_after: usize,
}

fn run(args: &Args) -> Result<Cleaned> {
    let config = CleanConfig {
        mode: Some(args.mode),
        garbled_chars: args.garbled_chars.clone(),
        truncate_after: args.truncate_after.clone(),
    };
    config.validate()?;

    let input_encoding = resolve_label(&args.input_encoding)?;
    let output_encoding = OutputEncoding::from_label(&args.encoding)?;
    let cleaner = TextCleaner::new(&config)?;

    let bytes = std::fs::read(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let text = decode_lenient(&bytes, input_encoding);

    let outcome = cleaner.clean(&text);
    tracing::info!(
        "🧹 {:?} mode kept {} of {} lines",
        args.mode,
        outcome.lines_after,
        outcome.lines_before
    );

    let data = output_encoding
        .encode(&outcome.text, args.lossy)
        .with_context(|| format!("cannot write cleaned text as {}", output_encoding.name()))?;

    let output = if args.in_place {
        let backup = backup_path(&args.input);
        std::fs::copy(&args.input, &backup)
            .with_context(|| format!("failed to create backup {}", backup.display()))?;
        tracing::info!("📦 Backup saved to {}", backup.display());
        args.input.clone()
    } else {
        args.output
            .clone()
            .unwrap_or_else(|| default_output_path(&args.input))
    };

    std::fs::write(&output, data)
        .with_context(|| format!("failed to write {}", output.display()))?;

    Ok(Cleaned {
        output,
        lines_before: outcome.lines_before,
        lines_after: outcome.lines_after,
    })
}

fn main() -> Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    let cleaned = run(&args)?;
    println!("✅ Cleaned text saved to {}", cleaned.output.display());
    println!(
        "   Lines: {} -> {}",
        cleaned.lines_before, cleaned.lines_after
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::SHIFT_JIS;
    use tempfile::TempDir;

    const SOURCE: &str = "給付金の手順書\n龠〆の崩れた行\n支払件数の説明\n";

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("texts/手順書.txt")),
            PathBuf::from("texts/手順書_cleaned.txt")
        );
        assert_eq!(
            backup_path(Path::new("texts/手順書.txt")),
            PathBuf::from("texts/手順書.txt.backup")
        );
    }

    #[test]
    fn test_cleans_into_default_output() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("manual.txt");
        std::fs::write(&input, SOURCE).unwrap();

        let args = Args::parse_from([
            "clean-text",
            input.to_str().unwrap(),
            "--mode",
            "garbled",
        ]);
        let cleaned = run(&args).unwrap();

        assert_eq!(cleaned.output, temp_dir.path().join("manual_cleaned.txt"));
        assert_eq!((cleaned.lines_before, cleaned.lines_after), (3, 2));
        assert_eq!(
            std::fs::read_to_string(&cleaned.output).unwrap(),
            "給付金の手順書\n支払件数の説明"
        );
        assert_eq!(std::fs::read_to_string(&input).unwrap(), SOURCE);
    }

    #[test]
    fn test_in_place_decodes_input_encoding_and_keeps_backup() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("manual.txt");
        let (sjis, _, had_errors) = SHIFT_JIS.encode(SOURCE);
        assert!(!had_errors);
        std::fs::write(&input, &sjis).unwrap();

        let args = Args::parse_from([
            "clean-text",
            input.to_str().unwrap(),
            "--input-encoding",
            "cp932",
            "--mode",
            "garbled",
            "--in-place",
        ]);
        let cleaned = run(&args).unwrap();

        assert_eq!(cleaned.output, input);
        assert_eq!(
            std::fs::read_to_string(&input).unwrap(),
            "給付金の手順書\n支払件数の説明"
        );
        let backup = temp_dir.path().join("manual.txt.backup");
        assert_eq!(std::fs::read(backup).unwrap(), sjis.into_owned());
    }

    #[test]
    fn test_output_conflicts_with_in_place() {
        let result = Args::try_parse_from(["clean-text", "a.txt", "-o", "b.txt", "--in-place"]);
        assert!(result.is_err());
    }
}
