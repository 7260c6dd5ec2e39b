use std::path::Path;
use std::{fs, io};

use bankfile_parser::{
    error,
    types::{self, RawDocument},
};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Путь до исходного банковского файла
    #[arg(long, required = true)]
    input_file: String,

    /// Формат исходного файла: mt101/cfonb/xml. Если не указан, определяется
    /// по расширению и первой непустой строке
    #[arg(long)]
    input_format: Option<KnownFileFormat>,

    /// Формат вывода: csv/text
    #[arg(long, value_enum, default_value_t = KnownOutputFormat::Csv)]
    output_format: KnownOutputFormat,

    /// Кодировка исходного файла: utf8/windows1252
    #[arg(long, value_enum, default_value_t = KnownEncoding::Utf8)]
    encoding: KnownEncoding,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum KnownFileFormat {
    Mt101,
    Cfonb,
    Xml,
}

impl KnownFileFormat {
    fn as_supported(&self) -> types::SupportedFileFormat {
        match self {
            KnownFileFormat::Mt101 => types::SupportedFileFormat::Mt101,
            KnownFileFormat::Cfonb => types::SupportedFileFormat::Cfonb,
            KnownFileFormat::Xml => types::SupportedFileFormat::Xml,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum KnownOutputFormat {
    Csv,
    Text,
}

impl KnownOutputFormat {
    fn as_supported(&self) -> types::OutputFormat {
        match self {
            KnownOutputFormat::Csv => types::OutputFormat::Csv,
            KnownOutputFormat::Text => types::OutputFormat::Text,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum KnownEncoding {
    Utf8,
    Windows1252,
}

impl KnownEncoding {
    fn as_supported(&self) -> types::TextEncoding {
        match self {
            KnownEncoding::Utf8 => types::TextEncoding::Utf8,
            KnownEncoding::Windows1252 => types::TextEncoding::Windows1252,
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum Error {
    #[error("{0}")]
    Parse(#[from] error::ParseError),
    #[error("{0}")]
    Dump(#[from] error::DumpError),
    #[error("{0}")]
    Usage(String),
    #[error("ошибка ввода-вывода: {0}")]
    IO(#[from] io::Error),
}

impl Error {
    fn code(&self) -> i32 {
        match self {
            Self::Parse(_) => 1,
            Self::Dump(_) => 2,
            Self::Usage(_) => 3,
            Self::IO(_) => 4,
        }
    }
}

/// Выбирает декодер, если формат не задан явно.
fn detect_format(path: &str, document: &RawDocument) -> Result<types::SupportedFileFormat, Error> {
    let extension = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    if extension.as_deref() == Some("xml") {
        return Ok(types::SupportedFileFormat::Xml);
    }

    let text = document.text();
    let Some(first_line) = text.lines().map(str::trim).find(|line| !line.is_empty()) else {
        return Err(Error::Usage(format!(
            "файл {} пуст, укажите --input-format",
            path
        )));
    };
    let format = if first_line.starts_with('<') {
        types::SupportedFileFormat::Xml
    } else if first_line.starts_with(':') || first_line.starts_with('{') {
        types::SupportedFileFormat::Mt101
    } else {
        types::SupportedFileFormat::Cfonb
    };
    tracing::info!(?format, "detected input format");
    Ok(format)
}

fn run() -> Result<(), Error> {
    let args = Args::parse();

    let bytes = fs::read(&args.input_file).map_err(|err| {
        Error::Usage(format!(
            "невозможно открыть файл {}\n:{}",
            &args.input_file, err
        ))
    })?;
    let document = RawDocument::with_encoding(&bytes, args.encoding.as_supported());

    let format = match args.input_format {
        Some(format) => format.as_supported(),
        None => detect_format(&args.input_file, &document)?,
    };

    let table = bankfile_parser::parse(&document, format)?;
    if table.is_unrecognized_structure() {
        tracing::warn!(file = %args.input_file, "XML structure is not recognized");
    }

    let mut output = io::stdout().lock();
    bankfile_parser::dump(&mut output, args.output_format.as_supported(), &table)?;

    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(e.code());
    }
}
