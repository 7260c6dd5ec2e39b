//! Модуль верхнего уровня для разбора банковских файлов и выгрузки таблиц.
//!
//! Предоставляет единый интерфейс ко всем декодерам через функции
//! [`parse`], [`parse_from_reader`] и [`dump`]. Выбор формата остаётся за
//! вызывающим кодом.

use crate::{error, types};
use std::io;

/// Трейт, который реализуют декодеры конкретных форматов.
///
/// Декодер не хранит состояния между вызовами: всё, что нужно для разбора,
/// живёт внутри одного вызова [`Decoder::decode`].
pub(crate) trait Decoder {
    /// Превращает исходный документ в таблицу.
    fn decode(document: &types::RawDocument) -> Result<types::Table, error::ParseError>;
}

/// Разбирает документ в заданном формате.
///
/// ## Аргументы
///
/// * `document` - Исходные байты и их кодировка.
/// * `format` - Формат ([`types::SupportedFileFormat`]), выбранный вызывающим кодом.
///
/// ## Возвращаемое значение
///
/// Таблица [`types::Table`], где нулевая строка содержит заголовки. Ошибка
/// [`error::ParseError`] возвращается только если документ нельзя прочитать
/// целиком, например при синтаксической ошибке в XML.
///
/// # Пример
///
/// ```rust
/// use bankfile_parser::{parse, types::{RawDocument, SupportedFileFormat}};
///
/// let data = ":20:BATCH-1\n:21:TX-1\n:32B:EUR1000,00\n";
/// let document = RawDocument::new(data.as_bytes());
///
/// let table = parse(&document, SupportedFileFormat::Mt101).expect("Ошибка разбора");
/// assert_eq!(table.record_count(), 1);
/// assert_eq!(table.header()[0], "Sender's Reference");
/// assert_eq!(table.records()[0][0], "BATCH-1");
/// ```
pub fn parse(
    document: &types::RawDocument,
    format: types::SupportedFileFormat,
) -> Result<types::Table, error::ParseError> {
    match format {
        types::SupportedFileFormat::Mt101 => crate::mt101_format::Mt101Decoder::decode(document),
        types::SupportedFileFormat::Cfonb => crate::cfonb_format::CfonbDecoder::decode(document),
        types::SupportedFileFormat::Xml => crate::xml_format::XmlDecoder::decode(document),
    }
}

/// Читает поток целиком и разбирает его в заданном формате.
///
/// # Пример
///
/// ```no_run
/// use std::fs::File;
/// use bankfile_parser::{parse_from_reader, types::{SupportedFileFormat, TextEncoding}};
///
/// let mut file = File::open("pacs008.xml").expect("Файл не найден");
/// let table = parse_from_reader(&mut file, SupportedFileFormat::Xml, TextEncoding::Utf8)
///     .expect("Ошибка разбора");
/// ```
pub fn parse_from_reader(
    reader: &mut impl io::Read,
    format: types::SupportedFileFormat,
    encoding: types::TextEncoding,
) -> Result<types::Table, error::ParseError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    parse(&types::RawDocument::with_encoding(&bytes, encoding), format)
}

/// Записывает таблицу в поток в указанном формате.
///
/// # Пример
///
/// ```rust
/// use bankfile_parser::{dump, parse_from_mt101, types::OutputFormat};
///
/// let table = parse_from_mt101(b":21:TX-1\n:32B:EUR10,\n").expect("Ошибка разбора");
/// let mut buffer = Vec::new();
///
/// dump(&mut buffer, OutputFormat::Text, &table).expect("Ошибка записи");
///
/// let result_string = String::from_utf8(buffer).expect("Невалидный UTF-8");
/// assert!(result_string.contains("Transaction Reference: TX-1"));
/// ```
pub fn dump(
    writer: &mut impl io::Write,
    format: types::OutputFormat,
    table: &types::Table,
) -> Result<(), error::DumpError> {
    match format {
        types::OutputFormat::Csv => crate::csv_format::dump_as_csv(writer, table),
        types::OutputFormat::Text => crate::text_format::dump_as_text(writer, table),
    }
}
