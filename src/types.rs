use std::borrow::Cow;

/// Одна строка таблицы: ячейки в порядке колонок.
pub type Row = Vec<String>;

/// Поддерживаемые форматы входных файлов.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportedFileFormat {
    /// SWIFT MT101, тегированный текст.
    Mt101,
    /// CFONB, текст с фиксированной шириной колонок.
    Cfonb,
    /// ISO 20022 pacs.008 или плоский список платежей в XML.
    Xml,
}

/// Форматы, в которые можно выгрузить таблицу.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Text,
}

/// Кодировка, в которой записан исходный файл.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    #[default]
    Utf8,
    /// Встречается в старых выгрузках CFONB.
    Windows1252,
}

/// Исходный файл в том виде, в каком его передал вызывающий код.
#[derive(Debug, Clone, Copy)]
pub struct RawDocument<'a> {
    bytes: &'a [u8],
    encoding: TextEncoding,
}

impl<'a> RawDocument<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self::with_encoding(bytes, TextEncoding::Utf8)
    }

    pub fn with_encoding(bytes: &'a [u8], encoding: TextEncoding) -> Self {
        RawDocument { bytes, encoding }
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// Декодирует байты в текст.
    ///
    /// Декодирование никогда не падает: некорректные последовательности
    /// заменяются на `U+FFFD`, BOM в начале файла отбрасывается.
    pub fn text(&self) -> Cow<'a, str> {
        let encoding = match self.encoding {
            TextEncoding::Utf8 => encoding_rs::UTF_8,
            TextEncoding::Windows1252 => encoding_rs::WINDOWS_1252,
        };
        let (text, _, had_errors) = encoding.decode(self.bytes);
        if had_errors {
            tracing::debug!(encoding = encoding.name(), "replaced malformed byte sequences");
        }
        text
    }
}

/// Откуда берётся значение колонки.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSource {
    /// Диапазон позиций в строке фиксированной ширины. `end: None` значит
    /// "до конца строки". При `trim` хвостовые пробелы отрезаются.
    Columns {
        start: usize,
        end: Option<usize>,
        trim: bool,
    },
    /// Тег поля SWIFT, например `32B`.
    Tag(&'static str),
    /// Путь внутри записи о транзакции, например `PmtId.EndToEndId`.
    Path(&'static str),
    /// Путь внутри заголовка сообщения; значение повторяется в каждой строке.
    GroupPath(&'static str),
    /// Путь к элементу почтового адреса, который склеивается в одну строку.
    Address(&'static str),
    /// Значение, которого нет в файле.
    Constant(&'static str),
}

/// Описание одной колонки выходной таблицы.
///
/// Таблицы `FieldSpec` статичны и общие для декодера (что извлекать) и
/// внешнего потребителя (как показывать): `label` попадает в заголовок,
/// `key` используется при сопоставлении полей.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub label: &'static str,
    pub key: &'static str,
    pub source: FieldSource,
}

/// Ищет колонку по ключу.
pub fn column_index(fields: &[FieldSpec], key: &str) -> Option<usize> {
    fields.iter().position(|field| field.key == key)
}

const ERROR_HEADER: &str = "Error";
const UNRECOGNIZED_STRUCTURE: &str = "Unrecognized XML structure";

/// Результат работы любого декодера.
///
/// Нулевая строка всегда заголовок, дальше данные в порядке следования в
/// исходном файле. Все строки одной длины.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    rows: Vec<Row>,
}

impl Table {
    /// Пустая таблица с заголовком из `label` каждой колонки.
    pub fn with_header(fields: &[FieldSpec]) -> Self {
        let header = fields.iter().map(|field| field.label.to_string()).collect();
        Table { rows: vec![header] }
    }

    /// Таблица-сигнал о том, что структура документа не распознана.
    pub fn unrecognized_structure() -> Self {
        Table {
            rows: vec![
                vec![ERROR_HEADER.to_string()],
                vec![UNRECOGNIZED_STRUCTURE.to_string()],
            ],
        }
    }

    pub(crate) fn push(&mut self, row: Row) {
        debug_assert_eq!(row.len(), self.width(), "row arity must match header");
        self.rows.push(row);
    }

    pub fn header(&self) -> &[String] {
        &self.rows[0]
    }

    /// Строки данных без заголовка.
    pub fn records(&self) -> &[Row] {
        &self.rows[1..]
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn width(&self) -> usize {
        self.header().len()
    }

    pub fn record_count(&self) -> usize {
        self.rows.len() - 1
    }

    pub fn is_unrecognized_structure(&self) -> bool {
        self.header() == [ERROR_HEADER]
    }

    /// Номер колонки по тексту заголовка.
    pub fn column(&self, label: &str) -> Option<usize> {
        self.header().iter().position(|h| h == label)
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }
}

impl From<Table> for Vec<Row> {
    fn from(table: Table) -> Self {
        table.into_rows()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const FIELDS: &[FieldSpec] = &[
        FieldSpec {
            label: "Bank Code",
            key: "BankCode",
            source: FieldSource::Columns { start: 0, end: Some(2), trim: false },
        },
        FieldSpec {
            label: "Amount",
            key: "Amount",
            source: FieldSource::Tag("32B"),
        },
    ];

    #[test]
    fn test_header_uses_labels() {
        let table = Table::with_header(FIELDS);
        assert_eq!(table.header(), ["Bank Code", "Amount"]);
        assert_eq!(table.record_count(), 0);
        assert!(table.records().is_empty());
    }

    #[test]
    fn test_column_lookup() {
        let table = Table::with_header(FIELDS);
        assert_eq!(table.column("Amount"), Some(1));
        assert_eq!(table.column("Missing"), None);
        assert_eq!(column_index(FIELDS, "BankCode"), Some(0));
    }

    #[test]
    fn test_unrecognized_structure_table() {
        let table = Table::unrecognized_structure();
        assert!(table.is_unrecognized_structure());
        assert_eq!(
            table.into_rows(),
            vec![
                vec!["Error".to_string()],
                vec!["Unrecognized XML structure".to_string()]
            ]
        );
    }

    #[test]
    fn test_text_strips_bom_and_replaces_garbage() {
        let bytes = b"\xEF\xBB\xBFabc\xFF";
        let doc = RawDocument::new(bytes);
        assert_eq!(doc.text(), "abc\u{FFFD}");
    }

    #[test]
    fn test_windows_1252_text() {
        let bytes = b"Soci\xE9t\xE9 G\xE9n\xE9rale";
        let doc = RawDocument::with_encoding(bytes, TextEncoding::Windows1252);
        assert_eq!(doc.text(), "Société Générale");
    }
}
