use std::collections::HashMap;
use std::mem;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, trace};

use crate::error::ParseError;
use crate::parser::Decoder;
use crate::types::{FieldSource, FieldSpec, RawDocument, Row, Table};

/// Тег, с которого начинается каждая транзакция (Transaction Reference).
pub const BOUNDARY_TAG: &str = "21";

const fn tag(label: &'static str, tag: &'static str) -> FieldSpec {
    FieldSpec {
        label,
        key: tag,
        source: FieldSource::Tag(tag),
    }
}

/// Поля MT101 в порядке выходных колонок.
pub const FIELDS: &[FieldSpec] = &[
    tag("Sender's Reference", "20"),
    tag("Customer Specified Reference", "21R"),
    tag("Transaction Reference", "21"),
    tag("F/X Deal Reference", "21F"),
    tag("Instruction Code", "23E"),
    tag("Account Identification", "25"),
    tag("Statement Number / Sequence Number", "28D"),
    tag("Requested Execution Date", "30"),
    tag("Amount & Currency", "32B"),
    tag("Ordering Customer (A)", "50A"),
    tag("Ordering Customer (F)", "50F"),
    tag("Ordering Customer (H)", "50H"),
    tag("Ordering Institution (A)", "52A"),
    tag("Ordering Institution (D)", "52D"),
    tag("Sender’s Correspondent (A)", "53A"),
    tag("Sender’s Correspondent (B)", "53B"),
    tag("Sender’s Correspondent (D)", "53D"),
    tag("Receiver’s Correspondent (A)", "54A"),
    tag("Receiver’s Correspondent (B)", "54B"),
    tag("Receiver’s Correspondent (D)", "54D"),
    tag("Third Reimbursement Institution (A)", "55A"),
    tag("Third Reimbursement Institution (B)", "55B"),
    tag("Third Reimbursement Institution (D)", "55D"),
    tag("Intermediary Institution (A)", "56A"),
    tag("Intermediary Institution (C)", "56C"),
    tag("Intermediary Institution (D)", "56D"),
    tag("Account With Institution (A)", "57A"),
    tag("Account With Institution (B)", "57B"),
    tag("Account With Institution (D)", "57D"),
    tag("Beneficiary Customer", "59"),
    tag("Beneficiary Customer (F)", "59F"),
    tag("Remittance Information", "70"),
    tag("Details of Charges", "71A"),
    tag("Sender’s Charges", "71F"),
    tag("Receiver’s Charges", "71G"),
    tag("Bank to Bank Information", "72"),
    tag("Regulatory Reporting", "77B"),
    tag("Envelope Contents", "77T"),
    tag("MPH Bank Name", "MPH01"),
    tag("MPH Account Number", "MPH02"),
    tag("MPH SWIFT Code", "MPH03"),
    tag("MPH Address Line 1", "MPH04"),
    tag("MPH Address Line 2", "MPH05"),
    tag("MPH Address Line 3", "MPH06"),
    tag("MPH Country", "MPH07"),
];

static TAG_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^:([0-9A-Z]{2,}):(.*)$").expect("tag pattern is valid"));

pub(crate) struct Mt101Decoder;

impl Decoder for Mt101Decoder {
    fn decode(document: &RawDocument) -> Result<Table, ParseError> {
        let text = document.text();
        let mut scanner = RecordScanner::default();
        for line in text.lines() {
            scanner.feed(line);
        }

        let mut table = Table::with_header(FIELDS);
        for row in scanner.finish() {
            table.push(row);
        }
        debug!(records = table.record_count(), "decoded MT101 message");
        Ok(table)
    }
}

/// Разбирает сообщение SWIFT MT101.
///
/// Поля до первого тега `:21:` (общая часть сообщения) попадают в каждую
/// строку, каждый `:21:` открывает новую транзакцию. Строки без тега
/// дописываются через пробел к значению предыдущего поля.
///
/// # Пример
///
/// ```rust
/// use bankfile_parser::parse_from_mt101;
///
/// let data = r##":20:BATCH-7
/// :30:240115
/// :21:TX-1
/// :32B:EUR1250,00
/// :59:/FR7630004000031234567890143
/// DUPONT JEAN
/// :21:TX-2
/// :32B:EUR80,00
/// "##;
///
/// let table = parse_from_mt101(data.as_bytes()).expect("Ошибка разбора");
/// assert_eq!(table.record_count(), 2);
/// assert_eq!(table.records()[0][29], "/FR7630004000031234567890143 DUPONT JEAN");
/// assert_eq!(table.records()[1][0], "BATCH-7");
/// ```
pub fn parse_from_mt101(bytes: &[u8]) -> Result<Table, ParseError> {
    Mt101Decoder::decode(&RawDocument::new(bytes))
}

enum Line<'a> {
    Tag { tag: &'a str, value: &'a str },
    /// Служебные блоки конверта SWIFT: `{1:...}`, `{4:`.
    Envelope,
    /// `-}`: конец текстового блока, а значит и сообщения.
    MessageEnd,
    Text(&'a str),
}

fn classify(line: &str) -> Line<'_> {
    let line = line.trim_end();
    if line.starts_with('{') {
        // Текстовый блок может начинаться на той же строке, что и `{4:`.
        return match line.find("{4:") {
            Some(pos) if pos + 3 < line.len() => classify(&line[pos + 3..]),
            _ => Line::Envelope,
        };
    }
    if line.starts_with("-}") {
        return Line::MessageEnd;
    }
    match TAG_LINE.captures(line) {
        Some(caps) => match (caps.get(1), caps.get(2)) {
            (Some(tag), Some(value)) => Line::Tag {
                tag: tag.as_str(),
                value: value.as_str().trim(),
            },
            _ => Line::Text(line),
        },
        None => Line::Text(line),
    }
}

fn known_tag(tag: &str) -> Option<&'static str> {
    FIELDS.iter().find_map(|field| match field.source {
        FieldSource::Tag(known) if known == tag => Some(known),
        _ => None,
    })
}

type Record = HashMap<&'static str, String>;

/// Состояние разбора: текущая транзакция и последний прочитанный тег.
#[derive(Debug, Default)]
struct RecordScanner {
    /// Общая часть сообщения. `None`, пока не встретился первый `:21:`.
    preamble: Option<Record>,
    current: Record,
    last_tag: Option<&'static str>,
    rows: Vec<Row>,
}

impl RecordScanner {
    fn feed(&mut self, line: &str) {
        match classify(line) {
            Line::Tag { tag, value } => self.on_tag(tag, value),
            Line::Envelope => self.last_tag = None,
            Line::MessageEnd => self.end_message(),
            Line::Text(text) => self.on_continuation(text),
        }
    }

    fn on_tag(&mut self, tag: &str, value: &str) {
        if tag == BOUNDARY_TAG {
            self.on_boundary();
        }
        match known_tag(tag) {
            Some(tag) => {
                self.current.insert(tag, value.to_string());
                self.last_tag = Some(tag);
            }
            None => trace!(tag, "skipping unknown tag"),
        }
    }

    fn on_boundary(&mut self) {
        if self.preamble.is_none() {
            self.preamble = Some(self.current.clone());
            return;
        }
        if self.current.is_empty() {
            return;
        }
        let next = self.preamble.clone().unwrap_or_default();
        let record = mem::replace(&mut self.current, next);
        self.rows.push(project(&record));
    }

    /// Закрывает сообщение: общая часть следующего сообщения своя.
    fn end_message(&mut self) {
        if !self.current.is_empty() {
            let record = mem::take(&mut self.current);
            self.rows.push(project(&record));
        }
        self.preamble = None;
        self.last_tag = None;
    }

    fn on_continuation(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        let Some(tag) = self.last_tag else {
            return;
        };
        let value = self.current.entry(tag).or_default();
        if !value.is_empty() {
            value.push(' ');
        }
        value.push_str(text);
    }

    fn finish(mut self) -> Vec<Row> {
        if !self.current.is_empty() {
            let record = mem::take(&mut self.current);
            self.rows.push(project(&record));
        }
        self.rows
    }
}

fn project(record: &Record) -> Row {
    FIELDS
        .iter()
        .map(|field| record.get(field.key).cloned().unwrap_or_default())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn column(key: &str) -> usize {
        crate::types::column_index(FIELDS, key).unwrap()
    }

    #[test]
    fn test_parse_one_transaction() {
        let input = ":20:REF-1\n:21:TX-1\n:32B:USD100,50\n:71A:SHA\n";

        let table = parse_from_mt101(input.as_bytes()).unwrap();

        assert_eq!(table.record_count(), 1);
        let row = &table.records()[0];
        assert_eq!(row.len(), FIELDS.len());
        assert_eq!(row[column("20")], "REF-1");
        assert_eq!(row[column("21")], "TX-1");
        assert_eq!(row[column("32B")], "USD100,50");
        assert_eq!(row[column("71A")], "SHA");
        assert_eq!(row[column("59")], "");
    }

    #[test]
    fn test_each_boundary_yields_one_row() {
        let input = r##":20:BATCH
:28D:1/1
:50H:/123456
ACME CORP
:30:240115
:21:A
:32B:EUR1,
:21:B
:32B:EUR2,
:59:/FR76
:21:C
:32B:EUR3,
"##;
        let table = parse_from_mt101(input.as_bytes()).unwrap();

        assert_eq!(table.record_count(), 3);
        let references: Vec<&str> = table
            .records()
            .iter()
            .map(|row| row[column("21")].as_str())
            .collect();
        assert_eq!(references, ["A", "B", "C"]);
        for row in table.records() {
            assert_eq!(row[column("20")], "BATCH");
            assert_eq!(row[column("50H")], "/123456 ACME CORP");
            assert_eq!(row[column("30")], "240115");
        }
        assert_eq!(table.records()[1][column("59")], "/FR76");
        assert_eq!(table.records()[2][column("59")], "");
    }

    #[test]
    fn test_transaction_overrides_general_fields() {
        let input = ":20:BATCH\n:50H:/GENERAL\n:21:A\n:50H:/OWN\n:21:B\n";
        let table = parse_from_mt101(input.as_bytes()).unwrap();

        assert_eq!(table.records()[0][column("50H")], "/OWN");
        assert_eq!(table.records()[1][column("50H")], "/GENERAL");
    }

    #[test]
    fn test_consecutive_boundaries() {
        let input = ":21:A\n:21:B\n:32B:EUR5,\n";
        let table = parse_from_mt101(input.as_bytes()).unwrap();

        assert_eq!(table.record_count(), 2);
        assert_eq!(table.records()[0][column("21")], "A");
        assert_eq!(table.records()[0][column("32B")], "");
        assert_eq!(table.records()[1][column("21")], "B");
        assert_eq!(table.records()[1][column("32B")], "EUR5,");
    }

    #[test]
    fn test_multiline_field() {
        let input = ":21:A\n:59:/DE89370400440532013000\nMAX MUSTERMANN\n  HAUPTSTR. 1  \n\n10115 BERLIN\n";
        let table = parse_from_mt101(input.as_bytes()).unwrap();

        assert_eq!(
            table.records()[0][column("59")],
            "/DE89370400440532013000 MAX MUSTERMANN HAUPTSTR. 1 10115 BERLIN"
        );
    }

    #[test]
    fn test_unknown_tag_is_not_stored() {
        let input = ":21:A\n:70:INVOICE 1\n:99Z:SECRET\nMORE TEXT\n:72:/ACC/X\n";
        let table = parse_from_mt101(input.as_bytes()).unwrap();

        let row = &table.records()[0];
        assert!(row.iter().all(|cell| !cell.contains("SECRET")));
        assert_eq!(row[column("70")], "INVOICE 1 MORE TEXT");
        assert_eq!(row[column("72")], "/ACC/X");
    }

    #[test]
    fn test_each_message_keeps_own_general_fields() {
        let input = "{1:F01AAAA}{4:\n:20:MSG1\n:21:T1\n:32B:EUR1,\n-}\n{1:F01BBBB}{4:\n:20:MSG2\n:21:T2\n:32B:EUR2,\n:21:T3\n-}";
        let table = parse_from_mt101(input.as_bytes()).unwrap();

        let pairs: Vec<(&str, &str)> = table
            .records()
            .iter()
            .map(|row| (row[column("21")].as_str(), row[column("20")].as_str()))
            .collect();
        assert_eq!(pairs, [("T1", "MSG1"), ("T2", "MSG2"), ("T3", "MSG2")]);
        assert_eq!(table.records()[0][column("32B")], "EUR1,");
        assert_eq!(table.records()[2][column("32B")], "");
    }

    #[test]
    fn test_text_before_any_tag_is_ignored() {
        let input = "garbage line\n:21:A\n";
        let table = parse_from_mt101(input.as_bytes()).unwrap();

        assert_eq!(table.record_count(), 1);
        assert!(table.records()[0].iter().all(|cell| !cell.contains("garbage")));
    }

    #[test]
    fn test_without_boundary_emits_single_row() {
        let input = ":20:ONLY\n:30:240101\n";
        let table = parse_from_mt101(input.as_bytes()).unwrap();

        assert_eq!(table.record_count(), 1);
        assert_eq!(table.records()[0][column("20")], "ONLY");
    }

    #[test]
    fn test_swift_envelope() {
        let input = "{1:F01BANKFRPPAXXX0000000000}{2:I101BANKDEFFXXXXN}{4:\r\n:20:ENV\r\n:21:A\r\n:70:PAYMENT\r\n-}\r\n";
        let table = parse_from_mt101(input.as_bytes()).unwrap();

        assert_eq!(table.record_count(), 1);
        assert_eq!(table.records()[0][column("20")], "ENV");
        assert_eq!(table.records()[0][column("70")], "PAYMENT");
    }

    #[test]
    fn test_text_block_on_envelope_line() {
        let input = "{4::20:INLINE\n:21:A\n-}";
        let table = parse_from_mt101(input.as_bytes()).unwrap();

        assert_eq!(table.records()[0][column("20")], "INLINE");
    }

    #[test]
    fn test_mph_tags() {
        let input = ":21:A\n:MPH01:HSBC\n:MPH07:GB\n";
        let table = parse_from_mt101(input.as_bytes()).unwrap();

        assert_eq!(table.records()[0][column("MPH01")], "HSBC");
        assert_eq!(table.records()[0][column("MPH07")], "GB");
    }

    #[test]
    fn test_empty_input() {
        let table = parse_from_mt101(b"").unwrap();
        assert_eq!(table.record_count(), 0);
        assert_eq!(table.width(), FIELDS.len());
    }
}
