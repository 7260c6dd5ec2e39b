use tracing::{debug, trace};

use crate::error::ParseError;
use crate::parser::Decoder;
use crate::types::{FieldSource, FieldSpec, RawDocument, Row, Table};

/// Код записи о движении по счёту. Остальные записи (остатки, итоги)
/// пропускаются.
pub const TRANSACTION_RECORD: &str = "04";

const fn raw(label: &'static str, key: &'static str, start: usize, end: usize) -> FieldSpec {
    FieldSpec {
        label,
        key,
        source: FieldSource::Columns { start, end: Some(end), trim: false },
    }
}

const fn text(label: &'static str, key: &'static str, start: usize, end: Option<usize>) -> FieldSpec {
    FieldSpec {
        label,
        key,
        source: FieldSource::Columns { start, end, trim: true },
    }
}

/// Колонки записи `04`.
pub const FIELDS: &[FieldSpec] = &[
    raw("Record Type", "RecordType", 0, 2),
    raw("Bank Code", "BankCode", 2, 7),
    raw("Desk Code", "DeskCode", 7, 11),
    raw("Currency Code", "CurrencyCode", 11, 14),
    text("Account Number", "AccountNumber", 14, Some(39)),
    text("Beneficiary Name", "BeneficiaryName", 39, Some(79)),
    text("Beneficiary Address 1", "BeneficiaryAddress1", 79, Some(119)),
    text("Beneficiary Address 2", "BeneficiaryAddress2", 119, Some(159)),
    text("Beneficiary Address 3", "BeneficiaryAddress3", 159, Some(199)),
    text("Amount", "Amount", 199, Some(214)),
    raw("Operation Code", "OperationCode", 214, 217),
    raw("Operation Date", "OperationDate", 217, 223),
    raw("Currency", "Currency", 223, 226),
    text("Reference", "Reference", 226, Some(241)),
    text("Bank Details", "BankDetails", 241, None),
];

pub(crate) struct CfonbDecoder;

impl Decoder for CfonbDecoder {
    fn decode(document: &RawDocument) -> Result<Table, ParseError> {
        let text = document.text();
        let mut table = Table::with_header(FIELDS);
        let mut skipped = 0usize;

        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            let record_type = slice(line, 0, Some(2));
            if record_type != TRANSACTION_RECORD {
                trace!(record_type, "skipping non-transaction record");
                skipped += 1;
                continue;
            }
            table.push(parse_record(line));
        }

        debug!(records = table.record_count(), skipped, "decoded CFONB file");
        Ok(table)
    }
}

/// Разбирает файл CFONB.
///
/// # Пример
///
/// ```rust
/// use bankfile_parser::parse_from_cfonb;
///
/// let line = format!("{:<199}{:>15}", "0412345", "000000000012550");
/// let table = parse_from_cfonb(line.as_bytes()).expect("Ошибка разбора");
/// assert_eq!(table.record_count(), 1);
/// assert_eq!(table.records()[0][9], "000000000012550");
/// ```
pub fn parse_from_cfonb(bytes: &[u8]) -> Result<Table, ParseError> {
    CfonbDecoder::decode(&RawDocument::new(bytes))
}

fn parse_record(line: &str) -> Row {
    FIELDS
        .iter()
        .map(|field| match field.source {
            FieldSource::Columns { start, end, trim } => {
                let value = slice(line, start, end);
                let value = if trim { value.trim_end() } else { value };
                value.to_string()
            }
            _ => String::new(),
        })
        .collect()
}

/// Вырезает символы `[start, end)`. Если строка короче `end`, колонка
/// считается пустой. Без `end` берётся остаток строки.
fn slice(line: &str, start: usize, end: Option<usize>) -> &str {
    let Some(from) = byte_offset(line, start) else {
        return "";
    };
    let to = match end {
        Some(end) => match byte_offset(line, end) {
            Some(to) => to,
            None => return "",
        },
        None => line.len(),
    };
    &line[from..to]
}

fn byte_offset(line: &str, chars: usize) -> Option<usize> {
    line.char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(line.len()))
        .nth(chars)
}
