use std::io::{self, Write};

use crate::error::DumpError;
use crate::types::Table;

/// Записывает таблицу в человекочитаемом виде: по строке `Заголовок: значение`
/// на каждую непустую ячейку, записи разделены пустой строкой.
pub fn dump_as_text<W: io::Write>(writer: &mut W, table: &Table) -> Result<(), DumpError> {
    let mut w = io::BufWriter::new(writer);
    for (index, record) in table.records().iter().enumerate() {
        if index > 0 {
            writeln!(w)?;
        }
        for (label, value) in table.header().iter().zip(record) {
            if value.is_empty() {
                continue;
            }
            writeln!(w, "{}: {}", label, value)?;
        }
    }
    w.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse_from_mt101, parse_from_xml};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_dump_transactions() {
        let input = ":20:BATCH\n:21:A\n:32B:EUR1,\n:21:B\n";
        let table = parse_from_mt101(input.as_bytes()).unwrap();

        let mut got = Vec::new();
        dump_as_text(&mut got, &table).unwrap();

        let expected = "Sender's Reference: BATCH\nTransaction Reference: A\nAmount & Currency: EUR1,\n\nSender's Reference: BATCH\nTransaction Reference: B\n";
        assert_eq!(expected, String::from_utf8_lossy(&got));
    }

    #[test]
    fn test_dump_error_table() {
        let table = parse_from_xml(b"<Unknown/>").unwrap();

        let mut got = Vec::new();
        dump_as_text(&mut got, &table).unwrap();

        assert_eq!("Error: Unrecognized XML structure\n", String::from_utf8_lossy(&got));
    }
}
