use std::io::{self, Write};

use crate::error;
use crate::types::Table;
use crate::utils::{needs_quotes, wrap_with_quotes};

/// Сериализует таблицу в CSV, записывая результат в `writer`.
///
/// Первая строка содержит заголовки. Значения с запятыми, кавычками,
/// переводами строк или пробелами по краям берутся в кавычки.
///
/// # Аргументы
///
/// * `writer` - Приемник данных. Это может быть файл, сокет или буфер в памяти (`Vec<u8>`).
/// * `table` - Таблица, полученная от любого из декодеров.
///
/// # Ошибки
///
/// Возвращает [`error::DumpError`], если произошла ошибка ввода-вывода при записи во `writer`.
///
/// # Пример
///
/// ```rust
/// use bankfile_parser::{dump_as_csv, parse_from_mt101};
///
/// let table = parse_from_mt101(b":21:TX-1\n:32B:EUR10,50\n").expect("Ошибка разбора");
/// let mut buffer = Vec::new();
///
/// dump_as_csv(&mut buffer, &table).expect("Ошибка записи");
///
/// let result_string = String::from_utf8(buffer).expect("Невалидный UTF-8");
/// assert!(result_string.contains(",TX-1,,,,,,\"EUR10,50\","));
/// ```
pub fn dump_as_csv(writer: &mut impl io::Write, table: &Table) -> Result<(), error::DumpError> {
    let mut w = io::BufWriter::new(writer);
    for row in table.rows() {
        write_row(&mut w, row)?;
    }
    w.flush()?;
    Ok(())
}

fn write_row(writer: &mut impl io::Write, row: &[String]) -> Result<(), error::DumpError> {
    let values: Vec<String> = row
        .iter()
        .map(|value| {
            if needs_quotes(value) {
                wrap_with_quotes(value)
            } else {
                value.clone()
            }
        })
        .collect();
    writeln!(writer, "{}", values.join(","))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_from_xml;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_dump_payment_list() {
        let input = r##"<Payments><Payment><BeneficiaryID>B2</BeneficiaryID><BeneficiaryName>Smith, "Bob"</BeneficiaryName><TotalAmount>100.50</TotalAmount></Payment></Payments>"##;
        let table = parse_from_xml(input.as_bytes()).unwrap();

        let mut got = Vec::new();
        dump_as_csv(&mut got, &table).unwrap();

        let expected = "Beneficiary ID,Beneficiary Name,Reference,Amount,Currency\nB2,\"Smith, \"\"Bob\"\"\",,100.50,EUR\n";
        assert_eq!(expected, String::from_utf8_lossy(&got));
    }

    #[test]
    fn test_dump_error_table() {
        let table = parse_from_xml(b"<Unknown/>").unwrap();

        let mut got = Vec::new();
        dump_as_csv(&mut got, &table).unwrap();

        assert_eq!("Error\nUnrecognized XML structure\n", String::from_utf8_lossy(&got));
    }
}
