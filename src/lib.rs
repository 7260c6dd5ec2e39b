//! # bankfile_parser
//!
//! Библиотека для разбора банковских платёжных файлов в единую таблицу строк.
//!
//! Поддерживаются три формата:
//! * **MT101** - тегированный текст SWIFT (`:20:`, `:21:`, `:32B:` ...)
//! * **CFONB** - текст с колонками фиксированной ширины, берутся записи `04`
//! * **XML** - ISO 20022 pacs.008 и плоский список платежей `<Payments>`
//!
//! Результат любого декодера - [`types::Table`]: нулевая строка содержит
//! заголовки колонок, остальные строки - данные в порядке следования в файле.
//! Состав колонок каждого формата задан статической таблицей
//! [`types::FieldSpec`], которую можно использовать и для сопоставления полей.
//!
//! ## Быстрый старт
//!
//! ```rust
//! use bankfile_parser::{parse_from_mt101, dump_as_csv};
//!
//! let data = ":20:BATCH-1\n:21:TX-1\n:32B:EUR1000,00\n:21:TX-2\n:32B:EUR5,00\n";
//!
//! let table = parse_from_mt101(data.as_bytes()).expect("Ошибка разбора");
//! assert_eq!(table.record_count(), 2);
//!
//! let mut writer = Vec::new();
//! dump_as_csv(&mut writer, &table).expect("Ошибка записи");
//! ```
//!
//! ## Обработка ошибок
//! Неполные строки, неизвестные теги и отсутствующие элементы дают пустые
//! ячейки. XML неизвестной структуры возвращается как таблица
//! `[["Error"], ["Unrecognized XML structure"]]`. Ошибку [`error::ParseError`]
//! вызывает только документ, который нельзя прочитать целиком.

pub mod error;
pub mod types;
pub mod xml_tree;

mod cfonb_format;
mod csv_format;
mod mt101_format;
mod parser;
mod text_format;
mod utils;
mod xml_format;

pub use parser::{dump, parse, parse_from_reader};

pub use cfonb_format::{FIELDS as CFONB_FIELDS, TRANSACTION_RECORD, parse_from_cfonb};

pub use mt101_format::{BOUNDARY_TAG, FIELDS as MT101_FIELDS, parse_from_mt101};

pub use xml_format::{
    CREDIT_TRANSFER_FIELDS, DocumentShape, PAYMENT_LIST_CURRENCY, PAYMENT_LIST_FIELDS,
    flatten_address, parse_from_xml,
};

pub use csv_format::dump_as_csv;

pub use text_format::dump_as_text;
