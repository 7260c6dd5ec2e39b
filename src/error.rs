use quick_xml::events::attributes::AttrError;
use thiserror::Error;

/// Ошибки разбора входного файла.
///
/// Битые строки и отсутствующие поля ошибками не считаются: декодеры
/// отдают пустую ячейку. Сюда попадает только то, что не позволяет
/// прочитать документ целиком.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("некорректный XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("некорректный атрибут XML: {0}")]
    XmlAttribute(#[from] AttrError),

    #[error("некорректный формат: {0}")]
    InvalidFormat(String),
}

/// Ошибки записи таблицы в выходной поток.
#[derive(Debug, Error)]
pub enum DumpError {
    #[error("ошибка записи: {0}")]
    Io(#[from] std::io::Error),
}
