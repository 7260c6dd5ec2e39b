use tracing::{debug, warn};

use crate::error::ParseError;
use crate::parser::Decoder;
use crate::types::{FieldSource, FieldSpec, RawDocument, Row, Table};
use crate::xml_tree::{Element, ParsedTree};

/// Валюта плоского списка платежей: сам формат её не содержит.
pub const PAYMENT_LIST_CURRENCY: &str = "EUR";

const fn path(label: &'static str, key: &'static str, path: &'static str) -> FieldSpec {
    FieldSpec {
        label,
        key,
        source: FieldSource::Path(path),
    }
}

const fn group(label: &'static str, key: &'static str, path: &'static str) -> FieldSpec {
    FieldSpec {
        label,
        key,
        source: FieldSource::GroupPath(path),
    }
}

const fn address(label: &'static str, key: &'static str, path: &'static str) -> FieldSpec {
    FieldSpec {
        label,
        key,
        source: FieldSource::Address(path),
    }
}

/// Колонки плоского списка платежей (`<Payments><Payment>...`).
pub const PAYMENT_LIST_FIELDS: &[FieldSpec] = &[
    path("Beneficiary ID", "BeneficiaryID", "BeneficiaryID"),
    path("Beneficiary Name", "BeneficiaryName", "BeneficiaryName"),
    path("Reference", "Reference", "Reference"),
    path("Amount", "Amount", "TotalAmount"),
    FieldSpec {
        label: "Currency",
        key: "Currency",
        source: FieldSource::Constant(PAYMENT_LIST_CURRENCY),
    },
];

/// Колонки pacs.008. Пути заголовка считаются от `GrpHdr`, остальные от
/// `CdtTrfTxInf`.
pub const CREDIT_TRANSFER_FIELDS: &[FieldSpec] = &[
    group("Message ID", "MsgId", "MsgId"),
    group("Creation Date/Time", "CreDtTm", "CreDtTm"),
    group("Number of Transactions", "NbOfTxs", "NbOfTxs"),
    group("Settlement Method", "SttlmMtd", "SttlmInf.SttlmMtd"),
    path("Instruction ID", "InstrId", "PmtId.InstrId"),
    path("End to End ID", "EndToEndId", "PmtId.EndToEndId"),
    path("UETR", "UETR", "PmtId.UETR"),
    path("Interbank Settlement Amount", "IntrBkSttlmAmt", "IntrBkSttlmAmt.#text"),
    path("Interbank Settlement Currency", "IntrBkSttlmAmt_Ccy", "IntrBkSttlmAmt.@Ccy"),
    path("Interbank Settlement Date", "IntrBkSttlmDt", "IntrBkSttlmDt"),
    path("Instructed Amount", "InstdAmt", "InstdAmt.#text"),
    path("Instructed Amount Currency", "InstdAmt_Ccy", "InstdAmt.@Ccy"),
    path("Charge Bearer", "ChrgBr", "ChrgBr"),
    path("Instructing Agent BICFI", "InstgAgt_BICFI", "InstgAgt.FinInstnId.BICFI"),
    path("Instructed Agent BICFI", "InstdAgt_BICFI", "InstdAgt.FinInstnId.BICFI"),
    path("Intermediary Agent 1 BICFI", "IntrmyAgt1_BICFI", "IntrmyAgt1.FinInstnId.BICFI"),
    path("Intermediary Agent 1 Name", "IntrmyAgt1_Nm", "IntrmyAgt1.FinInstnId.Nm"),
    address("Intermediary Agent 1 Address", "IntrmyAgt1_Address", "IntrmyAgt1.FinInstnId.PstlAdr"),
    path("Debtor Name", "Dbtr_Nm", "Dbtr.Nm"),
    address("Debtor Address", "Dbtr_Address", "Dbtr.PstlAdr"),
    path("Debtor Account IBAN", "DbtrAcct_IBAN", "DbtrAcct.Id.IBAN"),
    path("Debtor Agent BICFI", "DbtrAgt_BICFI", "DbtrAgt.FinInstnId.BICFI"),
    path("Creditor Agent BICFI", "CdtrAgt_BICFI", "CdtrAgt.FinInstnId.BICFI"),
    path("Creditor Agent Name", "CdtrAgt_Nm", "CdtrAgt.FinInstnId.Nm"),
    address("Creditor Agent Address", "CdtrAgt_Address", "CdtrAgt.FinInstnId.PstlAdr"),
    path("Creditor Name", "Cdtr_Nm", "Cdtr.Nm"),
    address("Creditor Address", "Cdtr_Address", "Cdtr.PstlAdr"),
    path("Creditor Account IBAN", "CdtrAcct_IBAN", "CdtrAcct.Id.IBAN"),
    path("Purpose Code", "Purp_Cd", "Purp.Cd"),
    path("Remittance Information Unstructured", "RmtInf_Ustrd", "RmtInf.Ustrd"),
];

const ADDRESS_PARTS: &[&str] = &["StrtNm", "BldgNb", "PstCd", "TwnNm", "DstrctNm", "Ctry"];

/// Какой из известных видов документа перед нами.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentShape<'t> {
    /// Корень `Payments` со списком `Payment`.
    PaymentList(&'t Element),
    /// `Document/FIToFICstmrCdtTrf` (pacs.008).
    CreditTransfer(&'t Element),
    Unrecognized,
}

impl<'t> DocumentShape<'t> {
    pub fn detect(tree: &'t ParsedTree) -> Self {
        let root = tree.root();
        match root.name() {
            "Payments" => DocumentShape::PaymentList(root),
            "Document" => root
                .child("FIToFICstmrCdtTrf")
                .map_or(DocumentShape::Unrecognized, DocumentShape::CreditTransfer),
            _ => DocumentShape::Unrecognized,
        }
    }
}

pub(crate) struct XmlDecoder;

impl Decoder for XmlDecoder {
    fn decode(document: &RawDocument) -> Result<Table, ParseError> {
        let text = document.text();
        let tree = ParsedTree::parse(&text)?;
        let table = match DocumentShape::detect(&tree) {
            DocumentShape::PaymentList(list) => project_payment_list(list),
            DocumentShape::CreditTransfer(message) => project_credit_transfer(message),
            DocumentShape::Unrecognized => {
                warn!(root = tree.root().name(), "unrecognized XML structure");
                Table::unrecognized_structure()
            }
        };
        Ok(table)
    }
}

/// Разбирает XML: pacs.008 или плоский список платежей.
///
/// Документ неизвестной структуры не считается ошибкой: возвращается
/// таблица `[["Error"], ["Unrecognized XML structure"]]`. Ошибкой является
/// только синтаксически некорректный XML.
///
/// # Пример
///
/// ```rust
/// use bankfile_parser::parse_from_xml;
///
/// let data = r##"<Payments>
///     <Payment>
///         <BeneficiaryID>B2</BeneficiaryID>
///         <BeneficiaryName>ACME</BeneficiaryName>
///         <Reference>INV-9</Reference>
///         <TotalAmount>100.50</TotalAmount>
///     </Payment>
/// </Payments>"##;
///
/// let table = parse_from_xml(data.as_bytes()).expect("Ошибка разбора");
/// assert_eq!(table.records(), [vec!["B2", "ACME", "INV-9", "100.50", "EUR"]]);
/// ```
pub fn parse_from_xml(bytes: &[u8]) -> Result<Table, ParseError> {
    XmlDecoder::decode(&RawDocument::new(bytes))
}

fn project_payment_list(list: &Element) -> Table {
    let mut table = Table::with_header(PAYMENT_LIST_FIELDS);
    let mut dropped = 0usize;
    for payment in list.children_named("Payment") {
        if is_payable(payment) {
            table.push(project(PAYMENT_LIST_FIELDS, payment, None));
        } else {
            dropped += 1;
        }
    }
    debug!(records = table.record_count(), dropped, "decoded payment list");
    table
}

/// Платёж попадает в таблицу, только если указан получатель и сумма
/// положительна.
fn is_payable(payment: &Element) -> bool {
    let has_beneficiary = payment
        .value("BeneficiaryID")
        .is_some_and(|id| !id.trim().is_empty());
    let positive_amount = payment
        .value("TotalAmount")
        .and_then(|amount| amount.trim().parse::<f64>().ok())
        .is_some_and(|amount| amount.is_finite() && amount > 0.0);
    has_beneficiary && positive_amount
}

fn project_credit_transfer(message: &Element) -> Table {
    let mut table = Table::with_header(CREDIT_TRANSFER_FIELDS);
    let header = message.child("GrpHdr");
    for transaction in message.children_named("CdtTrfTxInf") {
        table.push(project(CREDIT_TRANSFER_FIELDS, transaction, header));
    }

    let declared = header.and_then(|h| h.value("NbOfTxs")).unwrap_or_default();
    if let Ok(declared) = declared.parse::<usize>()
        && declared != table.record_count()
    {
        warn!(declared, actual = table.record_count(), "NbOfTxs does not match transactions");
    }
    debug!(records = table.record_count(), "decoded pacs.008 message");
    table
}

fn project(fields: &[FieldSpec], record: &Element, header: Option<&Element>) -> Row {
    fields
        .iter()
        .map(|field| match field.source {
            FieldSource::Path(path) => record.values(path).join(" "),
            FieldSource::GroupPath(path) => header
                .and_then(|h| h.value(path))
                .unwrap_or_default()
                .to_string(),
            FieldSource::Address(path) => record.find(path).map(flatten_address).unwrap_or_default(),
            FieldSource::Constant(value) => value.to_string(),
            FieldSource::Columns { .. } | FieldSource::Tag(_) => String::new(),
        })
        .collect()
}

/// Склеивает почтовый адрес в одну строку через `", "`, пропуская
/// отсутствующие части. Если структурированных частей нет, используются
/// строки `AdrLine`.
pub fn flatten_address(address: &Element) -> String {
    let parts: Vec<&str> = ADDRESS_PARTS
        .iter()
        .filter_map(|part| address.value(part))
        .filter(|value| !value.is_empty())
        .collect();
    if !parts.is_empty() {
        return parts.join(", ");
    }
    address
        .values("AdrLine")
        .into_iter()
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}
