use finflow_core::{StagedTransaction, TransactionKind};
use tracing::debug;

use crate::columns::DetectedRow;
use crate::error::ImportError;
use crate::normalize::{normalize_date, parse_amount};
use crate::rules::Categorizer;

const DEFAULT_DESCRIPTION: &str = "Imported transaction";

re!(re_block, r"(?is)<STMTTRN>(.*?)</STMTTRN>");
re!(re_dtposted, r"(?i)<DTPOSTED>\s*([^<\r\n]+)");
re!(re_trnamt, r"(?i)<TRNAMT>\s*([^<\r\n]+)");
re!(re_name, r"(?i)<NAME>\s*([^<\r\n]+)");
re!(re_memo, r"(?i)<MEMO>\s*([^<\r\n]+)");
re!(re_compact_date, r"^(\d{4})(\d{2})(\d{2})");

/// One `<STMTTRN>` block before categorization.
#[derive(Debug, Clone, PartialEq)]
pub struct OfxEntry {
    pub date: String,
    pub raw_amount: String,
    pub name: Option<String>,
    pub memo: Option<String>,
}

impl OfxEntry {
    pub fn description(&self) -> String {
        match (self.name.as_deref(), self.memo.as_deref()) {
            (Some(name), Some(memo)) if name != memo => format!("{name} - {memo}"),
            (Some(name), _) => name.to_string(),
            (None, Some(memo)) => memo.to_string(),
            (None, None) => DEFAULT_DESCRIPTION.to_string(),
        }
    }
}

/// Scans for transaction blocks. SGML (unclosed leaf tags) and XML flavours
/// both work since only the text up to the next tag or line break is read.
pub fn scan_entries(content: &str) -> Vec<OfxEntry> {
    re_block()
        .captures_iter(content)
        .map(|block| {
            let body = &block[1];
            OfxEntry {
                date: tag(re_dtposted(), body).map(parse_ofx_date).unwrap_or_default(),
                raw_amount: tag(re_trnamt(), body).unwrap_or_default(),
                name: tag(re_name(), body),
                memo: tag(re_memo(), body),
            }
        })
        .collect()
}

pub fn parse(
    data: &[u8],
    source: &str,
    categorizer: &Categorizer,
) -> Result<Vec<StagedTransaction>, ImportError> {
    let content = String::from_utf8_lossy(data);
    let entries = scan_entries(&content);
    if entries.is_empty() {
        return Err(ImportError::NoTransactions);
    }
    debug!(source, blocks = entries.len(), "scanned OFX transaction blocks");

    Ok(entries
        .into_iter()
        .map(|entry| {
            let amount = parse_amount(&entry.raw_amount);
            DetectedRow {
                description: entry.description(),
                date: entry.date,
                amount,
                kind: TransactionKind::from_amount(amount),
            }
            .into_staged(categorizer, source, None)
        })
        .collect())
}

fn tag(re: &regex::Regex, body: &str) -> Option<String> {
    re.captures(body)
        .map(|c| c[1].trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_ofx_date(raw: String) -> String {
    match re_compact_date().captures(&raw) {
        Some(c) => format!("{}-{}-{}", &c[1], &c[2], &c[3]),
        None => normalize_date(&raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finflow_core::Money;

    // ── unit helpers ──────────────────────────────────────────────────────────

    #[test]
    fn parse_ofx_date_8digit() {
        assert_eq!(parse_ofx_date("20240115".into()), "2024-01-15");
        assert_eq!(parse_ofx_date("20240301".into()), "2024-03-01");
    }

    #[test]
    fn parse_ofx_date_with_time_suffix_ignored() {
        assert_eq!(parse_ofx_date("20240115120000[-5:EST]".into()), "2024-01-15");
    }

    #[test]
    fn parse_ofx_date_other_formats_are_normalized() {
        assert_eq!(parse_ofx_date("15/01/2024".into()), "2024-01-15");
        assert_eq!(parse_ofx_date("not-a-date".into()), "not-a-date");
    }

    #[test]
    fn description_joins_name_and_memo() {
        let mut entry = OfxEntry {
            date: "2024-01-15".into(),
            raw_amount: "-1".into(),
            name: Some("AMAZON".into()),
            memo: Some("Online purchase".into()),
        };
        assert_eq!(entry.description(), "AMAZON - Online purchase");
        entry.memo = Some("AMAZON".into());
        assert_eq!(entry.description(), "AMAZON");
        entry.name = None;
        assert_eq!(entry.description(), "AMAZON");
        entry.memo = None;
        assert_eq!(entry.description(), "Imported transaction");
    }

    // ── full statement parse ──────────────────────────────────────────────────

    const SAMPLE_OFX: &str = r#"
OFXHEADER:100
DATA:OFXSGML
VERSION:102

<OFX>
<BANKMSGSRSV1>
<STMTTRNRS>
<STMTRS>
<CURDEF>BRL
<BANKACCTFROM>
<BANKID>0341
<ACCTID>000112345
<ACCTTYPE>CHECKING
</BANKACCTFROM>
<BANKTRANLIST>
<DTSTART>20240101
<DTEND>20240131
<STMTTRN>
<TRNTYPE>DEBIT
<DTPOSTED>20240115
<TRNAMT>-49.99
<FITID>TXN001
<NAME>AMAZON MARKETPLACE
<MEMO>Online purchase
</STMTTRN>
<STMTTRN>
<TRNTYPE>CREDIT
<DTPOSTED>20240120120000[-3:BRT]
<TRNAMT>1500,00
<FITID>TXN002
<NAME>SALARIO EMPRESA
</STMTTRN>
</BANKTRANLIST>
</STMTRS>
</STMTTRNRS>
</BANKMSGSRSV1>
</OFX>
"#;

    #[test]
    fn parse_full_ofx_statement() {
        let rows = parse(SAMPLE_OFX.as_bytes(), "jan.ofx", &Categorizer::default()).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.source == "jan.ofx"));
        assert!(rows.iter().all(|r| !r.is_duplicate && r.card.is_none()));
    }

    #[test]
    fn parse_ofx_transaction_fields() {
        let rows = parse(SAMPLE_OFX.as_bytes(), "jan.ofx", &Categorizer::default()).unwrap();
        let t0 = &rows[0];
        assert_eq!(t0.date, "2024-01-15");
        assert_eq!(t0.amount, Money::from_cents(-4999));
        assert_eq!(t0.kind, TransactionKind::Expense);
        assert_eq!(t0.description, "AMAZON MARKETPLACE - Online purchase");
    }

    #[test]
    fn parse_ofx_credit_with_comma_decimal() {
        let rows = parse(SAMPLE_OFX.as_bytes(), "jan.ofx", &Categorizer::default()).unwrap();
        let t1 = &rows[1];
        assert_eq!(t1.date, "2024-01-20");
        assert_eq!(t1.amount, Money::from_cents(150000));
        assert_eq!(t1.kind, TransactionKind::Income);
        assert_eq!(t1.description, "SALARIO EMPRESA");
    }

    #[test]
    fn xml_style_closed_tags() {
        let xml = "<OFX><STMTTRN><DTPOSTED>20240305</DTPOSTED><TRNAMT>-12.00</TRNAMT>\
                   <MEMO>PADARIA</MEMO></STMTTRN></OFX>";
        let rows = parse(xml.as_bytes(), "x.ofx", &Categorizer::default()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, "2024-03-05");
        assert_eq!(rows[0].description, "PADARIA");
        assert_eq!(rows[0].category, "food");
    }

    #[test]
    fn uber_block_becomes_transport_expense() {
        let ofx = "<OFX>\n<STMTTRN>\n<DTPOSTED>20240115\n<TRNAMT>-45.90\n<NAME>UBER\n</STMTTRN>\n</OFX>";
        let rows = parse(ofx.as_bytes(), "bank.ofx", &Categorizer::default()).unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.date, "2024-01-15");
        assert_eq!(row.amount, Money::from_cents(-4590));
        assert_eq!(row.kind, TransactionKind::Expense);
        assert_eq!(row.category, "transport");
    }

    #[test]
    fn statement_without_blocks_errors() {
        let empty = "<OFX><BANKTRANLIST><DTSTART>20240101</BANKTRANLIST></OFX>";
        let err = parse(empty.as_bytes(), "empty.ofx", &Categorizer::default()).unwrap_err();
        assert!(matches!(err, ImportError::NoTransactions));
    }

    #[test]
    fn rows_get_distinct_ids() {
        let rows = parse(SAMPLE_OFX.as_bytes(), "jan.ofx", &Categorizer::default()).unwrap();
        assert_ne!(rows[0].id, rows[1].id);
    }
}
