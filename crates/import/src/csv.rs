use csv::ReaderBuilder;
use finflow_core::StagedTransaction;
use tracing::debug;

use crate::columns::{ColumnDetector, RowLookup};
use crate::error::ImportError;
use crate::rules::Categorizer;

const UTF8_BOM: char = '\u{feff}';
const CANDIDATE_DELIMITERS: [u8; 3] = [b';', b',', b'\t'];

/// Picks the most frequent candidate delimiter in the header line. Ties
/// resolve in candidate order, so a header with no separators reads as `;`.
pub fn sniff_delimiter(content: &str) -> u8 {
    let header = content.lines().next().unwrap_or_default();
    let mut best = CANDIDATE_DELIMITERS[0];
    let mut best_count = 0;
    for delimiter in CANDIDATE_DELIMITERS {
        let count = header.bytes().filter(|b| *b == delimiter).count();
        if count > best_count {
            best = delimiter;
            best_count = count;
        }
    }
    best
}

/// Parses delimited text with a header row. `delimiter` of `None` sniffs it.
pub fn parse(
    data: &[u8],
    delimiter: Option<u8>,
    source: &str,
    categorizer: &Categorizer,
) -> Result<Vec<StagedTransaction>, ImportError> {
    let decoded = String::from_utf8_lossy(data);
    let content = decoded.trim_start_matches(UTF8_BOM);
    let delimiter = delimiter.unwrap_or_else(|| sniff_delimiter(content));

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader.headers()?.clone();
    let detector = ColumnDetector::default();
    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for result in reader.records() {
        let record = result?;
        let lookup = RowLookup::new(headers.iter().zip(record.iter()));
        match detector.detect(&lookup) {
            Some(row) => rows.push(row.into_staged(categorizer, source, None)),
            None => skipped += 1,
        }
    }

    debug!(
        source,
        delimiter = %char::from(delimiter).escape_default(),
        rows = rows.len(),
        skipped,
        "parsed delimited statement"
    );

    if rows.is_empty() {
        return Err(ImportError::no_rows());
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use finflow_core::{Money, TransactionKind};

    fn run(data: &str) -> Result<Vec<StagedTransaction>, ImportError> {
        parse(data.as_bytes(), None, "extrato.csv", &Categorizer::default())
    }

    // ── delimiter sniffing ────────────────────────────────────────────────────

    #[test]
    fn sniff_prefers_most_frequent() {
        assert_eq!(sniff_delimiter("data;descricao;valor\n1,00;x;y"), b';');
        assert_eq!(sniff_delimiter("date,description,amount"), b',');
        assert_eq!(sniff_delimiter("date\tdescription\tamount"), b'\t');
    }

    #[test]
    fn sniff_defaults_to_semicolon() {
        assert_eq!(sniff_delimiter("date"), b';');
        assert_eq!(sniff_delimiter(""), b';');
    }

    // ── parsing ───────────────────────────────────────────────────────────────

    #[test]
    fn separate_debit_and_credit_columns() {
        let data = "Data;Descrição;Crédito;Débito\n05/03/2024;POSTO SHELL;;150,00\n06/03/2024;PIX RECEBIDO;200,00;\n";
        let rows = run(data).unwrap();
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].date, "2024-03-05");
        assert_eq!(rows[0].amount, Money::from_cents(-15000));
        assert_eq!(rows[0].kind, TransactionKind::Expense);
        assert_eq!(rows[0].category, "transport");

        assert_eq!(rows[1].amount, Money::from_cents(20000));
        assert_eq!(rows[1].kind, TransactionKind::Income);
        assert_eq!(rows[1].category, "other");
    }

    #[test]
    fn single_signed_amount_column() {
        let data = "date,description,amount\n2024-01-02,Netflix,-39.90\n2024-01-05,Salary,5000.00\n";
        let rows = run(data).unwrap();
        assert_eq!(rows[0].amount, Money::from_cents(-3990));
        assert_eq!(rows[0].category, "leisure");
        assert_eq!(rows[1].kind, TransactionKind::Income);
        assert!(rows.iter().all(|r| r.source == "extrato.csv"));
    }

    #[test]
    fn bom_and_mixed_case_headers() {
        let data = "\u{feff}DATE,Description,AMOUNT\n2024-01-02,Coffee,(4.50)\n";
        let rows = run(data).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].amount, Money::from_cents(-450));
    }

    #[test]
    fn rows_missing_fields_are_skipped() {
        let data = "data;descricao;valor\n01/02/2024;;-10,00\n;Sem data;-5,00\n01/02/2024;Mercado;0,00\n02/02/2024;Mercado;-50,00\n";
        let rows = run(data).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].description, "Mercado");
        assert_eq!(rows[0].date, "2024-02-02");
    }

    #[test]
    fn short_rows_are_tolerated() {
        let data = "date,description,amount,notes\n2024-01-02,Coffee,-4.50\n";
        assert_eq!(run(data).unwrap().len(), 1);
    }

    #[test]
    fn explicit_tab_delimiter() {
        let data = "date\tdescription\tamount\n2024-01-02\tCoffee, large\t-4.50\n";
        let rows = parse(data.as_bytes(), Some(b'\t'), "x.tsv", &Categorizer::default()).unwrap();
        assert_eq!(rows[0].description, "Coffee, large");
    }

    #[test]
    fn unrecognized_columns_error_with_hint() {
        let err = run("foo,bar\n1,2\n").unwrap_err();
        match err {
            ImportError::NoRows { hint } => assert!(hint.contains("date")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn header_only_file_errors() {
        assert!(matches!(
            run("date,description,amount\n"),
            Err(ImportError::NoRows { .. })
        ));
    }
}
