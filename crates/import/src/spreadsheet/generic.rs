use finflow_core::StagedTransaction;

use super::{is_blank_row, joined_lowercase, Matrix};
use crate::columns::{ColumnDetector, RowLookup};
use crate::rules::Categorizer;

const HEADER_SCAN_ROWS: usize = 10;
const DATE_TOKENS: &[&str] = &["data", "date"];
const VALUE_TOKENS: &[&str] = &[
    "valor", "amount", "value", "descri", "histor", "credit", "debit", "crédito", "débito",
];

/// First of the leading rows that mentions a date and a value-like column;
/// row 0 when none does.
pub fn find_header_row(matrix: &Matrix) -> usize {
    matrix
        .iter()
        .take(HEADER_SCAN_ROWS)
        .position(|row| {
            let text = joined_lowercase(row);
            DATE_TOKENS.iter().any(|t| text.contains(t))
                && VALUE_TOKENS.iter().any(|t| text.contains(t))
        })
        .unwrap_or(0)
}

pub fn extract(matrix: &Matrix, source: &str, categorizer: &Categorizer) -> Vec<StagedTransaction> {
    let header_index = find_header_row(matrix);
    let Some(headers) = matrix.get(header_index) else {
        return Vec::new();
    };
    let detector = ColumnDetector::default();

    matrix
        .iter()
        .skip(header_index + 1)
        .filter(|row| !is_blank_row(row))
        .filter_map(|row| detector.detect(&RowLookup::new(headers.iter().zip(row.iter()))))
        .map(|row| row.into_staged(categorizer, source, None))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::sheet;
    use finflow_core::{Money, TransactionKind};

    #[test]
    fn header_row_found_below_preamble() {
        let m = sheet(&[
            &["Banco Exemplo"],
            &["Agência 0001"],
            &["Data", "Histórico", "Valor"],
            &["15/01/2024", "UBER", "-45,90"],
        ]);
        assert_eq!(find_header_row(&m), 2);
    }

    #[test]
    fn header_defaults_to_first_row() {
        let m = sheet(&[&["a", "b"], &["c", "d"]]);
        assert_eq!(find_header_row(&m), 0);
    }

    #[test]
    fn extracts_rows_after_header() {
        let m = sheet(&[
            &["Extrato"],
            &["Data", "Histórico", "Valor"],
            &["15/01/2024", "UBER", "-45,90"],
            &["", "", ""],
            &["2024-01-20", "Salário", "5000"],
            &["Saldo", "", "1000"],
        ]);
        let rows = extract(&m, "bank.xlsx", &Categorizer::default());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, "2024-01-15");
        assert_eq!(rows[0].amount, Money::from_cents(-4590));
        assert_eq!(rows[0].category, "transport");
        assert_eq!(rows[1].kind, TransactionKind::Income);
        assert_eq!(rows[1].amount, Money::from_cents(500000));
    }

    #[test]
    fn short_rows_only_see_their_cells() {
        let m = sheet(&[
            &["date", "description", "debit", "credit"],
            &["2024-02-01", "Market", "50"],
        ]);
        let rows = extract(&m, "s.xlsx", &Categorizer::default());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].amount, Money::from_cents(-5000));
    }
}
