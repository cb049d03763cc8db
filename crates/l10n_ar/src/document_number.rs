//! Document-number parsing with fallback to legacy Argentine formats.

use std::sync::LazyLock;

use regex::Regex;

use arledger_accounting::{document, DocumentNumberParts};
use arledger_core::{DomainError, DomainResult};

use crate::config::ArConfig;

static ANY_DIGIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d").expect("static regex"));
static NON_DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^0-9]").expect("static regex"));

/// Length of an unseparated `PPPPNNNNNNNN` number.
const COMPACT_NUMBER_LEN: usize = 12;

fn parse_error(document_type_code: &str, document_number: &str) -> DomainError {
    DomainError::validation(format!(
        "No pudimos obtener el número de factura y de punto de venta para {document_type_code} \
         {document_number}. Verifique que tiene un número cargado similar a \"00001-00000001\""
    ))
}

/// Base parser first; on failure, the legacy formats.
pub fn parse_document_number(
    document_number: &str,
    document_type_code: &str,
    config: &ArConfig,
) -> DomainResult<DocumentNumberParts> {
    match document::parse_document_number(document_number, document_type_code) {
        Ok(parts) => return Ok(parts),
        Err(e) => tracing::info!(
            error = %e,
            document_type_code,
            document_number,
            "base document number parsing failed, trying legacy formats"
        ),
    }
    parse_legacy(document_number, document_type_code, config)
}

/// Legacy formats:
/// - number-only document types: point of sale `0`, the whole string is the
///   number (only if it has a digit);
/// - `...-POS-NUMBER`: the last two hyphen-separated segments;
/// - 12 characters without hyphen: `PPPP` + `NNNNNNNN`.
///
/// Non-digits are stripped from both parts before conversion.
pub fn parse_legacy(
    document_number: &str,
    document_type_code: &str,
    config: &ArConfig,
) -> DomainResult<DocumentNumberParts> {
    let (point_of_sale, invoice_number): (Option<String>, Option<String>) =
        if config.is_number_only_code(document_type_code) {
            let number = ANY_DIGIT
                .is_match(document_number)
                .then(|| document_number.to_string());
            (Some("0".to_string()), number)
        } else if document_number.contains('-') {
            let mut segments = document_number.rsplit('-');
            let number = segments.next().map(str::to_string);
            let pos = segments.next().map(str::to_string);
            (pos, number)
        } else if document_number.chars().count() == COMPACT_NUMBER_LEN {
            let pos: String = document_number.chars().take(4).collect();
            let number: String = document_number.chars().skip(COMPACT_NUMBER_LEN - 8).collect();
            (Some(pos), Some(number))
        } else {
            (None, None)
        };

    let digits = |part: Option<String>| {
        part.map(|p| NON_DIGITS.replace_all(&p, "").into_owned())
            .filter(|p| !p.is_empty())
    };

    match (digits(point_of_sale), digits(invoice_number)) {
        (Some(pos), Some(number)) => {
            let to_int = |s: &str| {
                s.parse::<u64>()
                    .map_err(|_| parse_error(document_type_code, document_number))
            };
            Ok(DocumentNumberParts::new(to_int(&pos)?, to_int(&number)?))
        }
        _ => Err(parse_error(document_type_code, document_number)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn parse(number: &str, code: &str) -> DomainResult<DocumentNumberParts> {
        parse_document_number(number, code, &ArConfig::default())
    }

    #[test]
    fn hyphenated_number_uses_base_parser() {
        assert_eq!(parse("0001-00000123", "1").unwrap(), DocumentNumberParts::new(1, 123));
    }

    #[test]
    fn compact_twelve_characters() {
        assert_eq!(parse("000100000123", "1").unwrap(), DocumentNumberParts::new(1, 123));
    }

    #[test]
    fn no_digits_no_hyphen_fails_with_spanish_message() {
        let err = parse("ABC", "1").unwrap_err();
        match err {
            DomainError::Validation(msg) => {
                assert!(msg.starts_with("No pudimos obtener el número de factura"));
                assert!(msg.contains("1 ABC"));
                assert!(msg.contains("00001-00000001"));
            }
            other => panic!("Expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn legacy_hyphen_takes_last_two_segments_and_strips_noise() {
        assert_eq!(parse("A-0003-0000045", "6").unwrap(), DocumentNumberParts::new(3, 45));
        assert_eq!(parse("FA 0003-N 45", "6").unwrap(), DocumentNumberParts::new(3, 45));
    }

    #[test]
    fn legacy_hyphen_with_empty_point_of_sale_fails() {
        assert!(parse("-123", "6").is_err());
        assert!(parse("X-123", "6").is_err());
    }

    #[test]
    fn number_only_codes_use_zero_point_of_sale() {
        assert_eq!(parse("Liq 4521", "33").unwrap(), DocumentNumberParts::new(0, 4521));
        assert_eq!(parse("99887766", "331").unwrap(), DocumentNumberParts::new(0, 99887766));
        assert!(parse("sin numero", "99").is_err());
    }

    #[test]
    fn number_only_code_with_base_format_keeps_base_result() {
        assert_eq!(parse("0002-00000010", "33").unwrap(), DocumentNumberParts::new(2, 10));
    }

    #[test]
    fn import_shipments_stay_on_base_parser() {
        assert_eq!(parse("anything", "66").unwrap(), DocumentNumberParts::new(0, 0));
    }

    #[test]
    fn compact_with_letters_strips_them() {
        assert_eq!(parse("A001B0000012", "1").unwrap(), DocumentNumberParts::new(1, 12));
    }

    #[test]
    fn oversized_digit_runs_are_rejected() {
        let huge = "9".repeat(30);
        assert!(parse(&huge, "33").is_err());
    }

    proptest! {
        #[test]
        fn compact_numbers_split_four_and_eight(pos in 0u64..10_000, number in 0u64..100_000_000) {
            let raw = format!("{pos:04}{number:08}");
            prop_assert_eq!(parse(&raw, "1").unwrap(), DocumentNumberParts::new(pos, number));
        }

        #[test]
        fn formatted_parts_parse_back(pos in 0u64..100_000, number in 0u64..100_000_000) {
            let parts = DocumentNumberParts::new(pos, number);
            prop_assert_eq!(parse(&parts.to_string(), "11").unwrap(), parts);
        }
    }
}
