pub mod common_options;
pub mod logging;

use std::num::ParseIntError;

pub fn parse_u32(input: &str) -> Result<u32, ParseIntError> {
    parse_int::parse(input)
}

pub fn parse_u64(input: &str) -> Result<u64, ParseIntError> {
    parse_int::parse(input)
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    use super::*;

    #[test_case("8", 8; "decimal")]
    #[test_case("0x2000", 0x2000; "hex")]
    #[test_case("0b101", 5; "binary")]
    #[test_case("0o17", 15; "octal")]
    fn parses_addresses(input: &str, expected: u32) {
        assert_eq!(parse_u32(input).unwrap(), expected);
    }

    #[test]
    fn rejects_out_of_range() {
        assert!(parse_u32("0x100000000").is_err());
        assert_eq!(parse_u64("0x43C00000").unwrap(), 0x43C0_0000);
    }
}
