use crate::{error::AppError, models::Candidate};
use std::net::Ipv4Addr;

/// Parse an `a.b.c.d` or `a.b.c.d:port` token into a candidate.
///
/// Each octet must be all digits and at most 255, and a port, when present,
/// must be all digits in 1..=65535. A bad port rejects the whole token.
pub fn parse_candidate(token: &str) -> Result<Candidate, AppError> {
    let (address_part, port_part) = match token.split_once(':') {
        Some((address, port)) => (address, Some(port)),
        None => (token, None),
    };

    let address = parse_address(address_part)
        .ok_or_else(|| AppError::InvalidFormat(token.to_string()))?;

    let port = match port_part {
        Some(raw) => {
            Some(parse_port(raw).ok_or_else(|| AppError::InvalidFormat(token.to_string()))?)
        }
        None => None,
    };

    Ok(Candidate::new(address, port))
}

fn parse_address(raw: &str) -> Option<Ipv4Addr> {
    let mut octets = [0u8; 4];
    let mut groups = raw.split('.');

    for octet in octets.iter_mut() {
        *octet = parse_octet(groups.next()?)?;
    }

    // Exactly four groups
    if groups.next().is_some() {
        return None;
    }

    Some(Ipv4Addr::from(octets))
}

fn parse_octet(raw: &str) -> Option<u8> {
    if !is_all_digits(raw) {
        return None;
    }
    // u8 parsing caps the value at 255; leading zeros are accepted
    raw.parse::<u8>().ok()
}

fn parse_port(raw: &str) -> Option<u16> {
    if !is_all_digits(raw) {
        return None;
    }
    match raw.parse::<u16>() {
        Ok(0) | Err(_) => None,
        Ok(port) => Some(port),
    }
}

fn is_all_digits(raw: &str) -> bool {
    !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_address() {
        let candidate = parse_candidate("1.2.3.4").unwrap();
        assert_eq!(candidate.address, Ipv4Addr::new(1, 2, 3, 4));
        assert_eq!(candidate.port, None);
    }

    #[test]
    fn parses_address_with_port() {
        let candidate = parse_candidate("5.6.7.8:9000").unwrap();
        assert_eq!(candidate.address, Ipv4Addr::new(5, 6, 7, 8));
        assert_eq!(candidate.port, Some(9000));
    }

    #[test]
    fn accepts_bounds() {
        assert_eq!(
            parse_candidate("0.0.0.0:1").unwrap(),
            Candidate::new(Ipv4Addr::new(0, 0, 0, 0), Some(1))
        );
        assert_eq!(
            parse_candidate("255.255.255.255:65535").unwrap(),
            Candidate::new(Ipv4Addr::new(255, 255, 255, 255), Some(65535))
        );
    }

    #[test]
    fn leading_zeros_canonicalise() {
        assert_eq!(
            parse_candidate("010.001.000.9").unwrap(),
            parse_candidate("10.1.0.9").unwrap()
        );
    }

    #[test]
    fn rejects_out_of_range_values() {
        for token in [
            "999.1.1.1",
            "1.2.3.256",
            "1.2.3.4:70000",
            "1.2.3.4:65536",
            "1.2.3.4:0",
        ] {
            assert!(
                matches!(parse_candidate(token), Err(AppError::InvalidFormat(_))),
                "{} should be rejected",
                token
            );
        }
    }

    #[test]
    fn rejects_malformed_tokens() {
        for token in [
            "",
            "1.2.3",
            "1.2.3.4.5",
            "1..3.4",
            "a.b.c.d",
            "1.2.3.4:",
            "1.2.3.4:80a",
            "1.2.3.4:80:81",
            "+1.2.3.4",
            "1.2.3.-4",
        ] {
            assert!(
                parse_candidate(token).is_err(),
                "{:?} should be rejected",
                token
            );
        }
    }
}
