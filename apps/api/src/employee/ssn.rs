/// Message recorded against the field when validation fails.
pub const INVALID_SSN: &str = "Invalid social security number.";

/// Max stored length of a formatted SSN (`XXX-XX-XXXX`).
pub const SSN_MAX_LEN: usize = 11;

/// Validates a US Social Security Number in `AAA-GG-SSSS` form.
///
/// Rejects area numbers 000, 666 and 900-999, group 00 and serial 0000.
/// Input must already be formatted: no whitespace trimming, no dash insertion.
pub fn validate_social_security_number(ssn: Option<&str>) -> bool {
    let Some(ssn) = ssn else {
        return false;
    };

    let bytes = ssn.as_bytes();
    if !ssn.is_ascii() || bytes.len() != SSN_MAX_LEN || bytes[3] != b'-' || bytes[6] != b'-' {
        return false;
    }

    let area = &ssn[0..3];
    let group = &ssn[4..6];
    let serial = &ssn[7..11];
    if ![area, group, serial]
        .iter()
        .all(|part| part.bytes().all(|b| b.is_ascii_digit()))
    {
        return false;
    }

    if area == "000" || area == "666" || area.starts_with('9') {
        return false;
    }
    group != "00" && serial != "0000"
}
