/// Checks an order number against the Luhn mod-10 checksum.
///
/// Starting from the rightmost digit, every second digit is doubled (subtracting
/// 9 when the result exceeds 9) and all digits are summed; the number is valid
/// iff the sum is divisible by 10. Empty input and input containing anything
/// other than ASCII digits is reported as invalid.
pub fn is_valid(number: &str) -> bool {
    if number.is_empty() {
        return false;
    }

    let mut sum = 0u32;
    for (position, byte) in number.bytes().rev().enumerate() {
        if !byte.is_ascii_digit() {
            return false;
        }
        let mut digit = u32::from(byte - b'0');
        if position % 2 == 1 {
            digit *= 2;
            if digit > 9 {
                digit -= 9;
            }
        }
        // Only the residue matters; keeping it reduced makes any length safe.
        sum = (sum + digit) % 10;
    }

    sum % 10 == 0
}
