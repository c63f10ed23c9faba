//! Raw transaction and bus reset commands

use qblit_core::transaction::{ChipSelect, Transaction};

use super::{Engine, Session};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Parse a hex payload string (e.g. "00a5ff") into bytes
fn parse_hex_bytes(s: &str) -> Result<Vec<u8>, String> {
    let s: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    if s.len() % 2 != 0 {
        return Err("hex payload must have an even number of digits".to_string());
    }
    (0..s.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&s[i..i + 2], 16).map_err(|e| format!("Invalid hex byte: {}", e))
        })
        .collect()
}

/// Execute one opaque transaction and print the response
pub fn run_xfer(
    engine: &mut Engine,
    cs: ChipSelect,
    command: u8,
    send: Option<&str>,
    receive: usize,
    session: &mut Session,
) -> CmdResult {
    let send = match send {
        Some(hex) => parse_hex_bytes(hex)?,
        None => Vec::new(),
    };
    let mut receive_buf = vec![0u8; receive];

    let mut txn = Transaction::transfer(cs, command, &send, &mut receive_buf);
    engine.execute(&mut txn, session)?;

    if receive_buf.is_empty() {
        println!("OK ({} payload bytes sent)", send.len());
    } else {
        let hex: Vec<String> = receive_buf.iter().map(|b| format!("{:02x}", b)).collect();
        println!("{}", hex.join(" "));
    }
    Ok(())
}

/// Drive the bus to its idle posture
pub fn run_reset(engine: &mut Engine) -> CmdResult {
    engine.reset();
    println!("Bus idle");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_bytes() {
        assert_eq!(parse_hex_bytes("00a5ff").unwrap(), vec![0x00, 0xA5, 0xFF]);
        assert_eq!(parse_hex_bytes("00 a5 ff").unwrap(), vec![0x00, 0xA5, 0xFF]);
        assert_eq!(parse_hex_bytes("").unwrap(), Vec::<u8>::new());
        assert!(parse_hex_bytes("abc").is_err());
        assert!(parse_hex_bytes("zz").is_err());
    }
}
