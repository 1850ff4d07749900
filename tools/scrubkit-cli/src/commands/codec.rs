//! Compact time token conversion.

use scrubkit_model::{decode as decode_token, encode_secs, format_clock};

pub fn encode(seconds: f64) -> anyhow::Result<()> {
    println!("{}", encode_secs(seconds));
    Ok(())
}

pub fn decode(token: &str) -> anyhow::Result<()> {
    let secs = decode_token(token)?;
    println!("{secs}  ({})", format_clock(secs as f64));
    Ok(())
}
