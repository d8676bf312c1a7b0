use std::io::{self, Write};

use adx402::{PaymentReceipt, Role};
use serde_json::json;

/// One finished flow, ready to print.
#[derive(Debug, Default)]
pub struct Outcome<'a> {
    pub action: &'a str,
    pub message: &'a str,
    /// Resource id the server assigned (publisher id, slot id, image URL).
    pub id: Option<&'a str>,
    pub settlement: Option<&'a str>,
    pub explorer_url: Option<&'a str>,
}

/// Write an outcome as one JSON object or one TSV line:
/// action \t message \t id \t settlement \t explorer_url
pub fn write_outcome<W: Write>(writer: &mut W, outcome: &Outcome<'_>, json_mode: bool) -> io::Result<()> {
    if json_mode {
        let value = json!({
            "action": outcome.action,
            "message": outcome.message,
            "id": outcome.id,
            "settlement": outcome.settlement,
            "explorerUrl": outcome.explorer_url,
        });
        writeln!(writer, "{value}")?;
    } else {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}",
            outcome.action,
            outcome.message,
            outcome.id.unwrap_or("-"),
            outcome.settlement.unwrap_or("-"),
            outcome.explorer_url.unwrap_or("-"),
        )?;
    }
    writer.flush()
}

pub fn write_verified<W: Write>(
    writer: &mut W,
    wallet: &str,
    role: Option<Role>,
    json_mode: bool,
) -> io::Result<()> {
    let role = role.map(|r| r.to_string());
    if json_mode {
        writeln!(writer, "{}", json!({ "wallet": wallet, "verified": true, "role": role }))?;
    } else {
        writeln!(writer, "verified\t{wallet}\t{}", role.as_deref().unwrap_or("-"))?;
    }
    writer.flush()
}

pub fn write_receipt<W: Write>(
    writer: &mut W,
    receipt: &PaymentReceipt,
    explorer_url: &str,
    json_mode: bool,
) -> io::Result<()> {
    if json_mode {
        let mut value = serde_json::to_value(receipt)?;
        value["explorerUrl"] = json!(explorer_url);
        writeln!(writer, "{value}")?;
    } else {
        writeln!(
            writer,
            "{}\t{}\t{explorer_url}",
            receipt.transaction,
            receipt.network().unwrap_or("-"),
        )?;
    }
    writer.flush()
}
