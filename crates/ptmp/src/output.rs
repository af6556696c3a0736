use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use ptmp_frame::{escape_nul, IpcData};
use ptmp_session::{IpcCallResponseInfo, NegotiationInfo};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct ValueOutput {
    #[serde(rename = "type")]
    type_name: &'static str,
    type_id: u32,
    value: String,
}

impl From<&IpcData> for ValueOutput {
    fn from(value: &IpcData) -> Self {
        let tag = value.type_tag();
        Self {
            type_name: tag.name(),
            type_id: tag.code(),
            value: value.to_string(),
        }
    }
}

#[derive(Serialize)]
struct CallOutput<'a> {
    call_id: u32,
    call_name: &'a str,
    server_app_id: &'a str,
    returns: Vec<ValueOutput>,
}

pub fn print_call_response(
    call_name: &str,
    server: &NegotiationInfo,
    response: &IpcCallResponseInfo,
    format: OutputFormat,
) {
    let returns: Vec<ValueOutput> = response.rets.iter().map(ValueOutput::from).collect();
    match format {
        OutputFormat::Json => {
            let out = CallOutput {
                call_id: response.call_id,
                call_name,
                server_app_id: &server.app_id,
                returns,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "TYPE", "VALUE"]);
            for (index, ret) in returns.iter().enumerate() {
                table.add_row(vec![
                    index.to_string(),
                    format!("{} ({})", ret.type_name, ret.type_id),
                    ret.value.clone(),
                ]);
            }
            println!("{call_name} (call {})", response.call_id);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "call={} id={} returns={}",
                call_name,
                response.call_id,
                returns.len()
            );
            for ret in &returns {
                println!("  {}: {}", ret.type_name, ret.value);
            }
        }
        OutputFormat::Raw => {
            for ret in &returns {
                println!("{}", ret.value);
            }
        }
    }
}

pub fn print_negotiation(info: &NegotiationInfo, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(info).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"])
                .add_row(vec!["identifier".to_string(), info.identifier.clone()])
                .add_row(vec!["version".to_string(), info.version.to_string()])
                .add_row(vec!["app_id".to_string(), info.app_id.clone()])
                .add_row(vec!["encoding".to_string(), info.encoding.to_string()])
                .add_row(vec!["encryption".to_string(), info.encryption.to_string()])
                .add_row(vec!["compression".to_string(), info.compression.to_string()])
                .add_row(vec![
                    "authentication".to_string(),
                    info.authentication.to_string(),
                ])
                .add_row(vec!["timestamp".to_string(), info.timestamp.clone()])
                .add_row(vec![
                    "keep_alive_period".to_string(),
                    info.keep_alive_period.to_string(),
                ])
                .add_row(vec!["reserved".to_string(), info.reserved.clone()]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("Negotiation:");
            println!("  Protocol:        {} v{}", info.identifier, info.version);
            println!("  App ID:          {}", info.app_id);
            println!(
                "  Encoding:        {} (encryption {}, compression {})",
                info.encoding, info.encryption, info.compression
            );
            println!("  Authentication:  {}", info.authentication);
            println!("  Timestamp:       {}", info.timestamp);
            println!("  Keep-alive:      {}s", info.keep_alive_period);
            println!("  Reserved:        {}", info.reserved);
        }
        OutputFormat::Raw => {
            println!("{}", info.app_id);
        }
    }
}

#[derive(Serialize)]
struct EncodedOutput<'a> {
    call_id: u32,
    call_name: &'a str,
    wire_len: usize,
    wire: String,
}

pub fn print_encoded(call_id: u32, call_name: &str, wire: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = EncodedOutput {
                call_id,
                call_name,
                wire_len: wire.len(),
                wire: escape_nul(wire),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["CALL", "ID", "BYTES", "WIRE"])
                .add_row(vec![
                    call_name.to_string(),
                    call_id.to_string(),
                    wire.len().to_string(),
                    escape_nul(wire),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("{}", escape_nul(wire));
        }
        OutputFormat::Raw => {
            print_raw(wire);
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}
