use anyhow::{Result, bail};
use console::style;
use std::time::Duration;

use crate::core::config::GatewayConfig;
use crate::core::scan::ScanEngine;
use crate::core::scan::resolver::{KNOWN_TOOLS, NMAP_SCAN_TYPES};
use crate::core::scan::types::{ScanRequest, ScanStatus};
use crate::core::terminal::{GuideSection, print_success, print_warn};

const POLL_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ScanCommandArgs {
    pub tool: String,
    pub target: String,
    pub scan_type: Option<String>,
}

/// `scan <tool> <target> [--scan-type T]`, flags accepted anywhere after `start`.
pub(crate) fn parse_scan_command_args(args: &[String], start: usize) -> Option<ScanCommandArgs> {
    let mut positional = Vec::new();
    let mut scan_type = None;
    let mut i = start;
    while i < args.len() {
        match args[i].as_str() {
            "--scan-type" | "-t" => {
                if i + 1 < args.len() {
                    scan_type = Some(args[i + 1].clone());
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--verbose" => i += 1,
            other => {
                positional.push(other.to_string());
                i += 1;
            }
        }
    }
    let mut positional = positional.into_iter();
    Some(ScanCommandArgs {
        tool: positional.next()?,
        target: positional.next()?,
        scan_type,
    })
}

/// Runs one scan in-process, echoing output as it arrives.
pub async fn run_scan(config: &GatewayConfig, parsed: ScanCommandArgs) -> Result<()> {
    let engine = ScanEngine::new(config);
    let command = match &parsed.scan_type {
        Some(t) => format!("{} {} --scan-type {}", parsed.tool, parsed.target, t),
        None => format!("{} {}", parsed.tool, parsed.target),
    };
    let accepted = engine
        .submit(ScanRequest {
            tool: parsed.tool,
            target: parsed.target,
            command,
            scan_type: parsed.scan_type,
        })
        .await;

    let mut shown = String::new();
    let record = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                print_warn("Interrupted, terminating scan...");
                engine.shutdown().await;
            }
            _ = tokio::time::sleep(POLL_INTERVAL) => {}
        }
        let Some(record) = engine.get(&accepted.scan_id).await else {
            bail!("Scan {} disappeared", accepted.scan_id);
        };
        // File-output scans replace their placeholder wholesale.
        match record.output.strip_prefix(shown.as_str()) {
            Some(fresh) => print!("{}", fresh),
            None => print!("\n{}", record.output),
        }
        shown.clone_from(&record.output);
        if record.status.is_terminal() {
            break record;
        }
    };

    println!();
    match record.status {
        ScanStatus::Completed => {
            print_success(&format!("Scan {} completed", record.scan_id));
            Ok(())
        }
        _ => bail!(
            "Scan {} failed ({})",
            record.scan_id,
            style(record.command_line()).dim()
        ),
    }
}

pub fn print_tools() {
    let mut tools = GuideSection::new("Tools");
    for (name, description) in KNOWN_TOOLS {
        tools = tools.command(name, description);
    }
    tools
        .blank()
        .info("Any other tool name runs a labelled simulation.")
        .print();

    let mut nmap = GuideSection::new("nmap scan types");
    for scan_type in NMAP_SCAN_TYPES {
        nmap = nmap.text(scan_type);
    }
    nmap.blank()
        .hint("reconlab scan nmap 10.0.0.5 --scan-type stealth", "")
        .print();
    println!();
}
