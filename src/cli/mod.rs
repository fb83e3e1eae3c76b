mod daemon;
mod scan;
mod serve;

use anyhow::Result;
use console::style;

use crate::core::config::GatewayConfig;
use crate::core::terminal::{self, GuideSection, print_error};
use crate::platform::{NativePlatform, Platform};

fn print_help() {
    terminal::print_banner();

    GuideSection::new("Gateway")
        .command("serve", "Run the API gateway in the foreground")
        .command("gateway", "Manage the background daemon (start, stop, status)")
        .command("logs", "Follow real-time daemon logs")
        .print();

    GuideSection::new("Scanning")
        .command("scan", "Run one scan in-process: scan <tool> <target> [--scan-type T]")
        .command("tools", "List supported tools and nmap scan types")
        .print();

    GuideSection::new("Options")
        .text("--api-host <host>   Bind address (default from reconlab.toml, else 127.0.0.1)")
        .text("--api-port <port>   Bind port (default from reconlab.toml, else 8000)")
        .text("--verbose           Log at debug level")
        .print();

    println!(
        "\n {} {} <command> [options]\n",
        style("Usage:").bold(),
        style("reconlab").green()
    );
}

/// Scans `--api-host`/`--api-port` from `start` on. A malformed port keeps the
/// current value.
pub(crate) fn parse_api_server_flags(
    args: &[String],
    start: usize,
    mut api_host: String,
    mut api_port: u16,
) -> (String, u16) {
    let mut i = start;
    while i < args.len() {
        match args[i].as_str() {
            "--api-port" => {
                if i + 1 < args.len() {
                    api_port = args[i + 1].parse().unwrap_or(api_port);
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--api-host" => {
                if i + 1 < args.len() {
                    api_host = args[i + 1].clone();
                    i += 2;
                } else {
                    i += 1;
                }
            }
            _ => i += 1,
        }
    }
    (api_host, api_port)
}

pub(crate) fn has_flag(args: &[String], start: usize, flag: &str) -> bool {
    args.iter().skip(start).any(|a| a == flag)
}

pub async fn run_main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let data_dir = NativePlatform::data_dir();
    let run_dir = data_dir.join("run");
    let pid_file = run_dir.join(daemon::PID_FILE);

    let Some(cmd) = args.get(1).map(String::as_str) else {
        print_help();
        return Ok(());
    };
    let verbose = has_flag(&args, 2, "--verbose");

    match cmd {
        "serve" => {
            let log_tx = crate::logging::init(verbose, false);
            let mut config = GatewayConfig::load(&data_dir).await?;
            (config.api_host, config.api_port) =
                parse_api_server_flags(&args, 2, config.api_host, config.api_port);
            serve::run_gateway(&data_dir, config, log_tx).await
        }
        "gateway" => {
            let config = GatewayConfig::load(&data_dir).await?;
            let sub_cmd = args.get(2).map(String::as_str).unwrap_or("");
            match sub_cmd {
                "start" => {
                    let (api_host, api_port) =
                        parse_api_server_flags(&args, 3, config.api_host, config.api_port);
                    daemon::gateway_start(&run_dir, &pid_file, &api_host, api_port, verbose).await
                }
                "stop" => daemon::gateway_stop(&pid_file).await,
                "status" => {
                    daemon::gateway_status(&pid_file, &config.api_host, config.api_port).await
                }
                _ => {
                    print_error("Unknown or missing gateway command. Expected: start, stop, status");
                    print_help();
                    Ok(())
                }
            }
        }
        "logs" => daemon::follow_logs(&run_dir, &pid_file).await,
        "scan" => {
            let Some(parsed) = scan::parse_scan_command_args(&args, 2) else {
                print_error("Usage: reconlab scan <tool> <target> [--scan-type T]");
                return Ok(());
            };
            if verbose {
                crate::logging::init(true, false);
            }
            let config = GatewayConfig::load(&data_dir).await?;
            scan::run_scan(&config, parsed).await
        }
        "tools" => {
            scan::print_tools();
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        _ => {
            print_error(&format!("Unknown command: {}", cmd));
            print_help();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{has_flag, parse_api_server_flags};

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_api_server_flags_reads_host_and_port() {
        let args = args(&[
            "reconlab",
            "serve",
            "--api-host",
            "0.0.0.0",
            "--api-port",
            "19000",
        ]);
        let (host, port) = parse_api_server_flags(&args, 2, "127.0.0.1".to_string(), 8000);
        assert_eq!(host, "0.0.0.0");
        assert_eq!(port, 19000);
    }

    #[test]
    fn parse_api_server_flags_keeps_defaults_on_bad_input() {
        let args = args(&["reconlab", "serve", "--api-port", "http", "--api-host"]);
        let (host, port) = parse_api_server_flags(&args, 2, "127.0.0.1".to_string(), 8000);
        assert_eq!(host, "127.0.0.1");
        assert_eq!(port, 8000);
    }

    #[test]
    fn verbose_flag_is_found_after_the_command() {
        let args = args(&["reconlab", "serve", "--verbose"]);
        assert!(has_flag(&args, 2, "--verbose"));
        assert!(!has_flag(&args, 3, "--verbose"));
    }
}
