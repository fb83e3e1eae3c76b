use crate::core::config::DirsearchConfig;

use super::types::ExecutionPlan;

/// Tools with a real execution path, with a one-line description for help output.
pub const KNOWN_TOOLS: &[(&str, &str)] = &[
    ("subfinder", "Passive subdomain enumeration"),
    ("cmseek", "CMS detection and enumeration"),
    ("wafw00f", "Web application firewall fingerprinting"),
    ("nmap", "Port scanning (see scan types)"),
    ("arjun", "HTTP parameter discovery"),
    ("dirsearch", "Content discovery, results written to file"),
];

pub const NMAP_SCAN_TYPES: &[&str] = &[
    "top-ports",
    "service-version",
    "aggressive",
    "stealth",
    "vuln",
    "http-enum",
    "brute-force",
    "full-port",
];

/// Static (tool, scan type) -> argv table. Resolution never touches the
/// filesystem or spawns anything.
#[derive(Debug, Clone)]
pub struct ToolResolver {
    dirsearch: DirsearchConfig,
}

impl ToolResolver {
    pub fn new(dirsearch: DirsearchConfig) -> Self {
        Self { dirsearch }
    }

    pub fn resolve(
        &self,
        scan_id: &str,
        tool: &str,
        target: &str,
        scan_type: Option<&str>,
    ) -> ExecutionPlan {
        let streamed = |args: &[&str]| ExecutionPlan::Streamed {
            argv: args
                .iter()
                .map(|a| a.to_string())
                .chain(std::iter::once(target.to_string()))
                .collect(),
            announce: true,
        };

        match tool {
            "subfinder" => ExecutionPlan::Streamed {
                argv: vec![
                    "subfinder".to_string(),
                    "-d".to_string(),
                    target.to_string(),
                    "--silent".to_string(),
                ],
                announce: false,
            },
            "cmseek" => streamed(&["cmseek", "-u"]),
            "wafw00f" => streamed(&["wafw00f"]),
            "arjun" => streamed(&["arjun", "-u"]),
            "nmap" => streamed(nmap_args(scan_type)),
            "dirsearch" => {
                let output_file = self.dirsearch.output_dir().join(format!("{}.txt", scan_id));
                ExecutionPlan::FileOutput {
                    argv: vec![
                        "python3".to_string(),
                        "dirsearch.py".to_string(),
                        "-u".to_string(),
                        target.to_string(),
                        "-w".to_string(),
                        self.dirsearch.wordlist.display().to_string(),
                        "-o".to_string(),
                        output_file.display().to_string(),
                    ],
                    working_dir: self.dirsearch.install_dir.clone(),
                    output_file,
                }
            }
            _ => ExecutionPlan::Simulated {
                tool: tool.to_string(),
                target: target.to_string(),
            },
        }
    }
}

/// Unknown or missing scan types fall back to a plain SYN scan.
fn nmap_args(scan_type: Option<&str>) -> &'static [&'static str] {
    match scan_type.unwrap_or("default") {
        "top-ports" => &["nmap", "-T4", "--top-ports", "1000", "-v"],
        "service-version" => &["nmap", "-sV"],
        "aggressive" => &["nmap", "-A"],
        "stealth" => &["nmap", "-sS", "-Pn", "-T4"],
        "vuln" => &["nmap", "--script", "vuln"],
        "http-enum" => &["nmap", "-p", "80,443", "--script", "http-enum"],
        "brute-force" => &["nmap", "-p", "22", "--script", "ssh-brute"],
        "full-port" => &["nmap", "-p-", "-T4"],
        _ => &["nmap", "-sS"],
    }
}
