use console::{Emoji, style};

pub static SUCCESS_ICON: Emoji<'_, '_> = Emoji("✅ ", "");
pub static INFO_ICON: Emoji<'_, '_> = Emoji("ℹ️  ", "");
pub static WARN_ICON: Emoji<'_, '_> = Emoji("⚠️  ", "");
pub static ERROR_ICON: Emoji<'_, '_> = Emoji("❌ ", "");
pub static GEAR: Emoji<'_, '_> = Emoji("⚙️  ", "");
pub static SPARKLE: Emoji<'_, '_> = Emoji("✨ ", "");
pub static ARROW: Emoji<'_, '_> = Emoji("➜ ", "> ");

pub fn print_success(msg: &str) {
    println!("{} {}", SUCCESS_ICON, style(msg).green());
}

pub fn print_info(msg: &str) {
    println!("{} {}", INFO_ICON, style(msg).blue());
}

pub fn print_warn(msg: &str) {
    println!("{} {}", WARN_ICON, style(msg).yellow());
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", ERROR_ICON, style(msg).red().bold());
}

pub fn print_banner() {
    let lines: &[&str] = &[
        "                                         ",
        " _ __ ___  ___ ___  _ __ | | __ _| |__   ",
        "| '__/ _ \\/ __/ _ \\| '_ \\| |/ _` | '_ \\  ",
        "| | |  __/ (_| (_) | | | | | (_| | |_) | ",
        "|_|  \\___|\\___\\___/|_| |_|_|\\__,_|_.__/  ",
    ];

    // Gradient: #f87171 -> #fb923c -> #facc15 (diagonal top-left -> bottom-right)
    let stops: [(u8, u8, u8); 3] = [(248, 113, 113), (251, 146, 60), (250, 204, 21)];
    let max_w = 41u32;
    let max_d = max_w + 4 * 10;

    println!();
    for (y, line) in lines.iter().enumerate() {
        for (x, ch) in line.chars().enumerate() {
            if ch == ' ' {
                print!(" ");
                continue;
            }
            let d = ((x as u32 + y as u32 * 10) * 1000 / max_d).min(1000);
            let (r, g, b) = if d <= 500 {
                lerp_color(stops[0], stops[1], d * 2)
            } else {
                lerp_color(stops[1], stops[2], (d - 500) * 2)
            };
            print!("\x1b[38;2;{};{};{}m{}", r, g, b, ch);
        }
        println!();
    }
    print!("\x1b[0m");

    println!("\x1b[38;2;250;204;21mSecurity tooling behind one API.\x1b[0m\n");
}

fn lerp_color(a: (u8, u8, u8), b: (u8, u8, u8), t: u32) -> (u8, u8, u8) {
    let r = (a.0 as u32 * (1000 - t) + b.0 as u32 * t) / 1000;
    let g = (a.1 as u32 * (1000 - t) + b.1 as u32 * t) / 1000;
    let b_val = (a.2 as u32 * (1000 - t) + b.2 as u32 * t) / 1000;
    (r as u8, g as u8, b_val as u8)
}

pub fn print_goodbye() {
    println!(
        "\n{} {}",
        SPARKLE,
        style("Thank you for using reconlab. Happy hunting!")
            .bold()
            .cyan()
    );
}

enum GuideLine {
    Command(String, String),
    Status(String, String),
    Info(String),
    Warn(String),
    Text(String),
    Hint(String, String),
    Blank,
}

/// A titled block of help or status lines, rendered in one go by [`GuideSection::print`].
pub struct GuideSection {
    title: String,
    lines: Vec<GuideLine>,
}

impl GuideSection {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            lines: Vec::new(),
        }
    }

    pub fn command(mut self, name: &str, description: &str) -> Self {
        self.lines
            .push(GuideLine::Command(name.to_string(), description.to_string()));
        self
    }

    pub fn status(mut self, label: &str, value: &str) -> Self {
        self.lines
            .push(GuideLine::Status(label.to_string(), value.to_string()));
        self
    }

    pub fn info(mut self, msg: &str) -> Self {
        self.lines.push(GuideLine::Info(msg.to_string()));
        self
    }

    pub fn warn(mut self, msg: &str) -> Self {
        self.lines.push(GuideLine::Warn(msg.to_string()));
        self
    }

    pub fn text(mut self, msg: &str) -> Self {
        self.lines.push(GuideLine::Text(msg.to_string()));
        self
    }

    /// An example invocation, with an optional trailing note.
    pub fn hint(mut self, example: &str, note: &str) -> Self {
        self.lines
            .push(GuideLine::Hint(example.to_string(), note.to_string()));
        self
    }

    pub fn blank(mut self) -> Self {
        self.lines.push(GuideLine::Blank);
        self
    }

    fn render(&self) -> Vec<String> {
        let width = self
            .lines
            .iter()
            .filter_map(|l| match l {
                GuideLine::Command(name, _) => Some(name.len()),
                _ => None,
            })
            .max()
            .unwrap_or(0);

        let mut out = vec![format!("\n {}", style(&self.title).bold().underlined())];
        for line in &self.lines {
            out.push(match line {
                GuideLine::Command(name, description) => format!(
                    "   {}  {}",
                    style(format!("{:<width$}", name, width = width)).green(),
                    description
                ),
                GuideLine::Status(label, value) => {
                    format!("  {} {}: {}", GEAR, style(label).bold().cyan(), value)
                }
                GuideLine::Info(msg) => format!("  {} {}", INFO_ICON, style(msg).blue()),
                GuideLine::Warn(msg) => format!("  {} {}", WARN_ICON, style(msg).yellow()),
                GuideLine::Text(msg) => format!("   {}", msg),
                GuideLine::Hint(example, note) if note.is_empty() => {
                    format!("   {} {}", ARROW, style(example).cyan())
                }
                GuideLine::Hint(example, note) => format!(
                    "   {} {}  {}",
                    ARROW,
                    style(example).cyan(),
                    style(note).dim()
                ),
                GuideLine::Blank => String::new(),
            });
        }
        out
    }

    pub fn print(self) {
        for line in self.render() {
            println!("{}", line);
        }
    }
}
