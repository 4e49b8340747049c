mod demo;

use anyhow::Result;
use console::style;

use marquee::core::terminal::{self, GuideSection, print_error};

fn print_help() {
    terminal::print_banner();

    GuideSection::new("Core")
        .command("demo", "Run a scripted task against the console surface")
        .print();

    GuideSection::new("Diagnostics")
        .command("help", "Show this guide")
        .print();

    println!(
        "\n {} {} <command> [flags]\n",
        style("Usage:").bold(),
        style("marquee").green()
    );
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DemoArgs {
    pub context: String,
    pub task: String,
    pub pace_ms: u64,
}

pub(crate) fn parse_demo_args(args: &[String], start: usize) -> DemoArgs {
    let mut context = "Agent".to_string();
    let mut task = "Book a flight to Lisbon".to_string();
    let mut pace_ms = 600;
    let mut i = start;
    while i < args.len() {
        match args[i].as_str() {
            "--context" | "-c" => {
                if i + 1 < args.len() {
                    context = args[i + 1].clone();
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--task" | "-t" => {
                if i + 1 < args.len() {
                    task = args[i + 1].clone();
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--pace-ms" => {
                if i + 1 < args.len() {
                    pace_ms = args[i + 1].parse().unwrap_or(600);
                    i += 2;
                } else {
                    i += 1;
                }
            }
            _ => i += 1,
        }
    }
    DemoArgs {
        context,
        task,
        pace_ms,
    }
}

pub(crate) async fn run_main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("demo") => demo::run_demo(parse_demo_args(&args, 2)).await,
        Some("help") | Some("--help") | Some("-h") | None => {
            print_help();
            Ok(())
        }
        Some(other) => {
            print_error(&format!("Unknown command: {}", other));
            print_help();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_args(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn demo_args_have_sane_defaults() {
        let parsed = parse_demo_args(&to_args(&["marquee", "demo"]), 2);
        assert_eq!(parsed.context, "Agent");
        assert_eq!(parsed.pace_ms, 600);
    }

    #[test]
    fn demo_args_parse_flags_in_any_order() {
        let parsed = parse_demo_args(
            &to_args(&[
                "marquee",
                "demo",
                "--pace-ms",
                "50",
                "-t",
                "Find a hotel",
                "-c",
                "Concierge",
            ]),
            2,
        );
        assert_eq!(parsed.context, "Concierge");
        assert_eq!(parsed.task, "Find a hotel");
        assert_eq!(parsed.pace_ms, 50);
    }

    #[test]
    fn demo_args_ignore_trailing_flag_without_value() {
        let parsed = parse_demo_args(&to_args(&["marquee", "demo", "--task"]), 2);
        assert_eq!(parsed.task, "Book a flight to Lisbon");
    }
}
