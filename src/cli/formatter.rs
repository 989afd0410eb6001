/// Terminal output helpers for command summaries
use colored::*;

pub fn info_box(title: &str, items: &[String]) {
    println!("\n{} {}", "ℹ".cyan(), title.bold());
    for item in items {
        println!("  {} {}", "•".dimmed(), item);
    }
}

pub fn print_warning(message: &str) {
    println!(
        "\n{} {}",
        "⚠".yellow(),
        format!("Warning: {}", message).yellow()
    );
}

pub fn print_success(message: &str) {
    println!("\n{} {}", "✓".green().bold(), message);
}

pub fn print_tip(message: &str) {
    println!("\n{} {}", "→".cyan(), format!("Tip: {}", message).dimmed());
}

/// `12 of 340 (3.5%)`
pub fn format_fraction(part: usize, total: usize) -> String {
    if total == 0 {
        return format!("{} of {}", part, total);
    }
    format!(
        "{} of {} ({:.1}%)",
        part,
        total,
        part as f64 * 100.0 / total as f64
    )
}
