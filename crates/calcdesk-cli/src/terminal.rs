//! Terminal presentation: alert banners, login redirects and tables.

use std::io::{self, Write};

use calcdesk_core::models::{Calculation, HistoryPage, OperationStatistics, UserStatistics};
use calcdesk_core::{
    format_date_time_with, format_number, truncate, AlertKind, AlertSink, ClockStyle, Navigator,
};
use crossterm::style::{Attribute, Color, Stylize};
use tracing::debug;

/// Width of the expression column in calculation tables
const EXPRESSION_WIDTH: usize = 32;

/// Prints alerts as coloured banners on stderr.
pub struct TerminalSink;

impl AlertSink for TerminalSink {
    fn show(&self, kind: AlertKind, message: &str) {
        let (label, color) = match kind {
            AlertKind::Error => (" ERROR ", Color::Red),
            AlertKind::Success => (" OK ", Color::Green),
        };
        let mut stderr = io::stderr();
        let _ = writeln!(
            stderr,
            "{} {}",
            label.with(Color::Black).on(color).attribute(Attribute::Bold),
            message.with(color)
        );
    }

    fn hide(&self, kind: AlertKind) {
        debug!(%kind, "Alert expired");
    }
}

/// The CLI has no views to switch to; point the user at the login command.
pub struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn redirect(&self, path: &str) {
        debug!(path, "Login required");
        eprintln!("{}", "Please log in with `calcdesk login`.".with(Color::Yellow));
    }
}

pub fn print_calculation(calc: &Calculation, clock: ClockStyle) {
    println!("{}", calc.kind.to_string().attribute(Attribute::Bold));
    println!("  id:       {}", calc.id);
    println!("  inputs:   {}", calc.kind.expression(&calc.inputs));
    println!("  result:   {}", calc.result_display());
    println!("  created:  {}", format_date_time_with(&calc.created_at, clock));
    if calc.was_edited() {
        println!("  updated:  {}", format_date_time_with(&calc.updated_at, clock));
    }
}

pub fn print_calculation_table(calcs: &[Calculation], clock: ClockStyle) {
    if calcs.is_empty() {
        println!("No calculations yet.");
        return;
    }

    println!(
        "{:<36}  {:<14}  {:<width$}  {:>12}  {}",
        "ID",
        "TYPE",
        "EXPRESSION",
        "RESULT",
        "CREATED",
        width = EXPRESSION_WIDTH
    );
    for calc in calcs {
        println!(
            "{:<36}  {:<14}  {:<width$}  {:>12}  {}",
            calc.id,
            calc.kind,
            truncate(&calc.kind.expression(&calc.inputs), EXPRESSION_WIDTH),
            calc.result_display(),
            format_date_time_with(&calc.created_at, clock),
            width = EXPRESSION_WIDTH
        );
    }
}

pub fn print_history(page: &HistoryPage, clock: ClockStyle) {
    print_calculation_table(&page.calculations, clock);
    println!(
        "\nPage {} of {} ({} total)",
        page.page,
        page.total_pages.max(1),
        page.total
    );

    if let Some(hint) = page_hint(page) {
        println!("{}", hint.with(Color::DarkGrey));
    }
}

/// Flags for the neighbouring history pages, if there are any.
fn page_hint(page: &HistoryPage) -> Option<String> {
    let mut hints = Vec::new();
    if page.has_previous() {
        hints.push(format!("previous: --page {}", page.page - 1));
    }
    if page.has_next() {
        hints.push(format!("next: --page {}", page.page + 1));
    }
    (!hints.is_empty()).then(|| hints.join("  "))
}

fn optional_number(value: Option<f64>) -> String {
    value.map(format_number).unwrap_or_else(|| "-".to_string())
}

pub fn print_statistics(stats: &UserStatistics) {
    println!("{}", "Statistics".attribute(Attribute::Bold));
    println!("  total calculations:   {}", stats.total_calculations);
    println!("  most used operation:  {}", stats.most_used_operation.as_deref().unwrap_or("-"));
    println!("  average inputs:       {}", optional_number(stats.average_inputs_count));
    println!("  average result:       {}", optional_number(stats.average_result));

    if !stats.operations_breakdown.is_empty() {
        println!("\n{}", "By operation".attribute(Attribute::Bold));
        for (operation, count) in &stats.operations_breakdown {
            println!(
                "  {:<16} {:>5}  ({:.0}%)",
                operation,
                count,
                stats.operation_share(operation)
            );
        }
    }

    if !stats.calculations_by_day.is_empty() {
        println!("\n{}", "Last 30 days".attribute(Attribute::Bold));
        for (day, count) in &stats.calculations_by_day {
            println!("  {}  {}", day, "#".repeat(*count as usize));
        }
    }
}

pub fn print_operation_statistics(operation: &str, stats: &OperationStatistics) {
    println!(
        "  {:<16} count {:>4}  avg {:>10}  min {:>10}  max {:>10}",
        operation,
        stats.count,
        optional_number(stats.average_result),
        optional_number(stats.min_result),
        optional_number(stats.max_result)
    );
}
