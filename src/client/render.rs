//! Terminal rendering for the interactive client.
use std::io::{self, Write};

use console::{style, Style};

use crate::{server::runtime::ToolDescriptor, tools::ToolOutput};

use super::{ClientError, MenuChoice};

pub fn header() {
    let title = " Crontab Explorer (HTTP Client) ";
    let rule = "─".repeat(title.chars().count());
    let blue = Style::new().blue().bold();
    println!();
    println!("{}", blue.apply_to(format!("┌{rule}┐")));
    println!("{}", blue.apply_to(format!("│{title}│")));
    println!("{}", blue.apply_to(format!("└{rule}┘")));
    println!("A tool for monitoring crontab entries over the tool protocol.");
    println!();
}

pub fn connecting(base_url: &str) {
    println!("Connecting to tool server at {base_url}");
}

pub fn waiting(attempt: u32) {
    let _ = write_waiting(&mut io::stdout(), attempt);
}

fn write_waiting(out: &mut impl Write, attempt: u32) -> io::Result<()> {
    if attempt == 1 {
        writeln!(
            out,
            "{}",
            style("Server is not running or not accessible.").red().bold()
        )?;
        writeln!(out, "Start it with: crontab-explorer --port <PORT>")?;
        write!(out, "Waiting for server to start")?;
    }
    write!(out, ".")?;
    out.flush()
}

/// Ends the line of waiting dots once the retry budget is spent.
pub fn wait_exhausted() {
    let _ = write_wait_exhausted(&mut io::stdout());
}

fn write_wait_exhausted(out: &mut impl Write) -> io::Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "{}",
        style("Timed out waiting for server to start.").red().bold()
    )?;
    out.flush()
}

pub fn reachable_after_wait() {
    println!();
    println!("{}", style("Server is now running!").green());
}

/// Catalog as an aligned two-column table.
pub fn catalog_table(tools: &[ToolDescriptor]) -> String {
    let name_header = "Tool Name";
    let width = tools
        .iter()
        .map(|tool| tool.name.chars().count())
        .chain(std::iter::once(name_header.len()))
        .max()
        .unwrap_or(name_header.len());
    let mut out = String::new();
    out.push_str(&format!("{}\n", style("Available Tools").bold()));
    out.push_str(&format!("{name_header:<width$}  Description\n"));
    out.push_str(&format!("{}\n", "─".repeat(width + 2 + "Description".len())));
    for tool in tools {
        out.push_str(&format!(
            "{}  {}\n",
            style(format!("{:<width$}", tool.name)).cyan(),
            style(&tool.description).green()
        ));
    }
    out
}

pub fn catalog(tools: &[ToolDescriptor]) {
    println!(
        "{}",
        style(format!(
            "Connected to server. Found {} available tools.",
            tools.len()
        ))
        .green()
    );
    print!("{}", catalog_table(tools));
}

pub fn menu() {
    println!();
    println!("{}", style("Available Commands:").bold());
    for choice in MenuChoice::ALL {
        println!("{}. {}", choice.number(), choice.label());
    }
}

pub fn progress(message: &str) {
    println!("{}", style(message).yellow());
}

/// Envelope as pretty JSON, prefixed with a status-coloured title.
pub fn envelope(title: &str, output: &ToolOutput) {
    let title_style = if output.status.is_failure() {
        Style::new().red().bold()
    } else {
        Style::new().bold()
    };
    println!("{}", title_style.apply_to(format!("{title}:")));
    match serde_json::to_string_pretty(output) {
        Ok(pretty) => println!("{pretty}"),
        Err(err) => error(&format!("could not format response: {err}")),
    }
}

pub fn client_error(err: &ClientError) {
    error(&err.to_string());
}

pub fn error(message: &str) {
    eprintln!("{}", style(format!("Error: {message}")).red().bold());
}

pub fn goodbye() {
    println!("{}", style("Exiting Crontab Explorer. Goodbye!").green().bold());
}
