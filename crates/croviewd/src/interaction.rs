//! Terminal prompts and report rendering.

use console::{StyledObject, Term};
use croview::format::format_duration;
use dialoguer::{Confirm, Input, Password};

use super::*;

pub static INFO_PREFIX: &str = "ℹ ";
pub static WORKING_PREFIX: &str = "» ";
pub static SUCCESS_PREFIX: &str = "✓ ";
pub static ERROR_PREFIX: &str = "✗ ";
pub static WARNING_PREFIX: &str = "! ";
pub static PROMPT_PREFIX: &str = "❯ ";
pub static ITEM_PREFIX: &str = "├─";
pub static LAST_ITEM_PREFIX: &str = "└─";
pub static CONTINUE_PREFIX: &str = "│  ";

/// Width of a rendered progress bar, in cells.
const BAR_WIDTH: usize = 20;

#[derive(Debug)]
pub enum ResponseContent<'a> {
  Report(&'a Report),
  Reports(&'a [Report]),
  Success(&'a str),
  Working(&'a str),
  Warning(&'a str),
  Info(&'a str),
}

pub trait UserInteraction {
  fn confirm(&self, message: &str) -> Result<bool>;
  fn prompt(&self, message: &str, field: &'static str) -> Result<String>;
  fn prompt_password(&self, message: &str) -> Result<String>;
  fn reply(&self, content: ResponseContent) -> Result<()>;
}

/// Interaction over stdout/stdin.
pub struct Terminal {
  /// Answer confirmations with yes and refuse to prompt
  accept_defaults: bool,
  /// Output handle
  out:             Term,
}

impl Terminal {
  pub fn new(accept_defaults: bool) -> Self { Self { accept_defaults, out: Term::stdout() } }

  /// Whether output goes to a terminal that can be redrawn.
  pub fn is_interactive(&self) -> bool { self.out.is_term() }

  /// Redraws `reports` in place of the last `previous` lines. Returns the number of lines drawn.
  pub fn redraw(&self, reports: &[Report], previous: usize) -> Result<usize> {
    self.out.clear_last_lines(previous)?;
    for report in reports {
      self.out.write_line(&report_row(report))?;
    }
    Ok(reports.len())
  }
}

impl UserInteraction for Terminal {
  fn confirm(&self, message: &str) -> Result<bool> {
    if self.accept_defaults {
      return Ok(true);
    }
    Ok(
      Confirm::new()
        .with_prompt(format!("{} {}", style(PROMPT_PREFIX).yellow().bold(), message))
        .default(false)
        .interact()?,
    )
  }

  fn prompt(&self, message: &str, field: &'static str) -> Result<String> {
    if self.accept_defaults {
      return Err(CroviewdError::MissingInput(field));
    }
    Ok(
      Input::<String>::new()
        .with_prompt(format!("{} {}", style(PROMPT_PREFIX).yellow().bold(), message))
        .interact_text()?,
    )
  }

  fn prompt_password(&self, message: &str) -> Result<String> {
    if self.accept_defaults {
      return Err(CroviewdError::MissingInput("--password"));
    }
    Ok(
      Password::new()
        .with_prompt(format!("{} {}", style(PROMPT_PREFIX).yellow().bold(), message))
        .interact()?,
    )
  }

  fn reply(&self, content: ResponseContent) -> Result<()> {
    match content {
      ResponseContent::Report(report) => self.out.write_line(&report_details(report))?,
      ResponseContent::Reports(reports) => {
        if reports.is_empty() {
          self.out.write_line(&format!(
            "{} No reports yet. Request one with {}",
            style(INFO_PREFIX).blue(),
            style("croview analyze <url>").yellow()
          ))?;
          return Ok(());
        }
        self.out.write_line(&format!(
          "{} {} report(s):",
          style(SUCCESS_PREFIX).green().bold(),
          style(reports.len()).white().bold()
        ))?;
        for (i, report) in reports.iter().enumerate() {
          let branch = if i + 1 == reports.len() { LAST_ITEM_PREFIX } else { ITEM_PREFIX };
          self.out.write_line(&format!("{} {}", style(branch).dim(), report_row(report)))?;
        }
      },
      ResponseContent::Success(message) =>
        self.out.write_line(&format!("{} {}", style(SUCCESS_PREFIX).green().bold(), message))?,
      ResponseContent::Working(message) =>
        self.out.write_line(&format!("{} {}", style(WORKING_PREFIX).cyan(), message))?,
      ResponseContent::Warning(message) =>
        self.out.write_line(&format!("{} {}", style(WARNING_PREFIX).yellow().bold(), message))?,
      ResponseContent::Info(message) =>
        self.out.write_line(&format!("{} {}", style(INFO_PREFIX).blue(), message))?,
    }
    Ok(())
  }
}

/// Styles `text` in the terminal color matching `status`.
fn paint<D>(status: ReportStatus, text: D) -> StyledObject<D> {
  let styled = style(text);
  match status.color() {
    StatusColor::Blue => styled.blue(),
    StatusColor::Green => styled.green(),
    StatusColor::Red => styled.red(),
    StatusColor::Gray => styled.dim(),
  }
}

/// A `[####......]  40%` bar.
fn progress_bar(progress: f64) -> String {
  let filled = ((progress / 100.0) * BAR_WIDTH as f64).round().clamp(0.0, BAR_WIDTH as f64);
  let filled = filled as usize;
  format!("[{}{}] {:>3.0}%", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled), progress)
}

/// One-line summary of a report.
pub fn report_row(report: &Report) -> String {
  let status = report.status();
  let mut row = format!(
    "{} {:<10} {}",
    style(report.id()).dim(),
    paint(status, status.text()).bold(),
    style(report.url()).white()
  );
  match report {
    Report::Simulated(r) if r.is_in_flight() => {
      row.push_str(&format!("  {}", paint(status, progress_bar(r.progress))));
    },
    Report::Simulated(SimulatedReport { duration: Some(secs), .. }) => {
      row.push_str(&format!("  {}", style(format_duration(*secs)).dim()));
    },
    Report::Remote(RemoteReport { page_title: Some(title), .. }) => {
      row.push_str(&format!("  {}", style(title).dim()));
    },
    _ => {},
  }
  if let Some(error) = report.error() {
    row.push_str(&format!("  {}", style(error).red()));
  }
  row
}

/// Multi-line detail view of a report.
pub fn report_details(report: &Report) -> String {
  let status = report.status();
  let mut lines = vec![
    format!("{} Report {}", style(SUCCESS_PREFIX).green().bold(), style(report.id()).yellow()),
    field("URL", style(report.url()).blue().underlined()),
    field("Status", paint(status, status.text()).bold()),
    field("Started", style(report.started_at().format("%Y-%m-%d %H:%M:%S UTC")).white()),
  ];

  match report {
    Report::Simulated(r) => {
      lines.push(field("Progress", paint(status, progress_bar(r.progress))));
      if let Some(done) = r.completed_time {
        lines.push(field("Completed", style(done.format("%Y-%m-%d %H:%M:%S UTC")).white()));
      }
      if let Some(secs) = r.duration {
        lines.push(field("Duration", style(format_duration(secs)).white()));
      }
    },
    Report::Remote(r) => remote_details(r, &mut lines),
  }

  if let Some(error) = report.error() {
    lines.push(field("Error", style(error).red()));
  }
  lines.join("\n")
}

/// Lines only a service-backed report has.
fn remote_details(report: &RemoteReport, lines: &mut Vec<String>) {
  lines.push(field("Updated", style(report.updated_at.format("%Y-%m-%d %H:%M:%S UTC")).white()));
  if let Some(title) = &report.page_title {
    lines.push(field("Page title", style(title).white()));
  }
  let meta = &report.metadata;
  lines.push(field(
    "Metadata",
    style(format!(
      "{} words, {} analysis tokens, {} bytes",
      meta.word_count, meta.analysis_tokens, meta.page_size
    ))
    .white(),
  ));
  if let Some(load_time) = meta.load_time {
    lines.push(field("Load time", style(format!("{load_time:.2}s")).white()));
  }
  if report.pdf_path.is_some() {
    lines.push(field("PDF", style("available, use `croview download`").white()));
  }
  if !report.analysis.trim().is_empty() {
    lines.push(format!("   {}", style("Analysis:").green().bold()));
    for line in report.analysis.lines() {
      lines.push(format!("   {}{}", style(CONTINUE_PREFIX).dim(), line));
    }
  }
}

/// A `   Label: value` detail line.
fn field<D: std::fmt::Display>(label: &str, value: StyledObject<D>) -> String {
  format!("   {} {}", style(format!("{label}:")).green().bold(), value)
}
