//! Terminal rendering of analysis outcomes.
//!
//! Everything is rendered into a `String` first so a pass reaches stdout in a
//! single write. Colors are decided once at startup and passed in; with
//! `color == false` the output contains no escape codes at all.

use chrono::{DateTime, Local};
use console::{Style, Term};

use memon::analysis::{AnalysisOutcome, ReportRow, TreeReport, TreeSummary};
use memon::format::format_memory;
use memon::tree::Rank;

const SEPARATOR_WIDTH: usize = 60;
const ELLIPSIS: &str = "...";

/// Whether stdout should get ANSI colors.
pub fn should_use_colors(no_color: bool) -> bool {
    if no_color {
        return false;
    }
    if std::env::var("NO_COLOR").is_ok_and(|v| !v.is_empty()) {
        return false;
    }
    Term::stdout().is_term()
}

/// Shortens `name` to at most `width` characters, marking the cut with `...`.
pub fn truncate_name(name: &str, width: usize) -> String {
    if name.chars().count() <= width {
        return name.to_string();
    }
    let keep = width.saturating_sub(ELLIPSIS.len());
    let mut out: String = name.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}

fn line(out: &mut String, text: impl AsRef<str>) {
    out.push_str(text.as_ref());
    out.push('\n');
}

#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    pub color: bool,
    pub name_width: usize,
}

impl Renderer {
    pub fn new(color: bool, name_width: usize) -> Self {
        Self { color, name_width }
    }

    fn paint(&self, text: impl AsRef<str>, style: Style) -> String {
        if self.color {
            style.force_styling(true).apply_to(text.as_ref()).to_string()
        } else {
            text.as_ref().to_string()
        }
    }

    fn heading(&self, text: impl AsRef<str>) -> String {
        self.paint(text, Style::new().cyan().bold())
    }

    fn success(&self, text: impl AsRef<str>) -> String {
        self.paint(text, Style::new().green().bold())
    }

    fn failure(&self, text: impl AsRef<str>) -> String {
        self.paint(text, Style::new().red().bold())
    }

    fn label(&self, text: impl AsRef<str>) -> String {
        self.paint(text, Style::new().black().bright().bold())
    }

    fn rule(&self, ch: char) -> String {
        self.paint(
            ch.to_string().repeat(SEPARATOR_WIDTH),
            Style::new().yellow().bold(),
        )
    }

    /// Memory value styled by rank, or by size band when unranked.
    fn memory(&self, bytes: u64, rank: Option<Rank>) -> String {
        let style = match rank {
            Some(Rank::First) => Style::new().white().on_red().bold(),
            Some(Rank::Second) => Style::new().white().on_magenta().bold(),
            Some(Rank::Third) => Style::new().black().on_cyan().bold(),
            None => {
                let mb = bytes / (1024 * 1024);
                match mb {
                    0..=9 => Style::new().green(),
                    10..=99 => Style::new().yellow(),
                    100..=499 => Style::new().magenta(),
                    _ => Style::new().red(),
                }
            }
        };
        self.paint(format_memory(bytes), style)
    }

    /// Renders a whole pass.
    pub fn render(&self, query: &str, outcome: &AnalysisOutcome) -> String {
        let mut out = String::new();
        line(
            &mut out,
            format!(
                "{} {}",
                self.paint("🔍 Searching for processes matching:", Style::new().yellow().bold()),
                self.paint(query, Style::new().cyan())
            ),
        );

        match outcome {
            AnalysisOutcome::NoMatch => {
                line(
                    &mut out,
                    self.failure(format!("❌ No processes found matching '{}'", query)),
                );
            }
            AnalysisOutcome::NoRoot { matched } => {
                line(
                    &mut out,
                    self.success(format!("✅ Found {} matching process(es)", matched)),
                );
                line(&mut out, self.failure("❌ No root processes found"));
            }
            AnalysisOutcome::Trees {
                matched,
                trees,
                unbuilt,
            } => {
                line(
                    &mut out,
                    self.success(format!("✅ Found {} matching process(es)", matched)),
                );
                line(
                    &mut out,
                    self.success(format!(
                        "🌳 Found {} root process tree(s)",
                        trees.len() + unbuilt.len()
                    )),
                );

                for (i, report) in trees.iter().enumerate() {
                    if i > 0 {
                        out.push('\n');
                        line(&mut out, self.rule('='));
                    }
                    self.render_tree(i + 1, report, &mut out);
                }

                for pid in unbuilt {
                    line(
                        &mut out,
                        self.failure(format!("❌ Could not build process tree for PID {}", pid)),
                    );
                }
            }
        }

        out
    }

    fn render_tree(&self, number: usize, report: &TreeReport, out: &mut String) {
        out.push('\n');
        line(
            out,
            self.heading(format!(
                "📊 Process Tree {} (Root PID: {})",
                number, report.root_pid
            )),
        );
        line(out, self.rule('-'));
        line(
            out,
            format!(
                "{} [{}] {}",
                self.paint("🎯 Root:", Style::new().yellow().bold()),
                report.root_pid,
                truncate_name(&report.root_name, self.name_width)
            ),
        );
        line(out, self.heading("📋 Process Tree:"));

        let total = report.summary.total_memory;
        for row in &report.rows {
            line(out, self.render_row(row, total));
        }

        self.render_summary(&report.summary, out);
    }

    /// One tree line: guides, pid, name, memory, rank glyph, share of total.
    pub fn render_row(&self, row: &ReportRow, total: u64) -> String {
        let mut prefix = String::new();
        if let Some((own, ancestors)) = row.last_path.split_last() {
            for &ancestor_last in ancestors {
                prefix.push_str(if ancestor_last { "    " } else { "│   " });
            }
            prefix.push_str(if *own { "└── " } else { "├── " });
        }

        let pid_style = if row.depth == 0 {
            Style::new().black().bright().bold()
        } else {
            Style::new().blue().bright().bold()
        };

        let glyph = row.rank.map(Rank::glyph).unwrap_or("");
        let share = if total > 0 {
            format!(" ({:.1}%)", row.percentage)
        } else {
            String::new()
        };

        format!(
            "{}{} {} ({} {}{}{})",
            self.paint(prefix, Style::new().cyan()),
            self.paint(format!("[{}]", row.pid), pid_style),
            self.paint(truncate_name(&row.name, self.name_width), Style::new().blue().bold()),
            self.paint("RSS:", Style::new().bold()),
            self.memory(row.resident_bytes, row.rank),
            glyph,
            share
        )
    }

    fn render_summary(&self, summary: &TreeSummary, out: &mut String) {
        out.push('\n');
        line(out, self.heading("📈 Summary:"));
        line(
            out,
            format!("   {} {}", self.label("Tree Processes:"), summary.process_count),
        );
        line(
            out,
            format!(
                "   {} {}",
                self.label("Total Memory:"),
                self.memory(summary.total_memory, None)
            ),
        );
        line(
            out,
            format!(
                "   {} {}",
                self.label("Average Memory:"),
                self.memory(summary.average_memory, None)
            ),
        );

        if summary.top.is_empty() {
            return;
        }

        line(
            out,
            format!("   {}", self.label(format!("Top {} Consumers:", summary.top.len()))),
        );
        for (i, entry) in summary.top.iter().enumerate() {
            line(
                out,
                format!(
                    "      {}. [{}] {} {} ({:.1}%)",
                    i + 1,
                    entry.pid,
                    truncate_name(&entry.name, self.name_width),
                    self.memory(entry.resident_bytes, None),
                    entry.percentage
                ),
            );
        }
        line(
            out,
            format!(
                "   {} {} ({:.1}%)",
                self.label("Top 3 Combined:"),
                self.memory(summary.top3_memory, None),
                summary.top3_percentage
            ),
        );
    }

    /// Banner printed once when watch mode starts.
    pub fn watch_banner(&self, interval_secs: u64) -> String {
        self.heading(format!(
            "🕒 Starting watch mode - updating every {} seconds (Press Ctrl+C to stop)",
            interval_secs
        ))
    }

    /// Header printed above every watch iteration.
    pub fn watch_header(&self, now: DateTime<Local>, interval_secs: u64) -> String {
        let mut out = String::new();
        line(
            &mut out,
            self.heading(format!("🕒 {}", now.format("%Y-%m-%d %H:%M:%S"))),
        );
        line(
            &mut out,
            self.paint(
                format!("🔄 Updating every {} seconds", interval_secs),
                Style::new().yellow().bold(),
            ),
        );
        line(&mut out, self.rule('='));
        out
    }

    pub fn interrupted(&self) -> String {
        format!("\n{}", self.paint("🛑 Analysis interrupted by user", Style::new().red()))
    }
}
