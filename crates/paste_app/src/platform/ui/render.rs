use std::fmt::Write;

use paste_core::{AppViewModel, CardTone, CardView, HistoryRowView, HistoryView, Theme};

const BAR_WIDTH: usize = 24;

/// ANSI colours for one theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub heading: &'static str,
    pub accent: &'static str,
    pub success: &'static str,
    pub error: &'static str,
    pub muted: &'static str,
    pub reset: &'static str,
}

pub fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Dark => Palette {
            heading: "\x1b[1;97m",
            accent: "\x1b[96m",
            success: "\x1b[92m",
            error: "\x1b[91m",
            muted: "\x1b[90m",
            reset: "\x1b[0m",
        },
        Theme::Light => Palette {
            heading: "\x1b[1;30m",
            accent: "\x1b[34m",
            success: "\x1b[32m",
            error: "\x1b[31m",
            muted: "\x1b[37m",
            reset: "\x1b[0m",
        },
    }
}

/// Renders the whole screen for `view`.
pub fn render(view: &AppViewModel) -> String {
    let p = palette(view.theme);
    let mut out = String::new();

    let link = if view.push_connected {
        format!("{}live{}", p.success, p.reset)
    } else {
        format!("{}offline{}", p.muted, p.reset)
    };
    let _ = writeln!(
        out,
        "{}just_paste{} [{}] push: {}",
        p.heading, p.reset, view.theme_icon, link
    );

    for banner in &view.banners {
        let _ = writeln!(out, "{}* {}{}: {}", p.accent, banner.title, p.reset, banner.body);
    }

    let _ = writeln!(out, "URLs: {}", view.url_count);
    let qualities: Vec<String> = view
        .quality_options
        .iter()
        .map(|option| {
            if option.selected {
                format!("{}[{}]{}", p.accent, option.value, p.reset)
            } else {
                option.value.to_string()
            }
        })
        .collect();
    let _ = writeln!(
        out,
        "Format: {}  Quality: {}",
        view.format.as_str().to_uppercase(),
        qualities.join(" ")
    );

    if view.path_input_visible {
        let shown = if view.path_input.is_empty() {
            "(server default)"
        } else {
            view.path_input.as_str()
        };
        let _ = write!(out, "Path: {shown}");
        if let Some(status) = &view.path_status {
            let colour = if status.valid { p.success } else { p.error };
            let _ = write!(out, "  {}{}{}", colour, status.message, p.reset);
        }
        out.push('\n');
    }

    let _ = writeln!(out, "[{}]", view.submit_label);

    if !view.cards.is_empty() {
        let _ = writeln!(out, "{}Downloads{}", p.heading, p.reset);
        for card in &view.cards {
            render_card(&mut out, card, &p);
        }
    }

    let _ = writeln!(out, "{}History{}", p.heading, p.reset);
    match &view.history {
        HistoryView::Rows(rows) => {
            let mut shown = 0;
            for row in rows.iter().filter(|row| row.visible) {
                render_row(&mut out, row, &p);
                shown += 1;
            }
            if shown < rows.len() {
                let _ = writeln!(
                    out,
                    "{}  ({} hidden by filter){}",
                    p.muted,
                    rows.len() - shown,
                    p.reset
                );
            }
        }
        placeholder => {
            let text = placeholder.placeholder().unwrap_or_default();
            let _ = writeln!(out, "{}  {}{}", p.muted, text, p.reset);
        }
    }

    out
}

fn render_card(out: &mut String, card: &CardView, p: &Palette) {
    let colour = match card.tone {
        CardTone::Neutral => p.accent,
        CardTone::Success => p.success,
        CardTone::Error => p.error,
    };
    let _ = writeln!(out, "  {} {}{}{}", card.title, colour, card.status, p.reset);
    let _ = writeln!(
        out,
        "    {} {}  {}  ETA {}  {}",
        progress_bar(card.bar_percent),
        card.percent_text,
        card.speed,
        card.eta,
        card.transfer
    );
}

fn render_row(out: &mut String, row: &HistoryRowView, p: &Palette) {
    let _ = writeln!(
        out,
        "  #{} {}{}{}  {}  {}  {}  {}",
        row.id, p.accent, row.title, p.reset, row.date, row.format, row.quality, row.size
    );
    if let Some(path) = row.path.as_deref().filter(|path| !path.is_empty()) {
        let _ = writeln!(out, "     {}{}{}", p.muted, path, p.reset);
    }
}

/// A `BAR_WIDTH` wide bar for a percentage in `0..=100`.
pub fn progress_bar(percent: f64) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}
