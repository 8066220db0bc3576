//! Line commands typed at the prompt.

use paste_core::{Format, Msg};

/// Terminator of a `paste` block.
pub const PASTE_END: &str = ".";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Msg(Msg),
    /// Start collecting lines until `PASTE_END`.
    BeginPaste,
    ShowUrls,
    Help,
    Quit,
    Empty,
    Invalid(String),
}

/// What a command line is parsed against.
#[derive(Debug, Clone, Copy)]
pub struct CommandContext<'a> {
    /// Current URL box content, which `add` appends to.
    pub url_input: &'a str,
    /// False on mobile, where the server picks the destination.
    pub path_input_visible: bool,
    pub now_ms: u64,
}

const PATH_HIDDEN: &str = "the destination folder is chosen by the server on this device";

pub fn parse_command(line: &str, ctx: &CommandContext<'_>) -> Command {
    let line = line.trim();
    let (name, arg) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };

    match name.to_ascii_lowercase().as_str() {
        "" => Command::Empty,
        "add" if arg.is_empty() => Command::Invalid("usage: add <url>".to_string()),
        "add" => Command::Msg(Msg::InputChanged(append_line(ctx.url_input, arg))),
        "paste" => Command::BeginPaste,
        "urls" => Command::ShowUrls,
        "clear-input" => Command::Msg(Msg::InputChanged(String::new())),
        "format" => match arg.parse::<Format>() {
            Ok(format) => Command::Msg(Msg::FormatSelected(format)),
            Err(err) => Command::Invalid(err),
        },
        "quality" if arg.is_empty() => Command::Invalid("usage: quality <value>".to_string()),
        "quality" => Command::Msg(Msg::QualitySelected(arg.to_string())),
        "path" | "validate" if !ctx.path_input_visible => {
            Command::Invalid(PATH_HIDDEN.to_string())
        }
        "path" => Command::Msg(Msg::PathChanged(arg.to_string())),
        "validate" => Command::Msg(Msg::ValidatePathClicked),
        "download" => Command::Msg(Msg::DownloadClicked { now_ms: ctx.now_ms }),
        "history" => Command::Msg(Msg::RefreshHistoryClicked),
        "filter" => Command::Msg(Msg::FilterChanged(arg.to_string())),
        "copy" => with_id(arg, |id| Msg::CopyPathClicked { id }),
        "delete" => with_id(arg, |id| Msg::DeleteHistoryClicked { id }),
        "clear-history" => Command::Msg(Msg::ClearHistoryClicked),
        "theme" => Command::Msg(Msg::ThemeToggled),
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => Command::Invalid(format!("unknown command `{other}`; type `help`")),
    }
}

/// `y` or `yes` accepts; anything else declines.
pub fn parse_confirmation(line: &str) -> bool {
    matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn with_id(arg: &str, msg: impl FnOnce(i64) -> Msg) -> Command {
    match arg.parse::<i64>() {
        Ok(id) => Command::Msg(msg(id)),
        Err(_) => Command::Invalid(format!("expected a history id, got `{arg}`")),
    }
}

fn append_line(existing: &str, line: &str) -> String {
    let existing = existing.trim_end_matches('\n');
    if existing.trim().is_empty() {
        line.to_string()
    } else {
        format!("{existing}\n{line}")
    }
}

pub const HELP: &str = "\
Commands:
  add <url>          append a URL to the input
  paste              enter several URLs, one per line, finish with a lone `.`
  urls               show the current URL input
  clear-input        empty the URL input
  format <fmt>       mp4, mp3, wav, jpg or png
  quality <value>    pick one of the listed qualities
  path <dir>         destination folder on the server (empty for default)
  validate           ask the server whether the path is usable
  download           start downloading every URL in the input
  history            reload the download history
  filter <text>      show only history rows containing <text>
  copy <id>          copy the stored path of a history item
  delete <id>        delete a history item
  clear-history      delete the whole history
  theme              switch between dark and light
  help               show this help
  quit               leave
";
