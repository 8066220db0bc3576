use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use log::LevelFilter;
use paste_core::{update, AppState, ConfirmAction, Msg};
use paste_engine::{ApiError, EngineHandle};
use paste_logging::{paste_error, paste_info, paste_warn, DEFAULT_LOG_FILE};
use thiserror::Error;

use super::config::{self, ClientConfig};
use super::effects::{AppInput, EffectRunner, Followup, MsgSink};
use super::events::TimerRegistry;
use super::terminal::Terminal;
use super::ui::commands::{
    parse_command, parse_confirmation, Command, CommandContext, HELP, PASTE_END,
};
use super::ui::render::render;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("engine failed to start: {0}")]
    Engine(#[from] ApiError),
    #[error("terminal error: {0}")]
    Io(#[from] io::Error),
}

pub fn run_app() -> Result<(), AppError> {
    let config_path = config::config_path();
    let (config, config_error) = match config::load(&config_path) {
        Ok(config) => (config, None),
        Err(err) => (ClientConfig::default(), Some(err)),
    };
    paste_logging::initialize(
        config.log_destination,
        LevelFilter::Info,
        Path::new(DEFAULT_LOG_FILE),
    );
    if let Some(err) = config_error {
        paste_warn!("Using default configuration: {err}");
    }
    paste_info!("Starting just_paste against {}", config.server_url);

    let (tx, rx) = mpsc::channel::<AppInput>();
    let timers = Arc::new(Mutex::new(TimerRegistry::default()));
    let sink = Arc::new(MsgSink::new(tx.clone(), timers.clone()));
    let engine = EngineHandle::new(config.engine_config(), sink)?;
    let runner = EffectRunner::new(engine, timers);

    spawn_stdin_reader(tx.clone());

    let environment = config.environment();
    let mut app = App {
        state: AppState::for_environment(environment.as_ref()),
        runner,
        terminal: Terminal::new(io::stdout(), config.system_notifications),
        confirmation: None,
        paste_buffer: None,
        redraw_pending: false,
    };

    app.dispatch(Msg::Init)?;
    app.redraw()?;
    drop(tx);

    while let Ok(input) = rx.recv() {
        let flow = match input {
            AppInput::Msg(msg) => app.dispatch(msg).map(|()| Flow::Continue)?,
            AppInput::Line(line) => app.handle_line(&line)?,
            AppInput::InputClosed => Flow::Quit,
        };
        if flow == Flow::Quit {
            break;
        }
    }

    paste_info!("Shutting down");
    app.runner.shutdown();
    Ok(())
}

fn spawn_stdin_reader(tx: mpsc::Sender<AppInput>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(AppInput::Line(line)).is_err() {
                        return;
                    }
                }
                Err(err) => {
                    paste_error!("Reading stdin failed: {err}");
                    break;
                }
            }
        }
        let _ = tx.send(AppInput::InputClosed);
    });
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

struct App<W: Write> {
    state: AppState,
    runner: EffectRunner,
    terminal: Terminal<W>,
    confirmation: Option<ConfirmAction>,
    paste_buffer: Option<Vec<String>>,
    /// Set while a prompt or paste hides a state change from the screen.
    redraw_pending: bool,
}

impl<W: Write> App<W> {
    /// Feeds `msg` through `update`, runs the effects it produced and any
    /// messages they answer with, then redraws once if anything changed.
    /// A change that lands while a prompt or paste is open is drawn as soon
    /// as that ends.
    fn dispatch(&mut self, msg: Msg) -> io::Result<()> {
        let mut queue = VecDeque::from([msg]);

        while let Some(msg) = queue.pop_front() {
            let state = std::mem::take(&mut self.state);
            let (mut state, effects) = update(state, msg);
            self.redraw_pending |= state.consume_dirty();
            self.state = state;

            for followup in self.runner.run(effects, &mut self.terminal) {
                match followup {
                    Followup::Msg(msg) => queue.push_back(msg),
                    Followup::Confirm(action) => self.confirmation = Some(action),
                }
            }
        }

        if self.redraw_pending && self.confirmation.is_none() && self.paste_buffer.is_none() {
            self.redraw()?;
        }
        Ok(())
    }

    fn handle_line(&mut self, line: &str) -> io::Result<Flow> {
        if let Some(action) = self.confirmation.take() {
            let accepted = parse_confirmation(line);
            self.redraw_pending = true;
            self.dispatch(Msg::ConfirmationAnswered { action, accepted })?;
            return Ok(Flow::Continue);
        }

        if let Some(buffer) = self.paste_buffer.as_mut() {
            if line.trim() != PASTE_END {
                buffer.push(line.to_string());
                return Ok(Flow::Continue);
            }
            let pasted = self.paste_buffer.take().unwrap_or_default().join("\n");
            self.redraw_pending = true;
            self.dispatch(Msg::InputChanged(pasted))?;
            return Ok(Flow::Continue);
        }

        let now_ms = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default();
        let ctx = CommandContext {
            url_input: self.state.url_input(),
            path_input_visible: !self.state.is_mobile(),
            now_ms,
        };
        match parse_command(line, &ctx) {
            Command::Msg(msg) => self.dispatch(msg)?,
            Command::BeginPaste => {
                self.paste_buffer = Some(Vec::new());
                self.terminal
                    .print(&format!("Paste URLs, one per line; finish with `{PASTE_END}`.\n"))?;
            }
            Command::ShowUrls => {
                let urls = self.state.url_input().trim();
                let text = if urls.is_empty() { "(no URLs)" } else { urls };
                self.terminal.print(&format!("{text}\n"))?;
            }
            Command::Help => self.terminal.print(HELP)?,
            Command::Invalid(message) => self.terminal.print(&format!("{message}\n"))?,
            Command::Empty => self.redraw()?,
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn redraw(&mut self) -> io::Result<()> {
        self.redraw_pending = false;
        let screen = render(&self.state.view());
        self.terminal.print(&format!("\n{screen}> "))
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use async_trait::async_trait;
    use paste_engine::{
        DownloadRequest, DownloadResponse, HistoryEntry, PathValidation, ServerApi,
    };

    use super::*;

    struct IdleApi;

    #[async_trait]
    impl ServerApi for IdleApi {
        async fn validate_path(&self, _path: &str) -> Result<PathValidation, ApiError> {
            Ok(PathValidation { valid: true, message: None })
        }

        async fn submit_download(
            &self,
            _request: &DownloadRequest,
        ) -> Result<DownloadResponse, ApiError> {
            Ok(DownloadResponse::default())
        }

        async fn history(&self) -> Result<Vec<HistoryEntry>, ApiError> {
            Ok(Vec::new())
        }

        async fn delete_history(&self, _id: i64) -> Result<(), ApiError> {
            Ok(())
        }

        async fn clear_history(&self) -> Result<(), ApiError> {
            Ok(())
        }

        async fn fetch_artifact(&self, _url: &str, dir: &Path) -> Result<PathBuf, ApiError> {
            Ok(dir.join("artifact.bin"))
        }
    }

    fn test_app(save_dir: &Path) -> App<Vec<u8>> {
        let (tx, _rx) = mpsc::channel();
        let timers = Arc::new(Mutex::new(TimerRegistry::default()));
        let sink = Arc::new(MsgSink::new(tx, timers.clone()));
        let engine = EngineHandle::with_api(Arc::new(IdleApi), None, save_dir.to_path_buf(), sink)
            .expect("engine");
        App {
            state: AppState::default(),
            runner: EffectRunner::new(engine, timers),
            terminal: Terminal::new(Vec::new(), false),
            confirmation: None,
            paste_buffer: None,
            redraw_pending: false,
        }
    }

    fn finish(app: App<Vec<u8>>) -> String {
        app.runner.shutdown();
        String::from_utf8(app.terminal.into_inner()).expect("utf8 output")
    }

    #[test]
    fn change_during_confirmation_is_drawn_after_decline() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = test_app(dir.path());

        app.handle_line("clear-history").expect("prompt");
        app.dispatch(Msg::PushConnectionChanged { connected: true })
            .expect("event");
        let before_answer = app.terminal.get_ref().len();
        app.handle_line("n").expect("decline");

        let output = finish(app);
        let after_answer = &output[before_answer..];
        assert!(after_answer.contains("live"), "{after_answer}");
        assert!(after_answer.ends_with("> "), "{after_answer}");
    }

    #[test]
    fn change_during_paste_is_drawn_when_paste_ends() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = test_app(dir.path());

        app.handle_line("paste").expect("begin paste");
        app.dispatch(Msg::PushConnectionChanged { connected: true })
            .expect("event");
        let during_paste = app.terminal.get_ref().len();
        app.handle_line(PASTE_END).expect("end paste");

        let output = finish(app);
        let after_paste = &output[during_paste..];
        assert!(after_paste.contains("live"), "{after_paste}");
        assert!(after_paste.ends_with("> "), "{after_paste}");
    }
}
