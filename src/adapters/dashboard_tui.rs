use std::collections::VecDeque;
use std::io::{self, IsTerminal, Stdout};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use parking_lot::Mutex;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::{Frame, Terminal};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::domain::config::UiSection;
use crate::domain::SenseError;
use crate::ports::Dashboard;

const TICK: Duration = Duration::from_millis(100);

/// Shared display state, mutated by the port methods and read by the render
/// thread.
struct DashState {
    notifications: VecDeque<(String, Instant)>,
    speech: String,
    status: String,
    max_notifications: usize,
    running: bool,
}

/// Snapshot handed to the renderer so the lock is not held while drawing.
struct RenderSnapshot {
    notifications: Vec<(String, u64)>,
    speech: String,
    status: String,
}

impl DashState {
    fn snapshot(&self) -> RenderSnapshot {
        RenderSnapshot {
            notifications: self
                .notifications
                .iter()
                .map(|(text, at)| (text.clone(), at.elapsed().as_secs()))
                .collect(),
            speech: self.speech.clone(),
            status: self.status.clone(),
        }
    }
}

/// Live terminal dashboard: notification feed, speech caption, status line.
///
/// Rendering and input polling run on a dedicated thread; initialization
/// fails cleanly when stdout is not an interactive terminal, which is the
/// signal the application shell turns into headless fallback.
pub struct TerminalDashboard {
    state: Arc<Mutex<DashState>>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl TerminalDashboard {
    /// Take over the terminal and start the render loop.
    ///
    /// `q` or Ctrl-C in the dashboard requests application shutdown through
    /// the given channel.
    pub fn init(
        ui: &UiSection,
        shutdown_tx: mpsc::UnboundedSender<()>,
    ) -> Result<Self, SenseError> {
        if !io::stdout().is_terminal() {
            return Err(SenseError::Dashboard(
                "stdout is not an interactive terminal".to_string(),
            ));
        }

        enable_raw_mode()
            .map_err(|e| SenseError::Dashboard(format!("Failed to enter raw mode: {}", e)))?;

        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(SenseError::Dashboard(format!(
                "Failed to enter alternate screen: {}",
                e
            )));
        }

        let terminal = match Terminal::new(CrosstermBackend::new(io::stdout())) {
            Ok(t) => t,
            Err(e) => {
                let _ = execute!(io::stdout(), LeaveAlternateScreen);
                let _ = disable_raw_mode();
                return Err(SenseError::Dashboard(format!(
                    "Failed to create terminal: {}",
                    e
                )));
            }
        };

        let state = Arc::new(Mutex::new(DashState {
            notifications: VecDeque::new(),
            speech: String::new(),
            status: "Starting...".to_string(),
            max_notifications: ui.max_notifications.max(1),
            running: true,
        }));

        let thread_state = Arc::clone(&state);
        let thread = std::thread::Builder::new()
            .name("dashboard".to_string())
            .spawn(move || render_loop(terminal, thread_state, shutdown_tx))
            .map_err(|e| {
                let _ = execute!(io::stdout(), LeaveAlternateScreen);
                let _ = disable_raw_mode();
                SenseError::Dashboard(format!("Failed to spawn render thread: {}", e))
            })?;

        info!("Terminal dashboard initialized");
        Ok(Self {
            state,
            thread: Mutex::new(Some(thread)),
        })
    }
}

fn render_loop(
    mut terminal: Terminal<CrosstermBackend<Stdout>>,
    state: Arc<Mutex<DashState>>,
    shutdown_tx: mpsc::UnboundedSender<()>,
) {
    loop {
        // Input first so a quit key is never delayed by a draw.
        match event::poll(TICK) {
            Ok(true) => {
                if let Ok(Event::Key(key)) = event::read() {
                    if key.kind == KeyEventKind::Press {
                        let quit = matches!(key.code, KeyCode::Char('q') | KeyCode::Char('Q'))
                            || (key.code == KeyCode::Char('c')
                                && key.modifiers.contains(KeyModifiers::CONTROL));
                        if quit {
                            debug!("Quit requested from dashboard");
                            let _ = shutdown_tx.send(());
                        }
                    }
                }
            }
            Ok(false) => {}
            Err(e) => {
                warn!(error = %e, "Dashboard input error");
                break;
            }
        }

        let (snapshot, running) = {
            let state = state.lock();
            (state.snapshot(), state.running)
        };
        if !running {
            break;
        }
        if terminal.draw(|frame| render(frame, &snapshot)).is_err() {
            break;
        }
    }

    let _ = execute!(io::stdout(), LeaveAlternateScreen);
    let _ = disable_raw_mode();
    debug!("Dashboard render loop ended");
}

fn render(frame: &mut Frame, snapshot: &RenderSnapshot) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title
            Constraint::Min(4),    // Notifications
            Constraint::Length(6), // Speech
            Constraint::Length(3), // Status
        ])
        .split(frame.area());

    let title = Paragraph::new(Line::from(vec![
        Span::styled(
            "SenseBridge",
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  ambient sound awareness"),
        Span::styled("  (q to quit)", Style::default().fg(Color::DarkGray)),
    ]))
    .alignment(Alignment::Left);
    frame.render_widget(title, chunks[0]);

    let notification_lines: Vec<Line> = if snapshot.notifications.is_empty() {
        vec![Line::from(Span::styled(
            "Listening...",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        snapshot
            .notifications
            .iter()
            .map(|(text, ago)| {
                Line::from(vec![
                    Span::styled(
                        format!("{:>4}s ago  ", ago),
                        Style::default().fg(Color::DarkGray),
                    ),
                    Span::styled(text.clone(), Style::default().fg(Color::Yellow)),
                ])
            })
            .collect()
    };
    let notifications = Paragraph::new(notification_lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Notifications"),
    );
    frame.render_widget(notifications, chunks[1]);

    let speech_text = if snapshot.speech.is_empty() {
        Span::styled("(no speech yet)", Style::default().fg(Color::DarkGray))
    } else {
        Span::styled(snapshot.speech.clone(), Style::default().fg(Color::Cyan))
    };
    let speech = Paragraph::new(Line::from(speech_text))
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Speech"));
    frame.render_widget(speech, chunks[2]);

    let status = Paragraph::new(Line::from(snapshot.status.clone()))
        .block(Block::default().borders(Borders::ALL).title("Status"));
    frame.render_widget(status, chunks[3]);
}

impl Dashboard for TerminalDashboard {
    fn show_notification(&self, message: &str) {
        let mut state = self.state.lock();
        state
            .notifications
            .push_front((message.to_string(), Instant::now()));
        while state.notifications.len() > state.max_notifications {
            state.notifications.pop_back();
        }
    }

    fn update_speech_text(&self, text: &str) {
        self.state.lock().speech = text.to_string();
    }

    fn update_status_message(&self, status: &str) {
        self.state.lock().status = status.to_string();
    }

    fn shutdown(&self) {
        self.state.lock().running = false;
        if let Some(handle) = self.thread.lock().take() {
            let _ = handle.join();
        }
    }

    fn is_interactive(&self) -> bool {
        true
    }
}

impl Drop for TerminalDashboard {
    fn drop(&mut self) {
        self.shutdown();
    }
}
