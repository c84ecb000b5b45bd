//! ScopeApp - tick loop, input handling and backend supervision

use color_eyre::eyre::{Result as EyreResult, WrapErr};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
};
use ratatui::{layout::Rect, DefaultTerminal};
use std::{
    io::stdout,
    time::{Duration, Instant},
};
use tracing::{debug, info, warn};

use fluxscope::{
    engine::{ScopeEngine, WHEEL_ZOOM_IN, WHEEL_ZOOM_OUT},
    io::{BackendEvent, BackendSupervisor, CpalBackend},
    settings::{ParameterSet, SettingsStore},
    EngineConfig, DEFAULT_SAMPLE_RATE,
};

use super::ui::{self, Cursor, PlotHit, ScopeLayout, ViewState};

/// UI tick, ~100 Hz.
const TICK: Duration = Duration::from_millis(10);
/// Trigger level change per key press.
const LEVEL_STEP: f32 = 0.01;
/// Display time change per arrow key press, in drag pixels (1 ms).
const TIME_STEP_PIXELS: i32 = 10;

/// Display time change for a right drag from `start` to `column`, in drag
/// pixels. Dragging left lengthens the displayed time.
fn drag_pixels(start: u16, column: u16) -> i32 {
    (i32::from(start) - i32::from(column)) * ui::DOTS_PER_CELL_X
}

/// A left click only sets the trigger level while the trigger is on, and only
/// on the channel it watches.
fn level_click(hit: Option<PlotHit>, trigger_enabled: bool) -> Option<PlotHit> {
    hit.filter(|hit| trigger_enabled && hit.channel == 0)
}

pub struct ScopeApp {
    engine: ScopeEngine,
    supervisor: BackendSupervisor<CpalBackend>,
    store: SettingsStore,
    layout: ScopeLayout,
    cursor: Option<Cursor>,
    drag_column: Option<u16>,
    should_quit: bool,
}

impl ScopeApp {
    pub fn new(store: SettingsStore) -> Self {
        Self {
            engine: ScopeEngine::new(EngineConfig::default()),
            supervisor: BackendSupervisor::new(CpalBackend::new()),
            store,
            layout: ScopeLayout::default(),
            cursor: None,
            drag_column: None,
            should_quit: false,
        }
    }

    /// Restore settings, take over the terminal until quit, then save.
    pub fn run(mut self) -> EyreResult<()> {
        match self
            .store
            .load(&mut [&mut self.engine as &mut dyn ParameterSet])
        {
            Ok(diagnostics) if !diagnostics.is_empty() => {
                warn!(count = diagnostics.len(), "settings file had problems")
            }
            Ok(_) => {}
            Err(err) => warn!(error = %err, "could not read settings"),
        }
        // Values adjusted while loading were already clamped; nothing to react to.
        self.engine.drain_parameter_changes().for_each(drop);

        let mut terminal = ratatui::init();
        let res = execute!(stdout(), EnableMouseCapture)
            .wrap_err("failed to enable mouse capture")
            .and_then(|_| self.event_loop(&mut terminal));
        let _ = execute!(stdout(), DisableMouseCapture);
        ratatui::restore();

        self.supervisor.shutdown();
        self.store
            .save(&[&self.engine as &dyn ParameterSet])
            .wrap_err("failed to save settings")?;
        res
    }

    fn event_loop(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        let mut next_tick = Instant::now();
        while !self.should_quit {
            let now = Instant::now();
            if now >= next_tick {
                self.tick(now);
                let size = terminal.size()?;
                self.layout = ScopeLayout::new(Rect::new(0, 0, size.width, size.height));
                self.engine.set_pixel_width(self.layout.pixel_width());

                let view = ViewState {
                    engine: &self.engine,
                    backend: self.supervisor.info(),
                    cursor: self.cursor,
                };
                terminal.draw(|frame| ui::render(frame, &self.layout, &view))?;
                next_tick = now + TICK;
            }

            let timeout = next_tick.saturating_duration_since(Instant::now());
            if event::poll(timeout)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
                    Event::Mouse(mouse) => self.handle_mouse(mouse),
                    _ => {}
                }
            }
        }
        Ok(())
    }

    fn tick(&mut self, now: Instant) {
        match self.supervisor.poll(now) {
            Some(BackendEvent::Connected(info)) => {
                self.engine.set_sampling_rate(info.sample_rate);
                self.engine.set_channels(info.channels);
            }
            Some(BackendEvent::Disconnected) => {
                self.engine.set_sampling_rate(DEFAULT_SAMPLE_RATE);
            }
            None => {}
        }

        self.supervisor.drain_into(&mut self.engine);

        for change in self.engine.drain_parameter_changes() {
            debug!(name = change.name, value = %change.value, "parameter adjusted");
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        let engine = &mut self.engine;
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char('t') | KeyCode::Char('T') => {
                let mode = engine.trigger_mode().next();
                info!(mode = mode.label(), "trigger mode");
                engine.set_trigger_mode(mode);
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                engine.set_trigger_level(engine.trigger_level() + LEVEL_STEP)
            }
            KeyCode::Char('-') | KeyCode::Char('_') => {
                engine.set_trigger_level(engine.trigger_level() - LEVEL_STEP)
            }
            KeyCode::Up => engine.zoom_vertical(WHEEL_ZOOM_IN),
            KeyCode::Down => engine.zoom_vertical(WHEEL_ZOOM_OUT),
            KeyCode::Right => engine.nudge_display_time(TIME_STEP_PIXELS),
            KeyCode::Left => engine.nudge_display_time(-TIME_STEP_PIXELS),
            KeyCode::Char('c') | KeyCode::Char('C') => self.cursor = None,
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let channels = self.engine.channels();
        let hit = self.layout.hit(mouse.column, mouse.row, channels);

        match mouse.kind {
            MouseEventKind::ScrollUp => self.engine.zoom_vertical(WHEEL_ZOOM_IN),
            MouseEventKind::ScrollDown => self.engine.zoom_vertical(WHEEL_ZOOM_OUT),
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(hit) = level_click(hit, self.engine.trigger_enabled()) {
                    self.engine
                        .set_trigger_level_from_pixel(hit.y, hit.channel_height);
                }
            }
            MouseEventKind::Down(MouseButton::Right) => self.drag_column = Some(mouse.column),
            MouseEventKind::Drag(MouseButton::Right) => {
                if let Some(start) = self.drag_column {
                    self.engine
                        .nudge_display_time(drag_pixels(start, mouse.column));
                    self.drag_column = Some(mouse.column);
                }
            }
            MouseEventKind::Up(MouseButton::Right) => self.drag_column = None,
            MouseEventKind::Moved => {
                self.cursor = hit.map(|hit| Cursor {
                    pixel_x: hit.pixel_x,
                    channel: hit.channel,
                });
            }
            _ => {}
        }
    }
}
