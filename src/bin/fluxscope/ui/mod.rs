//! TUI module for fluxscope
//!
//! One braille canvas strip per channel, a controls panel and a help bar.

mod controls;
mod scope;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use fluxscope::{engine::ScopeEngine, io::BackendInfo};

use controls::render_controls;
use scope::render_channel;

/// Braille dots per terminal cell.
pub const DOTS_PER_CELL_X: i32 = 2;
pub const DOTS_PER_CELL_Y: i32 = 4;

const CONTROLS_WIDTH: u16 = 30;

/// Mouse-hover cursor, in display pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub pixel_x: usize,
    pub channel: usize,
}

pub struct ViewState<'a> {
    pub engine: &'a ScopeEngine,
    pub backend: Option<&'a BackendInfo>,
    pub cursor: Option<Cursor>,
}

/// A mouse position resolved against the plot area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotHit {
    pub pixel_x: usize,
    pub channel: usize,
    /// Dot row within the channel strip, from its top.
    pub y: f32,
    /// Channel strip height in dots.
    pub channel_height: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScopeLayout {
    pub scope: Rect,
    pub plot: Rect,
    pub controls: Rect,
    pub help: Rect,
}

impl ScopeLayout {
    pub fn new(area: Rect) -> Self {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(4), Constraint::Length(1)])
            .split(area);
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(10), Constraint::Length(CONTROLS_WIDTH)])
            .split(rows[0]);

        let scope = columns[0];
        Self {
            scope,
            plot: scope_block().inner(scope),
            controls: columns[1],
            help: rows[1],
        }
    }

    /// Horizontal resolution handed to the reducer.
    pub fn pixel_width(&self) -> usize {
        self.plot.width as usize * DOTS_PER_CELL_X as usize
    }

    /// Equal-height strips, one per channel.
    pub fn channel_rects(&self, channels: usize) -> Vec<Rect> {
        let channels = channels.max(1) as u32;
        Layout::default()
            .direction(Direction::Vertical)
            .constraints((0..channels).map(|_| Constraint::Ratio(1, channels)))
            .split(self.plot)
            .to_vec()
    }

    pub fn hit(&self, column: u16, row: u16, channels: usize) -> Option<PlotHit> {
        let plot = self.plot;
        if column < plot.x || column >= plot.x + plot.width {
            return None;
        }
        let (channel, strip) = self
            .channel_rects(channels)
            .into_iter()
            .enumerate()
            .find(|(_, r)| row >= r.y && row < r.y + r.height)?;

        let dots_y = DOTS_PER_CELL_Y as f32;
        Some(PlotHit {
            pixel_x: (column - plot.x) as usize * DOTS_PER_CELL_X as usize,
            channel,
            y: (row - strip.y) as f32 * dots_y + dots_y * 0.5,
            channel_height: strip.height as f32 * dots_y,
        })
    }
}

fn scope_block() -> Block<'static> {
    Block::default().title(" fluxscope ").borders(Borders::ALL)
}

/// Render the whole screen
pub fn render(frame: &mut Frame, layout: &ScopeLayout, view: &ViewState) {
    frame.render_widget(scope_block(), layout.scope);

    let channels = view.engine.channels();
    for (channel, area) in layout.channel_rects(channels).into_iter().enumerate() {
        render_channel(frame, area, view, channel);
    }

    render_controls(frame, layout.controls, view);

    let help = Paragraph::new(
        " [Q] Quit  [T] Trigger  [+/-] Level  [↑/↓] Scale  [←/→] Time  [C] Cursor off  \
         Mouse: wheel scale, left click level, right drag time",
    )
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, layout.help);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plot_sits_inside_the_border() {
        let layout = ScopeLayout::new(Rect::new(0, 0, 100, 30));
        assert_eq!(layout.plot, Rect::new(1, 1, 68, 27));
        assert_eq!(layout.pixel_width(), 136);
        assert_eq!(layout.help.y, 29);
    }

    #[test]
    fn hits_resolve_to_channel_strips() {
        let layout = ScopeLayout::new(Rect::new(0, 0, 100, 30));
        assert_eq!(layout.hit(0, 5, 2), None);

        let top = layout.hit(11, 1, 3).unwrap();
        assert_eq!(top.channel, 0);
        assert_eq!(top.pixel_x, 20);
        assert_eq!(top.y, 2.0);
        assert_eq!(top.channel_height, 36.0);

        let bottom = layout.hit(11, 27, 3).unwrap();
        assert_eq!(bottom.channel, 2);
    }
}
