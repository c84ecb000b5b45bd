//! Scope canvas - one channel strip

use ratatui::{
    layout::Rect,
    style::Color,
    symbols::Marker,
    widgets::canvas::{Canvas, Context, Line},
    Frame,
};

use fluxscope::{display::ReductionMode, ColumnColor, ScrollSplit};

use super::ViewState;

const GRID_COLOR: Color = Color::Rgb(40, 40, 40);
const TRIGGER_COLOR: Color = Color::Yellow;
const CURSOR_COLOR: Color = Color::Gray;

fn rgb(color: ColumnColor) -> Color {
    let (r, g, b) = color.to_rgb8();
    Color::Rgb(r, g, b)
}

/// Render one channel of the current traces into `area`.
pub fn render_channel(frame: &mut Frame, area: Rect, view: &ViewState, channel: usize) {
    let engine = view.engine;
    let width = engine.pixel_width();
    if width == 0 || area.height == 0 {
        return;
    }
    let x_max = (width - 1).max(1) as f64;
    let scaling = engine.vertical_scaling();
    let trigger = engine.trigger_enabled().then(|| engine.trigger_level());

    let canvas = Canvas::default()
        .marker(Marker::Braille)
        .x_bounds([0.0, x_max])
        .y_bounds([-1.0, 1.0])
        .paint(|ctx| {
            draw_grid(ctx, x_max);
            if let Some(level) = trigger {
                let y = (level * scaling) as f64;
                ctx.draw(&Line::new(0.0, y, x_max, y, TRIGGER_COLOR));
            }
            ctx.layer();

            draw_trace(ctx, view, channel, engine.scroll_split());

            if let Some(cursor) = view.cursor.filter(|c| c.channel == channel) {
                let x = cursor.pixel_x as f64;
                ctx.draw(&Line::new(x, -1.0, x, 1.0, CURSOR_COLOR));
                if let Ok(readout) = engine.cursor_readout(cursor.pixel_x, channel) {
                    let text = format!("+{:.2}ms Value: {:7.4}", readout.time_ms, readout.value);
                    ctx.print(0.0, 1.0, text);
                }
            }
        });

    frame.render_widget(canvas, area);
}

fn draw_grid(ctx: &mut Context, x_max: f64) {
    ctx.draw(&Line::new(0.0, 0.0, x_max, 0.0, GRID_COLOR));
    for i in 1..10 {
        let x = x_max * i as f64 / 10.0;
        ctx.draw(&Line::new(x, -1.0, x, 1.0, GRID_COLOR));
    }
}

fn draw_trace(ctx: &mut Context, view: &ViewState, channel: usize, split: ScrollSplit) {
    let engine = view.engine;
    let reducer = engine.reducer();
    let Some(trace) = reducer.trace(channel) else {
        return;
    };
    let scaling = engine.vertical_scaling();
    let plot_y = |value: f32| f64::from((value * scaling).clamp(-1.0, 1.0));
    let columns = trace.colors.len();

    match reducer.mode() {
        ReductionMode::Direct => {
            let mut previous: Option<(f64, f64)> = None;
            for screen_x in 0..columns {
                let column = split.column_for_screen(screen_x);
                let (Some(point), Some(&color)) =
                    (trace.points.get(column), trace.colors.get(column))
                else {
                    continue;
                };
                let here = (screen_x as f64, plot_y(point.y));
                let (x1, y1) = previous.unwrap_or(here);
                ctx.draw(&Line::new(x1, y1, here.0, here.1, rgb(color)));
                previous = Some(here);
            }
        }
        ReductionMode::Envelope => {
            for screen_x in 0..columns {
                let column = split.column_for_screen(screen_x);
                let (Some(top), Some(bottom), Some(&color)) = (
                    trace.points.get(column * 2),
                    trace.points.get(column * 2 + 1),
                    trace.colors.get(column),
                ) else {
                    continue;
                };
                let x = screen_x as f64;
                ctx.draw(&Line::new(x, plot_y(top.y), x, plot_y(bottom.y), rgb(color)));
            }
        }
    }
}
