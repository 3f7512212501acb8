//! Fixed-layout raster drawing: plot area, colour bar, ticks and a small
//! bitmap font. Every coordinate is a constant so output never depends on
//! anything but the data.

use image::{Rgb, RgbImage};

use super::colormap::magma;
use super::stft::{DISPLAY_N_FFT, DISPLAY_TOP_DB, DbSpectrogram};

/// Canvas width in pixels (10 units at 100 px per unit).
pub const CANVAS_WIDTH: u32 = 1000;
/// Canvas height in pixels (6 units at 100 px per unit).
pub const CANVAS_HEIGHT: u32 = 600;

const PLOT_LEFT: u32 = 90;
const PLOT_TOP: u32 = 60;
const PLOT_WIDTH: u32 = 700;
const PLOT_HEIGHT: u32 = 470;
const BAR_LEFT: u32 = 810;
const BAR_WIDTH: u32 = 24;
const TICK_LEN: u32 = 5;
const DB_TICK_STEP: f32 = 10.0;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const INK: Rgb<u8> = Rgb([0, 0, 0]);

pub(crate) fn draw(spec: &DbSpectrogram, sample_rate: u32, duration_seconds: f32) -> RgbImage {
    let mut image = RgbImage::from_pixel(CANVAS_WIDTH, CANVAS_HEIGHT, BACKGROUND);
    paint_plot(&mut image, spec, sample_rate);
    paint_frame(&mut image, PLOT_LEFT, PLOT_TOP, PLOT_WIDTH, PLOT_HEIGHT);
    paint_frequency_ticks(&mut image, sample_rate);
    paint_time_ticks(&mut image, duration_seconds);
    paint_colour_bar(&mut image);
    let title = "Spectrogram";
    let title_x = PLOT_LEFT + PLOT_WIDTH / 2 - text_width(title, 2) / 2;
    draw_text(&mut image, title, title_x, 22, 2);
    image
}

/// Lowest displayed frequency: the first non-DC bin.
fn min_frequency(sample_rate: u32) -> f32 {
    sample_rate as f32 / DISPLAY_N_FFT as f32
}

fn max_frequency(sample_rate: u32) -> f32 {
    sample_rate as f32 / 2.0
}

/// Frequency shown at a vertical offset from the top of the plot.
fn row_frequency(row: u32, sample_rate: u32) -> f32 {
    let lo = min_frequency(sample_rate).ln();
    let hi = max_frequency(sample_rate).ln();
    let t = 1.0 - (row as f32 + 0.5) / PLOT_HEIGHT as f32;
    (lo + (hi - lo) * t).exp()
}

/// Vertical offset from the top of the plot for a frequency, if it is on the axis.
fn frequency_row(freq: f32, sample_rate: u32) -> Option<u32> {
    let lo = min_frequency(sample_rate);
    let hi = max_frequency(sample_rate);
    if freq < lo || freq > hi || hi <= lo {
        return None;
    }
    let t = (freq.ln() - lo.ln()) / (hi.ln() - lo.ln());
    Some((((1.0 - t) * PLOT_HEIGHT as f32).round() as u32).min(PLOT_HEIGHT - 1))
}

fn paint_plot(image: &mut RgbImage, spec: &DbSpectrogram, sample_rate: u32) {
    let bin_hz = sample_rate as f32 / DISPLAY_N_FFT as f32;
    let row_bins: Vec<usize> = (0..PLOT_HEIGHT)
        .map(|row| {
            let bin = (row_frequency(row, sample_rate) / bin_hz).round() as usize;
            bin.clamp(1, spec.bins - 1)
        })
        .collect();
    for col in 0..PLOT_WIDTH {
        let frame = ((col as usize * spec.frames) / PLOT_WIDTH as usize).min(spec.frames - 1);
        for (row, &bin) in row_bins.iter().enumerate() {
            let value = (spec.at(frame, bin) + DISPLAY_TOP_DB) / DISPLAY_TOP_DB;
            image.put_pixel(PLOT_LEFT + col, PLOT_TOP + row as u32, Rgb(magma(value)));
        }
    }
}

fn paint_frequency_ticks(image: &mut RgbImage, sample_rate: u32) {
    let mut freq = 10.0_f32;
    while freq <= max_frequency(sample_rate) {
        if let Some(row) = frequency_row(freq, sample_rate) {
            let y = PLOT_TOP + row;
            hline(image, PLOT_LEFT - TICK_LEN, PLOT_LEFT, y);
            let label = format!("{} Hz", freq as u32);
            let x = PLOT_LEFT - TICK_LEN - 3 - text_width(&label, 1);
            draw_text(image, &label, x, y.saturating_sub(3), 1);
        }
        freq *= 10.0;
    }
}

fn paint_time_ticks(image: &mut RgbImage, duration_seconds: f32) {
    if !(duration_seconds > 0.0) {
        return;
    }
    let step = time_tick_step(duration_seconds);
    let decimals = if step < 1.0 { 1 } else { 0 };
    let baseline = PLOT_TOP + PLOT_HEIGHT;
    let mut index = 0u32;
    loop {
        let t = step * index as f32;
        if t > duration_seconds {
            break;
        }
        let x = PLOT_LEFT
            + ((t / duration_seconds) * (PLOT_WIDTH - 1) as f32).round() as u32;
        vline(image, x, baseline, baseline + TICK_LEN);
        let label = format!("{t:.decimals$}s");
        let label_x = x.saturating_sub(text_width(&label, 1) / 2);
        draw_text(image, &label, label_x, baseline + TICK_LEN + 4, 1);
        index += 1;
    }
}

/// Smallest 1-2-5 step giving at most eight time ticks.
fn time_tick_step(duration_seconds: f32) -> f32 {
    let mut magnitude = 0.01_f32;
    loop {
        for factor in [1.0_f32, 2.0, 5.0] {
            let step = magnitude * factor;
            if duration_seconds / step <= 8.0 {
                return step;
            }
        }
        magnitude *= 10.0;
    }
}

fn paint_colour_bar(image: &mut RgbImage) {
    for row in 0..PLOT_HEIGHT {
        let value = 1.0 - (row as f32 + 0.5) / PLOT_HEIGHT as f32;
        let colour = Rgb(magma(value));
        for col in 0..BAR_WIDTH {
            image.put_pixel(BAR_LEFT + col, PLOT_TOP + row, colour);
        }
    }
    paint_frame(image, BAR_LEFT, PLOT_TOP, BAR_WIDTH, PLOT_HEIGHT);

    let ticks = colour_bar_tick_count();
    for tick in 0..=ticks {
        let row = ((tick as f32 / ticks as f32) * (PLOT_HEIGHT - 1) as f32).round() as u32;
        let y = PLOT_TOP + row;
        let right = BAR_LEFT + BAR_WIDTH;
        hline(image, right, right + TICK_LEN, y);
        let label = colour_bar_label(tick);
        draw_text(image, &label, right + TICK_LEN + 3, y.saturating_sub(3), 1);
    }
}

fn colour_bar_tick_count() -> u32 {
    (DISPLAY_TOP_DB / DB_TICK_STEP) as u32
}

/// Tick 0 is the top of the bar (`+0 dB`); each step down is `DB_TICK_STEP` quieter.
fn colour_bar_label(tick: u32) -> String {
    let db = -(tick as i32) * DB_TICK_STEP as i32;
    format!("{db:+} dB")
}

fn paint_frame(image: &mut RgbImage, left: u32, top: u32, width: u32, height: u32) {
    hline(image, left, left + width, top);
    hline(image, left, left + width, top + height - 1);
    vline(image, left, top, top + height);
    vline(image, left + width - 1, top, top + height);
}

fn hline(image: &mut RgbImage, x0: u32, x1: u32, y: u32) {
    for x in x0..x1 {
        put(image, x, y, INK);
    }
}

fn vline(image: &mut RgbImage, x: u32, y0: u32, y1: u32) {
    for y in y0..y1 {
        put(image, x, y, INK);
    }
}

fn put(image: &mut RgbImage, x: u32, y: u32, colour: Rgb<u8>) {
    if x < image.width() && y < image.height() {
        image.put_pixel(x, y, colour);
    }
}

const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;
const GLYPH_ADVANCE: u32 = GLYPH_WIDTH + 1;

pub(crate) fn text_width(text: &str, scale: u32) -> u32 {
    text.chars().count() as u32 * GLYPH_ADVANCE * scale
}

pub(crate) fn draw_text(image: &mut RgbImage, text: &str, x: u32, y: u32, scale: u32) {
    for (index, ch) in text.chars().enumerate() {
        let Some(rows) = glyph(ch) else {
            continue;
        };
        let origin_x = x + index as u32 * GLYPH_ADVANCE * scale;
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                    continue;
                }
                for dy in 0..scale {
                    for dx in 0..scale {
                        put(
                            image,
                            origin_x + col * scale + dx,
                            y + row as u32 * scale + dy,
                            INK,
                        );
                    }
                }
            }
        }
    }
}

/// 5x7 glyphs, one byte per row, most significant of the low five bits leftmost.
fn glyph(ch: char) -> Option<[u8; GLYPH_HEIGHT as usize]> {
    let rows = match ch {
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
        '3' => [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        '+' => [0b00000, 0b00100, 0b00100, 0b11111, 0b00100, 0b00100, 0b00000],
        '-' => [0b00000, 0b00000, 0b00000, 0b11111, 0b00000, 0b00000, 0b00000],
        '.' => [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b01100, 0b01100],
        'B' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110],
        'H' => [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'S' => [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110],
        'a' => [0b00000, 0b00000, 0b01110, 0b00001, 0b01111, 0b10001, 0b01111],
        'c' => [0b00000, 0b00000, 0b01110, 0b10000, 0b10000, 0b10001, 0b01110],
        'd' => [0b00001, 0b00001, 0b01101, 0b10011, 0b10001, 0b10011, 0b01101],
        'e' => [0b00000, 0b00000, 0b01110, 0b10001, 0b11111, 0b10000, 0b01110],
        'g' => [0b00000, 0b01111, 0b10001, 0b10001, 0b01111, 0b00001, 0b01110],
        'm' => [0b00000, 0b00000, 0b11010, 0b10101, 0b10101, 0b10001, 0b10001],
        'o' => [0b00000, 0b00000, 0b01110, 0b10001, 0b10001, 0b10001, 0b01110],
        'p' => [0b00000, 0b00000, 0b11110, 0b10001, 0b11110, 0b10000, 0b10000],
        'r' => [0b00000, 0b00000, 0b10110, 0b11001, 0b10000, 0b10000, 0b10000],
        's' => [0b00000, 0b00000, 0b01110, 0b10000, 0b01110, 0b00001, 0b11110],
        't' => [0b01000, 0b01000, 0b11100, 0b01000, 0b01000, 0b01001, 0b00110],
        'z' => [0b00000, 0b00000, 0b11111, 0b00010, 0b00100, 0b01000, 0b11111],
        _ => return None,
    };
    Some(rows)
}
