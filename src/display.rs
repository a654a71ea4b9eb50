//! Frame composition and framebuffer output. Aircraft are picked in priority
//! order, drawn as colored text lines below a temperature/clock header, and
//! the finished RGB565 frame is written whole to the framebuffer device.

use std::io;
use std::path::Path;

use chrono::{DateTime, Local};
use embedded_graphics::{
    mono_font::{ascii::FONT_6X10, ascii::FONT_8X13, MonoTextStyle},
    pixelcolor::{raw::RawU16, Rgb565},
    prelude::*,
    text::{Baseline, Text},
};

use crate::aircraft::{Aircraft, DisplayPriority};

pub const FRAME_WIDTH: u32 = 320;
pub const FRAME_HEIGHT: u32 = 240;

const HEADER_ORIGIN: Point = Point::new(5, 5);
const LIST_TOP: i32 = 25;
const LINE_SPACING: i32 = 18;

/// Picks the aircraft to render: all High priority first, then Medium, then
/// Low, each bucket keeping its distance-ascending order, truncated to
/// `max_count`. Priority decides who gets a slot; distance decides the order
/// within a tier.
pub fn select_for_display(sorted: &[Aircraft], max_count: usize) -> Vec<Aircraft> {
    let mut selected = Vec::with_capacity(max_count.min(sorted.len()));
    for priority in [
        DisplayPriority::High,
        DisplayPriority::Medium,
        DisplayPriority::Low,
    ] {
        for ac in sorted.iter().filter(|ac| ac.priority == priority) {
            if selected.len() == max_count {
                return selected;
            }
            selected.push(ac.clone());
        }
    }
    selected
}

/// An in-memory 320x240 RGB565 frame, stored low byte first as the
/// framebuffer expects it.
pub struct Frame {
    data: Vec<u8>,
}

impl Frame {
    pub fn new() -> Frame {
        Frame {
            data: vec![0; (FRAME_WIDTH * FRAME_HEIGHT * 2) as usize],
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    fn set_pixel(&mut self, x: u32, y: u32, color: Rgb565) {
        let value = RawU16::from(color).into_inner();
        let offset = ((y * FRAME_WIDTH + x) * 2) as usize;
        self.data[offset] = (value & 0xff) as u8;
        self.data[offset + 1] = (value >> 8) as u8;
    }
}

impl Default for Frame {
    fn default() -> Frame {
        Frame::new()
    }
}

impl OriginDimensions for Frame {
    fn size(&self) -> Size {
        Size::new(FRAME_WIDTH, FRAME_HEIGHT)
    }
}

impl DrawTarget for Frame {
    type Color = Rgb565;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x >= 0
                && point.y >= 0
                && (point.x as u32) < FRAME_WIDTH
                && (point.y as u32) < FRAME_HEIGHT
            {
                self.set_pixel(point.x as u32, point.y as u32, color);
            }
        }
        Ok(())
    }
}

fn priority_color(priority: DisplayPriority) -> Rgb565 {
    match priority {
        DisplayPriority::High => Rgb565::RED,
        DisplayPriority::Medium => Rgb565::YELLOW,
        DisplayPriority::Low => Rgb565::GREEN,
    }
}

fn format_aircraft_line(ac: &Aircraft) -> String {
    let ac_type = ac.aircraft_type.as_deref().unwrap_or("?");
    let altitude = match ac.altitude_baro {
        Some(feet) => format!("{}ft", feet as i64),
        None => String::from("?ft"),
    };
    let speed = match ac.ground_speed {
        Some(knots) => format!("{}kt", knots as i64),
        None => String::from("?kt"),
    };
    format!(
        "{:.1}km {} {} {} {}",
        ac.distance_km,
        ac_type,
        ac.display_ident(),
        altitude,
        speed
    )
}

/// Draws the temperature/clock header and one line per selected aircraft,
/// colored by priority.
pub fn render_frame(temperature_c: f64, selection: &[Aircraft], now: DateTime<Local>) -> Frame {
    let mut frame = Frame::new();

    let header = format!("{:.1} C - {}", temperature_c, now.format("%H:%M %d/%m/%Y"));
    let header_style = MonoTextStyle::new(&FONT_8X13, Rgb565::WHITE);
    Text::with_baseline(&header, HEADER_ORIGIN, header_style, Baseline::Top)
        .draw(&mut frame)
        .ok();

    let mut y = LIST_TOP;
    for ac in selection {
        let line = format_aircraft_line(ac);
        let style = MonoTextStyle::new(&FONT_6X10, priority_color(ac.priority));
        Text::with_baseline(&line, Point::new(5, y), style, Baseline::Top)
            .draw(&mut frame)
            .ok();
        y += LINE_SPACING;
    }

    frame
}

/// Writes the finished frame to the framebuffer device in one shot.
pub fn write_to_framebuffer(frame: &Frame, device: &Path) -> io::Result<()> {
    std::fs::write(device, frame.as_bytes())
}
