// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Output sink
//!
//! Serializes emitted values to a writer in one of three layouts. The
//! layout is chosen once and passed to [`OutputSink::new`]; nothing here
//! consults the terminal or the environment.

use std::io::{self, Write};

use nu_ansi_term::{Color, Style};
use serde::Serialize;
use serde_json::Serializer;
use serde_json::ser::{Formatter, PrettyFormatter};

use crate::error::Error;

/// Styles applied to each kind of JSON token in colored output
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScheme {
    /// `null`
    pub null: Style,
    /// `true` and `false`
    pub boolean: Style,
    /// Numbers
    pub number: Style,
    /// String values
    pub string: Style,
    /// Object keys
    pub key: Style,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            null: Color::DarkGray.normal(),
            boolean: Color::Yellow.normal(),
            number: Color::Cyan.normal(),
            string: Color::Green.normal(),
            key: Color::Blue.bold(),
        }
    }
}

/// Settings for indented output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrettyConfig {
    /// Spaces per nesting level
    pub indent: usize,
    /// Colorize tokens with [`ColorScheme::default`]
    pub color: bool,
}

impl Default for PrettyConfig {
    fn default() -> Self {
        Self {
            indent: 2,
            color: false,
        }
    }
}

/// How each emitted value is laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Compact JSON with nothing between values
    #[default]
    Plain,
    /// Compact JSON followed by a newline
    Lines,
    /// Indented JSON followed by a newline
    Pretty(PrettyConfig),
}

/// Writes one serialized unit per emitted value
#[derive(Debug)]
pub struct OutputSink<W: Write> {
    writer: W,
    format: OutputFormat,
    scheme: ColorScheme,
}

impl<W: Write> OutputSink<W> {
    /// Create a sink over `writer`
    pub fn new(writer: W, format: OutputFormat) -> Self {
        Self {
            writer,
            format,
            scheme: ColorScheme::default(),
        }
    }

    /// The layout this sink writes
    #[must_use]
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Consume the sink and return the writer
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Serialize and write one value, then flush
    ///
    /// # Errors
    ///
    /// Returns `Error::Serialization` if the value cannot be represented as
    /// JSON and `Error::Write` if the writer fails.
    pub fn emit<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
        match self.format {
            OutputFormat::Plain => {
                serde_json::to_writer(&mut self.writer, value)?;
            }
            OutputFormat::Lines => {
                serde_json::to_writer(&mut self.writer, value)?;
                self.writer.write_all(b"\n")?;
            }
            OutputFormat::Pretty(config) => {
                let indent = " ".repeat(config.indent);
                let pretty = PrettyFormatter::with_indent(indent.as_bytes());
                if config.color {
                    let formatter = ColorFormatter::new(pretty, self.scheme);
                    value.serialize(&mut Serializer::with_formatter(&mut self.writer, formatter))?;
                } else {
                    value.serialize(&mut Serializer::with_formatter(&mut self.writer, pretty))?;
                }
                self.writer.write_all(b"\n")?;
            }
        }
        self.writer.flush()?;
        Ok(())
    }
}

/// Pretty layout with each scalar token wrapped in its scheme's escapes
struct ColorFormatter<'a> {
    inner: PrettyFormatter<'a>,
    scheme: ColorScheme,
    in_key: bool,
}

impl<'a> ColorFormatter<'a> {
    fn new(inner: PrettyFormatter<'a>, scheme: ColorScheme) -> Self {
        Self {
            inner,
            scheme,
            in_key: false,
        }
    }

    /// Write `token` inside `style`; keys are painted whole by the string hooks
    fn paint<W, F>(&mut self, writer: &mut W, style: Style, token: F) -> io::Result<()>
    where
        W: ?Sized + Write,
        F: FnOnce(&mut PrettyFormatter<'a>, &mut W) -> io::Result<()>,
    {
        if self.in_key {
            return token(&mut self.inner, writer);
        }
        write!(writer, "{}", style.prefix())?;
        token(&mut self.inner, writer)?;
        write!(writer, "{}", style.suffix())
    }
}

macro_rules! paint_numbers {
    ($($method:ident: $ty:ty),* $(,)?) => {
        $(
            fn $method<W: ?Sized + Write>(&mut self, writer: &mut W, value: $ty) -> io::Result<()> {
                let style = self.scheme.number;
                self.paint(writer, style, |inner, w| inner.$method(w, value))
            }
        )*
    };
}

impl Formatter for ColorFormatter<'_> {
    fn write_null<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        let style = self.scheme.null;
        self.paint(writer, style, |inner, w| inner.write_null(w))
    }

    fn write_bool<W: ?Sized + Write>(&mut self, writer: &mut W, value: bool) -> io::Result<()> {
        let style = self.scheme.boolean;
        self.paint(writer, style, |inner, w| inner.write_bool(w, value))
    }

    paint_numbers! {
        write_i8: i8,
        write_i16: i16,
        write_i32: i32,
        write_i64: i64,
        write_i128: i128,
        write_u8: u8,
        write_u16: u16,
        write_u32: u32,
        write_u64: u64,
        write_u128: u128,
        write_f32: f32,
        write_f64: f64,
    }

    fn write_number_str<W: ?Sized + Write>(&mut self, writer: &mut W, value: &str) -> io::Result<()> {
        let style = self.scheme.number;
        self.paint(writer, style, |inner, w| inner.write_number_str(w, value))
    }

    fn begin_string<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        let style = if self.in_key { self.scheme.key } else { self.scheme.string };
        write!(writer, "{}", style.prefix())?;
        self.inner.begin_string(writer)
    }

    fn end_string<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        let style = if self.in_key { self.scheme.key } else { self.scheme.string };
        self.inner.end_string(writer)?;
        write!(writer, "{}", style.suffix())
    }

    fn begin_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_array(writer)
    }

    fn end_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.inner.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_object(writer)
    }

    fn end_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.inner.begin_object_key(writer, first)?;
        self.in_key = true;
        Ok(())
    }

    fn end_object_key<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.in_key = false;
        self.inner.end_object_key(writer)
    }

    fn begin_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_object_value(writer)
    }
}
