//! Line-oriented surface for pipes and logs.

use std::io::{self, Write};

use serde::Serialize;

use crate::view::{Align, Column, ViewRow};

use super::screen::{Screen, Surface};

/// How [`StdoutSurface`] writes each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Title, headings, rows and totals as aligned text, blank-line separated.
    #[default]
    Text,
    /// One JSON object per frame per line.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown format {:?}, expected text or json", other)),
        }
    }
}

#[derive(Serialize)]
struct JsonFrame<'a> {
    time: &'a str,
    view: &'a str,
    relative: bool,
    status: &'a str,
    #[serde(flatten)]
    records: &'a serde_json::Value,
}

/// Writes frames to any [`Write`], by default stdout.
pub struct StdoutSurface<W: Write = io::Stdout> {
    out: W,
    format: OutputFormat,
    width: u16,
    height: u16,
}

impl StdoutSurface {
    pub fn stdout(format: OutputFormat) -> Self {
        Self::new(io::stdout(), format)
    }
}

impl<W: Write> StdoutSurface<W> {
    /// There is no screen to fit, so every row is printed.
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self {
            out,
            format,
            width: u16::MAX,
            height: u16::MAX,
        }
    }

    /// Limits rows per frame as if the output were `height` lines tall.
    pub fn with_height(mut self, height: u16) -> Self {
        self.height = height;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_text(&mut self, screen: &Screen) -> io::Result<()> {
        writeln!(self.out, "{}", screen.title)?;
        let mode = if screen.relative { "rel" } else { "abs" };
        writeln!(self.out, "[{}] {} {}", screen.view.name(), mode, screen.status)?;
        let headings: Vec<String> = screen
            .headings
            .iter()
            .map(|c| c.header.to_string())
            .collect();
        writeln!(self.out, "{}", text_line(&headings, &screen.headings))?;
        for row in &screen.lines.rows {
            write_row(&mut self.out, row, &screen.headings)?;
        }
        write_row(&mut self.out, &screen.lines.totals, &screen.headings)?;
        writeln!(self.out)?;
        self.out.flush()
    }

    fn write_json(&mut self, screen: &Screen) -> io::Result<()> {
        let empty = serde_json::Value::Object(serde_json::Map::new());
        let frame = JsonFrame {
            time: &screen.clock,
            view: screen.view.name(),
            relative: screen.relative,
            status: &screen.status,
            records: screen.records.as_ref().unwrap_or(&empty),
        };
        serde_json::to_writer(&mut self.out, &frame).map_err(io::Error::other)?;
        writeln!(self.out)?;
        self.out.flush()
    }
}

fn write_row<W: Write>(out: &mut W, row: &ViewRow, columns: &[Column]) -> io::Result<()> {
    writeln!(out, "{}", text_line(&row.cells, columns))
}

fn text_line(cells: &[String], columns: &[Column]) -> String {
    let last = columns.len().saturating_sub(1);
    let parts: Vec<String> = cells
        .iter()
        .zip(columns)
        .enumerate()
        .map(|(i, (text, c))| {
            let width = usize::from(c.width);
            match c.align {
                Align::Right => format!("{:>width$}", text),
                Align::Left if i == last => text.clone(),
                Align::Left => format!("{:<width$}", text),
            }
        })
        .collect();
    parts.join(" ")
}

impl<W: Write> Surface for StdoutSurface<W> {
    fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    fn clear(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn draw(&mut self, screen: &Screen) -> io::Result<()> {
        if screen.help {
            return Ok(());
        }
        match self.format {
            OutputFormat::Text => self.write_text(screen),
            OutputFormat::Json => self.write_json(screen),
        }
    }

    fn wants_records(&self) -> bool {
        self.format == OutputFormat::Json
    }

    fn finish(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{Lines, RowStyleClass, ViewKind};

    fn screen() -> Screen {
        Screen {
            clock: "12:00:00".to_string(),
            title: "myglot test".to_string(),
            status: "Mutex wait latency by instrument".to_string(),
            view: ViewKind::Mutex,
            relative: true,
            headings: vec![Column::right("Latency", 8), Column::left("Name", 10)],
            lines: Lines {
                rows: vec![ViewRow {
                    cells: vec!["1.00 us".to_string(), "sql/LOCK_open".to_string()],
                    style: RowStyleClass::Critical,
                }],
                totals: ViewRow {
                    cells: vec!["1.00 us".to_string(), "Totals".to_string()],
                    style: RowStyleClass::Totals,
                },
            },
            help: false,
            records: Some(serde_json::json!({"rows": [{"name": "x"}], "totals": {"name": "Totals"}})),
        }
    }

    #[test]
    fn text_frame_is_aligned() {
        let mut surface = StdoutSurface::new(Vec::new(), OutputFormat::Text);
        surface.draw(&screen()).unwrap();
        let text = String::from_utf8(surface.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "myglot test");
        assert_eq!(lines[1], "[mutex] rel Mutex wait latency by instrument");
        assert_eq!(lines[2], " Latency Name");
        assert_eq!(lines[3], " 1.00 us sql/LOCK_open");
        assert_eq!(lines[4], " 1.00 us Totals");
        assert_eq!(lines[5], "");
    }

    #[test]
    fn json_frame_is_one_line() {
        let mut surface = StdoutSurface::new(Vec::new(), OutputFormat::Json);
        assert!(surface.wants_records());
        surface.draw(&screen()).unwrap();
        let text = String::from_utf8(surface.into_inner()).unwrap();
        assert_eq!(text.lines().count(), 1);

        let value: serde_json::Value = serde_json::from_str(text.trim()).unwrap();
        assert_eq!(value["view"], "mutex");
        assert_eq!(value["relative"], true);
        assert_eq!(value["rows"][0]["name"], "x");
        assert_eq!(value["totals"]["name"], "Totals");
    }

    #[test]
    fn help_frames_are_skipped() {
        let mut surface = StdoutSurface::new(Vec::new(), OutputFormat::Text);
        let mut s = screen();
        s.help = true;
        surface.draw(&s).unwrap();
        assert!(surface.into_inner().is_empty());
    }

    #[test]
    fn parses_format_names() {
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert!("xml".parse::<OutputFormat>().is_err());
    }
}
