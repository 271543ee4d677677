//! Output handlers rendering streamed class metrics.
//!
//! The engine pushes one result at a time into a [`MetricsHandler`]; the
//! handler writes it straight to the underlying sink in its format. Nothing is
//! buffered and re-encoded, so the format has to be chosen before the engine
//! produces its first result.

use std::io::{self, Write};

use quick_xml::escape::escape;

use crate::core::config::OutputFormat;
use crate::engine::metrics::{ClassMetrics, METRIC_NAMES};

/// Receiver for streamed metric results.
pub trait MetricsHandler {
    /// Called once before the first result.
    fn begin(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Render the metrics of one class.
    fn handle_class(&mut self, name: &str, metrics: &ClassMetrics) -> io::Result<()>;

    /// Called once after the last result.
    fn end(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// One line per class: the class name followed by its metric values.
#[derive(Debug)]
pub struct PlainTextHandler<W: Write> {
    sink: W,
}

impl<W: Write> PlainTextHandler<W> {
    /// Wrap a sink.
    pub fn new(sink: W) -> Self {
        Self { sink }
    }

    /// Give back the sink.
    pub fn into_inner(self) -> W {
        self.sink
    }
}

impl<W: Write> MetricsHandler for PlainTextHandler<W> {
    fn handle_class(&mut self, name: &str, metrics: &ClassMetrics) -> io::Result<()> {
        writeln!(self.sink, "{name} {metrics}")
    }
}

/// A single `<ckjm>` document with one `<class>` element per result.
#[derive(Debug)]
pub struct XmlHandler<W: Write> {
    sink: W,
}

impl<W: Write> XmlHandler<W> {
    /// Wrap a sink.
    pub fn new(sink: W) -> Self {
        Self { sink }
    }

    /// Give back the sink.
    pub fn into_inner(self) -> W {
        self.sink
    }
}

impl<W: Write> MetricsHandler for XmlHandler<W> {
    fn begin(&mut self) -> io::Result<()> {
        writeln!(self.sink, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
        writeln!(self.sink, "<ckjm>")
    }

    fn handle_class(&mut self, name: &str, metrics: &ClassMetrics) -> io::Result<()> {
        writeln!(self.sink, "  <class>")?;
        writeln!(self.sink, "    <name>{}</name>", escape(name))?;
        for (tag, value) in METRIC_NAMES.iter().zip(metrics.values()) {
            writeln!(self.sink, "    <{tag}>{value}</{tag}>")?;
        }
        writeln!(self.sink, "  </class>")
    }

    fn end(&mut self) -> io::Result<()> {
        writeln!(self.sink, "</ckjm>")
    }
}

/// Handler chosen for a run.
#[derive(Debug)]
pub enum OutputHandler<W: Write> {
    /// Plain-text rendering
    Plain(PlainTextHandler<W>),
    /// XML rendering
    Xml(XmlHandler<W>),
}

impl<W: Write> OutputHandler<W> {
    /// Format this handler renders.
    pub fn format(&self) -> OutputFormat {
        match self {
            Self::Plain(_) => OutputFormat::Plain,
            Self::Xml(_) => OutputFormat::Xml,
        }
    }

    /// Give back the sink.
    pub fn into_inner(self) -> W {
        match self {
            Self::Plain(handler) => handler.into_inner(),
            Self::Xml(handler) => handler.into_inner(),
        }
    }
}

impl<W: Write> MetricsHandler for OutputHandler<W> {
    fn begin(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(handler) => handler.begin(),
            Self::Xml(handler) => handler.begin(),
        }
    }

    fn handle_class(&mut self, name: &str, metrics: &ClassMetrics) -> io::Result<()> {
        match self {
            Self::Plain(handler) => handler.handle_class(name, metrics),
            Self::Xml(handler) => handler.handle_class(name, metrics),
        }
    }

    fn end(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(handler) => handler.end(),
            Self::Xml(handler) => handler.end(),
        }
    }
}

/// Maps a format onto the handler wrapping a sink.
pub struct OutputFormatterSelector;

impl OutputFormatterSelector {
    /// Wrap `sink` in the handler for `format`.
    pub fn select<W: Write>(format: OutputFormat, sink: W) -> OutputHandler<W> {
        match format {
            OutputFormat::Xml => OutputHandler::Xml(XmlHandler::new(sink)),
            OutputFormat::Plain => OutputHandler::Plain(PlainTextHandler::new(sink)),
        }
    }

    /// Wrap `sink` in the handler named by `name`, falling back to plain text.
    pub fn select_by_name<W: Write>(name: &str, sink: W) -> OutputHandler<W> {
        Self::select(OutputFormat::from_name(name), sink)
    }
}
