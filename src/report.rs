//! Serialization of a finished [`Coverage`] tree.

use std::io::Write;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::Result;
use crate::model::{Class, Coverage, Lines, Method, Package};

pub const COBERTURA_DOCTYPE: &str =
    r#"coverage SYSTEM "http://cobertura.sourceforge.net/xml/coverage-04.dtd""#;

/// Output format for a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    Xml,
    Json,
}

/// Render the report in `format`.
pub fn render(coverage: &Coverage, format: Format) -> Result<String> {
    match format {
        Format::Xml => to_xml(coverage),
        Format::Json => to_json(coverage),
    }
}

pub fn to_json(coverage: &Coverage) -> Result<String> {
    let mut out = serde_json::to_string_pretty(coverage)?;
    out.push('\n');
    Ok(out)
}

pub fn to_xml(coverage: &Coverage) -> Result<String> {
    let mut buf = Vec::new();
    write_xml(&mut buf, coverage)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Write a Cobertura XML document, indented by two spaces.
pub fn write_xml<W: Write>(out: W, coverage: &Coverage) -> Result<()> {
    let mut writer = Writer::new_with_indent(out, b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::DocType(BytesText::from_escaped(COBERTURA_DOCTYPE)))?;

    let mut root = BytesStart::new("coverage");
    root.push_attribute(("line-rate", fmt_rate(coverage.line_rate).as_str()));
    root.push_attribute(("branch-rate", fmt_rate(coverage.branch_rate).as_str()));
    root.push_attribute(("version", coverage.version.as_str()));
    root.push_attribute(("timestamp", coverage.timestamp.to_string().as_str()));
    root.push_attribute(("lines-covered", coverage.lines_covered.to_string().as_str()));
    root.push_attribute(("lines-valid", coverage.lines_valid.to_string().as_str()));
    root.push_attribute(("branches-covered", coverage.branches_covered.to_string().as_str()));
    root.push_attribute(("branches-valid", coverage.branches_valid.to_string().as_str()));
    root.push_attribute(("complexity", fmt_rate(coverage.complexity).as_str()));
    writer.write_event(Event::Start(root))?;

    if coverage.sources.is_empty() {
        writer.write_event(Event::Empty(BytesStart::new("sources")))?;
    } else {
        writer.write_event(Event::Start(BytesStart::new("sources")))?;
        for source in &coverage.sources {
            writer.write_event(Event::Start(BytesStart::new("source")))?;
            writer.write_event(Event::Text(BytesText::new(source)))?;
            writer.write_event(Event::End(BytesEnd::new("source")))?;
        }
        writer.write_event(Event::End(BytesEnd::new("sources")))?;
    }

    write_list(&mut writer, "packages", &coverage.packages, write_package)?;

    writer.write_event(Event::End(BytesEnd::new("coverage")))?;
    writer.get_mut().write_all(b"\n").map_err(quick_xml::Error::from)?;
    Ok(())
}

/// `<name>` wrapping one element per item; a self-closing tag when empty.
fn write_list<W, T>(
    writer: &mut Writer<W>,
    name: &str,
    items: &[T],
    write_item: fn(&mut Writer<W>, &T) -> Result<()>,
) -> Result<()>
where
    W: Write,
{
    if items.is_empty() {
        writer.write_event(Event::Empty(BytesStart::new(name)))?;
        return Ok(());
    }
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    for item in items {
        write_item(writer, item)?;
    }
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Rate attributes every Cobertura node carries. Go profiles have no branch data.
fn push_rates(start: &mut BytesStart<'_>, line_rate: f64) {
    start.push_attribute(("line-rate", fmt_rate(line_rate).as_str()));
    start.push_attribute(("branch-rate", "0"));
    start.push_attribute(("complexity", "0"));
}

fn write_package<W: Write>(writer: &mut Writer<W>, package: &Package) -> Result<()> {
    let mut start = BytesStart::new("package");
    start.push_attribute(("name", package.name.as_str()));
    push_rates(&mut start, package.line_rate);
    writer.write_event(Event::Start(start))?;
    write_list(writer, "classes", &package.classes, write_class)?;
    writer.write_event(Event::End(BytesEnd::new("package")))?;
    Ok(())
}

fn write_class<W: Write>(writer: &mut Writer<W>, class: &Class) -> Result<()> {
    let mut start = BytesStart::new("class");
    start.push_attribute(("name", class.name.as_str()));
    start.push_attribute(("filename", class.file_name.as_str()));
    push_rates(&mut start, class.line_rate);
    writer.write_event(Event::Start(start))?;
    write_list(writer, "methods", &class.methods, write_method)?;
    write_lines(writer, &class.lines)?;
    writer.write_event(Event::End(BytesEnd::new("class")))?;
    Ok(())
}

fn write_method<W: Write>(writer: &mut Writer<W>, method: &Method) -> Result<()> {
    let mut start = BytesStart::new("method");
    start.push_attribute(("name", method.name.as_str()));
    start.push_attribute(("signature", method.signature.as_deref().unwrap_or("")));
    push_rates(&mut start, method.line_rate);
    writer.write_event(Event::Start(start))?;
    write_lines(writer, &method.lines)?;
    writer.write_event(Event::End(BytesEnd::new("method")))?;
    Ok(())
}

fn write_lines<W: Write>(writer: &mut Writer<W>, lines: &Lines) -> Result<()> {
    if lines.is_empty() {
        writer.write_event(Event::Empty(BytesStart::new("lines")))?;
        return Ok(());
    }
    writer.write_event(Event::Start(BytesStart::new("lines")))?;
    for line in lines {
        let mut el = BytesStart::new("line");
        el.push_attribute(("number", line.number.to_string().as_str()));
        el.push_attribute(("hits", line.hits.to_string().as_str()));
        writer.write_event(Event::Empty(el))?;
    }
    writer.write_event(Event::End(BytesEnd::new("lines")))?;
    Ok(())
}

/// Shortest representation that round-trips: `1`, `0`, `0.75`.
fn fmt_rate(rate: f64) -> String {
    format!("{}", rate)
}
