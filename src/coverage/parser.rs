//! Jacoco / Kover XML report parser
//!
//! Both tools emit the same shape: a root `report` holding one aggregate
//! `counter` per metric, and `class` elements (nested in `package`) carrying a
//! `sourcefilename` attribute and their own counters. Only `INSTRUCTION`
//! counters are consumed.

use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs;
use std::path::Path;

use super::CounterEntry;
use crate::error::{Result, ShroudError};

const INSTRUCTION: &str = "INSTRUCTION";

/// A `class` element and its own instruction counter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassRecord {
    pub name: Option<String>,
    pub source_file: Option<String>,
    pub instruction: Option<CounterEntry>,
}

/// Parsed report, queryable by the two lookups the aggregator needs
#[derive(Debug, Clone, Default)]
pub struct CoverageDocument {
    root_counters: Vec<CounterEntry>,
    classes: Vec<ClassRecord>,
}

impl CoverageDocument {
    /// Read and parse a report file
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let content = std::str::from_utf8(bytes)
            .map_err(|e| ShroudError::malformed(format!("report is not valid UTF-8: {}", e)))?;
        Self::parse(content)
    }

    /// Parse report XML from a string
    pub fn parse(content: &str) -> Result<Self> {
        let mut reader = Reader::from_str(content);
        reader.trim_text(true);

        let mut doc = CoverageDocument::default();
        let mut path: Vec<Vec<u8>> = Vec::new();
        let mut current_class: Option<ClassRecord> = None;
        let mut seen_root = false;

        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    let name = e.name().as_ref().to_vec();
                    doc.open_element(e, &name, &path, &mut seen_root, &mut current_class, false)?;
                    path.push(name);
                }
                Ok(Event::Empty(ref e)) => {
                    let name = e.name().as_ref().to_vec();
                    doc.open_element(e, &name, &path, &mut seen_root, &mut current_class, true)?;
                }
                Ok(Event::End(ref e)) => {
                    if e.name().as_ref() == b"class" {
                        if let Some(class) = current_class.take() {
                            doc.push_class(class);
                        }
                    }
                    path.pop();
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(ShroudError::malformed(format!(
                        "XML error at position {}: {}",
                        reader.buffer_position(),
                        e
                    )))
                }
                _ => {}
            }
            buf.clear();
        }

        if !seen_root {
            return Err(ShroudError::malformed("document has no <report> element"));
        }
        if !path.is_empty() {
            return Err(ShroudError::malformed(format!(
                "unexpected end of document inside <{}>",
                String::from_utf8_lossy(path.last().map(|p| p.as_slice()).unwrap_or_default())
            )));
        }

        Ok(doc)
    }

    fn open_element(
        &mut self,
        e: &BytesStart,
        name: &[u8],
        path: &[Vec<u8>],
        seen_root: &mut bool,
        current_class: &mut Option<ClassRecord>,
        is_empty: bool,
    ) -> Result<()> {
        if path.is_empty() {
            if *seen_root || name != b"report" {
                return Err(ShroudError::malformed(format!(
                    "expected root element <report>, found <{}>",
                    String::from_utf8_lossy(name)
                )));
            }
            *seen_root = true;
        }

        match name {
            b"class" => {
                let record = read_class(e)?;
                if is_empty {
                    self.push_class(record);
                } else {
                    *current_class = Some(record);
                }
            }
            b"counter" => {
                if let Some(counter) = read_instruction_counter(e)? {
                    match path.last().map(|p| p.as_slice()) {
                        Some(b"report") if path.len() == 1 => self.root_counters.push(counter),
                        Some(b"class") => {
                            if let Some(class) = current_class.as_mut() {
                                class.instruction = Some(counter);
                            }
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }

        Ok(())
    }

    /// All class records, in document order
    pub fn classes(&self) -> &[ClassRecord] {
        &self.classes
    }

    fn push_class(&mut self, class: ClassRecord) {
        if let Some(ref source_file) = class.source_file {
            log::trace!(
                "class {} from {}",
                class.name.as_deref().unwrap_or("<anonymous>"),
                source_file
            );
            self.classes.push(class);
        }
    }
}

/// Locate the report-level instruction counter
pub fn parse_project_counter(doc: &CoverageDocument) -> Result<CounterEntry> {
    match doc.root_counters.as_slice() {
        [counter] => Ok(*counter),
        [] => Err(ShroudError::malformed(
            "missing report-level INSTRUCTION counter",
        )),
        counters => Err(ShroudError::malformed(format!(
            "expected one report-level INSTRUCTION counter, found {}",
            counters.len()
        ))),
    }
}

/// Instruction counters of every class declared in `file_name`
///
/// Matching is exact and case-sensitive on the `sourcefilename` attribute.
/// Classes without an instruction counter contribute nothing.
pub fn find_instruction_counters_for_file(
    doc: &CoverageDocument,
    file_name: &str,
) -> Vec<CounterEntry> {
    doc.classes
        .iter()
        .filter(|class| class.source_file.as_deref() == Some(file_name))
        .filter_map(|class| class.instruction)
        .collect()
}

fn read_class(e: &BytesStart) -> Result<ClassRecord> {
    let mut record = ClassRecord::default();
    for attr in e.attributes() {
        let attr = attr.map_err(|e| ShroudError::malformed(format!("bad class attribute: {}", e)))?;
        match attr.key.as_ref() {
            b"name" => record.name = Some(unescaped(&attr)?),
            b"sourcefilename" => record.source_file = Some(unescaped(&attr)?),
            _ => {}
        }
    }
    Ok(record)
}

fn unescaped(attr: &Attribute) -> Result<String> {
    attr.unescape_value()
        .map(|value| value.into_owned())
        .map_err(|e| {
            ShroudError::malformed(format!(
                "bad value for attribute '{}': {}",
                String::from_utf8_lossy(attr.key.as_ref()),
                e
            ))
        })
}

/// Returns `None` for counters of any other type
fn read_instruction_counter(e: &BytesStart) -> Result<Option<CounterEntry>> {
    let mut counter_type = None;
    let mut missed = None;
    let mut covered = None;

    for attr in e.attributes() {
        let attr = attr.map_err(|e| ShroudError::malformed(format!("bad counter attribute: {}", e)))?;
        let value = String::from_utf8_lossy(&attr.value).to_string();
        match attr.key.as_ref() {
            b"type" => counter_type = Some(value),
            b"missed" => missed = Some(value),
            b"covered" => covered = Some(value),
            _ => {}
        }
    }

    if counter_type.as_deref() != Some(INSTRUCTION) {
        return Ok(None);
    }

    Ok(Some(CounterEntry {
        missed: numeric_attribute("missed", missed)?,
        covered: numeric_attribute("covered", covered)?,
    }))
}

fn numeric_attribute(name: &str, value: Option<String>) -> Result<u64> {
    let value = value.ok_or_else(|| {
        ShroudError::malformed(format!("INSTRUCTION counter is missing the '{}' attribute", name))
    })?;
    value.trim().parse::<u64>().map_err(|_| {
        ShroudError::malformed(format!(
            "INSTRUCTION counter attribute '{}' is not a non-negative integer: {:?}",
            name, value
        ))
    })
}
