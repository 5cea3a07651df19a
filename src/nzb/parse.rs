use crate::{Result, UsenetError};
use std::fs;
use std::io::{BufRead, BufReader, Cursor, Seek, SeekFrom};
use std::path::Path;
use tracing::debug;

use super::collection::{FileCollection, Segment};
use super::events::{XmlEvent, XmlEvents};

/// Element whose text is being collected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Current {
    None,
    File,
    Segment,
    Group,
}

/// Record counts from the first pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Counts {
    files: usize,
    segments: usize,
    groups: usize,
}

/// Parse an NZB document from a seekable source
///
/// The source is read twice: once to count the `file`, `segment` and `group`
/// elements, then, after seeking back to the start, to fill a
/// [`FileCollection`] allocated for exactly those counts.
pub fn parse<R: BufRead + Seek>(mut source: R) -> Result<FileCollection> {
    let counts = count(&mut source)?;
    debug!(
        "NZB holds {} files, {} segments, {} groups",
        counts.files, counts.segments, counts.groups
    );

    source.seek(SeekFrom::Start(0))?;
    load(&mut source, counts)
}

/// Parse an NZB document held in memory
///
/// # Example
/// ```
/// let nzb = r#"<nzb><file poster="p" subject="s" date="1">
///   <groups><group>alt.binaries.test</group></groups>
///   <segments><segment bytes="10" number="1">a@b</segment></segments>
/// </file></nzb>"#;
/// let files = usenet_wire::nzb::parse_str(nzb)?;
/// assert_eq!(files.file(0)?.segment(0).unwrap().message_id, "a@b");
/// # Ok::<(), usenet_wire::UsenetError>(())
/// ```
pub fn parse_str(xml: &str) -> Result<FileCollection> {
    parse(Cursor::new(xml.as_bytes()))
}

/// Parse an NZB file from disk
pub fn parse_file(path: impl AsRef<Path>) -> Result<FileCollection> {
    let file = fs::File::open(path.as_ref())?;
    debug!("Parsing NZB {}", path.as_ref().display());
    parse(BufReader::new(file))
}

fn count<R: BufRead>(source: R) -> Result<Counts> {
    let mut counts = Counts::default();
    for event in XmlEvents::new(source) {
        if let XmlEvent::End { name } = event? {
            match name.as_str() {
                "file" => counts.files += 1,
                "segment" => counts.segments += 1,
                "group" => counts.groups += 1,
                _ => {}
            }
        }
    }
    Ok(counts)
}

fn load<R: BufRead>(source: R, counts: Counts) -> Result<FileCollection> {
    let mut collection = FileCollection::with_capacity(counts.files, counts.segments, counts.groups);
    let mut current = Current::None;
    let mut in_file = false;

    for event in XmlEvents::new(source) {
        let event = event?;
        match &event {
            XmlEvent::Start { name, .. } => match name.as_str() {
                "file" => {
                    collection.push_file(
                        event.attribute("date").map(parse_unsigned).unwrap_or(0),
                        event.attribute("subject").unwrap_or_default().to_string(),
                        event.attribute("poster").unwrap_or_default().to_string(),
                    )?;
                    in_file = true;
                    current = Current::File;
                }
                "segment" => {
                    require_file(in_file, "segment")?;
                    collection.push_segment(Segment {
                        number: event
                            .attribute("number")
                            .map(parse_unsigned)
                            .and_then(|n| u32::try_from(n).ok())
                            .unwrap_or(0),
                        bytes: event.attribute("bytes").map(parse_unsigned).unwrap_or(0),
                        message_id: String::new(),
                    })?;
                    current = Current::Segment;
                }
                "group" => {
                    require_file(in_file, "group")?;
                    collection.push_group()?;
                    current = Current::Group;
                }
                _ => {}
            },
            XmlEvent::Text(text) => match current {
                Current::Segment => {
                    if let Some(segment) = collection.last_segment_mut() {
                        segment.message_id.push_str(text);
                    }
                }
                Current::Group => {
                    if let Some(group) = collection.last_group_mut() {
                        group.name.push_str(text);
                    }
                }
                Current::File | Current::None => {}
            },
            XmlEvent::End { name } => match name.as_str() {
                "segment" => {
                    if let Some(segment) = collection.last_segment_mut() {
                        trim_in_place(&mut segment.message_id);
                    }
                    current = Current::File;
                }
                "group" => {
                    if let Some(group) = collection.last_group_mut() {
                        trim_in_place(&mut group.name);
                    }
                    current = Current::File;
                }
                "file" => {
                    collection.close_file();
                    in_file = false;
                    current = Current::None;
                }
                _ => {}
            },
        }
    }

    collection.check_filled()?;
    Ok(collection)
}

fn require_file(in_file: bool, element: &str) -> Result<()> {
    if !in_file {
        return Err(UsenetError::NzbStructure(format!(
            "<{}> outside of <file>",
            element
        )));
    }
    Ok(())
}

/// Unsigned decimal attribute, 0 when invalid
fn parse_unsigned(value: &str) -> u64 {
    value.trim().parse().unwrap_or(0)
}

fn trim_in_place(s: &mut String) {
    let trimmed = s.trim();
    if trimmed.len() != s.len() {
        *s = trimmed.to_string();
    }
}
