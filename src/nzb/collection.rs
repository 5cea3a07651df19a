//! Arena of NZB records
//!
//! All files, segments and groups of one NZB live in three vectors sized once
//! from the counting pass. A [`File`] refers to its segments and groups by
//! index ranges into the shared vectors.

use crate::{Result, UsenetError};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::ops::Range;

/// A segment (article) of a file
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Segment {
    /// Segment number (1-based, 0 when missing or invalid)
    pub number: u32,
    /// Declared size of the article in bytes
    pub bytes: u64,
    /// Message-ID without angle brackets
    pub message_id: String,
}

/// A newsgroup a file was posted to
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Group {
    pub name: String,
}

/// File record, see [`FileView`] for access
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct File {
    pub(crate) timestamp: u64,
    pub(crate) subject: String,
    pub(crate) poster: String,
    pub(crate) segments: Range<usize>,
    pub(crate) groups: Range<usize>,
}

/// All records of one NZB document
#[derive(Debug, Clone, Default)]
pub struct FileCollection {
    files: Vec<File>,
    segments: Vec<Segment>,
    groups: Vec<Group>,
    limits: [usize; 3],
}

impl FileCollection {
    /// Allocate exactly once for the given record counts
    pub(crate) fn with_capacity(files: usize, segments: usize, groups: usize) -> Self {
        Self {
            files: Vec::with_capacity(files),
            segments: Vec::with_capacity(segments),
            groups: Vec::with_capacity(groups),
            limits: [files, segments, groups],
        }
    }

    pub(crate) fn push_file(&mut self, timestamp: u64, subject: String, poster: String) -> Result<()> {
        check_room("file", self.files.len(), self.limits[0])?;
        let segments = self.segments.len();
        let groups = self.groups.len();
        self.files.push(File {
            timestamp,
            subject,
            poster,
            segments: segments..segments,
            groups: groups..groups,
        });
        Ok(())
    }

    pub(crate) fn push_segment(&mut self, segment: Segment) -> Result<()> {
        check_room("segment", self.segments.len(), self.limits[1])?;
        self.segments.push(segment);
        Ok(())
    }

    pub(crate) fn push_group(&mut self) -> Result<()> {
        check_room("group", self.groups.len(), self.limits[2])?;
        self.groups.push(Group::default());
        Ok(())
    }

    pub(crate) fn last_segment_mut(&mut self) -> Option<&mut Segment> {
        self.segments.last_mut()
    }

    pub(crate) fn last_group_mut(&mut self) -> Option<&mut Group> {
        self.groups.last_mut()
    }

    /// Fix the ranges of the current file to everything pushed since it started
    pub(crate) fn close_file(&mut self) {
        let segments_end = self.segments.len();
        let groups_end = self.groups.len();
        if let Some(file) = self.files.last_mut() {
            file.segments.end = segments_end;
            file.groups.end = groups_end;
        }
    }

    /// Check that every counted record has been filled in
    pub(crate) fn check_filled(&self) -> Result<()> {
        let filled = [self.files.len(), self.segments.len(), self.groups.len()];
        if filled != self.limits {
            return Err(UsenetError::NzbStructure(format!(
                "counted {} files, {} segments, {} groups but loaded {}, {}, {}",
                self.limits[0], self.limits[1], self.limits[2], filled[0], filled[1], filled[2]
            )));
        }
        Ok(())
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// File at `index`
    pub fn file(&self, index: usize) -> Result<FileView<'_>> {
        self.get(index).ok_or(UsenetError::IndexOutOfRange {
            index,
            len: self.files.len(),
        })
    }

    /// File at `index`, `None` when out of range
    pub fn get(&self, index: usize) -> Option<FileView<'_>> {
        self.files.get(index).map(|file| FileView {
            collection: self,
            file,
        })
    }

    /// Files in document order
    pub fn iter(&self) -> impl ExactSizeIterator<Item = FileView<'_>> + '_ {
        self.files.iter().map(|file| FileView {
            collection: self,
            file,
        })
    }

    /// Declared size of every segment of every file
    pub fn total_bytes(&self) -> u64 {
        self.segments.iter().map(|s| s.bytes).sum()
    }
}

fn check_room(kind: &str, len: usize, limit: usize) -> Result<()> {
    if len >= limit {
        return Err(UsenetError::NzbStructure(format!(
            "more {} elements than counted ({})",
            kind, limit
        )));
    }
    Ok(())
}

/// Borrowed view of one file in a [`FileCollection`]
#[derive(Debug, Clone, Copy)]
pub struct FileView<'a> {
    collection: &'a FileCollection,
    file: &'a File,
}

impl<'a> FileView<'a> {
    /// Posting date as Unix seconds, 0 when absent
    pub fn timestamp(&self) -> u64 {
        self.file.timestamp
    }

    /// Posting date, `None` when absent or out of range
    pub fn date_time(&self) -> Option<DateTime<Utc>> {
        if self.file.timestamp == 0 {
            return None;
        }
        let secs = i64::try_from(self.file.timestamp).ok()?;
        DateTime::from_timestamp(secs, 0)
    }

    pub fn subject(&self) -> &'a str {
        &self.file.subject
    }

    pub fn poster(&self) -> &'a str {
        &self.file.poster
    }

    pub fn segment_count(&self) -> usize {
        self.file.segments.len()
    }

    pub fn segment(&self, index: usize) -> Option<&'a Segment> {
        self.segments().get(index)
    }

    pub fn segments(&self) -> &'a [Segment] {
        &self.collection.segments[self.file.segments.clone()]
    }

    pub fn group_count(&self) -> usize {
        self.file.groups.len()
    }

    pub fn group(&self, index: usize) -> Option<&'a Group> {
        self.groups().get(index)
    }

    pub fn groups(&self) -> &'a [Group] {
        &self.collection.groups[self.file.groups.clone()]
    }

    /// Calculate total size of all segments
    pub fn total_bytes(&self) -> u64 {
        self.segments().iter().map(|s| s.bytes).sum()
    }

    /// Get missing segment numbers (if any)
    ///
    /// Gaps are searched from 1 up to the highest declared number, but never
    /// past the segment count plus the number of distinct segment numbers,
    /// so a bogus `number` attribute cannot inflate the result.
    pub fn missing_segments(&self) -> Vec<u32> {
        let segments = self.segments();
        if segments.is_empty() {
            return vec![];
        }

        let seen: HashSet<u32> = segments.iter().map(|s| s.number).collect();
        let max_number = segments.iter().map(|s| s.number).max().unwrap_or(0);
        let bound = u32::try_from(segments.len() + seen.len()).unwrap_or(u32::MAX);

        (1..=max_number.min(bound))
            .filter(|n| !seen.contains(n))
            .collect()
    }
}
