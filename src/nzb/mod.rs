//! NZB file format parser
//!
//! NZB is an XML-based file format used to describe Usenet binary posts.
//! It lists, for every posted file, the newsgroups it went to and the
//! message-ids of its segments.
//!
//! Parsing makes two passes over the document so that every record of the
//! resulting [`FileCollection`] is stored in one allocation per record type.
//!
//! Reference: https://sabnzbd.org/wiki/extra/nzb-spec

mod collection;
pub mod events;
mod parse;

pub use collection::{FileCollection, FileView, Group, Segment};
pub use events::{XmlEvent, XmlEvents};
pub use parse::{parse, parse_file, parse_str};
