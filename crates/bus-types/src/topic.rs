//! # Topics
//!
//! Topics are dot-segmented strings (`room.tile.move`). A subscriber on a
//! coarser level (`room`) also observes finer events (`room.tile.move`) and
//! sees the topic rewritten to the part below its level (`tile.move`).
//!
//! ```text
//! publish "a.b.c"
//!   level "a"      remainder "b.c"
//!   level "a.b"    remainder "c"
//!   level "a.b.c"  remainder ""
//! ```

/// Segment separator.
pub const SEPARATOR: char = '.';

/// One prefix level of a published topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopicLevel<'a> {
    /// The prefix a subscriber would register on.
    pub level: &'a str,
    /// What is left of the topic below `level`.
    pub remainder: &'a str,
}

/// A topic is usable when it is non-empty.
#[must_use]
pub fn is_valid(topic: &str) -> bool {
    !topic.is_empty()
}

/// All prefix levels of `topic`, coarse to fine, ending with the topic itself.
///
/// A leading separator does not produce an empty level.
pub fn levels(topic: &str) -> impl Iterator<Item = TopicLevel<'_>> {
    let prefixes = topic
        .match_indices(SEPARATOR)
        .map(|(index, _)| index)
        .filter(|&index| index > 0)
        .map(move |index| TopicLevel {
            level: &topic[..index],
            remainder: &topic[index + SEPARATOR.len_utf8()..],
        });

    let full = std::iter::once(TopicLevel {
        level: topic,
        remainder: "",
    })
    .filter(move |_| is_valid(topic));

    prefixes.chain(full)
}

/// The remainder of `topic` below `level`, if `level` is one of its levels.
///
/// Matching happens on segment boundaries only: `a.bc` is not under `a.b`.
#[must_use]
pub fn remainder<'a>(topic: &'a str, level: &str) -> Option<&'a str> {
    if !is_valid(level) {
        return None;
    }
    if topic == level {
        return Some("");
    }
    topic.strip_prefix(level)?.strip_prefix(SEPARATOR)
}
