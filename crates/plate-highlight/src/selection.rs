use serde::{Deserialize, Serialize};

use crate::document::{AttrValue, Document, Path};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    #[serde(default)]
    pub path: Path,
    pub offset: usize,
}

impl Position {
    pub fn new(path: Path, offset: usize) -> Self {
        Self { path, offset }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(a: Position, b: Position) -> Self {
        if b < a {
            Self { start: b, end: a }
        } else {
            Self { start: a, end: b }
        }
    }

    pub fn collapsed(position: Position) -> Self {
        Self {
            start: position.clone(),
            end: position,
        }
    }

    pub fn in_block(path: Path, start: usize, end: usize) -> Self {
        Self::new(Position::new(path.clone(), start), Position::new(path, end))
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, position: &Position) -> bool {
        &self.start <= position && position <= &self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Selection {
    #[serde(default)]
    ranges: Vec<Range>,
    #[serde(default)]
    backward: bool,
}

impl Selection {
    pub fn collapsed(position: Position) -> Self {
        Self::single(Range::collapsed(position))
    }

    pub fn single(range: Range) -> Self {
        Self {
            ranges: vec![range],
            backward: false,
        }
    }

    pub fn from_ranges(ranges: impl IntoIterator<Item = Range>) -> Self {
        let mut ranges: Vec<Range> = ranges.into_iter().collect();
        ranges.sort_by(|a, b| a.start.cmp(&b.start));
        Self {
            ranges,
            backward: false,
        }
    }

    pub fn between(anchor: Position, focus: Position) -> Self {
        let backward = focus < anchor;
        Self {
            ranges: vec![Range::new(anchor, focus)],
            backward,
        }
    }

    pub fn ranges(&self) -> &[Range] {
        &self.ranges
    }

    pub fn first_range(&self) -> Option<&Range> {
        self.ranges.first()
    }

    pub fn is_backward(&self) -> bool {
        self.backward
    }

    // An empty selection has nothing to act on.
    pub fn is_collapsed(&self) -> bool {
        match self.ranges.as_slice() {
            [] => true,
            [range] => range.is_collapsed(),
            _ => false,
        }
    }

    pub fn attribute<'d>(&self, doc: &'d Document, key: &str) -> Option<&'d AttrValue> {
        if self.is_collapsed() {
            let position = &self.first_range()?.start;
            return doc.attribute_at_caret(&position.path, position.offset, key);
        }
        doc.attribute_in_ranges(&self.ranges, key)
    }
}
