//! Two-column layout with a single-column reading order.
//!
//! On wide screens tiles sit in two independent columns. On narrow screens
//! the columns collapse into one, and the tiles are read newspaper-style:
//! first left, first right, second left, second right, and so on. Each tile
//! gets a 1-based `mobile_order` that the stylesheet feeds into CSS `order`.
//!
//! Two quotes must not follow each other in that single column. After
//! interleaving, every adjacent quote pair is repaired by pulling the next
//! non-quote tile forward; if none is left the pair stays.
//!
//! Desktop placement is untouched by the repair: tiles are re-split by their
//! own column and keep their sheet order within it.

use crate::classify::Tile;
use crate::types::Column;

/// A tile with its narrow-screen sequence number.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedTile {
    pub tile: Tile,
    /// 1-based position in the collapsed single column.
    pub mobile_order: usize,
}

/// Tiles split into the two desktop columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Columns {
    pub left: Vec<PlacedTile>,
    pub right: Vec<PlacedTile>,
}

impl Columns {
    pub fn len(&self) -> usize {
        self.left.len() + self.right.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty() && self.right.is_empty()
    }

    pub fn column(&self, column: Column) -> &[PlacedTile] {
        match column {
            Column::Left => &self.left,
            Column::Right => &self.right,
        }
    }

    /// All tiles in narrow-screen order.
    pub fn mobile_sequence(&self) -> Vec<&PlacedTile> {
        let mut all: Vec<&PlacedTile> = self.left.iter().chain(&self.right).collect();
        all.sort_by_key(|p| p.mobile_order);
        all
    }
}

/// Alternate `left[i]`, `right[i]`, left first. The longer column's tail is
/// appended in order.
pub fn interleave<T>(left: Vec<T>, right: Vec<T>) -> Vec<T> {
    let mut out = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter();
    let mut right = right.into_iter();
    loop {
        match (left.next(), right.next()) {
            (None, None) => break,
            (l, r) => out.extend(l.into_iter().chain(r)),
        }
    }
    out
}

/// Break up adjacent quotes by swapping the next non-quote forward.
///
/// Returns the number of adjacent pairs that could not be repaired.
pub fn separate_quotes<T>(items: &mut [T], is_quote: impl Fn(&T) -> bool) -> usize {
    let mut unresolved = 0;
    for i in 0..items.len().saturating_sub(1) {
        if !(is_quote(&items[i]) && is_quote(&items[i + 1])) {
            continue;
        }
        match (i + 2..items.len()).find(|&j| !is_quote(&items[j])) {
            Some(j) => items.swap(i + 1, j),
            None => unresolved += 1,
        }
    }
    unresolved
}

/// Lay tiles out in two columns and number them for narrow screens.
///
/// `tiles` must already be in sheet order.
pub fn layout(tiles: Vec<Tile>) -> Columns {
    let (left, right): (Vec<Tile>, Vec<Tile>) =
        tiles.into_iter().partition(|t| t.column == Column::Left);

    let mut sequence = interleave(left, right);
    let unresolved = separate_quotes(&mut sequence, Tile::is_quote);
    if unresolved > 0 {
        tracing::debug!(unresolved, "adjacent quotes left in mobile order");
    }

    // Reading order is fixed; sheet order within each column is restored
    // below by sorting on the row index.
    let mut columns = Columns::default();
    for (i, tile) in sequence.into_iter().enumerate() {
        let placed = PlacedTile {
            tile,
            mobile_order: i + 1,
        };
        match placed.tile.column {
            Column::Left => columns.left.push(placed),
            Column::Right => columns.right.push(placed),
        }
    }
    columns.left.sort_by_key(|p| p.tile.index);
    columns.right.sort_by_key(|p| p.tile.index);
    columns
}
