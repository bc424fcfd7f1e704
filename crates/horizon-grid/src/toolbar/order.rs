//! Column order moves.

/// Move the item at `from` to `to`, shifting everything in between.
///
/// Returns `false` and leaves `items` untouched when either position is out
/// of range or the positions are equal.
pub fn array_change_position<T>(items: &mut Vec<T>, from: usize, to: usize) -> bool {
    if from >= items.len() || to >= items.len() || from == to {
        return false;
    }
    let item = items.remove(from);
    items.insert(to, item);
    true
}
