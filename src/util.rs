// Small catalog helpers shared by tooling and display code.

/// Bitwise check that an item id is a power of two.
pub fn is_power_of_two_id(id: i64) -> bool {
    id > 0 && (id & (id - 1)) == 0
}

pub fn is_odd_id(id: i64) -> bool {
    id % 2 != 0
}

/// Reverse a title, character-wise.
pub fn reverse_title(title: &str) -> String {
    title.chars().rev().collect()
}

/// Repeat a title `count` times; non-positive counts yield an empty string.
pub fn repeat_title(title: &str, count: i64) -> String {
    if count <= 0 {
        return String::new();
    }
    title.repeat(count as usize)
}
