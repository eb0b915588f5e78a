//! Geometry command stream encoding.
//!
//! A vector tile geometry is a flat `u32` sequence of command integers, each
//! followed by `count` parameter pairs:
//!
//! | Command   | Id | Parameters                 |
//! |-----------|----|----------------------------|
//! | MoveTo    | 1  | `count` zig-zag (dx, dy)   |
//! | LineTo    | 2  | `count` zig-zag (dx, dy)   |
//! | ClosePath | 7  | none, count is always 1    |
//!
//! A command integer packs the id in the low 3 bits and the count above them.
//! Parameters are deltas from the cursor, zig-zag folded so small negative
//! values stay small.

/// Geometry command ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Command {
    /// Start a new ring or line at a point.
    MoveTo = 1,
    /// Draw segments to the following points.
    LineTo = 2,
    /// Close the current ring.
    ClosePath = 7,
}

impl Command {
    /// Decode a command id.
    pub fn from_id(id: u32) -> Option<Self> {
        match id {
            1 => Some(Command::MoveTo),
            2 => Some(Command::LineTo),
            7 => Some(Command::ClosePath),
            _ => None,
        }
    }
}

// ============================================================================
// Integer Encoding
// ============================================================================

/// Fold a signed integer into an unsigned one: 0, -1, 1, -2, ... map to 0, 1, 2, 3, ...
pub const fn zigzag_encode(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

/// Inverse of [`zigzag_encode`].
pub const fn zigzag_decode(value: u32) -> i32 {
    ((value >> 1) as i32) ^ -((value & 1) as i32)
}

/// Pack a command and its repeat count into one integer.
pub const fn command_encode(command: Command, count: u32) -> u32 {
    (command as u32 & 0x7) | (count << 3)
}

/// Split a command integer into its id and count.
pub const fn command_decode(value: u32) -> (u32, u32) {
    (value & 0x7, value >> 3)
}

// ============================================================================
// Geometry
// ============================================================================

/// Number of integers in a unit square ring.
pub const UNIT_SQUARE_LEN: usize = 11;

/// Closed unit square ring with its top-left corner at `(col, row)`.
///
/// The cursor starts at the origin of every feature, so the MoveTo delta is the
/// absolute corner. The ring then walks right, down and left before closing.
pub fn unit_square_geometry(col: u32, row: u32) -> [u32; UNIT_SQUARE_LEN] {
    [
        command_encode(Command::MoveTo, 1),
        zigzag_encode(col as i32),
        zigzag_encode(row as i32),
        command_encode(Command::LineTo, 3),
        zigzag_encode(1),
        zigzag_encode(0),
        zigzag_encode(0),
        zigzag_encode(1),
        zigzag_encode(-1),
        zigzag_encode(0),
        command_encode(Command::ClosePath, 1),
    ]
}

/// Decode a single-ring geometry back into absolute vertices, ignoring ClosePath.
///
/// Returns `None` on an unknown command or a truncated parameter list.
pub fn decode_ring(geometry: &[u32]) -> Option<Vec<(i32, i32)>> {
    let mut vertices = Vec::new();
    let (mut x, mut y) = (0i32, 0i32);
    let mut i = 0;
    while i < geometry.len() {
        let (id, count) = command_decode(geometry[i]);
        i += 1;
        match Command::from_id(id)? {
            Command::MoveTo | Command::LineTo => {
                for _ in 0..count {
                    let dx = zigzag_decode(*geometry.get(i)?);
                    let dy = zigzag_decode(*geometry.get(i + 1)?);
                    i += 2;
                    x += dx;
                    y += dy;
                    vertices.push((x, y));
                }
            }
            Command::ClosePath => {}
        }
    }
    Some(vertices)
}
