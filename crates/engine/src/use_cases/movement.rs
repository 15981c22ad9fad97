//! Grid movement.
//!
//! Movement is continuous: the player slides in the chosen direction until
//! the next tile is a wall or the map edge. A move that cannot take a single
//! step is blocked and leaves the position untouched.

use storyloom_domain::{Direction, MapInfo, Player};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Moved this many tiles before stopping.
    Moved(u32),
    /// The first tile in that direction is not walkable.
    Blocked,
}

/// Slide `player` across `map` in `direction` until blocked.
pub fn move_player(map: &MapInfo, player: &mut Player, direction: Direction) -> MoveOutcome {
    let (dx, dy) = direction.delta();
    let mut steps = 0u32;
    let (mut x, mut y) = (player.position.x, player.position.y);

    while map.is_walkable(x + dx, y + dy) {
        x += dx;
        y += dy;
        steps += 1;
    }

    player.direction = direction;
    if steps == 0 {
        return MoveOutcome::Blocked;
    }
    player.position.x = x;
    player.position.y = y;
    MoveOutcome::Moved(steps)
}
