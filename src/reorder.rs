#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DropHalf {
    #[default]
    Top,
    Bottom,
}

impl DropHalf {
    pub fn from_pointer(pointer_y: f64, top: f64, height: f64) -> Self {
        let midpoint = top + height / 2.0;
        if pointer_y < midpoint {
            DropHalf::Top
        } else {
            DropHalf::Bottom
        }
    }
}

pub fn insertion_position(from: usize, to: usize, half: DropHalf) -> usize {
    let mut position = match half {
        DropHalf::Top => to,
        DropHalf::Bottom => to + 1,
    };
    if from < position {
        position -= 1;
    }
    position
}

pub fn apply_drop<T>(items: &mut Vec<T>, from: usize, to: usize, half: DropHalf) -> bool {
    if from >= items.len() || to >= items.len() {
        return false;
    }
    let position = insertion_position(from, to, half);
    if position == from {
        return false;
    }
    let moved = items.remove(from);
    items.insert(position, moved);
    true
}
