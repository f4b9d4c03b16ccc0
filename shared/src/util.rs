/// Ticks of stall owed after stepping between cells of the given heights:
/// the hypotenuse of one horizontal unit and the height difference.
#[inline(always)]
pub fn stall_cost(from_height: i32, to_height: i32) -> f64 {
    let dh = f64::from(from_height - to_height);
    (1.0 + dh * dh).sqrt()
}

/// Integer edge weight between two adjacent cells. Level ground costs 1.
#[inline(always)]
pub fn step_cost(from_height: i32, to_height: i32) -> u32 {
    if from_height == to_height {
        1
    } else {
        stall_cost(from_height, to_height).ceil() as u32
    }
}
