pub const NUM_CLASSES: usize = 5;

/// Severity grades in class-index order.
pub const CLASS_NAMES: [&str; NUM_CLASSES] = [
    "No DR",
    "Mild",
    "Moderate",
    "Severe",
    "Proliferative DR",
];

/// Maps a class index to its display label. Indices outside the grade table
/// map to "Unknown" instead of erroring.
pub fn class_label(class: i32) -> &'static str {
    if (0..NUM_CLASSES as i32).contains(&class) {
        CLASS_NAMES[class as usize]
    } else {
        "Unknown"
    }
}
