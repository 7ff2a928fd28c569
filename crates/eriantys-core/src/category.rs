//! The five token categories.

literal_enum! {
    /// One of the five fixed token kinds. Every container tracks all five.
    pub enum Category as "category" {
        Yellow => "yellow",
        Blue => "blue",
        Green => "green",
        Red => "red",
        Pink => "pink",
    }
}

impl Category {
    /// Number of categories.
    pub const COUNT: usize = 5;

    /// Dense index used by per-category arrays.
    pub fn index(self) -> usize {
        self as usize
    }
}
