/// Rows passed through untouched, plus how many there are.
#[derive(Debug, Clone)]
pub struct TableView<T> {
    pub rows: Vec<T>,
    pub count: usize,
}

impl<T> TableView<T> {
    pub fn new(rows: Vec<T>) -> Self {
        let count = rows.len();
        Self { rows, count }
    }
}
