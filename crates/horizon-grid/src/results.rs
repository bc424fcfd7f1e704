//! The results row: per-column sums shown below the table body.

use crate::model::{GridEngine, ResponsiveClass, ResultRole, TableData, text};

/// Text of the results row title cell.
pub const RESULTS_TITLE: &str = "Total";

/// One cell of the results row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultCell {
    /// Original column index.
    pub column: usize,
    /// Formatted content, empty for columns without a result role.
    pub text: String,
}

/// Sums over all rows for the columns that declare a result role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsRow {
    pub cells: Vec<ResultCell>,
}

impl ResultsRow {
    /// Compute the results row in display order.
    ///
    /// Returns `None` when no column declares a result role. Always-hidden and
    /// never-shown columns get no cell.
    pub fn compute(engine: &GridEngine) -> Option<Self> {
        let data = engine.data();
        if !data.columns().iter().any(|c| c.result.is_some()) {
            return None;
        }

        let cells = engine
            .order()
            .iter()
            .filter_map(|&column| {
                let col = data.column(column)?;
                if matches!(col.responsive, ResponsiveClass::AlwaysHidden | ResponsiveClass::Never) {
                    return None;
                }
                let text = match col.result {
                    Some(ResultRole::Number) => text::format_german(column_sum(data, column), 2),
                    Some(ResultRole::Currency) => format!("{} €", text::format_german(column_sum(data, column), 2)),
                    Some(ResultRole::Title) => RESULTS_TITLE.to_string(),
                    None => String::new(),
                };
                Some(ResultCell { column, text })
            })
            .collect();
        Some(Self { cells })
    }

    pub fn cell(&self, column: usize) -> Option<&ResultCell> {
        self.cells.iter().find(|c| c.column == column)
    }
}

/// Sum of a column over every row, regardless of searches.
///
/// A cell's sort value wins over its content when present.
pub fn column_sum(data: &TableData, column: usize) -> f64 {
    data.rows()
        .iter()
        .filter_map(|row| row.cell(column))
        .map(|cell| match &cell.sort {
            Some(sort) => sort.trim().parse::<f64>().unwrap_or_else(|_| text::pure_decimal(sort)),
            None => text::pure_decimal(&text::strip_tags_with_content(&cell.html)),
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Cell, Column, Row};

    fn create_test_engine() -> GridEngine {
        let mut title = Column::new("label", 0);
        title.result = Some(ResultRole::Title);
        let mut hours = Column::new("hours", 1);
        hours.result = Some(ResultRole::Number);
        let mut price = Column::new("price", 2);
        price.result = Some(ResultRole::Currency);
        let mut hidden = Column::new("cost", 3).with_responsive(ResponsiveClass::Never);
        hidden.result = Some(ResultRole::Number);
        let rows = vec![
            Row::new(1, vec!["a".into(), "1.000,5".into(), "10,00 €".into(), "1".into()]),
            Row::new(2, vec!["b".into(), "234".into(), Cell::new("<b>x</b>").with_sort("1224.56"), "2".into()]),
        ];
        GridEngine::new(TableData::new(vec![title, hours, price, hidden], rows))
    }

    #[test]
    fn test_sums_with_german_format() {
        let row = ResultsRow::compute(&create_test_engine()).unwrap();
        assert_eq!(row.cell(0).unwrap().text, RESULTS_TITLE);
        assert_eq!(row.cell(1).unwrap().text, "1.234,50");
        assert_eq!(row.cell(2).unwrap().text, "1.234,56 €");
        assert!(row.cell(3).is_none());
    }

    #[test]
    fn test_follows_display_order() {
        let mut engine = create_test_engine();
        engine.set_order(vec![2, 0, 1, 3]);
        let row = ResultsRow::compute(&engine).unwrap();
        let columns: Vec<usize> = row.cells.iter().map(|c| c.column).collect();
        assert_eq!(columns, vec![2, 0, 1]);
    }

    #[test]
    fn test_no_result_columns() {
        let data = TableData::new(vec![Column::new("a", 0)], vec![]);
        assert!(ResultsRow::compute(&GridEngine::new(data)).is_none());
    }
}
