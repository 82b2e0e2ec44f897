use std::cmp::Ordering;
use std::io::Write;

use crossterm::style::Stylize;
use serde::Serialize;
use serde::ser::SerializeMap;

use crate::Result;
use crate::lib::cell::{Cell, ColourRank};
use crate::lib::error::TableError;
use crate::lib::filter::MatchFilter;
use crate::lib::outlier::OutlierPolicy;

/// Spaces added to the widest cell of each column
pub const COLUMN_PADDING: usize = 2;

/// How a table is drawn as text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    pub colour: bool,
}

/// One column's title and display state, changed only through [`Table`]
#[derive(Debug, Clone, Default)]
pub struct HeaderColumn {
    title: String,
    filters: Vec<MatchFilter>,
    width: usize,
    hidden: bool,
    numeric: Option<bool>,
}

impl HeaderColumn {
    fn new(title: String) -> Self {
        let width = title.chars().count() + COLUMN_PADDING;
        Self {
            title,
            width,
            ..Default::default()
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn filters(&self) -> &[MatchFilter] {
        &self.filters
    }

    /// Widest cell plus [`COLUMN_PADDING`]
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// True when every non-empty cell seen so far was numeric
    pub fn is_numeric(&self) -> bool {
        self.numeric == Some(true)
    }

    fn observe(&mut self, cell: &Cell) {
        self.width = self.width.max(cell.width() + COLUMN_PADDING);
        if cell.as_str().is_empty() {
            return;
        }
        self.numeric = Some(cell.is_numeric() && self.numeric != Some(false));
    }

    fn passes(&self, cell: &Cell) -> bool {
        let numeric = self.is_numeric();
        self.filters.iter().all(|f| f.matches(cell, numeric))
    }
}

#[derive(Debug, Clone)]
struct Row {
    cells: Vec<Cell>,
    hidden: bool,
}

/// Header and row storage plus the display shaping applied before rendering.
///
/// Rows always hold exactly one cell per header. Display order and
/// visibility never touch storage, so row and column indices stay stable
/// across filtering, hiding and ordering.
#[derive(Debug, Clone, Default)]
pub struct Table {
    headers: Vec<HeaderColumn>,
    rows: Vec<Row>,
    order: Vec<usize>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the header set.
    ///
    /// Rows added earlier are resized to the new width, padded with empty
    /// cells or truncated.
    pub fn set_header<I, S>(&mut self, titles: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.headers = titles
            .into_iter()
            .map(|t| HeaderColumn::new(t.into()))
            .collect();
        self.order = (0..self.headers.len()).collect();

        let width = self.headers.len();
        for row in &mut self.rows {
            row.cells.resize(width, Cell::empty());
            for (header, cell) in self.headers.iter_mut().zip(&row.cells) {
                header.observe(cell);
            }
        }
    }

    /// Append a row; short rows are padded, long rows grow the header list.
    pub fn add_row(&mut self, mut cells: Vec<Cell>) {
        if cells.len() > self.headers.len() {
            self.grow(cells.len());
        }
        cells.resize(self.headers.len(), Cell::empty());
        for (header, cell) in self.headers.iter_mut().zip(&cells) {
            header.observe(cell);
        }
        self.rows.push(Row {
            cells,
            hidden: false,
        });
    }

    fn grow(&mut self, width: usize) {
        for index in self.headers.len()..width {
            self.headers.push(HeaderColumn::new(String::new()));
            self.order.push(index);
            for row in &mut self.rows {
                row.cells.push(Cell::empty());
            }
        }
    }

    pub fn headers(&self) -> &[HeaderColumn] {
        &self.headers
    }

    pub fn column_order(&self) -> &[usize] {
        &self.order
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Cells of a stored row, hidden or not
    pub fn row(&self, index: usize) -> Option<&[Cell]> {
        self.rows.get(index).map(|r| r.cells.as_slice())
    }

    /// Mark a column hidden.
    ///
    /// # Panics
    ///
    /// Panics when `index` is not a current column.
    pub fn hide_column(&mut self, index: usize) {
        let count = self.headers.len();
        match self.headers.get_mut(index) {
            Some(header) => header.hidden = true,
            None => panic!("hide_column: index {index} out of range for {count} columns"),
        }
    }

    /// Set the display order.
    ///
    /// Indices past the current header count grow the header list, so a
    /// column is never dropped: mentioned columns come first in the order
    /// given, grown ones in the order first seen, then every column not
    /// mentioned in its storage order.
    pub fn order(&mut self, indices: &[usize]) {
        let mut known = Vec::new();
        let mut grown = Vec::new();
        for &index in indices {
            let bucket = if index < self.headers.len() {
                &mut known
            } else {
                &mut grown
            };
            if !bucket.contains(&index) {
                bucket.push(index);
            }
        }

        if let Some(&widest) = grown.iter().max() {
            self.grow(widest + 1);
        }

        let mut order = known;
        order.extend(grown);
        for index in 0..self.headers.len() {
            if !order.contains(&index) {
                order.push(index);
            }
        }
        self.order = order;
    }

    /// Case-insensitive lookup of a column by title
    pub fn find_column(&self, title: &str) -> Option<usize> {
        let title = title.trim();
        self.headers
            .iter()
            .position(|h| h.title.eq_ignore_ascii_case(title))
    }

    /// Activate `COLUMN<op>value` filters; filters on the same column are ANDed.
    pub fn set_filter<S: AsRef<str>>(&mut self, specs: &[S]) -> std::result::Result<(), TableError> {
        for spec in specs {
            let (column, filter) = MatchFilter::parse(spec.as_ref())?;
            let index = self
                .find_column(&column)
                .ok_or(TableError::UnknownColumn(column))?;
            log::debug!("filter on column {} ({}): {:?}", index, self.headers[index].title, filter);
            self.headers[index].filters.push(filter);
        }
        Ok(())
    }

    /// Stable multi key sort; a leading `!` sorts that key in descending order.
    pub fn sort_by_names<S: AsRef<str>>(&mut self, specs: &[S]) -> std::result::Result<(), TableError> {
        let mut keys = Vec::new();
        for spec in specs {
            let spec = spec.as_ref().trim();
            if spec.is_empty() {
                continue;
            }
            let (name, descending) = match spec.strip_prefix('!') {
                Some(name) => (name, true),
                None => (spec, false),
            };
            let index = self
                .find_column(name)
                .ok_or_else(|| TableError::UnknownColumn(name.trim().to_string()))?;
            keys.push((index, descending, self.headers[index].is_numeric()));
        }
        if keys.is_empty() {
            return Ok(());
        }

        self.rows.sort_by(|a, b| {
            for &(index, descending, numeric) in &keys {
                let ordering = compare_cells(&a.cells[index], &b.cells[index], numeric);
                let ordering = if descending {
                    ordering.reverse()
                } else {
                    ordering
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });
        Ok(())
    }

    /// Rows that are neither hidden nor rejected by a filter
    pub fn visible_row_indices(&self) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| !row.hidden && self.passes_filters(row))
            .map(|(index, _)| index)
            .collect()
    }

    fn passes_filters(&self, row: &Row) -> bool {
        self.headers
            .iter()
            .zip(&row.cells)
            .all(|(header, cell)| header.passes(cell))
    }

    /// Visible columns in display order
    pub fn visible_columns(&self) -> Vec<usize> {
        self.order
            .iter()
            .copied()
            .filter(|&index| !self.headers[index].hidden)
            .collect()
    }

    /// Visible rows whose numeric value in `column` is an outlier.
    pub fn list_out_of_range(&self, column: usize) -> Vec<usize> {
        self.list_out_of_range_with(column, OutlierPolicy::default())
    }

    pub fn list_out_of_range_with(&self, column: usize, policy: OutlierPolicy) -> Vec<usize> {
        let (rows, values): (Vec<usize>, Vec<f64>) = self
            .visible_row_indices()
            .into_iter()
            .filter_map(|index| {
                let cell = self.rows[index].cells.get(column)?;
                cell.is_numeric().then(|| (index, cell.magnitude()))
            })
            .unzip();

        policy
            .scan(&values)
            .into_iter()
            .map(|position| rows[position])
            .collect()
    }

    /// Exclude rows from rendering without removing them from storage.
    pub fn hide_rows(&mut self, indices: &[usize]) {
        for &index in indices {
            match self.rows.get_mut(index) {
                Some(row) => row.hidden = true,
                None => log::debug!("hide_rows: no row {index}"),
            }
        }
    }

    /// Aligned text with trailing spaces removed from every line.
    pub fn print(&self, out: &mut impl Write, options: RenderOptions) -> Result<()> {
        let columns = self.visible_columns();
        if columns.is_empty() {
            return Ok(());
        }

        let titles: Vec<Cell> = columns
            .iter()
            .map(|&index| Cell::text(self.headers[index].title.as_str()))
            .collect();
        writeln!(out, "{}", self.format_line(&columns, &titles, RenderOptions::default()))?;

        for index in self.visible_row_indices() {
            let row = &self.rows[index];
            let cells: Vec<Cell> = columns.iter().map(|&c| row.cells[c].clone()).collect();
            writeln!(out, "{}", self.format_line(&columns, &cells, options))?;
        }
        Ok(())
    }

    fn format_line(&self, columns: &[usize], cells: &[Cell], options: RenderOptions) -> String {
        let Some(last) = cells.iter().rposition(|c| !c.as_str().is_empty()) else {
            return String::new();
        };

        let mut line = String::new();
        for (position, (&column, cell)) in columns.iter().zip(cells).enumerate().take(last + 1) {
            if options.colour {
                line.push_str(&paint(cell));
            } else {
                line.push_str(cell.as_str());
            }
            if position < last {
                let padding = self.headers[column].width.saturating_sub(cell.width());
                line.push_str(&" ".repeat(padding));
            }
        }
        line
    }

    /// One record per visible row keyed by the visible header titles
    pub fn records(&self) -> Vec<Record<'_>> {
        let columns = self.visible_columns();
        self.visible_row_indices()
            .into_iter()
            .map(|index| Record {
                fields: columns
                    .iter()
                    .map(|&c| (self.headers[c].title.as_str(), self.rows[index].cells[c].as_str()))
                    .collect(),
            })
            .collect()
    }

    pub fn print_json(&self, out: &mut impl Write) -> Result<()> {
        serde_json::to_writer_pretty(&mut *out, &self.records())?;
        writeln!(out)?;
        Ok(())
    }

    pub fn print_yaml(&self, out: &mut impl Write) -> Result<()> {
        serde_yaml::to_writer(out, &self.records())?;
        Ok(())
    }
}

fn compare_cells(a: &Cell, b: &Cell, numeric: bool) -> Ordering {
    if !numeric {
        return a.as_str().cmp(b.as_str());
    }
    match (a.is_numeric(), b.is_numeric()) {
        (true, true) => a.cmp_numeric(b),
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.as_str().cmp(b.as_str()),
    }
}

fn paint(cell: &Cell) -> String {
    match cell.colour() {
        ColourRank::None => cell.as_str().to_string(),
        ColourRank::Warning => cell.as_str().yellow().to_string(),
        ColourRank::Bad => cell.as_str().red().to_string(),
    }
}

/// A rendered row, serialised as a map in display column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record<'a> {
    pub fields: Vec<(&'a str, &'a str)>,
}

impl Serialize for Record<'_> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (title, value) in &self.fields {
            map.serialize_entry(title, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(table: &Table) -> String {
        let mut out = Vec::new();
        table.print(&mut out, RenderOptions::default()).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn column(table: &Table, index: usize) -> Vec<String> {
        table
            .visible_row_indices()
            .into_iter()
            .map(|r| table.row(r).unwrap()[index].to_string())
            .collect()
    }

    fn pods() -> Table {
        let mut table = Table::new();
        table.set_header(["NAME", "RESTARTS", "STATE"]);
        table.add_row(vec![Cell::text("foo"), Cell::count(3), Cell::text("Running")]);
        table.add_row(vec![Cell::text("bar"), Cell::count(10), Cell::text("Waiting")]);
        table.add_row(vec![Cell::text("foo"), Cell::count(1), Cell::text("Running")]);
        table.add_row(vec![Cell::text("baz"), Cell::count(3), Cell::text("Running")]);
        table
    }

    #[test]
    fn rows_keep_insertion_order_and_content() {
        let table = pods();
        assert_eq!(table.row_count(), 4);
        assert_eq!(column(&table, 0), ["foo", "bar", "foo", "baz"]);
        assert_eq!(table.row(1).unwrap()[1], Cell::count(10));
    }

    #[test]
    fn short_rows_are_padded_and_long_rows_grow_headers() {
        let mut table = Table::new();
        table.set_header(["A", "B"]);
        table.add_row(vec![Cell::text("1")]);
        assert_eq!(table.row(0).unwrap().len(), 2);

        table.add_row(vec![Cell::text("1"), Cell::text("2"), Cell::text("3")]);
        assert_eq!(table.headers().len(), 3);
        assert_eq!(table.column_order(), [0, 1, 2]);
        assert_eq!(table.row(0).unwrap().len(), 3);
    }

    #[test]
    fn reheading_resizes_existing_rows() {
        let mut table = pods();
        table.set_header(["NAME"]);
        assert_eq!(table.row(0).unwrap().len(), 1);
        table.set_header(["NAME", "X", "Y", "Z"]);
        assert_eq!(table.row(0).unwrap().len(), 4);
        assert_eq!(table.row(0).unwrap()[3], Cell::empty());
    }

    #[test]
    fn numeric_sort_descending_then_ascending_reverses() {
        let mut table = Table::new();
        table.set_header(["NAME", "RESTARTS"]);
        for (name, restarts) in [("a", 5), ("b", 100), ("c", 20), ("d", 0)] {
            table.add_row(vec![Cell::text(name), Cell::count(restarts)]);
        }

        table.sort_by_names(&["!RESTARTS"]).unwrap();
        let descending = column(&table, 0);
        assert_eq!(descending, ["b", "c", "a", "d"]);

        table.sort_by_names(&["restarts"]).unwrap();
        let mut ascending = column(&table, 0);
        ascending.reverse();
        assert_eq!(ascending, descending);
    }

    #[test]
    fn sort_is_stable_for_equal_keys() {
        let mut table = pods();
        table.sort_by_names(&["STATE"]).unwrap();
        // foo(3), foo(1), baz(3) are all Running and keep their relative order
        assert_eq!(column(&table, 0), ["foo", "foo", "baz", "bar"]);
        assert_eq!(column(&table, 1), ["3", "1", "3", "10"]);
    }

    #[test]
    fn multi_key_sort_falls_through_ties() {
        let mut table = pods();
        table.sort_by_names(&["NAME", "!RESTARTS"]).unwrap();
        assert_eq!(column(&table, 0), ["bar", "baz", "foo", "foo"]);
        assert_eq!(column(&table, 1), ["10", "3", "3", "1"]);
    }

    #[test]
    fn unknown_sort_column_is_an_error() {
        let mut table = pods();
        assert_eq!(
            table.sort_by_names(&["AGE"]),
            Err(TableError::UnknownColumn("AGE".to_string()))
        );
    }

    #[test]
    fn equality_filter_and_its_complement() {
        let mut matching = pods();
        matching.set_filter(&["NAME=foo"]).unwrap();
        let kept = matching.visible_row_indices();
        assert_eq!(kept, [0, 2]);

        let mut complement = pods();
        complement.set_filter(&["name!=foo"]).unwrap();
        let rest = complement.visible_row_indices();
        assert_eq!(rest, [1, 3]);
    }

    #[test]
    fn filters_are_anded_across_columns() {
        let mut table = pods();
        table.set_filter(&["NAME=foo", "RESTARTS>2"]).unwrap();
        assert_eq!(table.visible_row_indices(), [0]);
    }

    #[test]
    fn unknown_filter_column_is_an_error() {
        let mut table = pods();
        assert_eq!(
            table.set_filter(&["IMAGE=nginx"]),
            Err(TableError::UnknownColumn("IMAGE".to_string()))
        );
    }

    #[test]
    fn hidden_column_is_never_rendered() {
        let titles = ["NAME", "RESTARTS", "STATE"];
        for hidden in 0..titles.len() {
            let mut table = pods();
            table.hide_column(hidden);
            assert!(table.headers()[hidden].is_hidden());
            assert!(!table.visible_columns().contains(&hidden));

            let header = render(&table).lines().next().unwrap_or_default().to_string();
            for (index, title) in titles.iter().enumerate() {
                assert_eq!(header.contains(title), index != hidden, "hiding column {hidden}");
            }
            for record in table.records() {
                assert!(record.fields.iter().all(|(title, _)| *title != titles[hidden]));
                assert_eq!(record.fields.len(), titles.len() - 1);
            }
        }

        let mut table = pods();
        table.hide_column(1);
        assert!(!render(&table).contains("10"));
        assert_eq!(table.records()[0].fields, [("NAME", "foo"), ("STATE", "Running")]);
    }

    #[test]
    fn header_state_follows_rows_and_filters() {
        let mut table = pods();
        let restarts = &table.headers()[1];
        assert_eq!(restarts.title(), "RESTARTS");
        assert_eq!(restarts.width(), "RESTARTS".len() + COLUMN_PADDING);
        assert!(restarts.filters().is_empty());
        assert!(!restarts.is_hidden());

        table.add_row(vec![Cell::text("a-much-longer-name"), Cell::count(0), Cell::empty()]);
        table.set_filter(&["restarts>1", "restarts<5"]).unwrap();
        assert_eq!(table.headers()[0].width(), "a-much-longer-name".len() + COLUMN_PADDING);
        assert_eq!(table.headers()[1].filters().len(), 2);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn hiding_a_missing_column_panics() {
        let mut table = pods();
        table.hide_column(3);
    }

    #[test]
    fn order_keeps_every_column() {
        let mut table = pods();
        table.order(&[2, 0]);
        assert_eq!(table.column_order(), [2, 0, 1]);

        table.order(&[1, 5, 1, 4]);
        assert_eq!(table.column_order(), [1, 5, 4, 0, 2, 3]);
        assert_eq!(table.headers().len(), 6);
        assert_eq!(table.row(0).unwrap().len(), 6);
    }

    #[test]
    fn text_output_is_aligned_and_trimmed() {
        let mut table = Table::new();
        table.set_header(["NAME", "IMAGE"]);
        table.add_row(vec![Cell::text("web"), Cell::text("nginx:1.25")]);
        table.add_row(vec![Cell::text("sidecar"), Cell::empty()]);
        assert_eq!(
            render(&table),
            "NAME     IMAGE\nweb      nginx:1.25\nsidecar\n"
        );
    }

    #[test]
    fn ordered_text_output() {
        let mut table = Table::new();
        table.set_header(["NAME", "IMAGE"]);
        table.add_row(vec![Cell::text("web"), Cell::text("nginx")]);
        table.order(&[1]);
        assert_eq!(render(&table), "IMAGE  NAME\nnginx  web\n");
    }

    #[test]
    fn json_uses_visible_titles_in_display_order() {
        let mut table = pods();
        table.order(&[2]);
        table.hide_column(1);
        table.set_filter(&["NAME=bar"]).unwrap();

        let mut out = Vec::new();
        table.print_json(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value, serde_json::json!([{ "STATE": "Waiting", "NAME": "bar" }]));
        assert!(text.find("STATE").unwrap() < text.find("NAME").unwrap());
    }

    #[test]
    fn outliers_are_listed_and_hidden() {
        let mut table = Table::new();
        table.set_header(["NAME", "USED"]);
        for (name, used) in [("a", 10), ("b", 10), ("c", 1000), ("d", 10), ("e", 10)] {
            table.add_row(vec![Cell::text(name), Cell::count(used)]);
        }
        let outliers = table.list_out_of_range(1);
        assert_eq!(outliers, [2]);

        let normal: Vec<usize> = (0..table.row_count()).filter(|r| !outliers.contains(r)).collect();
        table.hide_rows(&normal);
        assert_eq!(table.visible_row_indices(), [2]);
    }

    #[test]
    fn colour_only_applies_when_enabled() {
        let mut table = Table::new();
        table.set_header(["%REQ"]);
        table.add_row(vec![Cell::coloured(ColourRank::Bad, "95", 95.0)]);

        let mut plain = Vec::new();
        table.print(&mut plain, RenderOptions { colour: false }).unwrap();
        assert_eq!(String::from_utf8(plain).unwrap(), "%REQ\n95\n");

        let mut coloured = Vec::new();
        table.print(&mut coloured, RenderOptions { colour: true }).unwrap();
        let coloured = String::from_utf8(coloured).unwrap();
        assert!(coloured.contains("95"));
        if std::env::var_os("NO_COLOR").is_none() {
            assert!(coloured.contains("\u{1b}["));
        }
    }
}
