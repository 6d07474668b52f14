use std::io::Write;

/// A plain text grid with box-drawing borders.
///
/// Every cell is left aligned and padded to the widest entry of its column.
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<I>(headers: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Appends a row. Missing trailing cells render empty, surplus cells are dropped.
    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    fn widths(&self) -> Vec<usize> {
        self.headers
            .iter()
            .enumerate()
            .map(|(column, header)| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(column))
                    .map(|cell| cell.chars().count())
                    .chain(std::iter::once(header.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }

    pub fn render(&self, mut output: impl Write) -> std::io::Result<()> {
        let widths = self.widths();

        let rule = |left: &str, fill: &str, cross: &str, right: &str| {
            let segments: Vec<_> = widths.iter().map(|width| fill.repeat(width + 2)).collect();
            format!("{left}{}{right}", segments.join(cross))
        };
        let line = |cells: &[String]| {
            let cells: Vec<_> = widths
                .iter()
                .enumerate()
                .map(|(column, &width)| {
                    let cell = cells.get(column).map(String::as_str).unwrap_or("");
                    format!(" {cell:<width$} ")
                })
                .collect();
            format!("│{}│", cells.join("│"))
        };

        writeln!(output, "{}", rule("╒", "═", "╤", "╕"))?;
        writeln!(output, "{}", line(&self.headers))?;
        writeln!(output, "{}", rule("╞", "═", "╪", "╡"))?;
        for (index, row) in self.rows.iter().enumerate() {
            if index > 0 {
                writeln!(output, "{}", rule("├", "─", "┼", "┤"))?;
            }
            writeln!(output, "{}", line(row))?;
        }
        writeln!(output, "{}", rule("╘", "═", "╧", "╛"))?;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn renders_fancy_grid() {
        let mut table = Table::new(["a", "bb"]);
        table.push_row(vec!["1".into(), "2".into()]);
        table.push_row(vec!["333".into()]);

        let mut buffer = Vec::new();
        table.render(&mut buffer).unwrap();

        let expected = "\
╒═════╤════╕
│ a   │ bb │
╞═════╪════╡
│ 1   │ 2  │
├─────┼────┤
│ 333 │    │
╘═════╧════╛
";
        assert_eq!(String::from_utf8(buffer).unwrap(), expected);
    }

    #[test]
    fn header_only_table() {
        let table = Table::new(["Region"]);

        let mut buffer = Vec::new();
        table.render(&mut buffer).unwrap();

        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "╒════════╕\n│ Region │\n╞════════╡\n╘════════╛\n"
        );
    }
}
