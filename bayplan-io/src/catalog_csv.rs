//! 产品目录 CSV 解析。
//!
//! 首行为表头，按名称（不区分大小写）匹配 `code,size,diameter,width,pallet,note`，
//! 列顺序任意，缺失的列被容忍。数值列只取开头的整数部分；直径或宽度不是数值的行
//! 被跳过并记录警告，托盘数不是数值时记为缺失。没有品番的行被丢弃。

use bayplan_core::catalog::{CatalogCode, CatalogEntry, CatalogProvider, InMemoryCatalog};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Code,
    Size,
    Diameter,
    Width,
    Pallet,
    Note,
}

impl Column {
    const ALL: [Column; 6] = [
        Column::Code,
        Column::Size,
        Column::Diameter,
        Column::Width,
        Column::Pallet,
        Column::Note,
    ];

    fn header(self) -> &'static str {
        match self {
            Column::Code => "code",
            Column::Size => "size",
            Column::Diameter => "diameter",
            Column::Width => "width",
            Column::Pallet => "pallet",
            Column::Note => "note",
        }
    }
}

/// 每个已知列在原始表头中的位置。
#[derive(Debug, Default)]
struct HeaderMap {
    indices: [Option<usize>; 6],
}

impl HeaderMap {
    fn parse(line: &str) -> Self {
        let headers: Vec<String> = line
            .split(',')
            .map(|header| header.trim().to_lowercase())
            .collect();
        let mut map = Self::default();
        for (slot, column) in Column::ALL.iter().enumerate() {
            map.indices[slot] = headers.iter().position(|h| h == column.header());
        }
        map
    }

    fn index(&self, column: Column) -> Option<usize> {
        Column::ALL
            .iter()
            .position(|c| *c == column)
            .and_then(|slot| self.indices[slot])
    }

    fn missing(&self) -> Vec<&'static str> {
        Column::ALL
            .iter()
            .zip(self.indices.iter())
            .filter(|(_, index)| index.is_none())
            .map(|(column, _)| column.header())
            .collect()
    }
}

/// 解析整个 CSV 文本。空文本或只有表头时返回空目录。
pub fn parse_catalog(source: &str) -> InMemoryCatalog {
    let mut lines = source.trim().lines();
    let Some(header_line) = lines.next() else {
        warn!("catalog csv is empty");
        return InMemoryCatalog::new();
    };
    let header = HeaderMap::parse(header_line);
    let missing = header.missing();
    if !missing.is_empty() {
        debug!(?missing, "catalog csv lacks columns");
    }

    let mut catalog = InMemoryCatalog::new();
    let mut skipped = 0usize;
    for (offset, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        // 表头占第 1 行
        let line_no = offset + 2;
        match parse_row(&header, line, line_no) {
            RowOutcome::Entry(entry) => catalog.insert(entry),
            RowOutcome::Skipped => skipped += 1,
            RowOutcome::NoCode => {}
        }
    }

    if catalog.is_empty() {
        warn!(skipped, "catalog csv produced no entries");
    } else {
        debug!(entries = catalog.len(), skipped, "catalog csv parsed");
    }
    catalog
}

enum RowOutcome {
    Entry(CatalogEntry),
    Skipped,
    NoCode,
}

fn parse_row(header: &HeaderMap, line: &str, line_no: usize) -> RowOutcome {
    let values: Vec<&str> = line.split(',').map(str::trim).collect();
    let field = |column: Column| field_value(header, &values, column);

    let mut dimensions = [0u32; 2];
    for (slot, column) in [Column::Diameter, Column::Width].into_iter().enumerate() {
        if header.index(column).is_none() {
            continue;
        }
        let raw = field(column);
        match parse_leading_int(raw) {
            Some(value) => dimensions[slot] = value,
            None => {
                warn!(
                    line = line_no,
                    column = column.header(),
                    value = raw,
                    "catalog row has non-numeric value, skipped"
                );
                return RowOutcome::Skipped;
            }
        }
    }

    let Some(code) = CatalogCode::parse(field(Column::Code)) else {
        return RowOutcome::NoCode;
    };

    RowOutcome::Entry(CatalogEntry {
        code,
        size: field(Column::Size).to_string(),
        diameter_mm: dimensions[0],
        width_mm: dimensions[1],
        pallet_count: parse_leading_int(field(Column::Pallet)),
        note: field(Column::Note).to_string(),
    })
}

fn field_value<'a>(header: &HeaderMap, values: &[&'a str], column: Column) -> &'a str {
    header
        .index(column)
        .and_then(|index| values.get(index).copied())
        .unwrap_or("")
}

/// 读取开头的十进制整数部分，例如 `"650mm"` 得到 650。没有数字或为负数时返回 `None`。
fn parse_leading_int(raw: &str) -> Option<u32> {
    let trimmed = raw.trim_start();
    let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(digits.len(), |(index, _)| index);
    digits[..end].parse::<u32>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_integer_is_extracted() {
        assert_eq!(parse_leading_int("650"), Some(650));
        assert_eq!(parse_leading_int("650mm"), Some(650));
        assert_eq!(parse_leading_int("634.9"), Some(634));
        assert_eq!(parse_leading_int("+12"), Some(12));
        assert_eq!(parse_leading_int("-5"), None);
        assert_eq!(parse_leading_int("n/a"), None);
        assert_eq!(parse_leading_int(""), None);
    }

    #[test]
    fn header_is_matched_case_insensitively_in_any_order() {
        let map = HeaderMap::parse(" Note ,DIAMETER,code,extra");
        assert_eq!(map.index(Column::Note), Some(0));
        assert_eq!(map.index(Column::Diameter), Some(1));
        assert_eq!(map.index(Column::Code), Some(2));
        assert_eq!(map.index(Column::Pallet), None);
        assert_eq!(map.missing(), vec!["size", "width", "pallet"]);
    }

    #[test]
    fn header_only_yields_empty_catalog() {
        assert!(parse_catalog("code,size,diameter\n").is_empty());
        assert!(parse_catalog("   ").is_empty());
    }
}
